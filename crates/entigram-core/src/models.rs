//! Core data model for entigram.

use serde::{Deserialize, Serialize};

/// Stable identifier of a dataset row. Row ids are assigned in dataset
/// order by the loader and never change afterwards.
pub type RowId = u64;

/// Normalize a raw entity span before it is used as an index key.
///
/// Trims surrounding whitespace and lower-cases, so casing and whitespace
/// variants reported by the extractor merge into one entity.
pub fn normalize_entity(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// One unit of the input dataset: a text record with a stable id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRow {
    pub id: RowId,
    pub text: String,
}

impl SourceRow {
    pub fn new(id: RowId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// One entity occurrence reported by the extraction collaborator:
/// an entity span, the row it was found in, and the category label the
/// collaborator assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub entity: String,
    pub row_id: RowId,
    pub label: String,
}

impl ExtractedEntity {
    pub fn new(entity: impl Into<String>, row_id: RowId, label: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            row_id,
            label: label.into(),
        }
    }
}

/// Where a category came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryOrigin {
    /// Produced by the offline annotation pipeline.
    Discovered,
    /// Created by a user through the curation workflow.
    UserCreated,
}

/// A named grouping of entities, as returned by index reads and synthesis.
///
/// `entities` is ordered by descending row count at the time of the read;
/// the ordering is a live aggregate, not a stored property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub key: String,
    pub entities: Vec<String>,
}

impl Category {
    pub fn new(key: impl Into<String>, entities: Vec<String>) -> Self {
        Self {
            key: key.into(),
            entities,
        }
    }

    /// A category with no entities is valid and displayable (it conveys no
    /// bars); callers distinguish this from a failed synthesis.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// An entity together with the row evidence that backs it.
///
/// Used when upserting categories whose members may not be registered yet:
/// an unknown entity is only accepted when it carries row evidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityEvidence {
    pub entity: String,
    pub rows: Vec<RowId>,
}

impl EntityEvidence {
    pub fn new(entity: impl Into<String>, rows: Vec<RowId>) -> Self {
        Self {
            entity: entity.into(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_entity_trims_and_lowercases() {
        assert_eq!(normalize_entity("  COVID "), "covid");
        assert_eq!(normalize_entity("Bob Dylan"), "bob dylan");
        assert_eq!(normalize_entity("flu"), "flu");
    }

    #[test]
    fn test_normalize_entity_whitespace_only_is_empty() {
        assert_eq!(normalize_entity("   "), "");
    }

    #[test]
    fn test_category_is_empty() {
        assert!(Category::new("musicians", vec![]).is_empty());
        assert!(!Category::new("musicians", vec!["dylan".to_string()]).is_empty());
    }
}
