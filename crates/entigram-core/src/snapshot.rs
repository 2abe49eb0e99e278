//! Persisted index snapshot.
//!
//! A dataset directory holds the annotated CSV and a `histograms.json`
//! snapshot reconstructable into an [`EntityIndex`] at load time. The
//! snapshot stores category member lists in their count-ranked order at
//! save time and the entity first-discovery order explicitly, so count-tie
//! ordering survives a reload. No format versioning beyond this.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::Result;
use crate::index::EntityIndex;
use crate::models::{CategoryOrigin, RowId};

/// JSON-serializable snapshot of an [`EntityIndex`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    /// Category key → member entities, ranked by row count at save time.
    pub histograms: BTreeMap<String, Vec<String>>,
    /// Entity → row ids mentioning it, ascending.
    pub ids_by_entity: BTreeMap<String, Vec<RowId>>,
    /// Entity names in first-discovery order.
    pub entities_order: Vec<String>,
    /// Keys of user-created categories, in creation order.
    #[serde(default)]
    pub user_categories: Vec<String>,
    /// Stamped when the snapshot is written to disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

impl IndexSnapshot {
    /// Capture the current state of an index.
    pub fn from_index(index: &EntityIndex) -> Self {
        let mut histograms = BTreeMap::new();
        let mut user_categories = Vec::new();
        for key in index.category_keys() {
            // category_keys only returns existing keys, so the read cannot
            // miss; an inconsistency here is an index corruption bug.
            if let Ok(entities) = index.entities_in_category(&key) {
                histograms.insert(key.clone(), entities);
            }
            if index.category_origin(&key) == Some(CategoryOrigin::UserCreated) {
                user_categories.push(key);
            }
        }

        let entities_order = index.entities_in_discovery_order();
        let mut ids_by_entity = BTreeMap::new();
        for entity in &entities_order {
            ids_by_entity.insert(
                entity.clone(),
                index.rows_for_entity(entity).into_iter().collect(),
            );
        }

        Self {
            histograms,
            ids_by_entity,
            entities_order,
            user_categories,
            generated_at: None,
        }
    }

    /// Rebuild an index from this snapshot, restoring discovery order and
    /// category origin.
    pub fn into_index(self) -> Result<EntityIndex> {
        let mut index = EntityIndex::new();

        // Discovery order first, then whatever the order list missed.
        for entity in &self.entities_order {
            if let Some(rows) = self.ids_by_entity.get(entity) {
                index.register_entity(entity, rows)?;
            }
        }
        for (entity, rows) in &self.ids_by_entity {
            if !index.contains_entity(entity) {
                index.register_entity(entity, rows)?;
            }
        }

        for (key, members) in &self.histograms {
            if self.user_categories.contains(key) {
                continue;
            }
            index.upsert_category(key, members, CategoryOrigin::Discovered)?;
        }
        for key in &self.user_categories {
            if let Some(members) = self.histograms.get(key) {
                index.upsert_category(key, members, CategoryOrigin::UserCreated)?;
            }
        }

        Ok(index)
    }

    /// Write the snapshot into `dir` as pretty-printed JSON, stamping
    /// `generated_at`.
    pub fn save(mut self, dir: &Path) -> Result<()> {
        self.generated_at = Some(Utc::now());
        let path = dir.join(defaults::HISTOGRAMS_FILE);
        let json = serde_json::to_string_pretty(&self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a snapshot from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(defaults::HISTOGRAMS_FILE);
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
