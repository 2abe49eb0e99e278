//! The entity index: the aggregate root of entigram.
//!
//! Maintains the bidirectional mapping between discovered entities, the row
//! ids that mention them, and the named categories grouping them. Categories
//! are non-exclusive: an entity may belong to any number of them.
//!
//! Ordering is a live aggregate. Reads that return entities in row-count
//! order recompute the ordering on every call, since row counts change as
//! evidence merges in, and a cached order would go stale.
//!
//! ## Invariants
//!
//! - Entity keys are normalized (trimmed, lower-cased); row-id lists are
//!   duplicate-free sets and never empty for a registered entity.
//! - Every member of every category exists as an entity key.
//! - Category keys are unique; a committed category is never empty.

use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, Result};
use crate::events::{EventBus, IndexEvent};
use crate::models::{normalize_entity, CategoryOrigin, EntityEvidence, RowId};

struct EntityRecord {
    rows: BTreeSet<RowId>,
    /// First-discovery sequence number, the tie-break for count ordering.
    seq: u64,
}

struct CategoryRecord {
    key: String,
    members: Vec<String>,
    origin: CategoryOrigin,
}

/// Point-in-time record of entity evidence.
///
/// Captured by the curation workflow before a synthesis mutates the index,
/// and restored on cancel. `None` marks an entity that did not exist at
/// capture time.
#[derive(Default)]
pub struct EvidenceSnapshot {
    entries: HashMap<String, Option<(u64, BTreeSet<RowId>)>>,
}

impl EvidenceSnapshot {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Bidirectional entity/category index over one dataset session.
///
/// Explicitly owned and injected into the components that use it; mutations
/// are synchronous and assume a single writer. Structural changes emit
/// [`IndexEvent`]s on the attached [`EventBus`].
pub struct EntityIndex {
    entities: HashMap<String, EntityRecord>,
    next_seq: u64,
    categories: Vec<CategoryRecord>,
    events: EventBus,
}

impl EntityIndex {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            next_seq: 0,
            categories: Vec::new(),
            events: EventBus::default(),
        }
    }

    /// The change-event bus for this index.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // =========================================================================
    // ENTITIES
    // =========================================================================

    /// Register an entity, unioning `rows` into its evidence set.
    ///
    /// The raw span is normalized before keying, so casing and whitespace
    /// variants merge. Registration is idempotent: the final evidence set is
    /// independent of call order. An unknown entity without row evidence is
    /// rejected with `InvalidEntity`.
    ///
    /// Returns the normalized entity name.
    pub fn register_entity(&mut self, raw: &str, rows: &[RowId]) -> Result<String> {
        let name = normalize_entity(raw);
        if name.is_empty() {
            return Err(Error::InvalidEntity(format!(
                "entity {raw:?} normalizes to an empty name"
            )));
        }

        use std::collections::hash_map::Entry;
        match self.entities.entry(name.clone()) {
            Entry::Occupied(mut occupied) => {
                if !rows.is_empty() {
                    let record = occupied.get_mut();
                    record.rows.extend(rows.iter().copied());
                    let row_count = record.rows.len();
                    self.events.emit(IndexEvent::EntityRegistered {
                        entity: name.clone(),
                        row_count,
                    });
                }
            }
            Entry::Vacant(vacant) => {
                if rows.is_empty() {
                    return Err(Error::InvalidEntity(format!(
                        "{name} has no row evidence"
                    )));
                }
                let seq = self.next_seq;
                self.next_seq += 1;
                let record = vacant.insert(EntityRecord {
                    rows: rows.iter().copied().collect(),
                    seq,
                });
                let row_count = record.rows.len();
                self.events.emit(IndexEvent::EntityRegistered {
                    entity: name.clone(),
                    row_count,
                });
            }
        }
        Ok(name)
    }

    /// Row ids mentioning `entity`. Unknown entities yield the empty set
    /// (zero occurrences), never an error.
    pub fn rows_for_entity(&self, entity: &str) -> BTreeSet<RowId> {
        self.entities
            .get(&normalize_entity(entity))
            .map(|r| r.rows.clone())
            .unwrap_or_default()
    }

    pub fn contains_entity(&self, entity: &str) -> bool {
        self.entities.contains_key(&normalize_entity(entity))
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// All entity names in first-discovery order.
    pub fn entities_in_discovery_order(&self) -> Vec<String> {
        let mut names: Vec<(&String, u64)> =
            self.entities.iter().map(|(k, v)| (k, v.seq)).collect();
        names.sort_by_key(|(_, seq)| *seq);
        names.into_iter().map(|(k, _)| k.clone()).collect()
    }

    /// Order entity names by descending row count, ties broken by
    /// first-discovery order. Names are normalized before ranking; unknown
    /// names rank last.
    pub fn rank_by_evidence(&self, names: &[String]) -> Vec<String> {
        let mut ranked: Vec<String> = names.iter().map(|n| normalize_entity(n)).collect();
        ranked.sort_by(|a, b| {
            let (count_a, seq_a) = self.rank_key(a);
            let (count_b, seq_b) = self.rank_key(b);
            count_b.cmp(&count_a).then(seq_a.cmp(&seq_b))
        });
        ranked
    }

    fn rank_key(&self, name: &str) -> (usize, u64) {
        self.entities
            .get(name)
            .map(|r| (r.rows.len(), r.seq))
            .unwrap_or((0, u64::MAX))
    }

    // =========================================================================
    // CATEGORIES
    // =========================================================================

    /// Member entities of a category, ordered by descending row count with
    /// ties broken by first-discovery order. Recomputed on every call.
    pub fn entities_in_category(&self, key: &str) -> Result<Vec<String>> {
        let record = self
            .find_category(key)
            .ok_or_else(|| Error::CategoryNotFound(key.to_string()))?;
        Ok(self.rank_by_evidence(&record.members))
    }

    /// Insert a category or fully replace its member list and origin.
    ///
    /// All members must already be registered entities; an unknown member is
    /// rejected with `InvalidEntity` and the index is left unchanged.
    /// Members are normalized and deduplicated preserving first occurrence.
    pub fn upsert_category(
        &mut self,
        key: &str,
        members: &[String],
        origin: CategoryOrigin,
    ) -> Result<()> {
        let members = self.resolve_members(key, members)?;
        self.apply_category(key, members, origin);
        Ok(())
    }

    /// Insert or replace a category whose members carry their own row
    /// evidence. Unknown entities are auto-registered from that evidence;
    /// an unknown entity *without* evidence is rejected with
    /// `InvalidEntity` before anything is mutated.
    pub fn upsert_category_with_evidence(
        &mut self,
        key: &str,
        evidence: &[EntityEvidence],
        origin: CategoryOrigin,
    ) -> Result<()> {
        if key.trim().is_empty() {
            return Err(Error::InvalidInput("category key is empty".to_string()));
        }
        // Validate everything up front so a failure leaves the index intact.
        let mut members = Vec::new();
        let mut seen = BTreeSet::new();
        for ev in evidence {
            let name = normalize_entity(&ev.entity);
            if name.is_empty() {
                return Err(Error::InvalidEntity(format!(
                    "entity {:?} normalizes to an empty name",
                    ev.entity
                )));
            }
            if !self.entities.contains_key(&name) && ev.rows.is_empty() {
                return Err(Error::InvalidEntity(format!(
                    "{name} has no row evidence"
                )));
            }
            if seen.insert(name.clone()) {
                members.push(name);
            }
        }
        if members.is_empty() {
            return Err(Error::InvalidInput(format!(
                "category {key:?} has no members"
            )));
        }

        for ev in evidence {
            self.register_entity(&ev.entity, &ev.rows)?;
        }
        self.apply_category(key, members, origin);
        Ok(())
    }

    /// Delete a category. Underlying entities survive, since they may still
    /// be referenced by other categories. Returns whether the key existed.
    pub fn remove_category(&mut self, key: &str) -> bool {
        let before = self.categories.len();
        self.categories.retain(|c| c.key != key);
        let removed = self.categories.len() < before;
        if removed {
            self.events.emit(IndexEvent::CategoryRemoved {
                key: key.to_string(),
            });
        }
        removed
    }

    pub fn contains_category(&self, key: &str) -> bool {
        self.find_category(key).is_some()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn category_origin(&self, key: &str) -> Option<CategoryOrigin> {
        self.find_category(key).map(|c| c.origin)
    }

    /// Category keys in creation order.
    pub fn category_keys(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.key.clone()).collect()
    }

    /// Category keys in natural display order: user-created categories first
    /// (creation order), then discovered categories by descending row count
    /// of their top entity. Recomputed on every call.
    pub fn natural_order(&self) -> Vec<String> {
        let mut user = Vec::new();
        let mut discovered = Vec::new();
        for record in &self.categories {
            match record.origin {
                CategoryOrigin::UserCreated => user.push(record.key.clone()),
                CategoryOrigin::Discovered => {
                    discovered.push((record.key.clone(), self.top_entity_count(record)));
                }
            }
        }
        discovered.sort_by(|a, b| b.1.cmp(&a.1));
        user.extend(discovered.into_iter().map(|(key, _)| key));
        user
    }

    fn top_entity_count(&self, record: &CategoryRecord) -> usize {
        record
            .members
            .iter()
            .map(|m| self.entities.get(m).map(|r| r.rows.len()).unwrap_or(0))
            .max()
            .unwrap_or(0)
    }

    fn find_category(&self, key: &str) -> Option<&CategoryRecord> {
        self.categories.iter().find(|c| c.key == key)
    }

    fn resolve_members(&self, key: &str, members: &[String]) -> Result<Vec<String>> {
        if key.trim().is_empty() {
            return Err(Error::InvalidInput("category key is empty".to_string()));
        }
        let mut resolved = Vec::new();
        let mut seen = BTreeSet::new();
        for member in members {
            let name = normalize_entity(member);
            if !self.entities.contains_key(&name) {
                return Err(Error::InvalidEntity(format!(
                    "{name} has no row evidence"
                )));
            }
            if seen.insert(name.clone()) {
                resolved.push(name);
            }
        }
        if resolved.is_empty() {
            return Err(Error::InvalidInput(format!(
                "category {key:?} has no members"
            )));
        }
        Ok(resolved)
    }

    fn apply_category(&mut self, key: &str, members: Vec<String>, origin: CategoryOrigin) {
        let entity_count = members.len();
        if let Some(pos) = self.categories.iter().position(|c| c.key == key) {
            self.categories[pos].members = members;
            self.categories[pos].origin = origin;
        } else {
            self.categories.push(CategoryRecord {
                key: key.to_string(),
                members,
                origin,
            });
        }
        self.events.emit(IndexEvent::CategoryUpserted {
            key: key.to_string(),
            entity_count,
        });
    }

    // =========================================================================
    // CURATION SUPPORT
    // =========================================================================

    /// Capture the current evidence state of the named entities, including
    /// their discovery sequence. Entities unknown at capture time are
    /// recorded as absent.
    pub fn capture_evidence<'a>(
        &self,
        entities: impl IntoIterator<Item = &'a str>,
    ) -> EvidenceSnapshot {
        let mut snapshot = EvidenceSnapshot::default();
        for raw in entities {
            let name = normalize_entity(raw);
            if name.is_empty() {
                continue;
            }
            let prior = self
                .entities
                .get(&name)
                .map(|r| (r.seq, r.rows.clone()));
            snapshot.entries.insert(name, prior);
        }
        snapshot
    }

    /// Restore entity evidence captured by [`capture_evidence`](Self::capture_evidence).
    ///
    /// Entities recorded as absent are deleted again. Callers must remove
    /// any category still referencing a restored-absent entity first, or the
    /// no-dangling-members invariant breaks. Emits no events: this is an
    /// undo, not a new discovery.
    pub fn restore_evidence(&mut self, snapshot: EvidenceSnapshot) {
        for (name, prior) in snapshot.entries {
            match prior {
                Some((seq, rows)) => {
                    self.entities.insert(name, EntityRecord { rows, seq });
                }
                None => {
                    self.entities.remove(&name);
                }
            }
        }
    }
}

impl Default for EntityIndex {
    fn default() -> Self {
        Self::new()
    }
}
