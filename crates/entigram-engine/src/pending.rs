//! The human-in-the-loop pending-category workflow.
//!
//! A small state machine governing one in-flight, user-curated category:
//! a search synthesizes a candidate entity universe, the user toggles
//! candidates in and out of the selection, and the category is either
//! committed into the index or cancelled without a trace.
//!
//! At most one pending category exists per session. Starting a new search
//! while one is pending runs cancel semantics on the old one first, so no
//! speculative category is ever orphaned.

use std::collections::BTreeSet;

use tracing::{debug, info};

use entigram_core::{
    normalize_entity, Category, CategoryOrigin, EntityIndex, Error, EvidenceSnapshot, Result,
    SourceRow,
};

use crate::synthesizer::CategorySynthesizer;

struct PendingCategory {
    name: String,
    /// Synthesized candidate universe, first-report order.
    universe: Vec<String>,
    /// Current selection. Starts empty: the user checks entities in.
    selected: BTreeSet<String>,
    /// Whether the category key was speculatively inserted into the index.
    speculative: bool,
    /// Evidence state of every touched entity, captured before synthesis.
    undo_evidence: EvidenceSnapshot,
    /// Prior member list and origin when the query augmented an existing
    /// category.
    undo_members: Option<(Vec<String>, CategoryOrigin)>,
}

enum State {
    Idle,
    Pending(PendingCategory),
}

/// Workflow tracking the single in-flight user-curated category.
pub struct PendingCategoryWorkflow {
    synthesizer: CategorySynthesizer,
    state: State,
}

impl PendingCategoryWorkflow {
    pub fn new(synthesizer: CategorySynthesizer) -> Self {
        Self {
            synthesizer,
            state: State::Idle,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, State::Pending(_))
    }

    /// Name of the pending category, if any.
    pub fn pending_name(&self) -> Option<&str> {
        match &self.state {
            State::Pending(p) => Some(&p.name),
            State::Idle => None,
        }
    }

    /// The synthesized candidate universe, if pending.
    pub fn candidate_universe(&self) -> Option<&[String]> {
        match &self.state {
            State::Pending(p) => Some(&p.universe),
            State::Idle => None,
        }
    }

    /// Currently selected candidates, if pending.
    pub fn selected(&self) -> Option<Vec<String>> {
        match &self.state {
            State::Pending(p) => Some(p.selected.iter().cloned().collect()),
            State::Idle => None,
        }
    }

    /// `Idle -> Pending`: synthesize a category for `query` and start
    /// curating it. An existing pending category is cancelled first.
    ///
    /// The synthesized entities register into the index immediately; when
    /// the synthesis is non-empty and the key is brand-new, the category is
    /// speculatively inserted so projections include it during curation.
    /// The pre-search state of everything touched is captured for cancel.
    ///
    /// Returns the synthesized category for display. Collaborator failure
    /// leaves the index unmodified (the previous pending category is still
    /// cancelled) and the workflow idle.
    pub async fn start_search(
        &mut self,
        query: &str,
        corpus: &[SourceRow],
        index: &mut EntityIndex,
    ) -> Result<Category> {
        self.cancel(index)?;

        let found = self.synthesizer.discover(query, corpus).await?;
        let undo_evidence =
            index.capture_evidence(found.evidence.iter().map(|e| e.entity.as_str()));
        let undo_members = index
            .entities_in_category(query)
            .ok()
            .map(|members| (members, index.category_origin(query).unwrap_or(CategoryOrigin::Discovered)));

        let category = self.synthesizer.register(&found, index)?;

        let speculative = if !found.is_empty() && !index.contains_category(query) {
            index.upsert_category(query, &found.entity_names(), CategoryOrigin::UserCreated)?;
            true
        } else {
            false
        };

        info!(
            query = %query,
            entity_count = found.evidence.len(),
            speculative,
            "Pending category started"
        );
        self.state = State::Pending(PendingCategory {
            name: query.to_string(),
            universe: found.entity_names(),
            selected: BTreeSet::new(),
            speculative,
            undo_evidence,
            undo_members,
        });
        Ok(category)
    }

    /// `Pending -> Pending`: flip one entity in or out of the selection.
    /// No-op (returns `false`) when idle or when the entity is not part of
    /// the synthesized universe.
    pub fn toggle(&mut self, entity: &str) -> bool {
        let State::Pending(pending) = &mut self.state else {
            return false;
        };
        let name = normalize_entity(entity);
        if !pending.universe.contains(&name) {
            return false;
        }
        if !pending.selected.remove(&name) {
            pending.selected.insert(name);
        }
        true
    }

    /// `Pending -> Idle`: promote the curated selection into the index as a
    /// user-created category, ordered by row count.
    ///
    /// Fails with `EmptySelection` when nothing is selected, leaving the
    /// index unchanged and the workflow pending. The interface disables commit in
    /// that case; the core still rejects it defensively.
    pub fn commit(&mut self, index: &mut EntityIndex) -> Result<Category> {
        let State::Pending(pending) = &mut self.state else {
            return Err(Error::InvalidInput(
                "no pending category to commit".to_string(),
            ));
        };
        if pending.selected.is_empty() {
            return Err(Error::EmptySelection);
        }

        let selected: Vec<String> = pending.selected.iter().cloned().collect();
        let ordered = index.rank_by_evidence(&selected);
        index.upsert_category(&pending.name, &ordered, CategoryOrigin::UserCreated)?;

        info!(
            category = %pending.name,
            entity_count = ordered.len(),
            "Pending category committed"
        );
        let category = Category::new(pending.name.clone(), ordered);
        self.state = State::Idle;
        Ok(category)
    }

    /// `Pending -> Idle`: discard the pending category, restoring the index
    /// to the exact state it had before `start_search`. No-op when idle.
    pub fn cancel(&mut self, index: &mut EntityIndex) -> Result<()> {
        let State::Pending(pending) = std::mem::replace(&mut self.state, State::Idle) else {
            return Ok(());
        };

        if pending.speculative {
            index.remove_category(&pending.name);
        }
        if let Some((members, origin)) = pending.undo_members {
            index.upsert_category(&pending.name, &members, origin)?;
        }
        index.restore_evidence(pending.undo_evidence);

        debug!(category = %pending.name, "Pending category cancelled");
        Ok(())
    }
}
