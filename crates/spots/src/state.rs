use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use crate::record::{SpotId, SpotRecord};
use crate::store::{ApplyOutcome, SpotStore};
use crate::visibility::{VisibilityEffect, VisibilityTracker};

/// A mutation observed by consumers of [`SpotState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Bootstrapped { count: usize },
    Inserted(SpotId),
    Replaced(SpotId),
    Suppressed(SpotId),
    Revealed(SpotId),
}

/// Spot store plus its visibility overlay.
///
/// This is the single mutation point for spot state. Every operation returns
/// the changes it caused; callers recompute the published view with
/// [`SpotState::snapshot`] when the list is non-empty.
#[derive(Debug, Default, Clone)]
pub struct SpotState {
    store: SpotStore,
    visibility: VisibilityTracker,
}

impl SpotState {
    pub fn new(visibility: VisibilityTracker) -> Self {
        Self {
            store: SpotStore::new(),
            visibility,
        }
    }

    pub fn bootstrap(&mut self, records: Vec<SpotRecord>) -> Vec<Change> {
        self.store.bootstrap(records);
        self.visibility.on_bootstrap(self.store.records());
        vec![Change::Bootstrapped {
            count: self.store.len(),
        }]
    }

    pub fn apply_update(&mut self, record: SpotRecord, now: Instant) -> Vec<Change> {
        let mut changes = Vec::with_capacity(2);
        let effect = self.visibility.on_update(&record, now);
        let id = record.id.clone();
        match self.store.apply_update(record) {
            ApplyOutcome::Inserted => changes.push(Change::Inserted(id.clone())),
            ApplyOutcome::Replaced { .. } => changes.push(Change::Replaced(id.clone())),
        }
        if effect == VisibilityEffect::Revealed {
            changes.push(Change::Revealed(id));
        }
        changes
    }

    pub fn fire_due(&mut self, now: Instant) -> Vec<Change> {
        self.visibility
            .fire_due(now)
            .into_iter()
            .map(Change::Suppressed)
            .collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.visibility.next_deadline()
    }

    pub fn store(&self) -> &SpotStore {
        &self.store
    }

    pub fn visibility(&self) -> &VisibilityTracker {
        &self.visibility
    }

    /// Recompute the derived view from current state.
    pub fn snapshot(&self) -> SpotView {
        SpotView {
            spots: self.store.records().to_vec(),
            by_id: self.store.by_id(),
            suppressed: self.visibility.suppressed().clone(),
            revision: self.store.revision(),
        }
    }
}

/// Immutable view handed to the presentation layer.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SpotView {
    pub spots: Vec<SpotRecord>,
    pub by_id: HashMap<SpotId, SpotRecord>,
    pub suppressed: BTreeSet<SpotId>,
    /// Store revision this view was built from.
    pub revision: u64,
}

impl SpotView {
    pub fn get(&self, id: &str) -> Option<&SpotRecord> {
        self.by_id.get(id)
    }

    pub fn is_suppressed(&self, id: &str) -> bool {
        self.suppressed.contains(id)
    }

    /// Records to render, in sequence order.
    pub fn visible(&self) -> impl Iterator<Item = &SpotRecord> + '_ {
        self.spots
            .iter()
            .filter(move |r| !self.suppressed.contains(&r.id))
    }

    pub fn len(&self) -> usize {
        self.spots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spots.is_empty()
    }
}
