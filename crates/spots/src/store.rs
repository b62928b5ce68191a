use std::collections::HashMap;

use crate::record::{SpotId, SpotRecord};

/// Result of merging one record into the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Unseen id, prepended to the front of the sequence.
    Inserted,
    /// Known id, replaced at its existing position.
    Replaced { position: usize },
}

/// Canonical, de-duplicated spot state.
///
/// Ordering contract:
/// - `bootstrap` keeps the order of the fetched sequence.
/// - `apply_update` replaces known ids in place and prepends unseen ones, so
///   the newest unseen spot is always first.
///
/// Records are never removed for the lifetime of the store.
#[derive(Debug, Default, Clone)]
pub struct SpotStore {
    records: Vec<SpotRecord>,
    index: HashMap<SpotId, usize>,
    revision: u64,
}

impl SpotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole known set.
    ///
    /// Duplicate ids collapse into one record: the data of the last
    /// occurrence at the position of the first.
    pub fn bootstrap(&mut self, records: impl IntoIterator<Item = SpotRecord>) {
        self.records.clear();
        self.index.clear();
        for record in records {
            match self.index.get(&record.id) {
                Some(&pos) => self.records[pos] = record,
                None => {
                    self.index.insert(record.id.clone(), self.records.len());
                    self.records.push(record);
                }
            }
        }
        self.revision += 1;
    }

    /// Merge one record, last write wins by arrival order.
    pub fn apply_update(&mut self, record: SpotRecord) -> ApplyOutcome {
        self.revision += 1;
        if let Some(&position) = self.index.get(&record.id) {
            self.records[position] = record;
            return ApplyOutcome::Replaced { position };
        }

        self.records.insert(0, record);
        self.reindex();
        ApplyOutcome::Inserted
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (pos, record) in self.records.iter().enumerate() {
            self.index.insert(record.id.clone(), pos);
        }
    }

    pub fn records(&self) -> &[SpotRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&SpotRecord> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Id-keyed lookup view over the current sequence.
    pub fn by_id(&self) -> HashMap<SpotId, SpotRecord> {
        self.records
            .iter()
            .map(|r| (r.id.clone(), r.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Bumped on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::{ApplyOutcome, SpotStore};
    use crate::record::{SpotRecord, SpotStatus};
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn spot(id: &str, status: SpotStatus) -> SpotRecord {
        SpotRecord::new(id, 47.62, -122.35, status)
    }

    fn ids(store: &SpotStore) -> Vec<&str> {
        store.records().iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn bootstrap_keeps_fetch_order() {
        let mut store = SpotStore::new();
        store.bootstrap(vec![
            spot("A1", SpotStatus::Available),
            spot("B1", SpotStatus::Occupied),
            spot("C1", SpotStatus::Soon),
        ]);
        assert_eq!(ids(&store), vec!["A1", "B1", "C1"]);
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn bootstrap_replaces_previous_state() {
        let mut store = SpotStore::new();
        store.bootstrap(vec![spot("A1", SpotStatus::Available)]);
        store.bootstrap(vec![spot("Z9", SpotStatus::Soon)]);
        assert_eq!(ids(&store), vec!["Z9"]);
        assert!(store.get("A1").is_none());
    }

    #[test]
    fn bootstrap_collapses_duplicates_at_first_position() {
        let mut store = SpotStore::new();
        store.bootstrap(vec![
            spot("A1", SpotStatus::Available),
            spot("B1", SpotStatus::Available),
            spot("A1", SpotStatus::Occupied),
        ]);
        assert_eq!(ids(&store), vec!["A1", "B1"]);
        assert_eq!(store.get("A1").unwrap().status, SpotStatus::Occupied);
    }

    #[test]
    fn unseen_id_is_prepended() {
        let mut store = SpotStore::new();
        store.bootstrap(vec![spot("A1", SpotStatus::Available)]);
        let outcome = store.apply_update(spot("N1", SpotStatus::Soon));
        assert_eq!(outcome, ApplyOutcome::Inserted);
        assert_eq!(ids(&store), vec!["N1", "A1"]);
        assert_eq!(store.get("A1").unwrap().id, "A1");
    }

    #[test]
    fn known_id_is_replaced_in_place() {
        let mut store = SpotStore::new();
        store.bootstrap(vec![
            spot("A1", SpotStatus::Available),
            spot("B1", SpotStatus::Available),
            spot("C1", SpotStatus::Available),
        ]);
        let outcome = store.apply_update(spot("B1", SpotStatus::Occupied));
        assert_eq!(outcome, ApplyOutcome::Replaced { position: 1 });
        assert_eq!(ids(&store), vec!["A1", "B1", "C1"]);
        assert_eq!(store.get("B1").unwrap().status, SpotStatus::Occupied);
    }

    #[test]
    fn update_before_bootstrap_works_on_empty_store() {
        let mut store = SpotStore::new();
        store.apply_update(spot("A1", SpotStatus::Soon));
        assert_eq!(store.len(), 1);
        assert!(store.contains("A1"));
    }

    #[test]
    fn ids_stay_unique_over_many_updates() {
        let mut store = SpotStore::new();
        store.bootstrap(vec![spot("A1", SpotStatus::Available)]);
        let pool = ["A1", "B1", "C1", "D1", "E1"];
        let mut status = SpotStatus::Occupied;
        for step in 0..200usize {
            // Deterministic but irregular id sequence.
            let id = pool[(step * 7 + step / 3) % pool.len()];
            status = status.next_in_cycle();
            store.apply_update(spot(id, status));

            let unique: HashSet<&str> = store.records().iter().map(|r| r.id.as_str()).collect();
            assert_eq!(unique.len(), store.len());
        }
        assert_eq!(store.len(), pool.len());
        assert_eq!(store.by_id().len(), pool.len());
    }

    #[test]
    fn lookup_follows_positions_after_prepend() {
        let mut store = SpotStore::new();
        store.bootstrap(vec![spot("A1", SpotStatus::Available)]);
        store.apply_update(spot("B1", SpotStatus::Available));
        store.apply_update(spot("C1", SpotStatus::Available));
        let outcome = store.apply_update(spot("A1", SpotStatus::Soon));
        assert_eq!(outcome, ApplyOutcome::Replaced { position: 2 });
        assert_eq!(ids(&store), vec!["C1", "B1", "A1"]);
    }
}
