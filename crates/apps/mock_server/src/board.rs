use parking_lot::RwLock;
use spots::{SpotRecord, SpotStatus};

/// Demo spots around Seattle Center.
pub fn seed_spots() -> Vec<SpotRecord> {
    vec![
        SpotRecord::new("A1", 47.62319, -122.3546, SpotStatus::Available),
        SpotRecord::new("A2", 47.62270, -122.3539, SpotStatus::Soon),
        SpotRecord::new("B1", 47.62190, -122.3527, SpotStatus::Occupied),
        SpotRecord::new("B2", 47.62230, -122.3506, SpotStatus::Available),
        SpotRecord::new("C1", 47.62160, -122.3515, SpotStatus::Occupied),
    ]
}

/// Backend-side spot table. Keeps first-insertion order; an upsert of a
/// known id replaces it where it is.
#[derive(Default)]
pub struct SpotBoard {
    spots: RwLock<Vec<SpotRecord>>,
}

impl SpotBoard {
    pub fn new(seed: Vec<SpotRecord>) -> Self {
        let board = Self::default();
        for spot in seed {
            board.upsert(spot);
        }
        board
    }

    pub fn upsert(&self, spot: SpotRecord) {
        let mut spots = self.spots.write();
        match spots.iter_mut().find(|s| s.id == spot.id) {
            Some(slot) => *slot = spot,
            None => spots.push(spot),
        }
    }

    pub fn list(&self) -> Vec<SpotRecord> {
        self.spots.read().clone()
    }

    pub fn len(&self) -> usize {
        self.spots.read().len()
    }
}
