use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable spot identifier as reported by the backend.
pub type SpotId = String;

/// Occupancy status of a parking spot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotStatus {
    Available,
    /// Potentially available shortly.
    Soon,
    Occupied,
}

impl SpotStatus {
    pub const ALL: [SpotStatus; 3] = [SpotStatus::Available, SpotStatus::Soon, SpotStatus::Occupied];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpotStatus::Available => "available",
            SpotStatus::Soon => "soon",
            SpotStatus::Occupied => "occupied",
        }
    }

    pub fn is_occupied(&self) -> bool {
        matches!(self, SpotStatus::Occupied)
    }

    /// Next status along `occupied -> soon -> available -> occupied`.
    pub fn next_in_cycle(&self) -> Self {
        match self {
            SpotStatus::Occupied => SpotStatus::Soon,
            SpotStatus::Soon => SpotStatus::Available,
            SpotStatus::Available => SpotStatus::Occupied,
        }
    }
}

impl std::fmt::Display for SpotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single parking spot as carried by the bulk fetch and the update channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotRecord {
    pub id: SpotId,
    pub lat: f64,
    pub lng: f64,
    pub status: SpotStatus,
    /// Informational score, only displayed.
    pub confidence: f64,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub camera_id: Option<String>,
}

impl SpotRecord {
    pub fn new(id: impl Into<SpotId>, lat: f64, lng: f64, status: SpotStatus) -> Self {
        Self {
            id: id.into(),
            lat,
            lng,
            status,
            confidence: 1.0,
            updated_at: Utc::now(),
            camera_id: None,
        }
    }

    pub fn with_status(mut self, status: SpotStatus) -> Self {
        self.status = status;
        self
    }
}
