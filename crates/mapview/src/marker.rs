use serde::Serialize;
use spots::{SpotRecord, SpotStatus, SpotView};

/// Fill color for a status dot.
pub fn status_color(status: SpotStatus) -> &'static str {
    match status {
        SpotStatus::Available => "#22c55e",
        SpotStatus::Soon => "#f59e0b",
        SpotStatus::Occupied => "#ef4444",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub label: &'static str,
    pub color: &'static str,
}

pub const LEGEND: [LegendEntry; 3] = [
    LegendEntry {
        label: "Available",
        color: "#22c55e",
    },
    LegendEntry {
        label: "Soon",
        color: "#f59e0b",
    },
    LegendEntry {
        label: "Occupied",
        color: "#ef4444",
    },
];

/// A status dot anchored at a spot's coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub status: SpotStatus,
    pub color: &'static str,
    /// Hover text, `Spot {id}: {status}`.
    pub title: String,
}

impl Marker {
    pub fn for_spot(spot: &SpotRecord) -> Self {
        Self {
            id: spot.id.clone(),
            lat: spot.lat,
            lng: spot.lng,
            status: spot.status,
            color: status_color(spot.status),
            title: format!("Spot {}: {}", spot.id, spot.status),
        }
    }
}

/// Markers for every spot that is not suppressed, in store order.
pub fn markers_for(view: &SpotView) -> Vec<Marker> {
    view.visible().map(Marker::for_spot).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use spots::SpotState;
    use std::time::Instant;

    #[test]
    fn legend_matches_marker_colors() {
        for (entry, status) in LEGEND.iter().zip(SpotStatus::ALL) {
            assert_eq!(entry.color, status_color(status));
        }
    }

    #[test]
    fn title_names_spot_and_status() {
        let spot = SpotRecord::new("B2", 47.6223, -122.3506, SpotStatus::Soon);
        let marker = Marker::for_spot(&spot);
        assert_eq!(marker.title, "Spot B2: soon");
        assert_eq!(marker.color, "#f59e0b");
    }

    #[test]
    fn suppressed_spots_have_no_marker() {
        let mut state = SpotState::default();
        state.bootstrap(vec![
            SpotRecord::new("A1", 47.62319, -122.3546, SpotStatus::Available),
            SpotRecord::new("B1", 47.62190, -122.3527, SpotStatus::Occupied),
        ]);
        // Occupied but still inside its grace window: shown in red.
        state.apply_update(
            SpotRecord::new("C1", 47.62160, -122.3515, SpotStatus::Occupied),
            Instant::now(),
        );

        let markers = markers_for(&state.snapshot());
        let shown: Vec<(&str, &str)> = markers
            .iter()
            .map(|m| (m.id.as_str(), m.color))
            .collect();
        assert_eq!(shown, vec![("C1", "#ef4444"), ("A1", "#22c55e")]);
    }
}
