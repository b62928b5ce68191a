//! Random status walk standing in for a real detector.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use spots::{SpotRecord, UpdateEvent, encode_event};
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::board::SpotBoard;

pub const SIMULATED_CONFIDENCE: f64 = 0.9;

/// Advance one random spot along the status cycle and store it.
pub fn step(board: &SpotBoard, rng: &mut impl Rng) -> Option<SpotRecord> {
    let spots = board.list();
    if spots.is_empty() {
        return None;
    }
    let target = &spots[rng.gen_range(0..spots.len())];
    let mut updated = target.clone();
    updated.status = target.status.next_in_cycle();
    updated.updated_at = Utc::now();
    updated.confidence = SIMULATED_CONFIDENCE;
    board.upsert(updated.clone());
    Some(updated)
}

/// Step every `period` and broadcast each change, forever.
pub async fn run(board: Arc<SpotBoard>, hub: broadcast::Sender<String>, period: Duration) {
    let mut rng = StdRng::from_entropy();
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(spot) = step(&board, &mut rng) else {
            continue;
        };
        debug!("simulated {} -> {}", spot.id, spot.status);
        let frame = encode_event(&UpdateEvent::spot_update(spot));
        if hub.send(frame).is_err() {
            trace!("no listeners for simulated update");
        }
    }
}
