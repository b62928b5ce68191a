//! Grace-period suppression of freshly occupied spots.
//!
//! A spot that turns `occupied` stays on the map for a grace window before it
//! is suppressed, so rapid transitions do not flicker. A spot that turns
//! `available` or `soon` is revealed immediately.
//!
//! Time is injected: callers pass `now` into every operation and drive expiry
//! through [`VisibilityTracker::next_deadline`] and
//! [`VisibilityTracker::fire_due`]. Nothing here sleeps.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use crate::record::{SpotId, SpotRecord};

pub const DEFAULT_GRACE: Duration = Duration::from_millis(3000);

/// What happens to a pending suppression when the same spot updates again.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum StaleTimerPolicy {
    /// Timers are keyed by spot id; any newer update cancels the pending one.
    #[default]
    Cancel,
    /// Timers always fire, even if the spot has since become available.
    Legacy,
}

impl StaleTimerPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cancel" => Some(StaleTimerPolicy::Cancel),
            "legacy" => Some(StaleTimerPolicy::Legacy),
            _ => None,
        }
    }
}

/// Effect of one update on the suppressed set.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VisibilityEffect {
    /// Suppression scheduled at the given deadline.
    Scheduled(Instant),
    /// Spot was suppressed and is now shown again.
    Revealed,
    /// Nothing changed in the suppressed set.
    Unchanged,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct TimerKey {
    deadline: Instant,
    seq: u64,
}

#[derive(Debug, Clone)]
pub struct VisibilityTracker {
    grace: Duration,
    policy: StaleTimerPolicy,
    suppressed: BTreeSet<SpotId>,
    timers: BTreeMap<TimerKey, SpotId>,
    // Only maintained under `StaleTimerPolicy::Cancel`.
    by_spot: BTreeMap<SpotId, TimerKey>,
    next_seq: u64,
}

impl Default for VisibilityTracker {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE, StaleTimerPolicy::default())
    }
}

impl VisibilityTracker {
    pub fn new(grace: Duration, policy: StaleTimerPolicy) -> Self {
        Self {
            grace,
            policy,
            suppressed: BTreeSet::new(),
            timers: BTreeMap::new(),
            by_spot: BTreeMap::new(),
            next_seq: 0,
        }
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn policy(&self) -> StaleTimerPolicy {
        self.policy
    }

    /// Reset from a freshly fetched set: every occupied spot is suppressed
    /// right away, without a grace window.
    pub fn on_bootstrap<'a>(&mut self, records: impl IntoIterator<Item = &'a SpotRecord>) {
        self.timers.clear();
        self.by_spot.clear();
        self.suppressed = records
            .into_iter()
            .filter(|r| r.status.is_occupied())
            .map(|r| r.id.clone())
            .collect();
    }

    /// Under `Cancel`, an `available`/`soon` update drops the pending timer
    /// and a repeated `occupied` update keeps the first deadline.
    pub fn on_update(&mut self, record: &SpotRecord, now: Instant) -> VisibilityEffect {
        if record.status.is_occupied() {
            if let Some(key) = self.by_spot.get(&record.id) {
                return VisibilityEffect::Scheduled(key.deadline);
            }
            let deadline = now + self.grace;
            self.schedule(record.id.clone(), deadline);
            return VisibilityEffect::Scheduled(deadline);
        }

        self.cancel(&record.id);
        if self.suppressed.remove(&record.id) {
            VisibilityEffect::Revealed
        } else {
            VisibilityEffect::Unchanged
        }
    }

    fn schedule(&mut self, id: SpotId, deadline: Instant) {
        let key = TimerKey {
            deadline,
            seq: self.next_seq,
        };
        self.next_seq = self.next_seq.wrapping_add(1);
        if self.policy == StaleTimerPolicy::Cancel {
            self.by_spot.insert(id.clone(), key);
        }
        self.timers.insert(key, id);
    }

    /// Cancel the pending suppression for `id`, if any.
    ///
    /// Returns `true` if a timer was removed.
    pub fn cancel(&mut self, id: &str) -> bool {
        match self.by_spot.remove(id) {
            Some(key) => self.timers.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.keys().next().map(|k| k.deadline)
    }

    /// Apply every timer whose deadline is `<= now`, in deadline order.
    ///
    /// Returns ids that were not suppressed before and are now.
    pub fn fire_due(&mut self, now: Instant) -> Vec<SpotId> {
        let mut newly = Vec::new();
        while let Some((&key, _)) = self.timers.first_key_value() {
            if key.deadline > now {
                break;
            }
            let Some(id) = self.timers.remove(&key) else {
                break;
            };
            if self.by_spot.get(&id) == Some(&key) {
                self.by_spot.remove(&id);
            }
            if self.suppressed.insert(id.clone()) {
                newly.push(id);
            }
        }
        newly
    }

    pub fn is_suppressed(&self, id: &str) -> bool {
        self.suppressed.contains(id)
    }

    pub fn suppressed(&self) -> &BTreeSet<SpotId> {
        &self.suppressed
    }

    pub fn pending_count(&self) -> usize {
        self.timers.len()
    }
}
