//! Live spot session: fetch, then subscribe, then merge.
//!
//! One task owns the [`SpotState`] and reacts to three event sources, one at
//! a time: completion of the initial fetch, inbound channel updates and
//! expiring visibility timers. Consumers never touch the state; they read
//! snapshots from a watch channel.
//!
//! Ordering contract:
//! - The update channel is opened only after the initial fetch settled, so a
//!   bootstrap always precedes (or is absent before) every update.
//! - A failed fetch or channel is reported through [`FeedHealth`] and is not
//!   retried.
//! - Shutdown closes the channel and drops pending timers with the task.

use std::sync::Arc;
use std::time::Duration;

use spots::{Change, SpotRecord, SpotState, SpotView, StaleTimerPolicy, VisibilityTracker};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::transport::{SpotTransport, UpdateChannel};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BootstrapState {
    #[default]
    Pending,
    Loaded {
        count: usize,
    },
    /// The store starts empty; updates still apply.
    Failed {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    NotStarted,
    Connecting,
    Open,
    /// Closed by the server, the network or a shutdown. Not reopened.
    Closed,
    Failed {
        reason: String,
    },
}

/// Observable feed health.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedHealth {
    pub bootstrap: BootstrapState,
    pub channel: ChannelState,
}

impl FeedHealth {
    /// True while updates can still arrive.
    pub fn is_live(&self) -> bool {
        matches!(
            self.channel,
            ChannelState::Connecting | ChannelState::Open | ChannelState::NotStarted
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub grace: Duration,
    pub stale_timers: StaleTimerPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            grace: spots::DEFAULT_GRACE,
            stale_timers: StaleTimerPolicy::default(),
        }
    }
}

impl From<&FeedConfig> for SessionOptions {
    fn from(cfg: &FeedConfig) -> Self {
        Self {
            grace: cfg.grace,
            stale_timers: cfg.stale_timers,
        }
    }
}

/// Owner side of a running session.
///
/// Dropping the handle also ends the session.
pub struct SessionHandle {
    view: watch::Receiver<Arc<SpotView>>,
    health: watch::Receiver<FeedHealth>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn view(&self) -> watch::Receiver<Arc<SpotView>> {
        self.view.clone()
    }

    pub fn health(&self) -> watch::Receiver<FeedHealth> {
        self.health.clone()
    }

    /// Latest published snapshot.
    pub fn current(&self) -> Arc<SpotView> {
        self.view.borrow().clone()
    }

    /// Close the update channel and wait for the session task to end.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("spot session task failed: {e}");
            }
        }
    }
}

/// Start a session on the current tokio runtime.
pub fn spawn_session(transport: Arc<dyn SpotTransport>, options: SessionOptions) -> SessionHandle {
    let state = SpotState::new(VisibilityTracker::new(options.grace, options.stale_timers));
    let (view_tx, view_rx) = watch::channel(Arc::new(state.snapshot()));
    let (health_tx, health_rx) = watch::channel(FeedHealth::default());
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let session = Session {
        transport,
        state,
        view_tx,
        health_tx,
    };
    let task = tokio::spawn(session.run(shutdown_rx));

    SessionHandle {
        view: view_rx,
        health: health_rx,
        shutdown: Some(shutdown_tx),
        task: Some(task),
    }
}

struct Session {
    transport: Arc<dyn SpotTransport>,
    state: SpotState,
    view_tx: watch::Sender<Arc<SpotView>>,
    health_tx: watch::Sender<FeedHealth>,
}

impl Session {
    async fn run(mut self, mut shutdown_rx: oneshot::Receiver<()>) {
        let fetched = tokio::select! {
            _ = &mut shutdown_rx => return self.stopped_early(),
            r = self.transport.load_initial_state() => r,
        };
        match fetched {
            Ok(records) => {
                let changes = self.state.bootstrap(records);
                let count = self.state.store().len();
                info!("bootstrapped {count} spots");
                self.health_tx
                    .send_modify(|h| h.bootstrap = BootstrapState::Loaded { count });
                self.publish(&changes);
            }
            Err(e) => {
                warn!("initial spot fetch failed, starting empty: {e}");
                self.health_tx.send_modify(|h| {
                    h.bootstrap = BootstrapState::Failed {
                        reason: e.to_string(),
                    }
                });
            }
        }

        self.health_tx
            .send_modify(|h| h.channel = ChannelState::Connecting);
        let opened = tokio::select! {
            _ = &mut shutdown_rx => return self.stopped_early(),
            r = self.transport.open_update_channel() => r,
        };
        let mut channel = match opened {
            Ok(channel) => {
                self.health_tx.send_modify(|h| h.channel = ChannelState::Open);
                Some(channel)
            }
            Err(e) => {
                warn!("update channel unavailable, feed will not update: {e}");
                self.health_tx.send_modify(|h| {
                    h.channel = ChannelState::Failed {
                        reason: e.to_string(),
                    }
                });
                None
            }
        };

        loop {
            let deadline = self.state.next_deadline();
            tokio::select! {
                _ = &mut shutdown_rx => break,
                update = next_update(&mut channel) => match update {
                    Some(record) => self.on_update(record),
                    None => {
                        info!("update channel closed, feed is now stale");
                        channel = None;
                        self.health_tx.send_modify(|h| h.channel = ChannelState::Closed);
                    }
                },
                _ = sleep_until(deadline) => {
                    let changes = self.state.fire_due(Instant::now().into_std());
                    self.publish(&changes);
                }
            }
        }

        if let Some(channel) = channel.take() {
            channel.close().await;
            self.health_tx.send_modify(|h| h.channel = ChannelState::Closed);
        }
        debug!("spot session stopped");
    }

    /// Shutdown before the channel opened: no updates will ever arrive.
    fn stopped_early(&self) {
        self.health_tx.send_modify(|h| h.channel = ChannelState::Closed);
        debug!("spot session stopped before the update channel opened");
    }

    fn on_update(&mut self, record: SpotRecord) {
        let changes = self
            .state
            .apply_update(record, Instant::now().into_std());
        self.publish(&changes);
    }

    fn publish(&self, changes: &[Change]) {
        if changes.is_empty() {
            return;
        }
        for change in changes {
            debug!(?change, "spot state changed");
        }
        self.view_tx.send_replace(Arc::new(self.state.snapshot()));
    }
}

async fn next_update(channel: &mut Option<UpdateChannel>) -> Option<SpotRecord> {
    match channel {
        Some(channel) => channel.next_update().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
