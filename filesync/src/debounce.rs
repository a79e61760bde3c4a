//! Per-path event debouncing.
//!
//! Editors and build steps emit bursts of filesystem events for one logical
//! change. Each path gets its own quiet-period timer: the first event arms
//! it, every further event rearms it, and only a full quiet period fires the
//! action. Nothing fires while events keep arriving.

use core::time::Duration;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

/// Action dispatched once a path settles.
pub type FireAction = Arc<dyn Fn(PathBuf) -> BoxFuture<'static, ()> + Send + Sync>;

/// Notification that a pending timer fired, keyed by its generation so the
/// registry only removes the entry the notification belongs to.
pub type FiredRx = mpsc::UnboundedReceiver<(PathBuf, u64)>;
type FiredTx = mpsc::UnboundedSender<(PathBuf, u64)>;

struct Pending {
    handle: JoinHandle<()>,
    generation: u64,
}

/// Owned registry of pending per-path timers.
///
/// Only the watch event loop touches it, so no locking is needed; the timers
/// themselves run as spawned tasks and report back through the fired channel.
pub struct Debouncer {
    delay: Duration,
    pending: HashMap<PathBuf, Pending>,
    on_fire: FireAction,
    fired_tx: FiredTx,
    next_generation: u64,
}

impl Debouncer {
    /// Create a debouncer together with the receiver for fired notifications.
    pub fn new(delay: Duration, on_fire: FireAction) -> (Self, FiredRx) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        (
            Self {
                delay,
                pending: HashMap::new(),
                on_fire,
                fired_tx,
                next_generation: 0,
            },
            fired_rx,
        )
    }

    /// Record one raw event for `path`, arming or rearming its timer.
    pub fn observe(&mut self, path: PathBuf) {
        self.next_generation += 1;
        let generation = self.next_generation;

        let on_fire = Arc::clone(&self.on_fire);
        let fired_tx = self.fired_tx.clone();
        let delay = self.delay;
        let fire_path = path.clone();
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            on_fire(fire_path.clone()).await;
            // Err means the registry is gone; the action already ran.
            drop(fired_tx.send((fire_path, generation)));
        });

        if let Some(previous) = self.pending.insert(path, Pending { handle, generation }) {
            previous.handle.abort();
        }
    }

    /// Remove a fired entry, unless a newer timer replaced it in the meantime.
    pub fn settle(&mut self, path: &Path, generation: u64) {
        if self
            .pending
            .get(path)
            .is_some_and(|p| p.generation == generation)
        {
            self.pending.remove(path);
            debug!(path = %path.display(), "Debounced change settled");
        }
    }

    /// Number of paths currently waiting out their quiet period.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
