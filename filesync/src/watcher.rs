//! Filesystem watching and the watch event loop.
//!
//! Raw notify events are bridged into the async world through an unbounded
//! channel, filtered against the exclusion globs, and fed to the debouncer.
//! The loop owns the debouncer; fired notifications come back in on a second
//! channel so settled entries can be cleaned up.

use core::time::Duration;
use std::path::PathBuf;

use eyre::WrapErr as _;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use tokio::sync::mpsc::unbounded_channel;
use tracing::{error, info, warn};

use crate::debounce::{Debouncer, FireAction};
use crate::ignore::IgnoreRules;

fn is_relevant(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Watch all `paths` recursively and drive the debounce loop until the event
/// source closes.
///
/// Paths that cannot be watched are logged and skipped so one bad entry does
/// not take down the others.
///
/// # Errors
///
/// Returns an error if the watcher backend cannot be created.
pub async fn run_watch_loop(
    paths: Vec<PathBuf>,
    rules: IgnoreRules,
    delay: Duration,
    on_fire: FireAction,
) -> eyre::Result<()> {
    let (raw_tx, mut raw_rx) = unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res| {
            if let Ok(event) = res
                && raw_tx.send(event).is_err()
            {
                error!("Failed to forward filesystem event to watch loop");
            }
        },
        notify::Config::default(),
    )
    .wrap_err("Failed to create file watcher")?;

    for path in &paths {
        match watcher.watch(path, RecursiveMode::Recursive) {
            Ok(()) => info!(path = %path.display(), "Watching"),
            Err(e) => warn!(path = %path.display(), error = %e, "Cannot watch path, skipping"),
        }
    }

    let (mut debouncer, mut fired_rx) = Debouncer::new(delay, on_fire);

    loop {
        tokio::select! {
            event = raw_rx.recv() => {
                let Some(event) = event else { break };
                if !is_relevant(&event.kind) {
                    continue;
                }
                for path in event.paths {
                    if rules.is_ignored(&path) {
                        continue;
                    }
                    debouncer.observe(path);
                }
            }
            fired = fired_rx.recv() => {
                let Some((path, generation)) = fired else { break };
                debouncer.settle(&path, generation);
            }
        }
    }

    Ok(())
}
