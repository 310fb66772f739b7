//! File watching
//!
//! Turns filesystem events under a directory into wake-ups on a
//! `Notify`. [`debounced`] restarts its timer on every wake-up and only
//! reloads once `DEBOUNCE` has passed without one.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::Notify;

use crate::error::Result;

/// Quiet period after the last event before a reload runs
pub const DEBOUNCE: Duration = Duration::from_millis(200);

/// Whether an event changes content worth reloading
fn is_relevant(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(modify) => !matches!(modify, ModifyKind::Metadata(_)),
        _ => false,
    }
}

/// Watch `dir` recursively, waking `trigger` on every relevant change
///
/// The watcher stops when the returned handle is dropped.
pub fn watch_dir(dir: &Path, trigger: Arc<Notify>) -> Result<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) if is_relevant(&event.kind) => {
                tracing::trace!(paths = ?event.paths, "Change detected");
                trigger.notify_one();
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Watch error: {e}"),
        }
    })?;
    watcher.watch(dir, RecursiveMode::Recursive)?;
    tracing::debug!(dir = %dir.display(), "Watching for changes");
    Ok(watcher)
}

/// Run `reload` once `trigger` has been quiet for `DEBOUNCE`, forever
pub async fn debounced<F, Fut>(trigger: Arc<Notify>, mut reload: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        trigger.notified().await;
        while tokio::time::timeout(DEBOUNCE, trigger.notified()).await.is_ok() {}
        reload().await;
    }
}
