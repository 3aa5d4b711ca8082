//! Translates raw filesystem events into `WorkerOp`s: `ADDED`/`REMOVED`
//! dispatch immediately, `MODIFIED` goes through the debouncer first.

use crate::debounce::Debouncer;
use crate::worker::{WorkerOp, WorkerPool};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};

/// Starts watching `root` recursively. The returned watcher must be kept
/// alive for as long as events should be delivered; dropping it stops the
/// watch.
pub fn start_watcher(
    root: PathBuf,
    pool: WorkerPool,
    debouncer: Debouncer,
) -> notify::Result<RecommendedWatcher> {
    let watch_root = root.clone();
    let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
        let event = match result {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = %err, "filesystem watch error");
                return;
            }
        };
        handle_event(&watch_root, &pool, &debouncer, event);
    })?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    Ok(watcher)
}

fn handle_event(root: &Path, pool: &WorkerPool, debouncer: &Debouncer, event: Event) {
    for path in &event.paths {
        let Some(relative) = relative_slash_path(path, root) else {
            continue;
        };

        match event.kind {
            EventKind::Create(_) => pool.dispatch(WorkerOp::Added(relative)),
            EventKind::Remove(_) => pool.dispatch(WorkerOp::Removed(relative)),
            EventKind::Modify(_) => {
                let pool = pool.clone();
                debouncer.notify_modified(relative, move |path| {
                    pool.dispatch(WorkerOp::Modified(path));
                });
            }
            EventKind::Any | EventKind::Access(_) | EventKind::Other => {}
        }
    }
}

fn relative_slash_path(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    if relative.as_os_str().is_empty() {
        return None;
    }
    Some(
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"),
    )
}
