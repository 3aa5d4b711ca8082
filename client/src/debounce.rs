//! Modification debouncer: coalesces a flurry of `MODIFIED` events
//! for the same path into a single delta-sync dispatch, 2 seconds after the
//! last event.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

const DEBOUNCE_WINDOW: Duration = Duration::from_secs(2);

#[derive(Clone, Default)]
pub struct Debouncer {
    timers: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
}

impl Debouncer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the timer for `path`. A reset aborts any timer already running
    /// for that path, so a burst of edits produces exactly one fire — never
    /// one per edit.
    pub fn notify_modified(&self, path: String, on_fire: impl FnOnce(String) + Send + 'static) {
        let mut timers = self.timers.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = timers.remove(&path) {
            previous.abort();
        }

        let timers_handle = self.timers.clone();
        let path_for_task = path.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(DEBOUNCE_WINDOW).await;
            timers_handle
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .remove(&path_for_task);
            on_fire(path_for_task);
        });
        timers.insert(path, handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn resetting_the_timer_fires_only_once() {
        let debouncer = Debouncer::new();
        let fires = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let fires = fires.clone();
            debouncer.notify_modified("a.txt".to_string(), move |_| {
                fires.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        tokio::time::sleep(DEBOUNCE_WINDOW + Duration::from_millis(200)).await;
        assert_eq!(fires.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_paths_fire_independently() {
        let debouncer = Debouncer::new();
        let fired = Arc::new(Mutex::new(Vec::new()));

        for path in ["a.txt", "b.txt"] {
            let fired = fired.clone();
            debouncer.notify_modified(path.to_string(), move |p| {
                fired.lock().unwrap_or_else(|e| e.into_inner()).push(p);
            });
        }

        tokio::time::sleep(DEBOUNCE_WINDOW + Duration::from_millis(200)).await;
        let mut result = fired.lock().unwrap_or_else(|e| e.into_inner()).clone();
        result.sort();
        assert_eq!(result, vec!["a.txt".to_string(), "b.txt".to_string()]);
    }
}
