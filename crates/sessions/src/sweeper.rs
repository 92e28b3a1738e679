use std::{sync::Arc, time::Duration};

use {chrono::Utc, tokio::task::JoinHandle, tracing::debug};

use crate::store::SessionStore;

/// Handle to the background sweep task. The task runs until `stop()` is
/// called (or the process exits); it does not coordinate with in-flight
/// requests — a request whose session is swept mid-flight will recreate it
/// empty on its next append.
pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Cancel the sweep task.
    pub fn stop(&self) {
        self.task.abort();
    }
}

/// Spawn the periodic sweep for `store`, checking every `interval`.
pub fn spawn_sweeper(store: &Arc<SessionStore>, interval: Duration) -> SweeperHandle {
    let store = Arc::clone(store);
    let task = tokio::spawn(async move {
        let mut tick = tokio::time::interval(interval);
        // The first tick completes immediately; consume it so the first
        // sweep happens one full interval after startup.
        tick.tick().await;
        loop {
            tick.tick().await;
            let removed = store.sweep(Utc::now()).await;
            if removed > 0 {
                let remaining = store.len().await;
                debug!(removed, remaining, "swept idle sessions");
            }
        }
    });
    SweeperHandle { task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Role, StoreLimits};

    #[tokio::test]
    async fn sweeper_removes_idle_sessions() {
        let store = Arc::new(SessionStore::new(StoreLimits {
            idle_expiry: chrono::Duration::zero(),
            ..StoreLimits::default()
        }));
        store.append_turn("s1", Role::User, "hi").await;

        let handle = spawn_sweeper(&store, Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(store.is_empty().await);
        handle.stop();
    }

    #[tokio::test]
    async fn stopped_sweeper_no_longer_sweeps() {
        let store = Arc::new(SessionStore::new(StoreLimits {
            idle_expiry: chrono::Duration::zero(),
            ..StoreLimits::default()
        }));
        let handle = spawn_sweeper(&store, Duration::from_millis(20));
        handle.stop();
        tokio::time::sleep(Duration::from_millis(60)).await;

        store.append_turn("s1", Role::User, "hi").await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(store.len().await, 1);
    }
}
