use crate::store::SessionStore;
use log::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Runs `SessionStore::sweep_expired` every `every` until `shutdown` is cancelled.
pub fn spawn_sweeper(
    store: Arc<SessionStore>,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Session sweeper started (interval {}s)", every.as_secs());
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = store.sweep_expired();
                    if removed > 0 {
                        debug!("Swept {removed} expired session(s), {} remaining", store.len());
                    }
                }
            }
        }
        info!("Session sweeper stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use uuid::Uuid;

    #[tokio::test(start_paused = true)]
    async fn sweeper_removes_expired_sessions_until_cancelled() {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(SessionStore::with_clock(
            chrono::Duration::hours(2),
            clock.clone(),
        ));
        let shutdown = CancellationToken::new();
        let handle = spawn_sweeper(store.clone(), Duration::from_secs(10), shutdown.clone());

        store.create(Uuid::new_v4(), "dave");
        clock.advance(chrono::Duration::hours(3));
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert!(store.is_empty());

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_leaves_live_sessions_alone() {
        let store = Arc::new(SessionStore::with_clock(
            chrono::Duration::hours(2),
            Arc::new(ManualClock::default()),
        ));
        let shutdown = CancellationToken::new();
        let handle = spawn_sweeper(store.clone(), Duration::from_secs(10), shutdown.clone());

        let created = store.create(Uuid::new_v4(), "alice");
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(store.validate(&created.token));

        shutdown.cancel();
        handle.await.unwrap();
    }
}
