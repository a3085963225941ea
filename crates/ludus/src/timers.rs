//! Delayed one-shot tasks keyed by match.
//!
//! Bot assignment and bot completion are armed as cancellable timers.
//! Cancelling a missing timer is a no-op, and a fired timer removes its
//! own registration.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use colosseum_common::MatchId;
use tokio::task::JoinHandle;

/// What a pending timer will do when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Attach a bot to a waiting matchmaking slot
    BotAssign,
    /// Mark the bot slot completed
    BotComplete,
}

/// Registry of pending one-shot timers
#[derive(Clone, Default)]
pub struct TimerRegistry {
    tasks: Arc<Mutex<HashMap<(MatchId, TimerKind), JoinHandle<()>>>>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot timer. An existing timer under the same key is
    /// cancelled first.
    pub fn schedule<F>(&self, match_id: MatchId, kind: TimerKind, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let tasks = Arc::clone(&self.tasks);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
            if let Ok(mut tasks) = tasks.lock() {
                tasks.remove(&(match_id, kind));
            }
        });

        let mut tasks = match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = tasks.insert((match_id, kind), handle) {
            tracing::debug!(match_id = %match_id, ?kind, "Replacing pending timer");
            previous.abort();
        }
    }

    /// Cancel a pending timer; missing or already-fired keys are no-ops
    pub fn cancel(&self, match_id: MatchId, kind: TimerKind) {
        let mut tasks = match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = tasks.remove(&(match_id, kind)) {
            handle.abort();
        }
    }

    /// Number of timers still pending
    pub fn pending(&self) -> usize {
        self.tasks.lock().map(|t| t.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_timer_fires_once_and_unregisters() {
        let registry = TimerRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&fired);
        let id = Uuid::new_v4();

        registry.schedule(id, TimerKind::BotAssign, Duration::from_millis(10), async move {
            count.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(registry.pending(), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(registry.pending(), 0);
    }

    #[tokio::test]
    async fn test_cancel_prevents_firing() {
        let registry = TimerRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&fired);
        let id = Uuid::new_v4();

        registry.schedule(id, TimerKind::BotComplete, Duration::from_millis(30), async move {
            count.fetch_add(1, Ordering::SeqCst);
        });
        registry.cancel(id, TimerKind::BotComplete);
        assert_eq!(registry.pending(), 0);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_missing_is_noop() {
        let registry = TimerRegistry::new();
        registry.cancel(Uuid::new_v4(), TimerKind::BotAssign);
    }
}
