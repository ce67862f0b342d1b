use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};
use tokio::{sync::Mutex, task::JoinHandle, time::Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// What a periodic task wants to do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stop,
}

/// A periodic background task with an explicit cancellation handle.
pub struct ScheduledTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Spawns `tick` every `period`. The first tick fires one period after spawning.
    pub fn every<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = TickOutcome> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let child = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = interval.tick() => {
                        if child.is_cancelled() {
                            break;
                        }
                        if tick().await == TickOutcome::Stop {
                            break;
                        }
                    }
                }
            }
        });

        Self { cancel, handle }
    }

    /// Stops the task. Safe to call more than once.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Scheduled tasks keyed by the user whose session owns them.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<Mutex<HashMap<Uuid, ScheduledTask>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `task` for `user_id`, cancelling any task it replaces.
    ///
    /// Entries of tasks that have already stopped are dropped on the way.
    pub async fn replace(&self, user_id: Uuid, task: ScheduledTask) {
        let mut tasks = self.tasks.lock().await;
        tasks.retain(|_, existing| !existing.is_finished());
        if let Some(previous) = tasks.insert(user_id, task) {
            previous.cancel();
            tracing::debug!("🔁 Replaced scheduled task for user: {}", user_id);
        }
    }

    /// Cancels and forgets the task of `user_id`. Returns whether one existed.
    pub async fn cancel(&self, user_id: &Uuid) -> bool {
        match self.tasks.lock().await.remove(user_id) {
            Some(task) => {
                task.cancel();
                tracing::debug!("🛑 Cancelled scheduled task for user: {}", user_id);
                true
            }
            None => false,
        }
    }

    /// Number of registered tasks that are still running.
    pub async fn active_count(&self) -> usize {
        self.tasks
            .lock()
            .await
            .values()
            .filter(|task| !task.is_finished())
            .count()
    }
}
