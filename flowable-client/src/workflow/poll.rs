//! Task polling and handler dispatch.

use crate::error::{ClientError, Result};
use crate::resources::{TaskQuery, Tasks};
use crate::workflow::task::Task;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, instrument, trace};

/// Shortest pause between polls, applied when the caller passes a smaller
/// interval.
pub(crate) const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Boxed async result of a task handler.
type HandlerFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

type Handler = Box<dyn Fn(Task) -> HandlerFuture + Send + Sync>;

/// Poll `query` until it returns a task or `timeout` elapses.
///
/// Sleeps `interval` (at least [`MIN_POLL_INTERVAL`]) between polls but never
/// past the deadline, so the last poll happens at the deadline at the latest.
#[instrument(
    skip(tasks, query, timeout, interval),
    fields(family = ?tasks.family(), timeout_ms = timeout.as_millis() as u64)
)]
pub(crate) async fn wait_for_task(
    tasks: &Tasks<'_>,
    query: &TaskQuery,
    name: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<Value> {
    let deadline = Instant::now() + timeout;
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        if let Some(task) = tasks.list(query).await?.into_first() {
            debug!(attempts, "task appeared");
            return Ok(task);
        }

        let now = Instant::now();
        if now >= deadline {
            debug!(attempts, "gave up waiting for task");
            return Err(ClientError::TaskTimeout {
                name: name.to_string(),
                timeout,
            });
        }

        let pause = interval.max(MIN_POLL_INTERVAL).min(deadline - now);
        trace!(attempts, pause_ms = pause.as_millis() as u64, "task not there yet");
        sleep(pause).await;
    }
}

/// Handlers registered per task name.
#[derive(Default)]
pub(crate) struct TaskHandlers {
    handlers: HashMap<String, Handler>,
}

impl TaskHandlers {
    pub(crate) fn register<F, Fut>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(Task) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.handlers
            .insert(name.into(), Box::new(move |task| Box::pin(handler(task))));
    }

    /// Run the handler registered under the task's exact name.
    ///
    /// Completed tasks and tasks without a handler are skipped. Returns
    /// whether a handler ran.
    pub(crate) async fn dispatch(&self, task: Task) -> Result<bool> {
        if task.is_completed() {
            return Ok(false);
        }
        let Some(handler) = task.name().and_then(|name| self.handlers.get(name)) else {
            trace!(task = ?task.name(), "no handler registered");
            return Ok(false);
        };
        debug!(task = ?task.name(), id = ?task.id(), "dispatching task");
        handler(task).await?;
        Ok(true)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for TaskHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("TaskHandlers")
            .field("names", &names)
            .finish()
    }
}
