//! Periodic retry runner.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::{debug, error, warn};

use viva_protocols::task::{RetryTask, TaskType};
use viva_protocols::{StoreError, TaskError};

use crate::backoff::next_retry_time;
use crate::queue::RetryQueue;

/// Handler for one task type.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Execute the deferred call the task represents.
    async fn handle(&self, task: &RetryTask) -> Result<(), TaskError>;
}

/// Outcome counts for one runner cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub fetched: usize,
    pub completed: usize,
    pub retried: usize,
    pub failed: usize,
}

/// Drains due tasks and routes each to complete, retry, or terminal
/// failure.
///
/// Invoked periodically by the application. Each task is processed in
/// its own error scope so one failure cannot abort the batch; each is
/// claimed first by bumping its scheduled time a lease ahead, so an
/// overlapping runner pass does not pick it up again.
pub struct RetryRunner {
    queue: Arc<RetryQueue>,
    handlers: HashMap<TaskType, Arc<dyn TaskHandler>>,
}

impl RetryRunner {
    /// Create a runner with no handlers registered.
    pub fn new(queue: Arc<RetryQueue>) -> Self {
        Self {
            queue,
            handlers: HashMap::new(),
        }
    }

    /// Register the handler for a task type.
    pub fn register(mut self, task_type: TaskType, handler: Arc<dyn TaskHandler>) -> Self {
        self.handlers.insert(task_type, handler);
        self
    }

    /// Process one batch of due tasks.
    pub async fn run_once(&self) -> Result<RunReport, StoreError> {
        let config = self.queue.config().clone();
        let due = self.queue.pending_tasks(config.batch_limit).await?;

        let mut report = RunReport {
            fetched: due.len(),
            ..Default::default()
        };
        if due.is_empty() {
            return Ok(report);
        }
        debug!("Runner picked up {} due task(s)", due.len());

        for task in due {
            let lease_until = Utc::now() + Duration::seconds(config.lease_secs as i64);
            if let Err(e) = self.queue.claim_task(task.id, lease_until).await {
                warn!("Could not claim task {}: {}; skipping", task.id, e);
                continue;
            }

            self.process(&task, &mut report).await;
        }

        Ok(report)
    }

    /// Dispatch one task and record the outcome. Bookkeeping failures
    /// are logged, never propagated - the next cycle sees the task
    /// again once its lease lapses.
    async fn process(&self, task: &RetryTask, report: &mut RunReport) {
        let handler = match self.handlers.get(&task.task_type) {
            Some(handler) => handler,
            None => {
                error!("No handler registered for {:?}", task.task_type);
                self.finish_failed(task, "no handler registered", report).await;
                return;
            }
        };

        match handler.handle(task).await {
            Ok(()) => {
                if let Err(e) = self.queue.complete_task(task.id).await {
                    warn!("Could not mark task {} complete: {}", task.id, e);
                }
                report.completed += 1;
            }
            Err(error) => self.route_failure(task, &error, report).await,
        }
    }

    /// A rate limit always requeues at the provider's resume time; any
    /// other failure retries with backoff until the attempt budget is
    /// spent.
    async fn route_failure(&self, task: &RetryTask, error: &TaskError, report: &mut RunReport) {
        let rate_limited = matches!(error, TaskError::RateLimited { .. });

        if !rate_limited && task.attempts_exhausted() {
            self.finish_failed(task, &error.to_string(), report).await;
            return;
        }

        let next = next_retry_time(self.queue.config(), task.attempt_count, error, Utc::now());
        warn!(
            "Task {} attempt {} failed ({}); retrying at {}",
            task.id, task.attempt_count, error, next
        );
        if let Err(e) = self.queue.retry_task(task.id, next, &error.to_string()).await {
            warn!("Could not reschedule task {}: {}", task.id, e);
        }
        report.retried += 1;
    }

    async fn finish_failed(&self, task: &RetryTask, error: &str, report: &mut RunReport) {
        error!(
            "Task {} exhausted after {} attempt(s): {}",
            task.id, task.attempt_count, error
        );
        if let Err(e) = self.queue.fail_task(task.id, error).await {
            warn!("Could not mark task {} failed: {}", task.id, e);
        }
        report.failed += 1;
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
