use super::*;
use chrono::{DateTime, Duration};
use uuid::Uuid;
use viva_protocols::task::RetryTaskPatch;
use viva_protocols::InterviewRepository;
use viva_store::MemoryRepository;

use crate::config::QueueConfig;

struct SucceedingHandler;

#[async_trait]
impl TaskHandler for SucceedingHandler {
    async fn handle(&self, _task: &RetryTask) -> Result<(), TaskError> {
        Ok(())
    }
}

struct RateLimitedHandler {
    resume_at: DateTime<Utc>,
}

#[async_trait]
impl TaskHandler for RateLimitedHandler {
    async fn handle(&self, _task: &RetryTask) -> Result<(), TaskError> {
        Err(TaskError::RateLimited {
            resume_at: self.resume_at,
        })
    }
}

struct FailingHandler;

#[async_trait]
impl TaskHandler for FailingHandler {
    async fn handle(&self, _task: &RetryTask) -> Result<(), TaskError> {
        Err(TaskError::Transient("upstream 503".to_string()))
    }
}

fn fixture(
    handler: Arc<dyn TaskHandler>,
) -> (Arc<MemoryRepository>, Arc<RetryQueue>, RetryRunner) {
    let repository = Arc::new(MemoryRepository::new());
    let queue = Arc::new(RetryQueue::new(repository.clone(), QueueConfig::default()));
    let runner = RetryRunner::new(queue.clone()).register(TaskType::AnswerScoring, handler);
    (repository, queue, runner)
}

async fn queue_due(queue: &RetryQueue, max_attempts: Option<u32>) -> Uuid {
    queue
        .queue_task(
            Uuid::new_v4(),
            TaskType::AnswerScoring,
            serde_json::json!({"sessionId": "s1"}),
            Utc::now() - Duration::seconds(1),
            max_attempts,
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_success_completes_task() {
    let (repository, queue, runner) = fixture(Arc::new(SucceedingHandler));
    let id = queue_due(&queue, None).await;

    let report = runner.run_once().await.unwrap();
    assert_eq!(report.fetched, 1);
    assert_eq!(report.completed, 1);

    let task = repository.get_retry_task(id).await.unwrap().unwrap();
    assert!(task.completed_at.is_some());
}

#[tokio::test]
async fn test_rate_limit_requeues_at_resume_time() {
    let resume_at = Utc::now() + Duration::minutes(10);
    let (repository, queue, runner) = fixture(Arc::new(RateLimitedHandler { resume_at }));
    let id = queue_due(&queue, None).await;

    let report = runner.run_once().await.unwrap();
    assert_eq!(report.retried, 1);

    let task = repository.get_retry_task(id).await.unwrap().unwrap();
    assert_eq!(task.scheduled_retry_time, resume_at);
    assert_eq!(task.attempt_count, 2);
    assert!(task.completed_at.is_none());
    assert!(task.failed_at.is_none());

    // Not due again until the resume time elapses
    let report = runner.run_once().await.unwrap();
    assert_eq!(report.fetched, 0);
}

#[tokio::test]
async fn test_rate_limited_then_due_after_resume_time() {
    let resume_at = Utc::now() + Duration::minutes(10);
    let (repository, queue, runner) = fixture(Arc::new(RateLimitedHandler { resume_at }));
    let id = queue_due(&queue, None).await;

    runner.run_once().await.unwrap();
    assert_eq!(runner.run_once().await.unwrap().fetched, 0);

    // Simulate the 10 minutes elapsing
    repository
        .update_retry_task(
            id,
            &RetryTaskPatch {
                scheduled_retry_time: Some(Utc::now() - Duration::seconds(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(runner.run_once().await.unwrap().fetched, 1);
}

#[tokio::test]
async fn test_transient_failure_backs_off() {
    let (repository, queue, runner) = fixture(Arc::new(FailingHandler));
    let id = queue_due(&queue, None).await;

    let report = runner.run_once().await.unwrap();
    assert_eq!(report.retried, 1);

    let task = repository.get_retry_task(id).await.unwrap().unwrap();
    assert_eq!(task.attempt_count, 2);
    assert_eq!(task.last_error.as_deref(), Some("Transient failure: upstream 503"));
    // First retry waits the base delay (300s), not the lease bump
    let delay = task.scheduled_retry_time - Utc::now();
    assert!(delay > Duration::seconds(290) && delay <= Duration::seconds(301));
}

#[tokio::test]
async fn test_exhausted_attempts_routed_to_fail() {
    let (repository, queue, runner) = fixture(Arc::new(FailingHandler));
    // attempt_count starts at 1 == max_attempts: the next failure must
    // be terminal, never another retry
    let id = queue_due(&queue, Some(1)).await;

    let report = runner.run_once().await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.retried, 0);

    let task = repository.get_retry_task(id).await.unwrap().unwrap();
    assert!(task.failed_at.is_some());
    assert!(task.completed_at.is_none());
    assert_eq!(task.attempt_count, 1);
}

#[tokio::test]
async fn test_one_failure_does_not_abort_batch() {
    let repository = Arc::new(MemoryRepository::new());
    let queue = Arc::new(RetryQueue::new(repository.clone(), QueueConfig::default()));
    let runner = RetryRunner::new(queue.clone())
        .register(TaskType::AnswerScoring, Arc::new(FailingHandler))
        .register(TaskType::SessionSummary, Arc::new(SucceedingHandler));

    queue_due(&queue, None).await;
    let ok_id = queue
        .queue_task(
            Uuid::new_v4(),
            TaskType::SessionSummary,
            serde_json::Value::Null,
            Utc::now() - Duration::seconds(1),
            None,
        )
        .await
        .unwrap();

    let report = runner.run_once().await.unwrap();
    assert_eq!(report.fetched, 2);
    assert_eq!(report.completed, 1);
    assert_eq!(report.retried, 1);

    let task = repository.get_retry_task(ok_id).await.unwrap().unwrap();
    assert!(task.completed_at.is_some());
}

#[tokio::test]
async fn test_missing_handler_is_terminal() {
    let repository = Arc::new(MemoryRepository::new());
    let queue = Arc::new(RetryQueue::new(repository.clone(), QueueConfig::default()));
    let runner = RetryRunner::new(queue.clone());

    let id = queue_due(&queue, None).await;

    let report = runner.run_once().await.unwrap();
    assert_eq!(report.failed, 1);

    let task = repository.get_retry_task(id).await.unwrap().unwrap();
    assert!(task.failed_at.is_some());
}

#[tokio::test]
async fn test_empty_queue_reports_nothing() {
    let (_, _, runner) = fixture(Arc::new(SucceedingHandler));
    let report = runner.run_once().await.unwrap();
    assert_eq!(report, RunReport::default());
}
