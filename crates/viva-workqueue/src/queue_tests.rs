use super::*;
use chrono::Duration;
use viva_store::MemoryRepository;

fn queue() -> (Arc<MemoryRepository>, RetryQueue) {
    let repository = Arc::new(MemoryRepository::new());
    let queue = RetryQueue::new(repository.clone(), QueueConfig::default());
    (repository, queue)
}

#[tokio::test]
async fn test_future_task_invisible_until_due() {
    let (repository, queue) = queue();
    let id = queue
        .queue_task(
            Uuid::new_v4(),
            TaskType::AnswerScoring,
            serde_json::json!({"sessionId": "s1"}),
            Utc::now() + Duration::minutes(10),
            None,
        )
        .await
        .unwrap();

    assert!(queue.pending_tasks(10).await.unwrap().is_empty());

    // Once the scheduled time elapses the task is due, exactly once
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

    let due = queue.pending_tasks(10).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, id);
}

#[tokio::test]
async fn test_pending_ordered_and_limited() {
    let (_, queue) = queue();
    let now = Utc::now();

    let late = queue
        .queue_task(
            Uuid::new_v4(),
            TaskType::SessionSummary,
            serde_json::Value::Null,
            now - Duration::minutes(1),
            None,
        )
        .await
        .unwrap();
    let early = queue
        .queue_task(
            Uuid::new_v4(),
            TaskType::SessionSummary,
            serde_json::Value::Null,
            now - Duration::minutes(5),
            None,
        )
        .await
        .unwrap();

    let due = queue.pending_tasks(10).await.unwrap();
    assert_eq!(due.len(), 2);
    assert_eq!(due[0].id, early);
    assert_eq!(due[1].id, late);

    // The limit bounds per-cycle work
    assert_eq!(queue.pending_tasks(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_retry_increments_and_never_completes() {
    let (repository, queue) = queue();
    let id = queue
        .queue_task(
            Uuid::new_v4(),
            TaskType::QuestionGeneration,
            serde_json::Value::Null,
            Utc::now() - Duration::seconds(1),
            None,
        )
        .await
        .unwrap();

    let next = Utc::now() + Duration::minutes(5);
    queue.retry_task(id, next, "rate limited").await.unwrap();

    let task = repository.get_retry_task(id).await.unwrap().unwrap();
    assert_eq!(task.attempt_count, 2);
    assert_eq!(task.scheduled_retry_time, next);
    assert_eq!(task.last_error.as_deref(), Some("rate limited"));
    assert!(task.completed_at.is_none());
}

#[tokio::test]
async fn test_retry_time_clamped_into_future() {
    let (repository, queue) = queue();
    let id = queue
        .queue_task(
            Uuid::new_v4(),
            TaskType::QuestionGeneration,
            serde_json::Value::Null,
            Utc::now() - Duration::seconds(1),
            None,
        )
        .await
        .unwrap();

    queue
        .retry_task(id, Utc::now() - Duration::minutes(5), "stale resume-at")
        .await
        .unwrap();

    let task = repository.get_retry_task(id).await.unwrap().unwrap();
    assert!(task.scheduled_retry_time > Utc::now());
}

#[tokio::test]
async fn test_complete_is_idempotent() {
    let (repository, queue) = queue();
    let id = queue
        .queue_task(
            Uuid::new_v4(),
            TaskType::AnswerScoring,
            serde_json::Value::Null,
            Utc::now(),
            None,
        )
        .await
        .unwrap();

    queue.complete_task(id).await.unwrap();
    let first = repository
        .get_retry_task(id)
        .await
        .unwrap()
        .unwrap()
        .completed_at
        .unwrap();

    queue.complete_task(id).await.unwrap();
    let second = repository
        .get_retry_task(id)
        .await
        .unwrap()
        .unwrap()
        .completed_at
        .unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_failed_task_leaves_due_set() {
    let (_, queue) = queue();
    let id = queue
        .queue_task(
            Uuid::new_v4(),
            TaskType::AnswerScoring,
            serde_json::Value::Null,
            Utc::now() - Duration::seconds(1),
            None,
        )
        .await
        .unwrap();

    assert_eq!(queue.pending_tasks(10).await.unwrap().len(), 1);
    queue.fail_task(id, "exhausted").await.unwrap();
    assert!(queue.pending_tasks(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_claim_hides_task_for_lease() {
    let (_, queue) = queue();
    let id = queue
        .queue_task(
            Uuid::new_v4(),
            TaskType::SessionSummary,
            serde_json::Value::Null,
            Utc::now() - Duration::seconds(1),
            None,
        )
        .await
        .unwrap();

    queue
        .claim_task(id, Utc::now() + Duration::seconds(60))
        .await
        .unwrap();

    assert!(queue.pending_tasks(10).await.unwrap().is_empty());
}
