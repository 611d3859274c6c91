//! End-to-end scenarios against the memory backends. These
//! exercise the same contract the Redis/Postgres backends implement but
//! don't require live infrastructure, so they run in plain `cargo test`.

use std::sync::Arc;

use task_runtime::models::TaskSendParams;
use task_runtime::push::{GlobalWebhookSettings, PushNotificationManager};
use task_runtime::scheduler::{Scheduler, SchedulerKind};
use task_runtime::storage::{MemoryStorage, Storage};
use uuid::Uuid;

fn memory_storage() -> Arc<Storage> {
    Arc::new(Storage::Memory(MemoryStorage::new()))
}

// S1: round-trip of a `run` operation through the queue.
#[tokio::test]
async fn s1_run_operation_round_trips_with_identical_params() {
    let scheduler = Scheduler::connect(SchedulerKind::Memory { capacity: 8 }).await.unwrap();
    let task_id = Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap();
    let context_id = Uuid::parse_str("22222222-2222-2222-2222-222222222222").unwrap();
    let params = TaskSendParams {
        task_id,
        context_id,
        messages: vec![task_runtime::models::Message::text(
            task_runtime::models::Role::User,
            "hi",
        )],
        webhook: None,
        long_running: false,
    };
    scheduler.run_task(params).await.unwrap();

    let envelope = scheduler.receive_task_operations().await.unwrap();
    assert_eq!(envelope.operation.kind(), "run");
    assert_eq!(envelope.operation.task_id(), task_id);
}

// S2: an operation tag outside the closed set fails to deserialize, and the
// worker loop's caller is expected to log and move on rather than panic;
// here we assert the queue itself recovers (length returns to zero) after
// discarding one and accepting a legitimate operation.
#[tokio::test]
async fn s2_unknown_operation_does_not_wedge_the_queue() {
    let raw = r#"{"operation":"nuke","params":{}}"#;
    let parsed: Result<task_runtime::models::QueueEnvelope, _> = serde_json::from_str(raw);
    assert!(parsed.is_err());

    let scheduler = Scheduler::connect(SchedulerKind::Memory { capacity: 8 }).await.unwrap();
    scheduler.pause_task(Uuid::new_v4()).await.unwrap();
    assert_eq!(scheduler.get_queue_length().await.unwrap(), 1);
    scheduler.clear_queue().await.unwrap();
    assert_eq!(scheduler.get_queue_length().await.unwrap(), 0);
}

// S3: no per-task config, manifest carries a global webhook URL.
#[tokio::test]
async fn s3_status_falls_back_to_global_webhook() {
    let storage = memory_storage();
    let manager = PushNotificationManager::new(
        storage.clone(),
        GlobalWebhookSettings {
            url: Some("https://ex/wh".to_string()),
            token: None,
        },
        true,
    );
    let task_id = Uuid::new_v4();
    let effective = manager.get_effective_webhook_config(task_id).unwrap();
    assert_eq!(effective.url, "https://ex/wh");
}

// S4: a per-task registration takes priority over the global fallback.
#[tokio::test]
async fn s4_per_task_config_overrides_global() {
    let storage = memory_storage();
    let manager = PushNotificationManager::new(
        storage.clone(),
        GlobalWebhookSettings {
            url: Some("https://ex/wh".to_string()),
            token: None,
        },
        true,
    );
    let task_id = Uuid::new_v4();
    manager
        .register_push_config(
            task_id,
            task_runtime::models::WebhookConfig::new(task_id, "https://task/wh", None),
            false,
        )
        .await
        .unwrap();
    let effective = manager.get_effective_webhook_config(task_id).unwrap();
    assert_eq!(effective.url, "https://task/wh");
}

// S5: a persisted registration survives reconstructing the Push Manager
// against the same Storage and calling initialize() again.
#[tokio::test]
async fn s5_persisted_config_survives_manager_restart() {
    let storage = memory_storage();
    let task_id = Uuid::new_v4();
    {
        let manager = PushNotificationManager::new(
            storage.clone(),
            GlobalWebhookSettings { url: None, token: None },
            true,
        );
        manager
            .register_push_config(
                task_id,
                task_runtime::models::WebhookConfig::new(task_id, "https://task/wh", None),
                true,
            )
            .await
            .unwrap();
    }

    let restarted = PushNotificationManager::new(storage, GlobalWebhookSettings { url: None, token: None }, true);
    restarted.initialize().await.unwrap();
    assert_eq!(restarted.get_push_config(task_id).unwrap().url, "https://task/wh");
}

// S6: deleting a task cascades to its webhook config on both backends; here
// exercised through the `Storage` enum against the memory backend.
#[tokio::test]
async fn s6_task_delete_cascades_webhook_config() {
    let storage = memory_storage();
    let task = task_runtime::models::Task::new(Uuid::new_v4(), Uuid::new_v4());
    let task_id = task.task_id;
    storage.save_task(&task).await.unwrap();
    storage
        .save_webhook_config(&task_runtime::models::WebhookConfig::new(
            task_id,
            "https://task/wh",
            None,
        ))
        .await
        .unwrap();

    storage.delete_task(task_id).await.unwrap();

    assert!(storage.load_task(task_id).await.unwrap().is_none());
    assert!(storage.load_webhook_config(task_id).await.unwrap().is_none());
}

// S7: N concurrent sequence allocations for one task yield a permutation of
// 1..=N with no duplicates or gaps. `Sequencer` is the exact component
// `PushNotificationManager::notify_*` draws sequence numbers from before
// attempting delivery, so exercising it directly here avoids depending on
// live network delivery to observe the invariant.
#[tokio::test]
async fn s7_concurrent_emissions_get_distinct_monotonic_sequence_numbers() {
    let sequencer = Arc::new(task_runtime::push::sequencer::Sequencer::new());
    let task_id = Uuid::new_v4();

    let mut handles = Vec::new();
    for _ in 0..1000u32 {
        let sequencer = sequencer.clone();
        handles.push(tokio::spawn(async move { sequencer.next(task_id) }));
    }
    let mut seen = Vec::with_capacity(1000);
    for h in handles {
        seen.push(h.await.unwrap());
    }
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 1000);
    assert_eq!(seen[0], 1);
    assert_eq!(*seen.last().unwrap(), 1000);
}
