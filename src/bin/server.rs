//! Standalone binary running the worker loop against whichever Scheduler
//! and Storage backends `RuntimeConfig` selects.

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use task_runtime::config::{RuntimeConfig, StorageKind};
use task_runtime::push::{GlobalWebhookSettings, PushNotificationManager};
use task_runtime::scheduler::Scheduler;
use task_runtime::storage::{MemoryStorage, PostgresStorage, Storage};
use task_runtime::worker::handler::{HandlerOutcome, TaskHandler};
use task_runtime::worker::Worker;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug)]
struct NoopHandler;

#[async_trait::async_trait]
impl TaskHandler for NoopHandler {
    async fn handle(
        &self,
        _task: &task_runtime::models::Task,
        _new_messages: &[task_runtime::models::Message],
        _cancellation: CancellationToken,
    ) -> HandlerOutcome {
        HandlerOutcome::completed()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    task_runtime::logging::init();

    info!(version = env!("CARGO_PKG_VERSION"), "starting task runtime server");

    let config = RuntimeConfig::from_env()?;

    let storage = Arc::new(match &config.storage {
        StorageKind::Memory => Storage::Memory(MemoryStorage::new()),
        StorageKind::Postgres { database_url } => {
            Storage::Postgres(PostgresStorage::connect(database_url).await?)
        }
    });

    let scheduler = Arc::new(Scheduler::connect(config.scheduler.clone()).await?);

    let push_manager = Arc::new(PushNotificationManager::new(
        storage.clone(),
        GlobalWebhookSettings {
            url: config.global_webhook_url.clone(),
            token: config.global_webhook_token.clone(),
        },
        config.push_notifications_enabled,
    ));
    push_manager.initialize().await?;

    let worker = Arc::new(Worker::new(
        scheduler.clone(),
        storage.clone(),
        push_manager,
        Arc::new(NoopHandler),
    ));

    info!("worker loop ready, press Ctrl+C to shut down");

    let shutdown = CancellationToken::new();
    let worker_shutdown = shutdown.clone();
    let worker_task = tokio::spawn(async move { worker.run(worker_shutdown).await });

    shutdown_signal().await;
    info!("shutdown signal received, draining in-flight work");
    shutdown.cancel();
    scheduler.release().await;

    match tokio::time::timeout(SHUTDOWN_GRACE, worker_task).await {
        Ok(Ok(())) => info!("worker loop exited cleanly"),
        Ok(Err(e)) => error!(error = %e, "worker task panicked"),
        Err(_) => error!(timeout_secs = SHUTDOWN_GRACE.as_secs(), "graceful shutdown timed out"),
    }

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received SIGTERM"),
    }
}
