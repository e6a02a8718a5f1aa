use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::config::ReminderConfig;
use crate::services::reminder::ReminderService;

/// Owns the cron job that sends daily practice reminders. Built by the
/// composition root and stopped explicitly on shutdown.
pub struct ReminderScheduler {
    scheduler: Mutex<JobScheduler>,
    shutdown_tx: broadcast::Sender<()>,
    reminders: Arc<ReminderService>,
    config: ReminderConfig,
    running: AtomicBool,
}

impl ReminderScheduler {
    pub async fn new(
        reminders: Arc<ReminderService>,
        config: ReminderConfig,
    ) -> Result<Self, WorkerError> {
        let scheduler = JobScheduler::new().await?;
        let (shutdown_tx, _) = broadcast::channel(1);
        Ok(Self {
            scheduler: Mutex::new(scheduler),
            shutdown_tx,
            reminders,
            config,
            running: AtomicBool::new(false),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub async fn start(&self) -> Result<(), WorkerError> {
        if !self.config.enabled {
            info!("ENABLE_REMINDER_WORKER is off, skipping reminder scheduler");
            return Ok(());
        }
        let scheduler = self.scheduler.lock().await;
        if self.is_running() {
            return Ok(());
        }

        let reminders = Arc::clone(&self.reminders);
        let shutdown_rx = self.shutdown_tx.subscribe();
        let job = Job::new_async(self.config.schedule.as_str(), move |_uuid, _lock| {
            let reminders = Arc::clone(&reminders);
            let mut rx = shutdown_rx.resubscribe();
            Box::pin(async move {
                tokio::select! {
                    _ = rx.recv() => {},
                    result = reminders.tick(chrono::Local::now().naive_local()) => {
                        match result {
                            Ok(0) => {}
                            Ok(sent) => info!(sent, "practice reminders sent"),
                            Err(e) => error!(error = %e, "Reminder worker error"),
                        }
                    }
                }
            })
        })?;
        scheduler.add(job).await?;
        scheduler.start().await?;
        self.running.store(true, Ordering::SeqCst);
        info!(schedule = %self.config.schedule, "Reminder scheduler started");
        Ok(())
    }

    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        info!("Stopping reminder scheduler...");
        let _ = self.shutdown_tx.send(());

        let mut scheduler = self.scheduler.lock().await;
        if let Err(e) = scheduler.shutdown().await {
            warn!(error = %e, "Error shutting down scheduler");
        }
        info!("Reminder scheduler stopped");
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[tokio::test]
    async fn disabled_scheduler_does_not_start() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let scheduler = ReminderScheduler::new(
            Arc::new(ReminderService::new(db)),
            ReminderConfig {
                enabled: false,
                schedule: "0 * * * * *".to_string(),
            },
        )
        .await
        .unwrap();

        scheduler.start().await.unwrap();
        assert!(!scheduler.is_running());
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let scheduler = ReminderScheduler::new(
            Arc::new(ReminderService::new(db)),
            ReminderConfig {
                enabled: true,
                schedule: "0 * * * * *".to_string(),
            },
        )
        .await
        .unwrap();

        scheduler.start().await.unwrap();
        scheduler.start().await.unwrap();
        assert!(scheduler.is_running());
        scheduler.stop().await;
        scheduler.stop().await;
        assert!(!scheduler.is_running());
    }
}
