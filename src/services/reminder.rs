use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDateTime, NaiveTime};
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::db::operations::{reminders, StoreError};
use crate::db::rows::ReminderSettings;
use crate::db::Database;
use crate::response::AppError;
use crate::services::validation::ValidationError;

pub const REMINDER_TITLE: &str = "Time to Practice!";
pub const REMINDER_BODY: &str = "Tap to translate 3 English words into Armenian.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub user_id: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ReminderError> for AppError {
    fn from(err: ReminderError) -> Self {
        match err {
            ReminderError::Validation(err) => err.into(),
            ReminderError::Store(err) => err.into(),
        }
    }
}

/// Due when enabled, the wall clock shows the configured minute, and no
/// reminder went out earlier the same day.
pub fn should_notify(settings: &ReminderSettings, now: NaiveDateTime) -> bool {
    settings.enabled
        && settings.time == now.format("%H:%M").to_string()
        && settings.last_notification_date != Some(now.date())
}

/// Normalizes `H:MM` / `HH:MM` to `HH:MM`.
pub fn parse_time(value: &str) -> Result<String, ValidationError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map(|time| time.format("%H:%M").to_string())
        .map_err(|_| ValidationError::Invalid {
            field: "time",
            reason: "expected HH:MM".to_string(),
        })
}

type Listeners = Arc<Mutex<HashMap<String, usize>>>;

/// Keeps a user counted as listening for reminders while alive.
pub struct ListenerGuard {
    user_id: String,
    listeners: Listeners,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let mut listeners = self.listeners.lock();
        if let Some(count) = listeners.get_mut(&self.user_id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                listeners.remove(&self.user_id);
            }
        }
    }
}

pub struct ReminderService {
    db: Database,
    sender: broadcast::Sender<Reminder>,
    listeners: Listeners,
}

impl ReminderService {
    pub fn new(db: Database) -> Self {
        let (sender, _) = broadcast::channel(64);
        Self {
            db,
            sender,
            listeners: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The receiver sees every user's reminders; callers filter by user id.
    pub fn subscribe(&self, user_id: &str) -> (broadcast::Receiver<Reminder>, ListenerGuard) {
        *self.listeners.lock().entry(user_id.to_string()).or_insert(0) += 1;
        let guard = ListenerGuard {
            user_id: user_id.to_string(),
            listeners: Arc::clone(&self.listeners),
        };
        (self.sender.subscribe(), guard)
    }

    pub fn is_listening(&self, user_id: &str) -> bool {
        self.listeners.lock().contains_key(user_id)
    }

    pub async fn settings(&self, user_id: &str) -> Result<ReminderSettings, StoreError> {
        reminders::get_settings(&self.db, user_id).await
    }

    pub async fn update(
        &self,
        user_id: &str,
        enabled: bool,
        time: &str,
    ) -> Result<ReminderSettings, ReminderError> {
        let time = parse_time(time)?;
        Ok(reminders::save_settings(&self.db, user_id, enabled, &time).await?)
    }

    /// Delivers every reminder due at `now` to users with an open listener
    /// and records the day it went out. Users nobody is listening for stay
    /// unmarked.
    pub async fn tick(&self, now: NaiveDateTime) -> Result<usize, StoreError> {
        let mut sent = 0;
        for (user_id, settings) in reminders::list_enabled(&self.db).await? {
            if !should_notify(&settings, now) {
                continue;
            }
            if !self.is_listening(&user_id) {
                tracing::debug!(user_id = %user_id, "practice reminder due, no listener");
                continue;
            }
            let reminder = Reminder {
                user_id: user_id.clone(),
                title: REMINDER_TITLE.to_string(),
                body: REMINDER_BODY.to_string(),
            };
            if self.sender.send(reminder).is_err() {
                tracing::debug!(user_id = %user_id, "practice reminder dropped, listener gone");
                continue;
            }
            reminders::mark_notified(&self.db, &user_id, now.date()).await?;
            tracing::info!(user_id = %user_id, "practice reminder sent");
            sent += 1;
        }
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn enabled_at(time: &str) -> ReminderSettings {
        ReminderSettings {
            enabled: true,
            time: time.to_string(),
            last_notification_date: None,
        }
    }

    #[test]
    fn fires_on_exact_minute_once_per_day() {
        let mut settings = enabled_at("09:00");
        assert!(should_notify(&settings, at("2026-05-01 09:00:30")));
        assert!(!should_notify(&settings, at("2026-05-01 09:01:00")));

        settings.last_notification_date = Some(at("2026-05-01 09:00:00").date());
        assert!(!should_notify(&settings, at("2026-05-01 09:00:45")));
        assert!(should_notify(&settings, at("2026-05-02 09:00:00")));
    }

    #[test]
    fn disabled_never_fires() {
        let settings = ReminderSettings::default();
        assert!(!should_notify(&settings, at("2026-05-01 09:00:00")));
    }

    #[test]
    fn time_is_normalized() {
        assert_eq!(parse_time("7:05").unwrap(), "07:05");
        assert_eq!(parse_time(" 21:30 ").unwrap(), "21:30");
        assert!(parse_time("25:00").is_err());
        assert!(parse_time("soon").is_err());
    }

    #[tokio::test]
    async fn tick_broadcasts_and_records_the_day() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let service = ReminderService::new(db);
        let (mut rx, _guard) = service.subscribe("u");
        service.update("u", true, "09:00").await.unwrap();

        assert_eq!(service.tick(at("2026-05-01 09:00:00")).await.unwrap(), 1);
        let reminder = rx.try_recv().unwrap();
        assert_eq!(reminder.user_id, "u");
        assert_eq!(reminder.title, REMINDER_TITLE);

        assert_eq!(service.tick(at("2026-05-01 09:00:30")).await.unwrap(), 0);
        let stored = service.settings("u").await.unwrap();
        assert_eq!(stored.last_notification_date, Some(at("2026-05-01 00:00:00").date()));
    }

    #[tokio::test]
    async fn users_without_a_listener_are_not_marked() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let service = ReminderService::new(db);
        service.update("away", true, "09:00").await.unwrap();
        service.update("here", true, "09:00").await.unwrap();
        let (mut rx, guard) = service.subscribe("here");

        assert_eq!(service.tick(at("2026-05-01 09:00:00")).await.unwrap(), 1);
        assert_eq!(rx.try_recv().unwrap().user_id, "here");
        assert!(rx.try_recv().is_err());
        assert_eq!(service.settings("away").await.unwrap().last_notification_date, None);

        drop(guard);
        assert!(!service.is_listening("here"));
        let (_rx, _guard) = service.subscribe("away");
        assert_eq!(service.tick(at("2026-05-01 09:00:40")).await.unwrap(), 1);
        assert!(service.settings("away").await.unwrap().last_notification_date.is_some());
    }

    #[tokio::test]
    async fn update_rejects_bad_time_without_writing() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let service = ReminderService::new(db);
        let err = service.update("u", true, "9 o'clock").await.unwrap_err();
        assert!(matches!(err, ReminderError::Validation(_)));
        assert_eq!(service.settings("u").await.unwrap(), ReminderSettings::default());
    }
}
