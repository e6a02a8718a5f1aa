use chrono::NaiveDate;

use super::StoreError;
use crate::db::rows::ReminderSettings;
use crate::db::Database;

pub async fn get_settings(db: &Database, user_id: &str) -> Result<ReminderSettings, StoreError> {
    let row = sqlx::query(
        r#"
        SELECT "user_id", "enabled", "time", "last_notification_date"
        FROM "reminder_settings"
        WHERE "user_id" = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(db.pool())
    .await?;

    match row {
        Some(row) => Ok(ReminderSettings::decode(&row)?.1),
        None => Ok(ReminderSettings::default()),
    }
}

pub async fn save_settings(
    db: &Database,
    user_id: &str,
    enabled: bool,
    time: &str,
) -> Result<ReminderSettings, StoreError> {
    sqlx::query(
        r#"
        INSERT INTO "reminder_settings" ("user_id", "enabled", "time")
        VALUES (?, ?, ?)
        ON CONFLICT ("user_id") DO UPDATE SET
            "enabled" = excluded."enabled",
            "time" = excluded."time"
        "#,
    )
    .bind(user_id)
    .bind(enabled)
    .bind(time)
    .execute(db.pool())
    .await?;

    get_settings(db, user_id).await
}

pub async fn list_enabled(db: &Database) -> Result<Vec<(String, ReminderSettings)>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT "user_id", "enabled", "time", "last_notification_date"
        FROM "reminder_settings"
        WHERE "enabled" = 1
        "#,
    )
    .fetch_all(db.pool())
    .await?;

    rows.iter()
        .map(|row| ReminderSettings::decode(row).map_err(StoreError::from))
        .collect()
}

pub async fn mark_notified(db: &Database, user_id: &str, date: NaiveDate) -> Result<(), StoreError> {
    sqlx::query(r#"UPDATE "reminder_settings" SET "last_notification_date" = ? WHERE "user_id" = ?"#)
        .bind(date.format("%Y-%m-%d").to_string())
        .bind(user_id)
        .execute(db.pool())
        .await?;
    Ok(())
}
