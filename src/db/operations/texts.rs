use chrono::{DateTime, Utc};

use super::StoreError;
use crate::db::rows::PersonalText;
use crate::db::Database;

pub async fn list_texts(db: &Database, user_id: &str) -> Result<Vec<PersonalText>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT "id", "title", "content", "date_added"
        FROM "texts"
        WHERE "user_id" = ?
        ORDER BY "date_added" DESC, "rowid" DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db.pool())
    .await?;

    rows.iter()
        .map(|row| PersonalText::decode(row).map_err(StoreError::from))
        .collect()
}

pub async fn insert_text(
    db: &Database,
    user_id: &str,
    title: &str,
    content: &str,
    date_added: DateTime<Utc>,
) -> Result<PersonalText, StoreError> {
    let id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO "texts" ("id", "user_id", "title", "content", "date_added")
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(title)
    .bind(content)
    .bind(date_added)
    .execute(db.pool())
    .await?;

    Ok(PersonalText {
        id,
        title: title.to_string(),
        content: content.to_string(),
        date_added,
    })
}

pub async fn delete_text(db: &Database, user_id: &str, id: &str) -> Result<bool, StoreError> {
    let result = sqlx::query(r#"DELETE FROM "texts" WHERE "id" = ? AND "user_id" = ?"#)
        .bind(id)
        .bind(user_id)
        .execute(db.pool())
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_all_texts(db: &Database) -> Result<i64, StoreError> {
    let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "texts""#)
        .fetch_one(db.pool())
        .await?;
    Ok(count)
}
