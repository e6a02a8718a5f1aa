use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;

use super::StoreError;
use crate::db::rows::VocabularyEntry;
use crate::db::Database;

pub async fn list_words(db: &Database, user_id: &str) -> Result<Vec<VocabularyEntry>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT "id", "english", "armenian", "date_added", "is_learned"
        FROM "words"
        WHERE "user_id" = ?
        ORDER BY "date_added" DESC, "rowid" DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db.pool())
    .await?;

    decode_all(&rows)
}

/// Inserts the whole batch in one transaction; nothing is written when any
/// row fails.
pub async fn insert_words(
    db: &Database,
    user_id: &str,
    batch: &[(String, String)],
    date_added: DateTime<Utc>,
) -> Result<Vec<VocabularyEntry>, StoreError> {
    let mut tx = db.pool().begin().await?;
    let mut created = Vec::with_capacity(batch.len());
    for (english, armenian) in batch {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO "words" ("id", "user_id", "english", "armenian", "date_added", "is_learned")
            VALUES (?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(english)
        .bind(armenian)
        .bind(date_added)
        .execute(&mut *tx)
        .await?;

        created.push(VocabularyEntry {
            id,
            english_text: english.clone(),
            armenian_text: armenian.clone(),
            date_added,
            is_learned: false,
        });
    }
    tx.commit().await?;
    Ok(created)
}

/// Writes the full mutable state of an entry. Returns `false` when the entry
/// does not exist or belongs to someone else.
pub async fn update_word(
    db: &Database,
    user_id: &str,
    entry: &VocabularyEntry,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        r#"
        UPDATE "words"
        SET "english" = ?, "armenian" = ?, "is_learned" = ?
        WHERE "id" = ? AND "user_id" = ?
        "#,
    )
    .bind(&entry.english_text)
    .bind(&entry.armenian_text)
    .bind(entry.is_learned)
    .bind(&entry.id)
    .bind(user_id)
    .execute(db.pool())
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_word(db: &Database, user_id: &str, id: &str) -> Result<bool, StoreError> {
    let result = sqlx::query(r#"DELETE FROM "words" WHERE "id" = ? AND "user_id" = ?"#)
        .bind(id)
        .bind(user_id)
        .execute(db.pool())
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_all_words(db: &Database) -> Result<i64, StoreError> {
    let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "words""#)
        .fetch_one(db.pool())
        .await?;
    Ok(count)
}

fn decode_all(rows: &[SqliteRow]) -> Result<Vec<VocabularyEntry>, StoreError> {
    rows.iter()
        .map(|row| VocabularyEntry::decode(row).map_err(StoreError::from))
        .collect()
}
