use std::collections::HashMap;

use chrono::Utc;
use sqlx::{Sqlite, Transaction};

use super::StoreError;
use crate::db::rows::{PublicText, Visibility};
use crate::db::Database;

const SELECT_COLUMNS: &str =
    r#"SELECT p."id", p."title", p."body", p."visibility", p."created_by", p."created_at" FROM "public_texts" p"#;

#[derive(Debug, Clone)]
pub struct PublicTextInput {
    pub title: String,
    pub body: String,
    pub visibility: Visibility,
    pub group_ids: Vec<String>,
}

/// Texts the user may read: everything public plus group-only texts shared
/// with a group the user belongs to. Group assignments are left empty.
pub async fn list_visible(db: &Database, user_id: &str) -> Result<Vec<PublicText>, StoreError> {
    let sql = format!(
        r#"{SELECT_COLUMNS}
        WHERE p."visibility" = 'public'
           OR EXISTS (
               SELECT 1 FROM "text_groups" tg
               JOIN "user_groups" ug ON ug."group_id" = tg."group_id"
               WHERE tg."text_id" = p."id" AND ug."user_id" = ?
           )
        ORDER BY p."created_at" DESC"#
    );
    let rows = sqlx::query(&sql).bind(user_id).fetch_all(db.pool()).await?;
    Ok(rows
        .iter()
        .map(PublicText::decode)
        .collect::<Result<Vec<_>, _>>()?)
}

pub async fn find_visible(
    db: &Database,
    user_id: &str,
    text_id: &str,
) -> Result<Option<PublicText>, StoreError> {
    let sql = format!(
        r#"{SELECT_COLUMNS}
        WHERE p."id" = ?
          AND (p."visibility" = 'public'
               OR EXISTS (
                   SELECT 1 FROM "text_groups" tg
                   JOIN "user_groups" ug ON ug."group_id" = tg."group_id"
                   WHERE tg."text_id" = p."id" AND ug."user_id" = ?
               ))"#
    );
    let row = sqlx::query(&sql)
        .bind(text_id)
        .bind(user_id)
        .fetch_optional(db.pool())
        .await?;
    match row {
        Some(row) => Ok(Some(PublicText::decode(&row)?)),
        None => Ok(None),
    }
}

pub async fn list_all(db: &Database) -> Result<Vec<PublicText>, StoreError> {
    let sql = format!(r#"{SELECT_COLUMNS} ORDER BY p."created_at" DESC"#);
    let rows = sqlx::query(&sql).fetch_all(db.pool()).await?;
    let mut texts = rows
        .iter()
        .map(PublicText::decode)
        .collect::<Result<Vec<_>, _>>()?;
    attach_groups(db, &mut texts).await?;
    Ok(texts)
}

pub async fn find_by_id(db: &Database, text_id: &str) -> Result<Option<PublicText>, StoreError> {
    let sql = format!(r#"{SELECT_COLUMNS} WHERE p."id" = ?"#);
    let row = sqlx::query(&sql).bind(text_id).fetch_optional(db.pool()).await?;
    let Some(row) = row else {
        return Ok(None);
    };
    let mut texts = vec![PublicText::decode(&row)?];
    attach_groups(db, &mut texts).await?;
    Ok(texts.pop())
}

pub async fn create(
    db: &Database,
    created_by: &str,
    input: &PublicTextInput,
) -> Result<PublicText, StoreError> {
    let id = uuid::Uuid::new_v4().to_string();
    let mut tx = db.pool().begin().await?;
    sqlx::query(
        r#"
        INSERT INTO "public_texts" ("id", "title", "body", "visibility", "created_by", "created_at")
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&input.title)
    .bind(&input.body)
    .bind(input.visibility.as_str())
    .bind(created_by)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;
    replace_groups(&mut tx, &id, input).await?;
    tx.commit().await?;

    find_by_id(db, &id)
        .await?
        .ok_or(StoreError::Sqlx(sqlx::Error::RowNotFound))
}

/// Returns `None` when the text does not exist.
pub async fn update(
    db: &Database,
    text_id: &str,
    input: &PublicTextInput,
) -> Result<Option<PublicText>, StoreError> {
    let mut tx = db.pool().begin().await?;
    let result = sqlx::query(
        r#"
        UPDATE "public_texts"
        SET "title" = ?, "body" = ?, "visibility" = ?
        WHERE "id" = ?
        "#,
    )
    .bind(&input.title)
    .bind(&input.body)
    .bind(input.visibility.as_str())
    .bind(text_id)
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    replace_groups(&mut tx, text_id, input).await?;
    tx.commit().await?;

    find_by_id(db, text_id).await
}

pub async fn delete(db: &Database, text_id: &str) -> Result<bool, StoreError> {
    let result = sqlx::query(r#"DELETE FROM "public_texts" WHERE "id" = ?"#)
        .bind(text_id)
        .execute(db.pool())
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_all(db: &Database) -> Result<i64, StoreError> {
    let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "public_texts""#)
        .fetch_one(db.pool())
        .await?;
    Ok(count)
}

async fn replace_groups(
    tx: &mut Transaction<'_, Sqlite>,
    text_id: &str,
    input: &PublicTextInput,
) -> Result<(), StoreError> {
    sqlx::query(r#"DELETE FROM "text_groups" WHERE "text_id" = ?"#)
        .bind(text_id)
        .execute(&mut **tx)
        .await?;

    if input.visibility == Visibility::Public {
        return Ok(());
    }

    for group_id in &input.group_ids {
        sqlx::query(r#"INSERT OR IGNORE INTO "text_groups" ("text_id", "group_id") VALUES (?, ?)"#)
            .bind(text_id)
            .bind(group_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

async fn attach_groups(db: &Database, texts: &mut [PublicText]) -> Result<(), StoreError> {
    if texts.is_empty() {
        return Ok(());
    }

    let rows: Vec<(String, String, String)> = sqlx::query_as(
        r#"
        SELECT tg."text_id", g."id", g."name"
        FROM "text_groups" tg
        JOIN "groups" g ON g."id" = tg."group_id"
        ORDER BY g."name"
        "#,
    )
    .fetch_all(db.pool())
    .await?;

    let mut by_text: HashMap<String, Vec<(String, String)>> = HashMap::new();
    for (text_id, group_id, name) in rows {
        by_text.entry(text_id).or_default().push((group_id, name));
    }

    for text in texts.iter_mut() {
        if let Some(groups) = by_text.remove(&text.id) {
            for (group_id, name) in groups {
                text.group_ids.push(group_id);
                text.groups.push(name);
            }
        }
    }
    Ok(())
}
