use chrono::Utc;
use serde::Serialize;
use sqlx::Row;

use super::StoreError;
use crate::db::rows::UserProfile;
use crate::db::Database;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOverview {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub word_count: i64,
    pub text_count: i64,
    pub is_admin: bool,
}

/// Records a sign-in. The first call creates the profile.
pub async fn upsert_profile(
    db: &Database,
    user_id: &str,
    email: Option<&str>,
) -> Result<(), StoreError> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO "user_profiles" ("id", "email", "created_at", "last_sign_in_at", "is_active")
        VALUES (?, ?, ?, ?, 1)
        ON CONFLICT ("id") DO UPDATE SET
            "email" = COALESCE(excluded."email", "user_profiles"."email"),
            "last_sign_in_at" = excluded."last_sign_in_at"
        "#,
    )
    .bind(user_id)
    .bind(email)
    .bind(now)
    .bind(now)
    .execute(db.pool())
    .await?;
    Ok(())
}

pub async fn list_users(db: &Database) -> Result<Vec<UserOverview>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT up."id", up."email", up."created_at", up."last_sign_in_at", up."is_active",
               (SELECT COUNT(*) FROM "words" w WHERE w."user_id" = up."id") AS "word_count",
               (SELECT COUNT(*) FROM "texts" t WHERE t."user_id" = up."id") AS "text_count",
               EXISTS (SELECT 1 FROM "admins" a WHERE a."user_id" = up."id") AS "is_admin"
        FROM "user_profiles" up
        ORDER BY up."created_at" DESC
        "#,
    )
    .fetch_all(db.pool())
    .await?;

    rows.iter()
        .map(|row| {
            Ok(UserOverview {
                profile: UserProfile::decode(row)?,
                word_count: row.try_get("word_count").unwrap_or(0),
                text_count: row.try_get("text_count").unwrap_or(0),
                is_admin: row.try_get("is_admin").unwrap_or(false),
            })
        })
        .collect()
}

pub async fn count_users(db: &Database) -> Result<i64, StoreError> {
    let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "user_profiles""#)
        .fetch_one(db.pool())
        .await?;
    Ok(count)
}

pub async fn is_admin(db: &Database, user_id: &str) -> Result<bool, StoreError> {
    let found: Option<String> =
        sqlx::query_scalar(r#"SELECT "user_id" FROM "admins" WHERE "user_id" = ?"#)
            .bind(user_id)
            .fetch_optional(db.pool())
            .await?;
    Ok(found.is_some())
}

pub async fn grant_admin(db: &Database, user_id: &str) -> Result<(), StoreError> {
    sqlx::query(r#"INSERT OR IGNORE INTO "admins" ("user_id", "created_at") VALUES (?, ?)"#)
        .bind(user_id)
        .bind(Utc::now())
        .execute(db.pool())
        .await?;
    Ok(())
}
