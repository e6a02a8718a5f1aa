use chrono::Utc;

use super::StoreError;
use crate::db::rows::{Group, GroupMember, UserProfile};
use crate::db::Database;

pub async fn list_groups(db: &Database) -> Result<Vec<Group>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT g."id", g."name", g."description", g."created_by", g."created_at",
               (SELECT COUNT(*) FROM "user_groups" ug WHERE ug."group_id" = g."id") AS "member_count"
        FROM "groups" g
        ORDER BY g."created_at" DESC
        "#,
    )
    .fetch_all(db.pool())
    .await?;

    rows.iter()
        .map(|row| Group::decode(row).map_err(StoreError::from))
        .collect()
}

pub async fn find_group(db: &Database, group_id: &str) -> Result<Option<Group>, StoreError> {
    let row = sqlx::query(
        r#"
        SELECT g."id", g."name", g."description", g."created_by", g."created_at",
               (SELECT COUNT(*) FROM "user_groups" ug WHERE ug."group_id" = g."id") AS "member_count"
        FROM "groups" g
        WHERE g."id" = ?
        "#,
    )
    .bind(group_id)
    .fetch_optional(db.pool())
    .await?;

    match row {
        Some(row) => Ok(Some(Group::decode(&row)?)),
        None => Ok(None),
    }
}

pub async fn create_group(
    db: &Database,
    name: &str,
    description: Option<&str>,
    created_by: &str,
) -> Result<Group, StoreError> {
    let id = uuid::Uuid::new_v4().to_string();
    let created_at = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO "groups" ("id", "name", "description", "created_by", "created_at")
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(name)
    .bind(description)
    .bind(created_by)
    .bind(created_at)
    .execute(db.pool())
    .await?;

    Ok(Group {
        id,
        name: name.to_string(),
        description: description.map(str::to_string),
        created_by: created_by.to_string(),
        created_at,
        member_count: 0,
    })
}

pub async fn update_group(
    db: &Database,
    group_id: &str,
    name: &str,
    description: Option<&str>,
) -> Result<Option<Group>, StoreError> {
    let result = sqlx::query(r#"UPDATE "groups" SET "name" = ?, "description" = ? WHERE "id" = ?"#)
        .bind(name)
        .bind(description)
        .bind(group_id)
        .execute(db.pool())
        .await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_group(db, group_id).await
}

/// Memberships and text associations go with the group (cascade).
pub async fn delete_group(db: &Database, group_id: &str) -> Result<bool, StoreError> {
    let result = sqlx::query(r#"DELETE FROM "groups" WHERE "id" = ?"#)
        .bind(group_id)
        .execute(db.pool())
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_members(db: &Database, group_id: &str) -> Result<Vec<GroupMember>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT ug."user_id", ug."group_id", ug."added_at", ug."added_by", up."email"
        FROM "user_groups" ug
        LEFT JOIN "user_profiles" up ON up."id" = ug."user_id"
        WHERE ug."group_id" = ?
        ORDER BY ug."added_at" DESC
        "#,
    )
    .bind(group_id)
    .fetch_all(db.pool())
    .await?;

    rows.iter()
        .map(|row| GroupMember::decode(row).map_err(StoreError::from))
        .collect()
}

/// Returns `false` when the user already belongs to the group.
pub async fn add_member(
    db: &Database,
    group_id: &str,
    user_id: &str,
    added_by: &str,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO "user_groups" ("user_id", "group_id", "added_by", "added_at")
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(group_id)
    .bind(added_by)
    .bind(Utc::now())
    .execute(db.pool())
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn remove_member(db: &Database, group_id: &str, user_id: &str) -> Result<bool, StoreError> {
    let result = sqlx::query(r#"DELETE FROM "user_groups" WHERE "group_id" = ? AND "user_id" = ?"#)
        .bind(group_id)
        .bind(user_id)
        .execute(db.pool())
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Active profiles that are not yet members of the group.
pub async fn available_users(db: &Database, group_id: &str) -> Result<Vec<UserProfile>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT up."id", up."email", up."created_at", up."last_sign_in_at", up."is_active"
        FROM "user_profiles" up
        WHERE up."is_active" = 1
          AND NOT EXISTS (
              SELECT 1 FROM "user_groups" ug
              WHERE ug."user_id" = up."id" AND ug."group_id" = ?
          )
        ORDER BY up."email"
        "#,
    )
    .bind(group_id)
    .fetch_all(db.pool())
    .await?;

    rows.iter()
        .map(|row| UserProfile::decode(row).map_err(StoreError::from))
        .collect()
}
