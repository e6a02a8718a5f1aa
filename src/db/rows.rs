//! Typed views of table rows.
//!
//! Every row coming back from the store goes through a `decode` step that
//! checks the columns the domain relies on. A row with a missing or empty
//! required column is an error, never a half-filled struct.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RowDecodeError {
    #[error("{table}.{column}: missing or null")]
    Missing {
        table: &'static str,
        column: &'static str,
    },
    #[error("{table}.{column}: empty value")]
    Empty {
        table: &'static str,
        column: &'static str,
    },
    #[error("{table}.{column}: unexpected value {value:?}")]
    Invalid {
        table: &'static str,
        column: &'static str,
        value: String,
    },
}

fn required_text(
    row: &SqliteRow,
    table: &'static str,
    column: &'static str,
) -> Result<String, RowDecodeError> {
    let value: Option<String> = row
        .try_get(column)
        .map_err(|_| RowDecodeError::Missing { table, column })?;
    let value = value.ok_or(RowDecodeError::Missing { table, column })?;
    if value.trim().is_empty() {
        return Err(RowDecodeError::Empty { table, column });
    }
    Ok(value)
}

fn optional_text(row: &SqliteRow, column: &'static str) -> Option<String> {
    row.try_get::<Option<String>, _>(column)
        .ok()
        .flatten()
        .filter(|value| !value.trim().is_empty())
}

fn required_time(
    row: &SqliteRow,
    table: &'static str,
    column: &'static str,
) -> Result<DateTime<Utc>, RowDecodeError> {
    row.try_get::<DateTime<Utc>, _>(column)
        .map_err(|_| RowDecodeError::Missing { table, column })
}

fn optional_time(row: &SqliteRow, column: &'static str) -> Option<DateTime<Utc>> {
    row.try_get::<Option<DateTime<Utc>>, _>(column).ok().flatten()
}

fn flag(row: &SqliteRow, table: &'static str, column: &'static str) -> Result<bool, RowDecodeError> {
    row.try_get::<bool, _>(column)
        .map_err(|_| RowDecodeError::Missing { table, column })
}

fn count(row: &SqliteRow, column: &'static str) -> i64 {
    row.try_get::<i64, _>(column).unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyEntry {
    pub id: String,
    #[serde(rename = "english")]
    pub english_text: String,
    #[serde(rename = "armenian")]
    pub armenian_text: String,
    pub date_added: DateTime<Utc>,
    pub is_learned: bool,
}

impl VocabularyEntry {
    pub fn decode(row: &SqliteRow) -> Result<Self, RowDecodeError> {
        const TABLE: &str = "words";
        Ok(Self {
            id: required_text(row, TABLE, "id")?,
            english_text: required_text(row, TABLE, "english")?,
            armenian_text: required_text(row, TABLE, "armenian")?,
            date_added: required_time(row, TABLE, "date_added")?,
            is_learned: flag(row, TABLE, "is_learned")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalText {
    pub id: String,
    pub title: String,
    pub content: String,
    pub date_added: DateTime<Utc>,
}

impl PersonalText {
    pub fn decode(row: &SqliteRow) -> Result<Self, RowDecodeError> {
        const TABLE: &str = "texts";
        Ok(Self {
            id: required_text(row, TABLE, "id")?,
            title: required_text(row, TABLE, "title")?,
            content: required_text(row, TABLE, "content")?,
            date_added: required_time(row, TABLE, "date_added")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Groups,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Groups => "groups",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "public" => Some(Self::Public),
            "groups" => Some(Self::Groups),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicText {
    pub id: String,
    pub title: String,
    pub body: String,
    pub visibility: Visibility,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    /// Names of the groups the text is shared with. Only filled for admin
    /// listings.
    pub groups: Vec<String>,
    pub group_ids: Vec<String>,
}

impl PublicText {
    pub fn decode(row: &SqliteRow) -> Result<Self, RowDecodeError> {
        const TABLE: &str = "public_texts";
        let raw_visibility = required_text(row, TABLE, "visibility")?;
        let visibility = Visibility::parse(&raw_visibility).ok_or(RowDecodeError::Invalid {
            table: TABLE,
            column: "visibility",
            value: raw_visibility,
        })?;
        Ok(Self {
            id: required_text(row, TABLE, "id")?,
            title: required_text(row, TABLE, "title")?,
            body: required_text(row, TABLE, "body")?,
            visibility,
            created_by: required_text(row, TABLE, "created_by")?,
            created_at: required_time(row, TABLE, "created_at")?,
            groups: Vec::new(),
            group_ids: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub member_count: i64,
}

impl Group {
    pub fn decode(row: &SqliteRow) -> Result<Self, RowDecodeError> {
        const TABLE: &str = "groups";
        Ok(Self {
            id: required_text(row, TABLE, "id")?,
            name: required_text(row, TABLE, "name")?,
            description: optional_text(row, "description"),
            created_by: required_text(row, TABLE, "created_by")?,
            created_at: required_time(row, TABLE, "created_at")?,
            member_count: count(row, "member_count"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub user_id: String,
    pub group_id: String,
    pub added_at: DateTime<Utc>,
    pub added_by: String,
    pub user_email: Option<String>,
}

impl GroupMember {
    pub fn decode(row: &SqliteRow) -> Result<Self, RowDecodeError> {
        const TABLE: &str = "user_groups";
        Ok(Self {
            user_id: required_text(row, TABLE, "user_id")?,
            group_id: required_text(row, TABLE, "group_id")?,
            added_at: required_time(row, TABLE, "added_at")?,
            added_by: required_text(row, TABLE, "added_by")?,
            user_email: optional_text(row, "email"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl UserProfile {
    pub fn decode(row: &SqliteRow) -> Result<Self, RowDecodeError> {
        const TABLE: &str = "user_profiles";
        Ok(Self {
            id: required_text(row, TABLE, "id")?,
            email: optional_text(row, "email"),
            created_at: required_time(row, TABLE, "created_at")?,
            last_sign_in_at: optional_time(row, "last_sign_in_at"),
            is_active: flag(row, TABLE, "is_active")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderSettings {
    pub enabled: bool,
    /// Local wall-clock time, `HH:MM`.
    pub time: String,
    pub last_notification_date: Option<NaiveDate>,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            time: "09:00".to_string(),
            last_notification_date: None,
        }
    }
}

impl ReminderSettings {
    pub fn decode(row: &SqliteRow) -> Result<(String, Self), RowDecodeError> {
        const TABLE: &str = "reminder_settings";
        let user_id = required_text(row, TABLE, "user_id")?;
        let last_notification_date = match optional_text(row, "last_notification_date") {
            Some(raw) => Some(NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                RowDecodeError::Invalid {
                    table: TABLE,
                    column: "last_notification_date",
                    value: raw,
                }
            })?),
            None => None,
        };
        Ok((
            user_id,
            Self {
                enabled: flag(row, TABLE, "enabled")?,
                time: required_text(row, TABLE, "time")?,
                last_notification_date,
            },
        ))
    }
}
