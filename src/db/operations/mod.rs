pub mod groups;
pub mod public_texts;
pub mod reminders;
pub mod texts;
pub mod users;
pub mod words;

use thiserror::Error;

use crate::db::rows::RowDecodeError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("malformed row: {0}")]
    Decode(#[from] RowDecodeError),
}
