use crate::db::operations::{users, StoreError};
use crate::db::Database;

/// The single authority on whether a user may use the admin area.
#[derive(Clone)]
pub struct AdminAccess {
    db: Database,
}

impl AdminAccess {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn is_admin(&self, user_id: &str) -> Result<bool, StoreError> {
        users::is_admin(&self.db, user_id).await
    }
}
