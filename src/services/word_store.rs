use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;
use thiserror::Error;

use crate::db::operations::{words, StoreError};
use crate::db::rows::VocabularyEntry;
use crate::db::Database;
use crate::response::AppError;
use crate::services::validation::{non_empty, require_text, ValidationError};

#[derive(Debug, Clone)]
pub struct NewWord {
    pub english: String,
    pub armenian: String,
}

/// Blank strings leave the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct WordPatch {
    pub english: Option<String>,
    pub armenian: Option<String>,
    pub is_learned: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct WordUpdate {
    pub entry: VocabularyEntry,
    /// The update flipped the entry from not learned to learned.
    pub became_learned: bool,
}

#[derive(Debug, Error)]
pub enum WordStoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("word not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<WordStoreError> for AppError {
    fn from(err: WordStoreError) -> Self {
        match err {
            WordStoreError::Validation(err) => err.into(),
            WordStoreError::NotFound => AppError::not_found("Word not found"),
            WordStoreError::Store(err) => err.into(),
        }
    }
}

/// Per-user vocabulary, cached in memory newest first and written through to
/// the database.
pub struct WordStore {
    db: Database,
    cache: RwLock<HashMap<String, Vec<VocabularyEntry>>>,
}

impl WordStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<VocabularyEntry>, StoreError> {
        let cached = self.cache.read().get(user_id).cloned();
        if let Some(entries) = cached {
            return Ok(entries);
        }

        let loaded = words::list_words(&self.db, user_id).await?;
        tracing::debug!(user_id, count = loaded.len(), "vocabulary loaded");
        let mut cache = self.cache.write();
        Ok(cache
            .entry(user_id.to_string())
            .or_insert(loaded)
            .clone())
    }

    pub async fn not_learned(&self, user_id: &str) -> Result<Vec<VocabularyEntry>, StoreError> {
        Ok(self
            .list(user_id)
            .await?
            .into_iter()
            .filter(|entry| !entry.is_learned)
            .collect())
    }

    /// Validates every word before writing any of them.
    pub async fn add(
        &self,
        user_id: &str,
        new_words: Vec<NewWord>,
    ) -> Result<Vec<VocabularyEntry>, WordStoreError> {
        let validated = new_words
            .iter()
            .map(|word| {
                Ok((
                    require_text("english", &word.english)?,
                    require_text("armenian", &word.armenian)?,
                ))
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;
        if validated.is_empty() {
            return Err(ValidationError::Required("words").into());
        }

        self.list(user_id).await?;

        let created = words::insert_words(&self.db, user_id, &validated, Utc::now()).await?;

        if let Some(entries) = self.cache.write().get_mut(user_id) {
            for entry in &created {
                entries.insert(0, entry.clone());
            }
        }

        tracing::info!(user_id, count = created.len(), "words added");
        Ok(created)
    }

    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        patch: WordPatch,
    ) -> Result<WordUpdate, WordStoreError> {
        let current = self
            .list(user_id)
            .await?
            .into_iter()
            .find(|entry| entry.id == id)
            .ok_or(WordStoreError::NotFound)?;

        let mut updated = current.clone();
        if let Some(english) = non_empty(patch.english.as_deref()) {
            updated.english_text = english;
        }
        if let Some(armenian) = non_empty(patch.armenian.as_deref()) {
            updated.armenian_text = armenian;
        }
        if let Some(is_learned) = patch.is_learned {
            updated.is_learned = is_learned;
        }

        if !words::update_word(&self.db, user_id, &updated).await? {
            self.invalidate(user_id);
            return Err(WordStoreError::NotFound);
        }

        if let Some(entries) = self.cache.write().get_mut(user_id) {
            if let Some(slot) = entries.iter_mut().find(|entry| entry.id == id) {
                *slot = updated.clone();
            }
        }

        Ok(WordUpdate {
            became_learned: !current.is_learned && updated.is_learned,
            entry: updated,
        })
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> Result<(), WordStoreError> {
        if !words::delete_word(&self.db, user_id, id).await? {
            return Err(WordStoreError::NotFound);
        }
        if let Some(entries) = self.cache.write().get_mut(user_id) {
            entries.retain(|entry| entry.id != id);
        }
        Ok(())
    }

    pub fn invalidate(&self, user_id: &str) {
        self.cache.write().remove(user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> WordStore {
        WordStore::new(Database::connect("sqlite::memory:").await.unwrap())
    }

    fn word(english: &str, armenian: &str) -> NewWord {
        NewWord {
            english: english.to_string(),
            armenian: armenian.to_string(),
        }
    }

    #[tokio::test]
    async fn add_trims_and_lists_newest_first() {
        let store = store().await;
        store.add("u", vec![word(" cat ", "կատու")]).await.unwrap();
        store.add("u", vec![word("dog", " շուն")]).await.unwrap();

        let listed = store.list("u").await.unwrap();
        assert_eq!(listed[0].english_text, "dog");
        assert_eq!(listed[0].armenian_text, "շուն");
        assert_eq!(listed[1].english_text, "cat");

        store.invalidate("u");
        let reloaded = store.list("u").await.unwrap();
        assert_eq!(reloaded, listed);
    }

    #[tokio::test]
    async fn blank_field_rejects_whole_batch() {
        let store = store().await;
        let err = store
            .add("u", vec![word("cat", "կատու"), word("dog", "  ")])
            .await
            .unwrap_err();
        assert!(matches!(err, WordStoreError::Validation(ValidationError::Required("armenian"))));
        assert!(store.list("u").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_insert_rolls_back_whole_batch() {
        let store = store().await;
        sqlx::query(
            r#"
            CREATE TRIGGER "reject_boom" BEFORE INSERT ON "words"
            WHEN NEW."english" = 'boom'
            BEGIN SELECT RAISE(ABORT, 'rejected'); END
            "#,
        )
        .execute(store.db.pool())
        .await
        .unwrap();

        let result = store.add("u", vec![word("cat", "կատու"), word("boom", "պայթյուն")]).await;
        assert!(matches!(result, Err(WordStoreError::Store(_))));

        let in_db = words::list_words(&store.db, "u").await.unwrap();
        assert!(in_db.is_empty());
        assert_eq!(store.list("u").await.unwrap(), in_db);
    }

    #[tokio::test]
    async fn update_reports_learned_flip_once() {
        let store = store().await;
        let created = store.add("u", vec![word("cat", "կատու")]).await.unwrap();
        let id = &created[0].id;

        let learn = WordPatch {
            english: Some(String::new()),
            is_learned: Some(true),
            ..WordPatch::default()
        };
        let first = store.update("u", id, learn.clone()).await.unwrap();
        assert!(first.became_learned);
        assert_eq!(first.entry.english_text, "cat");

        let second = store.update("u", id, learn).await.unwrap();
        assert!(!second.became_learned);
        assert!(store.not_learned("u").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_users_cannot_touch_entries() {
        let store = store().await;
        let created = store.add("owner", vec![word("cat", "կատու")]).await.unwrap();
        let id = &created[0].id;

        assert!(matches!(
            store.update("intruder", id, WordPatch::default()).await,
            Err(WordStoreError::NotFound)
        ));
        assert!(matches!(store.delete("intruder", id).await, Err(WordStoreError::NotFound)));
        store.delete("owner", id).await.unwrap();
        assert!(store.list("owner").await.unwrap().is_empty());
    }
}
