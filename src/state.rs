use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use thiserror::Error;

use crate::config::Config;
use crate::db::Database;
use crate::response::AppError;
use crate::services::admin_access::AdminAccess;
use crate::services::badge::BadgeEvaluator;
use crate::services::badge_store::{BadgeStore, FileBadgeStore};
use crate::services::chat::ChatGateway;
use crate::services::curated::CuratedCatalog;
use crate::services::dictionary::{DictionaryClient, LookupGate};
use crate::services::extractor::{ExtractorError, VocabularyExtractor};
use crate::services::practice::PracticeSessions;
use crate::services::reminder::ReminderService;
use crate::services::translation::TranslationGateway;
use crate::services::word_store::WordStore;

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum StateError {
    #[error("curated catalog: {0}")]
    Catalog(#[from] serde_json::Error),
    #[error(transparent)]
    Extractor(#[from] ExtractorError),
}

/// Everything that needs the relational store.
pub struct DataServices {
    pub db: Database,
    pub words: WordStore,
    pub admin: AdminAccess,
    pub reminders: Arc<ReminderService>,
}

impl DataServices {
    pub fn new(db: Database) -> Self {
        Self {
            words: WordStore::new(db.clone()),
            admin: AdminAccess::new(db.clone()),
            reminders: Arc::new(ReminderService::new(db.clone())),
            db,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    config: Arc<Config>,
    data: Option<Arc<DataServices>>,
    practice: Arc<PracticeSessions>,
    badges: Arc<BadgeEvaluator>,
    translation: TranslationGateway,
    chat: ChatGateway,
    dictionary: DictionaryClient,
    lookup_gate: Arc<LookupGate>,
    curated: Arc<CuratedCatalog>,
    extractor: Arc<VocabularyExtractor>,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Option<Database>,
        badge_store: Arc<dyn BadgeStore>,
    ) -> Result<Self, StateError> {
        let client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Ok(Self {
            started_at: Instant::now(),
            data: db.map(|db| Arc::new(DataServices::new(db))),
            practice: Arc::new(PracticeSessions::new()),
            badges: Arc::new(BadgeEvaluator::new(badge_store)),
            translation: TranslationGateway::new(config.translate.clone(), client.clone()),
            chat: ChatGateway::new(config.chat.clone(), client.clone()),
            dictionary: DictionaryClient::new(config.dictionary.clone(), client),
            lookup_gate: Arc::new(LookupGate::new()),
            curated: Arc::new(CuratedCatalog::load()?),
            extractor: Arc::new(VocabularyExtractor::new()?),
            config: Arc::new(config),
        })
    }

    /// Badge state on disk under the configured directory.
    pub fn with_file_badges(config: Config, db: Option<Database>) -> Result<Self, StateError> {
        let store = Arc::new(FileBadgeStore::new(config.badge_store_dir.clone()));
        Self::new(config, db, store)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn data_opt(&self) -> Option<Arc<DataServices>> {
        self.data.clone()
    }

    pub fn data(&self) -> Result<Arc<DataServices>, AppError> {
        self.data.clone().ok_or_else(|| {
            AppError::config(StatusCode::SERVICE_UNAVAILABLE, "Database is not configured")
        })
    }

    pub fn practice(&self) -> &PracticeSessions {
        &self.practice
    }

    pub fn badges(&self) -> &BadgeEvaluator {
        &self.badges
    }

    pub fn translation(&self) -> &TranslationGateway {
        &self.translation
    }

    pub fn chat(&self) -> &ChatGateway {
        &self.chat
    }

    pub fn dictionary(&self) -> &DictionaryClient {
        &self.dictionary
    }

    pub fn lookup_gate(&self) -> &LookupGate {
        &self.lookup_gate
    }

    pub fn curated(&self) -> &CuratedCatalog {
        &self.curated
    }

    pub fn extractor(&self) -> &VocabularyExtractor {
        &self.extractor
    }
}
