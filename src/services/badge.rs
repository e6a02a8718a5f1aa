use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::services::badge_store::{BadgeStore, BadgeStoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeCategory {
    Practice,
    Vocabulary,
    Streak,
    Achievement,
    Special,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatCounter {
    SessionsCompleted,
    PerfectScores,
    WordsAdded,
    WordsLearned,
    CurrentStreak,
    TextsAdded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    /// Earned once the counter reaches the badge's `max_progress`.
    Counter(StatCounter),
    /// Session finished before 08:00 local time.
    EarlyBird,
    /// Session finished at or after 22:00 local time.
    NightOwl,
    /// Session finished in under two minutes.
    SpeedDemon,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: BadgeCategory,
    pub rarity: BadgeRarity,
    pub max_progress: u32,
    #[serde(skip)]
    pub criterion: Criterion,
}

const fn badge(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    category: BadgeCategory,
    rarity: BadgeRarity,
    max_progress: u32,
    criterion: Criterion,
) -> BadgeDefinition {
    BadgeDefinition {
        id,
        name,
        description,
        icon,
        category,
        rarity,
        max_progress,
        criterion,
    }
}

use BadgeCategory as C;
use BadgeRarity as R;
use StatCounter as S;

pub static CATALOG: [BadgeDefinition; 16] = [
    badge("first-practice", "First Steps", "Complete your first practice session", "🎯", C::Practice, R::Common, 1, Criterion::Counter(S::SessionsCompleted)),
    badge("practice-warrior", "Practice Warrior", "Complete 10 practice sessions", "⚔️", C::Practice, R::Rare, 10, Criterion::Counter(S::SessionsCompleted)),
    badge("practice-master", "Practice Master", "Complete 50 practice sessions", "🏆", C::Practice, R::Epic, 50, Criterion::Counter(S::SessionsCompleted)),
    badge("practice-legend", "Practice Legend", "Complete 100 practice sessions", "👑", C::Practice, R::Legendary, 100, Criterion::Counter(S::SessionsCompleted)),
    badge("perfectionist", "Perfectionist", "Get a perfect score in practice", "💯", C::Achievement, R::Rare, 1, Criterion::Counter(S::PerfectScores)),
    badge("ace-student", "Ace Student", "Get 5 perfect scores", "🌟", C::Achievement, R::Epic, 5, Criterion::Counter(S::PerfectScores)),
    badge("word-collector", "Word Collector", "Add 25 words to vocabulary", "📚", C::Vocabulary, R::Common, 25, Criterion::Counter(S::WordsAdded)),
    badge("vocabulary-builder", "Vocabulary Builder", "Add 100 words to vocabulary", "🏗️", C::Vocabulary, R::Rare, 100, Criterion::Counter(S::WordsAdded)),
    badge("word-master", "Word Master", "Learn 50 words (mark as learned)", "🧠", C::Vocabulary, R::Epic, 50, Criterion::Counter(S::WordsLearned)),
    badge("streak-starter", "Streak Starter", "Practice 3 days in a row", "🔥", C::Streak, R::Common, 3, Criterion::Counter(S::CurrentStreak)),
    badge("streak-keeper", "Streak Keeper", "Practice 7 days in a row", "🔥🔥", C::Streak, R::Rare, 7, Criterion::Counter(S::CurrentStreak)),
    badge("streak-legend", "Streak Legend", "Practice 30 days in a row", "🔥🔥🔥", C::Streak, R::Legendary, 30, Criterion::Counter(S::CurrentStreak)),
    badge("early-bird", "Early Bird", "Practice before 8 AM", "🌅", C::Special, R::Rare, 1, Criterion::EarlyBird),
    badge("night-owl", "Night Owl", "Practice after 10 PM", "🦉", C::Special, R::Rare, 1, Criterion::NightOwl),
    badge("speed-demon", "Speed Demon", "Complete practice in under 2 minutes", "⚡", C::Special, R::Epic, 1, Criterion::SpeedDemon),
    badge("text-explorer", "Text Explorer", "Add 5 practice texts", "📖", C::Vocabulary, R::Rare, 5, Criterion::Counter(S::TextsAdded)),
];

const SPEED_DEMON_SECS: u64 = 120;
const EARLY_BIRD_HOUR: u32 = 8;
const NIGHT_OWL_HOUR: u32 = 22;

pub fn find_definition(id: &str) -> Option<&'static BadgeDefinition> {
    CATALOG.iter().find(|def| def.id == id)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
    pub practice_sessions_completed: u64,
    pub total_words_learned: u64,
    pub perfect_scores: u64,
    pub current_streak: u64,
    pub longest_streak: u64,
    /// Seconds.
    pub total_practice_time: u64,
    pub words_added: u64,
    pub texts_added: u64,
    pub last_practice_date: Option<NaiveDate>,
}

impl UserStats {
    pub fn counter(&self, counter: StatCounter) -> u64 {
        match counter {
            StatCounter::SessionsCompleted => self.practice_sessions_completed,
            StatCounter::PerfectScores => self.perfect_scores,
            StatCounter::WordsAdded => self.words_added,
            StatCounter::WordsLearned => self.total_words_learned,
            StatCounter::CurrentStreak => self.current_streak,
            StatCounter::TextsAdded => self.texts_added,
        }
    }

    /// Same day keeps the streak, the next day extends it, any gap restarts it.
    fn record_practice_day(&mut self, today: NaiveDate) {
        self.current_streak = match self.last_practice_date {
            Some(last) if last == today => self.current_streak.max(1),
            Some(last) if last.succ_opt() == Some(today) => self.current_streak + 1,
            _ => 1,
        };
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.last_practice_date = Some(today);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeAward {
    pub badge_id: String,
    pub earned_at: DateTime<Utc>,
    pub progress: u32,
    pub is_new: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BadgeState {
    pub stats: UserStats,
    pub awards: Vec<BadgeAward>,
    /// Display progress of badges not yet earned.
    pub progress: BTreeMap<String, u32>,
}

impl BadgeState {
    pub fn has_award(&self, badge_id: &str) -> bool {
        self.awards.iter().any(|award| award.badge_id == badge_id)
    }

    fn grant(&mut self, def: &BadgeDefinition, now: DateTime<Utc>) -> Option<BadgeAward> {
        if self.has_award(def.id) {
            return None;
        }
        let award = BadgeAward {
            badge_id: def.id.to_string(),
            earned_at: now,
            progress: def.max_progress,
            is_new: true,
        };
        self.progress.remove(def.id);
        self.awards.push(award.clone());
        Some(award)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BadgeEvent {
    SessionCompleted {
        correct: u32,
        total: u32,
        duration_secs: u64,
        /// Wall-clock time in the learner's timezone.
        local_time: NaiveDateTime,
    },
    WordsAdded(u32),
    WordsLearned(u32),
    TextsAdded(u32),
}

/// Applies one event and returns the badges it earned, in catalog order.
pub fn apply_event(state: &mut BadgeState, event: &BadgeEvent, now: DateTime<Utc>) -> Vec<BadgeAward> {
    match event {
        BadgeEvent::SessionCompleted {
            correct,
            total,
            duration_secs,
            local_time,
        } => {
            let stats = &mut state.stats;
            stats.practice_sessions_completed += 1;
            stats.total_practice_time += duration_secs;
            if *total > 0 && correct == total {
                stats.perfect_scores += 1;
            }
            stats.record_practice_day(local_time.date());
        }
        BadgeEvent::WordsAdded(n) => state.stats.words_added += u64::from(*n),
        BadgeEvent::WordsLearned(n) => state.stats.total_words_learned += u64::from(*n),
        BadgeEvent::TextsAdded(n) => state.stats.texts_added += u64::from(*n),
    }

    let mut earned = Vec::new();
    for def in CATALOG.iter() {
        if state.has_award(def.id) {
            continue;
        }
        match def.criterion {
            Criterion::Counter(counter) => {
                let value = state.stats.counter(counter);
                if value >= u64::from(def.max_progress) {
                    earned.extend(state.grant(def, now));
                } else {
                    let shown = value.min(u64::from(def.max_progress.saturating_sub(1)));
                    state.progress.insert(def.id.to_string(), shown as u32);
                }
            }
            special => {
                if let BadgeEvent::SessionCompleted {
                    duration_secs,
                    local_time,
                    ..
                } = event
                {
                    let qualifies = match special {
                        Criterion::EarlyBird => local_time.hour() < EARLY_BIRD_HOUR,
                        Criterion::NightOwl => local_time.hour() >= NIGHT_OWL_HOUR,
                        Criterion::SpeedDemon => *duration_secs < SPEED_DEMON_SECS,
                        Criterion::Counter(_) => false,
                    };
                    if qualifies {
                        earned.extend(state.grant(def, now));
                    }
                }
            }
        }
    }
    earned
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeStatus {
    #[serde(flatten)]
    pub definition: BadgeDefinition,
    pub earned: bool,
    pub earned_at: Option<DateTime<Utc>>,
    pub progress: u32,
    pub is_new: bool,
}

/// Catalog details for freshly earned awards, for display.
pub fn describe_awards(awards: &[BadgeAward]) -> Vec<BadgeStatus> {
    awards
        .iter()
        .filter_map(|award| {
            find_definition(&award.badge_id).map(|def| BadgeStatus {
                definition: def.clone(),
                earned: true,
                earned_at: Some(award.earned_at),
                progress: award.progress,
                is_new: award.is_new,
            })
        })
        .collect()
}

/// Owns the load-modify-save cycle for badge state. Store calls run on the
/// blocking pool; read-modify-write cycles are serialized per user.
pub struct BadgeEvaluator {
    store: Arc<dyn BadgeStore>,
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl BadgeEvaluator {
    pub fn new(store: Arc<dyn BadgeStore>) -> Self {
        Self {
            store,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.user_locks.lock().entry(user_id.to_string()).or_default())
    }

    async fn with_store<T, F>(&self, work: F) -> Result<T, BadgeStoreError>
    where
        F: FnOnce(&dyn BadgeStore) -> Result<T, BadgeStoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || work(store.as_ref())).await?
    }

    /// Best effort: storage failures are logged and never surfaced.
    pub async fn record(&self, user_id: &str, event: BadgeEvent) -> Vec<BadgeAward> {
        let lock = self.user_lock(user_id);
        let owner = user_id.to_string();
        let result = self
            .with_store(move |store| {
                let _guard = lock.lock();
                let mut state = store.load(&owner)?.unwrap_or_default();
                let earned = apply_event(&mut state, &event, Utc::now());
                if let Err(err) = store.save(&owner, &state) {
                    tracing::warn!(user_id = %owner, error = %err, "failed to persist badge state");
                }
                Ok(earned)
            })
            .await;

        let earned = match result {
            Ok(earned) => earned,
            Err(err) => {
                tracing::warn!(user_id, error = %err, "badge state unavailable, dropping event");
                return Vec::new();
            }
        };

        if !earned.is_empty() {
            let ids: Vec<&str> = earned.iter().map(|award| award.badge_id.as_str()).collect();
            tracing::info!(user_id, badges = ?ids, "badges earned");
        }

        earned
    }

    async fn load(&self, user_id: &str) -> Result<BadgeState, BadgeStoreError> {
        let owner = user_id.to_string();
        self.with_store(move |store| Ok(store.load(&owner)?.unwrap_or_default()))
            .await
    }

    pub async fn stats(&self, user_id: &str) -> Result<UserStats, BadgeStoreError> {
        Ok(self.load(user_id).await?.stats)
    }

    pub async fn overview(&self, user_id: &str) -> Result<Vec<BadgeStatus>, BadgeStoreError> {
        let state = self.load(user_id).await?;
        Ok(CATALOG
            .iter()
            .map(|def| {
                let award = state.awards.iter().find(|award| award.badge_id == def.id);
                BadgeStatus {
                    definition: def.clone(),
                    earned: award.is_some(),
                    earned_at: award.map(|award| award.earned_at),
                    progress: award
                        .map(|award| award.progress)
                        .or_else(|| state.progress.get(def.id).copied())
                        .unwrap_or(0),
                    is_new: award.is_some_and(|award| award.is_new),
                }
            })
            .collect())
    }

    /// Clears the `is_new` flag. Returns how many awards were updated.
    pub async fn mark_seen(&self, user_id: &str) -> Result<usize, BadgeStoreError> {
        let lock = self.user_lock(user_id);
        let owner = user_id.to_string();
        self.with_store(move |store| {
            let _guard = lock.lock();
            let Some(mut state) = store.load(&owner)? else {
                return Ok(0);
            };
            let mut cleared = 0;
            for award in state.awards.iter_mut().filter(|award| award.is_new) {
                award.is_new = false;
                cleared += 1;
            }
            if cleared > 0 {
                store.save(&owner, &state)?;
            }
            Ok(cleared)
        })
        .await
    }
}
