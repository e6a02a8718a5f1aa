//! Multiple-choice practice sessions over a learner's not-yet-learned words.
//!
//! The engine is pure: randomness and time come in as arguments, so the
//! session rules can be driven deterministically from tests.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::db::rows::VocabularyEntry;
use crate::response::AppError;

pub const OPTION_COUNT: usize = 4;
pub const DEFAULT_SESSION_SIZE: usize = 5;
pub const REMINDER_SESSION_SIZE: usize = 3;

/// Padding for option lists when the learner owns too few words.
pub const FALLBACK_PHRASES: [&str; 16] = [
    "Բարև ձեզ",
    "Շնորհակալություն",
    "Ցտեսություն",
    "Ինչպես եք",
    "Լավ եմ",
    "Ներողություն",
    "Այո",
    "Ոչ",
    "Խնդրեմ",
    "Կարող եմ",
    "Չգիտեմ",
    "Օգնություն",
    "Ժամանակ",
    "Փող",
    "Տուն",
    "Աշխատանք",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PracticeError {
    #[error("no active practice session")]
    NoSession,
    #[error("answer the current item before moving on")]
    NotAnswered,
}

impl From<PracticeError> for AppError {
    fn from(err: PracticeError) -> Self {
        match err {
            PracticeError::NoSession => AppError::not_found(err.to_string()),
            PracticeError::NotAnswered => AppError::conflict(err.to_string()),
        }
    }
}

/// The correct translation plus up to three distractors from the rest of the
/// pool, padded from [`FALLBACK_PHRASES`], in random order.
pub fn generate_options<R: Rng + ?Sized>(
    correct: &VocabularyEntry,
    pool: &[VocabularyEntry],
    rng: &mut R,
) -> Vec<String> {
    let mut options = vec![correct.armenian_text.clone()];

    let mut candidates: Vec<&VocabularyEntry> =
        pool.iter().filter(|entry| entry.id != correct.id).collect();
    candidates.shuffle(rng);
    for candidate in candidates {
        if options.len() == OPTION_COUNT {
            break;
        }
        if !options.contains(&candidate.armenian_text) {
            options.push(candidate.armenian_text.clone());
        }
    }

    if options.len() < OPTION_COUNT {
        let mut fallback = FALLBACK_PHRASES.to_vec();
        fallback.shuffle(rng);
        for phrase in fallback {
            if options.len() == OPTION_COUNT {
                break;
            }
            if !options.iter().any(|option| option == phrase) {
                options.push(phrase.to_string());
            }
        }
    }

    options.shuffle(rng);
    options
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub correct: bool,
    pub correct_answer: String,
    pub correct_count: u32,
    pub total_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    pub correct_count: u32,
    pub total_count: u32,
    pub elapsed_seconds: u64,
    /// Completion time in the learner's timezone.
    #[serde(skip)]
    pub local_time: NaiveDateTime,
    pub learned_in_session: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Continue,
    Finished(SessionOutcome),
}

#[derive(Debug, Clone)]
pub struct PracticeSession {
    items: Vec<VocabularyEntry>,
    pool: Vec<VocabularyEntry>,
    index: usize,
    options: Vec<String>,
    selected: Option<String>,
    correct_count: u32,
    total_count: u32,
    started_at: DateTime<Utc>,
    utc_offset: Duration,
}

impl PracticeSession {
    /// `None` when there is nothing left to practice.
    pub fn start<R: Rng + ?Sized>(
        pool: Vec<VocabularyEntry>,
        requested: usize,
        utc_offset_minutes: i32,
        started_at: DateTime<Utc>,
        rng: &mut R,
    ) -> Option<Self> {
        if pool.is_empty() || requested == 0 {
            return None;
        }
        let mut items = pool.clone();
        items.shuffle(rng);
        items.truncate(requested.min(pool.len()));
        let options = generate_options(&items[0], &pool, rng);

        Some(Self {
            items,
            pool,
            index: 0,
            options,
            selected: None,
            correct_count: 0,
            total_count: 0,
            started_at,
            utc_offset: Duration::minutes(i64::from(utc_offset_minutes)),
        })
    }

    pub fn items(&self) -> &[VocabularyEntry] {
        &self.items
    }

    pub fn current(&self) -> &VocabularyEntry {
        &self.items[self.index]
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn is_answered(&self) -> bool {
        self.selected.is_some()
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    pub fn learned_in_session(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.is_learned)
            .map(|item| item.id.clone())
            .collect()
    }

    /// `None` when the current item already has an answer.
    pub fn submit_answer(&mut self, choice: &str) -> Option<AnswerResult> {
        if self.selected.is_some() {
            return None;
        }
        let correct_answer = self.items.get(self.index)?.armenian_text.clone();
        let correct = choice == correct_answer;
        self.selected = Some(choice.to_string());
        self.total_count += 1;
        if correct {
            self.correct_count += 1;
        }
        Some(AnswerResult {
            correct,
            correct_answer,
            correct_count: self.correct_count,
            total_count: self.total_count,
        })
    }

    pub fn next<R: Rng + ?Sized>(
        &mut self,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Step, PracticeError> {
        if self.selected.is_none() {
            return Err(PracticeError::NotAnswered);
        }
        Ok(self.advance(now, rng))
    }

    /// Counts as a miss unless the item was already answered.
    pub fn skip<R: Rng + ?Sized>(&mut self, now: DateTime<Utc>, rng: &mut R) -> Step {
        if self.selected.is_none() {
            self.total_count += 1;
        }
        self.advance(now, rng)
    }

    /// Counts as a hit unless the item was already answered, and flags the
    /// session copy of the entry as learned.
    pub fn already_know<R: Rng + ?Sized>(&mut self, now: DateTime<Utc>, rng: &mut R) -> Step {
        if self.selected.is_none() {
            self.total_count += 1;
            self.correct_count += 1;
            let index = self.index;
            self.items[index].is_learned = true;
        }
        self.advance(now, rng)
    }

    fn advance<R: Rng + ?Sized>(&mut self, now: DateTime<Utc>, rng: &mut R) -> Step {
        self.index += 1;
        self.selected = None;
        if self.index >= self.items.len() {
            self.options.clear();
            return Step::Finished(self.outcome(now));
        }
        self.options = generate_options(&self.items[self.index], &self.pool, rng);
        Step::Continue
    }

    fn outcome(&self, now: DateTime<Utc>) -> SessionOutcome {
        let elapsed = (now - self.started_at).num_seconds().max(0) as u64;
        SessionOutcome {
            correct_count: self.correct_count,
            total_count: self.total_count,
            elapsed_seconds: elapsed,
            local_time: (now + self.utc_offset).naive_utc(),
            learned_in_session: self.learned_in_session(),
        }
    }

    pub fn view(&self) -> SessionView {
        let current = self.items.get(self.index);
        SessionView {
            active: true,
            index: self.index,
            total_items: self.items.len(),
            entry_id: current.map(|entry| entry.id.clone()),
            english: current.map(|entry| entry.english_text.clone()),
            options: self.options.clone(),
            answered: self.selected.is_some(),
            selected: self.selected.clone(),
            correct_answer: self
                .selected
                .as_ref()
                .and(current.map(|entry| entry.armenian_text.clone())),
            correct_count: self.correct_count,
            total_count: self.total_count,
            learned_in_session: self.learned_in_session(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub active: bool,
    pub index: usize,
    pub total_items: usize,
    pub entry_id: Option<String>,
    pub english: Option<String>,
    pub options: Vec<String>,
    pub answered: bool,
    pub selected: Option<String>,
    pub correct_answer: Option<String>,
    pub correct_count: u32,
    pub total_count: u32,
    pub learned_in_session: Vec<String>,
}

impl SessionView {
    pub fn inactive() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Continue(SessionView),
    Finished(SessionOutcome),
}

/// One in-memory session per learner. Starting a new session replaces the
/// previous one; a finished session is dropped.
#[derive(Default)]
pub struct PracticeSessions {
    sessions: RwLock<HashMap<String, PracticeSession>>,
}

impl PracticeSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(
        &self,
        user_id: &str,
        pool: Vec<VocabularyEntry>,
        requested: usize,
        utc_offset_minutes: i32,
    ) -> SessionView {
        let session = PracticeSession::start(
            pool,
            requested,
            utc_offset_minutes,
            Utc::now(),
            &mut rand::rng(),
        );
        let mut sessions = self.sessions.write();
        match session {
            Some(session) => {
                let view = session.view();
                sessions.insert(user_id.to_string(), session);
                view
            }
            None => {
                sessions.remove(user_id);
                SessionView::inactive()
            }
        }
    }

    pub fn view(&self, user_id: &str) -> SessionView {
        self.sessions
            .read()
            .get(user_id)
            .map(PracticeSession::view)
            .unwrap_or_else(SessionView::inactive)
    }

    /// `Ok(None)` when the item was already answered.
    pub fn answer(&self, user_id: &str, choice: &str) -> Result<Option<AnswerResult>, PracticeError> {
        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(user_id).ok_or(PracticeError::NoSession)?;
        Ok(session.submit_answer(choice))
    }

    pub fn next(&self, user_id: &str) -> Result<Advance, PracticeError> {
        self.step(user_id, |session, now, rng| session.next(now, rng))
    }

    pub fn skip(&self, user_id: &str) -> Result<Advance, PracticeError> {
        self.step(user_id, |session, now, rng| Ok(session.skip(now, rng)))
    }

    pub fn already_know(&self, user_id: &str) -> Result<Advance, PracticeError> {
        self.step(user_id, |session, now, rng| Ok(session.already_know(now, rng)))
    }

    fn step<F>(&self, user_id: &str, action: F) -> Result<Advance, PracticeError>
    where
        F: FnOnce(
            &mut PracticeSession,
            DateTime<Utc>,
            &mut rand::rngs::ThreadRng,
        ) -> Result<Step, PracticeError>,
    {
        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(user_id).ok_or(PracticeError::NoSession)?;
        match action(session, Utc::now(), &mut rand::rng())? {
            Step::Continue => Ok(Advance::Continue(session.view())),
            Step::Finished(outcome) => {
                sessions.remove(user_id);
                Ok(Advance::Finished(outcome))
            }
        }
    }
}
