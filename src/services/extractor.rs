//! Picks the most useful English words out of free text for the learner to
//! add to their vocabulary.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const LEXICON_JSON: &str = include_str!("../../data/extractor_lexicon.json");
const MAX_WORDS: usize = 3;
const MIN_WORD_LEN: usize = 3;
const MAX_CONTEXT_CHARS: usize = 100;

const COMPLEX_MARKERS: [&str; 12] = [
    "tion", "sion", "ment", "ness", "ity", "ous", "ful", "less", "able", "ive", "ary", "ory",
];

const CONTEXT_PATTERNS: [&str; 17] = [
    r"(?i)from\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)",
    r"(?i)in\s+(?:a\s+)?([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)",
    r"(?i)on\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)",
    r"(?i)(Medium)\s+article",
    r"(?i)(Guardian)\s+article",
    r"(?i)(article)",
    r"(?i)(book)",
    r"(?i)(news)",
    r"(?i)(blog)",
    r"(?i)(website)",
    r"(?i)(app)",
    r"(?i)(Medium)",
    r"(?i)(Guardian)",
    r"(?i)(Times)",
    r"(?i)(Post)",
    r"(?i)(BBC)",
    r"(?i)(CNN)",
];

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("invalid extractor lexicon: {0}")]
    Lexicon(#[from] serde_json::Error),
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Deserialize)]
struct Lexicon {
    common: Vec<String>,
    translations: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedWord {
    pub word: String,
    pub translation: String,
    pub context: String,
}

pub struct VocabularyExtractor {
    common: HashSet<String>,
    translations: HashMap<String, String>,
    token: Regex,
    context_patterns: Vec<Regex>,
}

impl VocabularyExtractor {
    pub fn new() -> Result<Self, ExtractorError> {
        let lexicon: Lexicon = serde_json::from_str(LEXICON_JSON)?;
        let context_patterns = CONTEXT_PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            common: lexicon.common.into_iter().collect(),
            translations: lexicon.translations,
            token: Regex::new(r"[a-zA-Z]+(?:-[a-zA-Z]+)*")?,
            context_patterns,
        })
    }

    pub fn extract(&self, input: &str) -> Vec<ExtractedWord> {
        let mut seen = HashSet::new();
        let mut scored: Vec<(String, i64)> = Vec::new();

        for token in self.token.find_iter(input).map(|m| m.as_str()) {
            if token.len() < MIN_WORD_LEN {
                continue;
            }
            let lemma = lemmatize(token);
            if !seen.insert(lemma.clone()) {
                continue;
            }
            let score = self.score(token);
            if score > 0 {
                scored.push((lemma, score));
            }
        }

        if scored.is_empty() {
            return Vec::new();
        }

        // Stable: equal scores keep their order of appearance.
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.truncate(MAX_WORDS);

        let context = self.context(input);
        scored
            .into_iter()
            .map(|(lemma, _)| ExtractedWord {
                translation: self.translations.get(&lemma).cloned().unwrap_or_default(),
                word: lemma,
                context: context.clone(),
            })
            .collect()
    }

    fn score(&self, word: &str) -> i64 {
        let lower = word.to_lowercase();
        if self.common.contains(&lower) {
            return 0;
        }
        let mut score = word.len() as i64;
        if self.translations.contains_key(&lower) {
            score += 15;
        }
        if COMPLEX_MARKERS.iter().any(|marker| lower.contains(marker)) {
            score += 8;
        }
        if word.len() < 4 {
            score -= 5;
        }
        score
    }

    fn context(&self, input: &str) -> String {
        let found = self.context_patterns.iter().find_map(|pattern| {
            pattern
                .captures(input)
                .and_then(|caps| caps.get(1).or_else(|| caps.get(0)))
                .map(|m| m.as_str().to_string())
        });
        truncate(found.as_deref().unwrap_or(input))
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() > MAX_CONTEXT_CHARS {
        let mut short: String = text.chars().take(MAX_CONTEXT_CHARS - 3).collect();
        short.push_str("...");
        short
    } else {
        text.to_string()
    }
}

/// Strips common inflections: `running` -> `run`, `walked` -> `walk`.
pub fn lemmatize(word: &str) -> String {
    let lower = word.to_lowercase();
    let len = lower.len();

    if lower.ends_with("ing") && len > 4 {
        let base = &lower[..len - 3];
        let bytes = base.as_bytes();
        if bytes.len() > 2 && bytes[bytes.len() - 1] == bytes[bytes.len() - 2] {
            return base[..base.len() - 1].to_string();
        }
        return base.to_string();
    }
    if lower.ends_with("ed") && len > 3 {
        return lower[..len - 2].to_string();
    }
    if lower.ends_with('s') && len > 2 && !lower.ends_with("ss") {
        return lower[..len - 1].to_string();
    }
    if lower.ends_with("ly") && len > 3 {
        return lower[..len - 2].to_string();
    }
    lower
}
