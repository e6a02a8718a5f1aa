//! Static word lists learners can import in bulk.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const CATALOG_JSON: &str = include_str!("../../data/curated_vocabulary.json");

pub const LEVELS: [&str; 3] = ["beginner", "intermediate", "advanced"];
pub const CATEGORIES: [&str; 5] = ["travel", "food", "emotions", "daily", "work"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuratedWord {
    pub english: String,
    pub armenian: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub level: &'static str,
    pub category: &'static str,
    pub word_count: usize,
}

pub struct CuratedCatalog {
    lists: HashMap<String, HashMap<String, Vec<CuratedWord>>>,
}

impl CuratedCatalog {
    pub fn load() -> Result<Self, serde_json::Error> {
        Ok(Self {
            lists: serde_json::from_str(CATALOG_JSON)?,
        })
    }

    pub fn words(&self, level: &str, category: &str) -> Option<&[CuratedWord]> {
        self.lists
            .get(level)
            .and_then(|categories| categories.get(category))
            .map(Vec::as_slice)
    }

    pub fn summary(&self) -> Vec<CategorySummary> {
        LEVELS
            .iter()
            .flat_map(|level| CATEGORIES.iter().map(move |category| (*level, *category)))
            .filter_map(|(level, category)| {
                self.words(level, category).map(|words| CategorySummary {
                    level,
                    category,
                    word_count: words.len(),
                })
            })
            .collect()
    }

    /// The list, or just the requested English words from it when a subset
    /// is given. Unknown words in the subset are ignored.
    pub fn select(&self, level: &str, category: &str, subset: Option<&[String]>) -> Option<Vec<CuratedWord>> {
        let words = self.words(level, category)?;
        Some(match subset {
            None => words.to_vec(),
            Some(wanted) => words
                .iter()
                .filter(|word| wanted.iter().any(|w| w.eq_ignore_ascii_case(&word.english)))
                .cloned()
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_level_and_category_has_twenty_words() {
        let catalog = CuratedCatalog::load().unwrap();
        let summary = catalog.summary();
        assert_eq!(summary.len(), LEVELS.len() * CATEGORIES.len());
        assert!(summary.iter().all(|s| s.word_count == 20));
    }

    #[test]
    fn subset_selection_matches_case_insensitively() {
        let catalog = CuratedCatalog::load().unwrap();
        let picked = catalog
            .select("beginner", "travel", Some(&["airport".to_string(), "nope".to_string()]))
            .unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].armenian, "Օդանավակայան");
        assert!(catalog.select("expert", "travel", None).is_none());
    }
}
