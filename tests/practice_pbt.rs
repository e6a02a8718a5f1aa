use std::collections::HashSet;

use chrono::{Duration, Utc};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use bararan_backend::db::rows::VocabularyEntry;
use bararan_backend::services::practice::{
    generate_options, PracticeSession, Step, FALLBACK_PHRASES, OPTION_COUNT,
};

fn entry(i: usize, armenian: &str) -> VocabularyEntry {
    VocabularyEntry {
        id: i.to_string(),
        english_text: format!("word{i}"),
        armenian_text: armenian.to_string(),
        date_added: Utc::now(),
        is_learned: false,
    }
}

fn pool_strategy() -> impl Strategy<Value = Vec<VocabularyEntry>> {
    // A small alphabet of translations forces duplicates and fallback clashes.
    let translations = prop::sample::select(vec![
        "կատու", "շուն", "տուն", "Տուն", "Ջուր", "Հաց", "բարև", "գիրք",
    ]);
    prop::collection::vec(translations, 1..12).prop_map(|names| {
        names
            .into_iter()
            .enumerate()
            .map(|(i, name)| entry(i, name))
            .collect()
    })
}

#[derive(Debug, Clone)]
enum Action {
    AnswerRight,
    AnswerWrong,
    Next,
    Skip,
    Know,
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::AnswerRight),
        Just(Action::AnswerWrong),
        Just(Action::Next),
        Just(Action::Skip),
        Just(Action::Know),
    ]
}

proptest! {
    #[test]
    fn options_hold_the_answer_once_and_never_repeat(pool in pool_strategy(), seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        for correct in &pool {
            let options = generate_options(correct, &pool, &mut rng);
            prop_assert_eq!(options.len(), OPTION_COUNT);
            let distinct: HashSet<_> = options.iter().collect();
            prop_assert_eq!(distinct.len(), options.len());
            prop_assert!(options.contains(&correct.armenian_text));
            for option in &options {
                let from_pool = pool.iter().any(|entry| &entry.armenian_text == option);
                let fallback = FALLBACK_PHRASES.contains(&option.as_str());
                prop_assert!(from_pool || fallback);
            }
        }
    }

    #[test]
    fn session_items_are_distinct_and_capped(
        pool in pool_strategy(),
        requested in 1usize..10,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let session = PracticeSession::start(pool.clone(), requested, 0, Utc::now(), &mut rng).unwrap();
        prop_assert_eq!(session.items().len(), requested.min(pool.len()));
        let ids: HashSet<_> = session.items().iter().map(|item| item.id.clone()).collect();
        prop_assert_eq!(ids.len(), session.items().len());
    }

    #[test]
    fn counters_stay_consistent_under_any_actions(
        pool in pool_strategy(),
        actions in prop::collection::vec(action_strategy(), 1..40),
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let started = Utc::now();
        let mut session = PracticeSession::start(pool.clone(), pool.len(), 0, started, &mut rng).unwrap();
        let items = session.items().len() as u32;
        let mut finished = None;

        for action in actions {
            let now = started + Duration::seconds(10);
            let step = match action {
                Action::AnswerRight => {
                    let right = session.current().armenian_text.clone();
                    session.submit_answer(&right);
                    Step::Continue
                }
                Action::AnswerWrong => {
                    session.submit_answer("not a translation");
                    Step::Continue
                }
                Action::Next => session.next(now, &mut rng).unwrap_or(Step::Continue),
                Action::Skip => session.skip(now, &mut rng),
                Action::Know => session.already_know(now, &mut rng),
            };

            prop_assert!(session.correct_count() <= session.total_count());
            prop_assert!(session.total_count() <= items);

            if let Step::Finished(outcome) = step {
                finished = Some(outcome);
                break;
            }
        }

        if let Some(outcome) = finished {
            prop_assert_eq!(outcome.total_count, items);
            prop_assert!(outcome.correct_count <= outcome.total_count);
            prop_assert_eq!(outcome.elapsed_seconds, 10);
        }
    }
}
