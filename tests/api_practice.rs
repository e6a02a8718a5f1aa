use std::collections::HashMap;

use axum::http::StatusCode;
use serde_json::{json, Value};

mod common;

use common::{token, TestApp};

fn translations() -> HashMap<&'static str, &'static str> {
    HashMap::from([("cat", "կատու"), ("dog", "շուն"), ("house", "տուն")])
}

async fn seed_animals(app: &TestApp, auth: &str) {
    let words: Vec<Value> = translations()
        .into_iter()
        .map(|(english, armenian)| json!({ "english": english, "armenian": armenian }))
        .collect();
    let (status, _) = app.post("/api/words", auth, json!({ "words": words })).await;
    assert_eq!(status, StatusCode::CREATED);
}

fn badge_ids(body: &Value) -> Vec<String> {
    body["data"]["newBadges"]
        .as_array()
        .map(|badges| {
            badges
                .iter()
                .map(|badge| badge["id"].as_str().unwrap().to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Answers every item, picking the right translation only where `right`
/// says so, and returns the final step response.
async fn play(app: &TestApp, auth: &str, mut right: impl FnMut(&str) -> bool) -> Value {
    let lookup = translations();
    let (_, mut session) = app.get("/api/practice", auth).await;
    loop {
        let english = session["data"]["english"].as_str().unwrap().to_string();
        let correct = lookup[english.as_str()];
        let choice = if right(&english) {
            correct.to_string()
        } else {
            session["data"]["options"]
                .as_array()
                .unwrap()
                .iter()
                .map(|option| option.as_str().unwrap())
                .find(|option| *option != correct)
                .unwrap()
                .to_string()
        };

        let (status, answer) = app
            .post("/api/practice/answer", auth, json!({ "choice": choice }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(answer["data"]["accepted"], true);
        assert_eq!(answer["data"]["result"]["correctAnswer"], correct);

        let (status, step) = app.post("/api/practice/next", auth, json!({})).await;
        assert_eq!(status, StatusCode::OK);
        if step["data"]["finished"] == true {
            return step;
        }
        session = json!({ "data": step["data"]["session"] });
    }
}

#[tokio::test]
async fn three_word_session_scores_one_of_three() {
    let app = TestApp::new().await;
    let alice = token("alice");
    seed_animals(&app, &alice).await;

    let (status, body) = app.post("/api/practice/start", &alice, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["active"], true);
    assert_eq!(body["data"]["totalItems"], 3);
    assert_eq!(body["data"]["options"].as_array().unwrap().len(), 4);

    let finished = play(&app, &alice, |english| english == "cat").await;
    assert_eq!(finished["data"]["summary"]["correctCount"], 1);
    assert_eq!(finished["data"]["summary"]["totalCount"], 3);
    assert!(badge_ids(&finished).contains(&"first-practice".to_string()));
    assert!(!badge_ids(&finished).contains(&"perfectionist".to_string()));

    let (_, body) = app.get("/api/practice", &alice).await;
    assert_eq!(body["data"]["active"], false);

    let (_, stats) = app.get("/api/badges/stats", &alice).await;
    assert_eq!(stats["data"]["practiceSessionsCompleted"], 1);
    assert_eq!(stats["data"]["currentStreak"], 1);
}

#[tokio::test]
async fn perfectionist_is_awarded_once() {
    let app = TestApp::new().await;
    let alice = token("alice");
    seed_animals(&app, &alice).await;

    app.post("/api/practice/start", &alice, json!({ "count": 3 })).await;
    let first = play(&app, &alice, |_| true).await;
    assert!(badge_ids(&first).contains(&"perfectionist".to_string()));

    app.post("/api/practice/start", &alice, json!({ "count": 3 })).await;
    let second = play(&app, &alice, |_| true).await;
    assert!(!badge_ids(&second).contains(&"perfectionist".to_string()));

    let (_, stats) = app.get("/api/badges/stats", &alice).await;
    assert_eq!(stats["data"]["perfectScores"], 2);

    let (_, overview) = app.get("/api/badges", &alice).await;
    let perfectionist = overview["data"]["badges"]
        .as_array()
        .unwrap()
        .iter()
        .find(|badge| badge["id"] == "perfectionist")
        .unwrap()
        .clone();
    assert_eq!(perfectionist["earned"], true);
    assert_eq!(perfectionist["isNew"], true);

    let (_, seen) = app.post("/api/badges/seen", &alice, json!({})).await;
    assert!(seen["data"]["cleared"].as_u64().unwrap() >= 2);
    let (_, seen) = app.post("/api/badges/seen", &alice, json!({})).await;
    assert_eq!(seen["data"]["cleared"], 0);
}

#[tokio::test]
async fn session_step_errors() {
    let app = TestApp::new().await;
    let alice = token("alice");

    let (status, _) = app.post("/api/practice/next", &alice, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    seed_animals(&app, &alice).await;
    app.post("/api/practice/start", &alice, json!({ "count": 2 })).await;
    let (status, body) = app.post("/api/practice/next", &alice, json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (_, body) = app
        .post("/api/practice/answer", &alice, json!({ "choice": "nope" }))
        .await;
    assert_eq!(body["data"]["accepted"], true);
    let (_, body) = app
        .post("/api/practice/answer", &alice, json!({ "choice": "again" }))
        .await;
    assert_eq!(body["data"]["accepted"], false);
    assert_eq!(body["data"]["session"]["totalCount"], 1);
}

#[tokio::test]
async fn skip_and_know_finish_the_session() {
    let app = TestApp::new().await;
    let alice = token("alice");
    seed_animals(&app, &alice).await;

    let (_, body) = app
        .post("/api/practice/start", &alice, json!({ "notification": true, "utcOffsetMinutes": 240 }))
        .await;
    assert_eq!(body["data"]["totalItems"], 3);

    let (_, step) = app.post("/api/practice/skip", &alice, json!({})).await;
    assert_eq!(step["data"]["finished"], false);
    let known = step["data"]["session"]["entryId"].as_str().unwrap().to_string();
    let (_, step) = app.post("/api/practice/know", &alice, json!({})).await;
    assert_eq!(step["data"]["session"]["learnedInSession"], json!([known]));
    let (_, step) = app.post("/api/practice/skip", &alice, json!({})).await;

    assert_eq!(step["data"]["finished"], true);
    assert_eq!(step["data"]["summary"]["correctCount"], 1);
    assert_eq!(step["data"]["summary"]["totalCount"], 3);
    assert_eq!(step["data"]["summary"]["learnedInSession"], json!([known]));
}

#[tokio::test]
async fn learned_words_are_left_out_of_practice() {
    let app = TestApp::new().await;
    let alice = token("alice");
    seed_animals(&app, &alice).await;

    let (_, body) = app.get("/api/words", &alice).await;
    for word in body["data"].as_array().unwrap() {
        let id = word["id"].as_str().unwrap();
        let (_, updated) = app
            .put(&format!("/api/words/{id}"), &alice, json!({ "isLearned": true }))
            .await;
        assert_eq!(updated["data"]["word"]["isLearned"], true);
    }

    let (status, body) = app.post("/api/practice/start", &alice, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["active"], false);

    let (_, stats) = app.get("/api/badges/stats", &alice).await;
    assert_eq!(stats["data"]["totalWordsLearned"], 3);
}
