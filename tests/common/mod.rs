#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use bararan_backend::auth::sign_token;
use bararan_backend::config::Config;
use bararan_backend::db::Database;
use bararan_backend::services::badge_store::MemoryBadgeStore;
use bararan_backend::state::AppState;

pub const SECRET: &str = "integration-test-secret";

/// Counts requests that reached the fake third-party APIs.
#[derive(Default)]
pub struct UpstreamCalls {
    pub translate: AtomicUsize,
    pub chat: AtomicUsize,
    pub dictionary: AtomicUsize,
}

impl UpstreamCalls {
    pub fn translate(&self) -> usize {
        self.translate.load(Ordering::SeqCst)
    }

    pub fn chat(&self) -> usize {
        self.chat.load(Ordering::SeqCst)
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub calls: Arc<UpstreamCalls>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let calls = Arc::new(UpstreamCalls::default());
        let upstream = spawn_upstream(Arc::clone(&calls)).await;

        let mut config = Config::for_tests();
        config.jwt_secret = Some(SECRET.to_string());
        config.translate.api_key = Some("test-key".to_string());
        config.translate.endpoint = format!("http://{upstream}/translate");
        config.chat.api_key = Some("test-key".to_string());
        config.chat.endpoint = format!("http://{upstream}");
        config.dictionary.endpoint = format!("http://{upstream}/dictionary");
        adjust(&mut config);

        let db = Database::connect("sqlite::memory:").await.unwrap();
        let state = AppState::new(config, Some(db), Arc::new(MemoryBadgeStore::new())).unwrap();

        Self {
            router: bararan_backend::create_app(state.clone()),
            state,
            calls,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn grant_admin(&self, user_id: &str) {
        let data = self.state.data_opt().unwrap();
        bararan_backend::db::operations::users::grant_admin(&data.db, user_id)
            .await
            .unwrap();
    }
}

pub fn token(user_id: &str) -> String {
    sign_token(
        user_id,
        Some(&format!("{user_id}@example.com")),
        SECRET,
        chrono::Duration::hours(1),
    )
    .unwrap()
}

async fn spawn_upstream(calls: Arc<UpstreamCalls>) -> SocketAddr {
    let app = Router::new()
        .route("/translate", post(fake_translate))
        .route("/chat/completions", post(fake_chat))
        .route("/dictionary/:word", get(fake_dictionary))
        .with_state(calls);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn fake_translate(
    State(calls): State<Arc<UpstreamCalls>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    calls.translate.fetch_add(1, Ordering::SeqCst);
    if body["q"] == "forbidden" {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": { "code": 403, "message": "API key not valid" } })),
        );
    }
    if body["q"] == "garbled" {
        return (StatusCode::OK, Json(json!({ "data": { "translations": [] } })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "data": { "translations": [
                { "translatedText": "բարեւ", "detectedSourceLanguage": "en" }
            ] }
        })),
    )
}

async fn fake_chat(
    State(calls): State<Arc<UpstreamCalls>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    calls.chat.fetch_add(1, Ordering::SeqCst);
    let last = body["messages"]
        .as_array()
        .and_then(|messages| messages.last())
        .and_then(|message| message["content"].as_str())
        .unwrap_or_default()
        .to_string();
    if last == "busy" {
        return (StatusCode::TOO_MANY_REQUESTS, Json(json!({ "error": "slow down" })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "choices": [{ "message": { "role": "assistant", "content": format!("  echo: {last} ") } }]
        })),
    )
}

async fn fake_dictionary(
    State(calls): State<Arc<UpstreamCalls>>,
    Path(word): Path<String>,
) -> impl IntoResponse {
    calls.dictionary.fetch_add(1, Ordering::SeqCst);
    match word.as_str() {
        "missing" => {
            return (StatusCode::NOT_FOUND, Json(json!({ "title": "No Definitions Found" })));
        }
        "slow" => tokio::time::sleep(Duration::from_secs(2)).await,
        _ => {}
    }
    (
        StatusCode::OK,
        Json(json!([{
            "word": word,
            "phonetic": "/test/",
            "phonetics": [{ "text": "/test/", "audio": "" }, { "audio": "https://audio/test.mp3" }],
            "meanings": [{
                "partOfSpeech": "noun",
                "definitions": [{ "definition": format!("the meaning of {word}"), "example": "an example" }]
            }]
        }])),
    )
}
