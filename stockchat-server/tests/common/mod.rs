//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use stockchat_common::Config;
use stockchat_server::narrative::{NarrativeError, NarrativeGenerator, NarrativeRequest};
use stockchat_server::snapshot::MemoryBlobStore;
use stockchat_server::{build_router, AppState};

pub const PREFIX: &str = "tickertape_custom_screener_";

// ============================================================================
// Snapshots
// ============================================================================

/// Object name of a snapshot taken `days_ago` days before now.
pub fn snapshot_name(days_ago: i64) -> String {
    let at = Utc::now() - Duration::days(days_ago);
    format!("{}{}.json", PREFIX, at.format("%Y-%m-%d_%H-%M"))
}

pub fn stock(name: &str, close: f64) -> Value {
    json!({
        "Name": name,
        "Close Price": close,
        "↓Market Cap": "25,000",
        "Return on Equity": "18",
        "PE Ratio": "22",
        "RSI – 14D": "55",
    })
}

/// Store holding three snapshots (30, 10 and 1 days old) of a small universe.
/// RELIANCE closes at 2800, 2850 and 2900.
pub fn three_snapshot_store() -> Arc<MemoryBlobStore> {
    let store = Arc::new(MemoryBlobStore::new());
    for (days_ago, reliance, tcs) in [(30, 2800.0, 3900.0), (10, 2850.0, 3950.0), (1, 2900.0, 3850.0)] {
        let body = json!([
            stock("Reliance Industries", reliance),
            stock("Tata Consultancy Services", tcs),
            stock("Infosys", 1500.0),
        ]);
        store.put(snapshot_name(days_ago), body.to_string());
    }
    store
}

// ============================================================================
// Narrator
// ============================================================================

enum Reply {
    Text(Option<String>),
    Failure { status: u16, body: String },
}

/// Narrative generator that records every request and answers with a
/// canned reply.
pub struct RecordingNarrator {
    reply: Reply,
    requests: Mutex<Vec<NarrativeRequest>>,
}

impl RecordingNarrator {
    pub fn replying(text: &str) -> Arc<Self> {
        Self::with_reply(Reply::Text(Some(text.to_string())))
    }

    pub fn silent() -> Arc<Self> {
        Self::with_reply(Reply::Text(None))
    }

    pub fn failing(status: u16, body: &str) -> Arc<Self> {
        Self::with_reply(Reply::Failure {
            status,
            body: body.to_string(),
        })
    }

    fn with_reply(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<NarrativeRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl NarrativeGenerator for RecordingNarrator {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, request: NarrativeRequest) -> Result<Option<String>, NarrativeError> {
        self.requests.lock().unwrap().push(request);
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Failure { status, body } => Err(NarrativeError::Api {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

/// Narrative generator that answers only after `delay`.
pub struct SlowNarrator {
    delay: StdDuration,
}

impl SlowNarrator {
    pub fn new(delay: StdDuration) -> Arc<dyn NarrativeGenerator> {
        Arc::new(Self { delay })
    }
}

#[async_trait]
impl NarrativeGenerator for SlowNarrator {
    fn name(&self) -> &str {
        "slow"
    }

    async fn generate(&self, _request: NarrativeRequest) -> Result<Option<String>, NarrativeError> {
        tokio::time::sleep(self.delay).await;
        Ok(Some("late".to_string()))
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn app(store: Arc<MemoryBlobStore>, narrator: Option<Arc<RecordingNarrator>>) -> Router {
    let narrator = narrator.map(|n| n as Arc<dyn NarrativeGenerator>);
    app_with_config(Config::default(), store, narrator)
}

pub fn app_with_config(
    config: Config,
    store: Arc<MemoryBlobStore>,
    narrator: Option<Arc<dyn NarrativeGenerator>>,
) -> Router {
    let state = AppState::with_collaborators(config, store, narrator);
    build_router(Arc::new(state))
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: &Router, uri: &str, body: String) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap(),
    )
    .await
}
