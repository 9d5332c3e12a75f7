//! Stockchat Server Library
//!
//! Serves a stock screener dataset to a chat front end: timestamped snapshots
//! are read from object storage, free-text queries are classified and
//! screened, and the selected data is handed to an LLM for a narrative.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    stockchat-server (Rust Service)                  │
//! │                               :4480                                 │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────┐      │
//! │  │  Snapshot       │  │  Screening      │  │  Narrative      │      │
//! │  │  Repository     │  │  Engine         │  │  Generator      │      │
//! │  └────────┬────────┘  └─────────────────┘  └─────────────────┘      │
//! │           │                                                         │
//! │  ┌────────┴────────┐                                                │
//! │  │  BlobStore      │  GCS JSON API / in-memory                      │
//! │  └─────────────────┘                                                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Concepts
//!
//! ## Snapshots
//! - One JSON array of stock records per scrape, named
//!   `<prefix><YYYY-MM-DD>_<HH-MM>.json`
//! - Only the trailing 183 days are eligible for history
//!
//! ## Screening
//! - Ticker-like queries are single-stock lookups
//! - Everything else runs through the keyword rule chain and is truncated
//!   to the configured result limit

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod analysis;
pub mod insights;
pub mod lookup;
pub mod narrative;
pub mod routes;
pub mod screener;
pub mod snapshot;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use stockchat_common::logging::generate_request_id;
use stockchat_common::{Config, Error};

use crate::insights::InsightService;
use crate::lookup::StockLookup;
use crate::narrative::{NarrativeGenerator, OpenAiNarrativeGenerator};
use crate::screener::ScreeningEngine;
use crate::snapshot::{BlobStore, GcsBlobStore, SnapshotRepository};

/// Largest accepted request body (portfolios and news lists are small).
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Service state shared by all handlers
pub struct AppState {
    /// Configuration
    pub config: Config,
    /// Snapshot repository
    pub repository: Arc<SnapshotRepository>,
    /// Screening engine
    pub screener: Arc<ScreeningEngine>,
    /// Snapshot lookups for `/api/stock`
    pub lookup: StockLookup,
    /// Insight and sentiment generation
    pub insights: InsightService,
}

impl AppState {
    /// Create the state with the GCS store and, when an API key is
    /// configured, the OpenAI generator.
    pub fn new(config: Config) -> stockchat_common::Result<Self> {
        let store: Arc<dyn BlobStore> = Arc::new(GcsBlobStore::new(&config.storage));

        let narrator = match config.openai_api_key() {
            Some(key) => Some(
                Arc::new(OpenAiNarrativeGenerator::new(key, &config.llm)?) as Arc<dyn NarrativeGenerator>,
            ),
            None => {
                tracing::warn!("No OpenAI API key configured; insight endpoints will fail");
                None
            }
        };

        Ok(Self::with_collaborators(config, store, narrator))
    }

    /// Create the state around explicit collaborators.
    pub fn with_collaborators(
        config: Config,
        store: Arc<dyn BlobStore>,
        narrator: Option<Arc<dyn NarrativeGenerator>>,
    ) -> Self {
        let repository = Arc::new(SnapshotRepository::new(store, &config.storage));
        let screener = Arc::new(ScreeningEngine::from_config(&config.screener));
        let lookup = StockLookup::new(Arc::clone(&repository));
        let insights = InsightService::new(
            Arc::clone(&repository),
            Arc::clone(&screener),
            narrator,
            config.llm.clone(),
        );

        Self {
            config,
            repository,
            screener,
            lookup,
            insights,
        }
    }
}

/// Build the HTTP router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let timeout = Duration::from_secs(state.config.network.request_timeout_secs);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/stock", get(routes::get_stock))
        .route("/api/insights", post(routes::post_insights))
        .route(
            "/api/portfolio",
            get(routes::get_portfolio).post(routes::post_portfolio),
        )
        .route("/api/sentiment", post(routes::post_sentiment))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(timeout))
        .layer(middleware::map_response(render_layer_errors))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %generate_request_id(),
            )
        }))
        .layer(cors)
}

/// Timeout and body-limit middleware answer with an empty or plain-text
/// body; give those responses the JSON error shape.
async fn render_layer_errors(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json {
        return response;
    }

    match response.status() {
        StatusCode::REQUEST_TIMEOUT => Error::Timeout.into_response(),
        StatusCode::PAYLOAD_TOO_LARGE => Error::PayloadTooLarge.into_response(),
        _ => response,
    }
}

/// Main stockchat service
pub struct StockchatService {
    state: Arc<AppState>,
}

impl StockchatService {
    /// Create a new service
    pub fn new(config: Config) -> Result<Self> {
        let state = Arc::new(AppState::new(config)?);
        Ok(Self { state })
    }

    /// Start the HTTP server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self.state.config.listen_address().parse()?;
        let app = build_router(Arc::clone(&self.state));

        tracing::info!(
            address = %addr,
            bucket = %self.state.config.storage.bucket,
            "Starting HTTP server"
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
