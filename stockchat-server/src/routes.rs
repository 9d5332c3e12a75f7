//! HTTP routes for the stockchat service.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use stockchat_common::{Error, Result};

use crate::analysis::{analyze_portfolio, PortfolioItem};
use crate::insights::{InsightRequest, SentimentRequest};
use crate::lookup::Enrichment;
use crate::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
}

/// Query parameters of `GET /api/stock`. Flags are set by any non-empty value.
#[derive(Debug, Default, Deserialize)]
pub struct StockParams {
    pub symbol: Option<String>,
    pub all: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub history: Option<String>,
    pub realtime: Option<String>,
    pub sentiment: Option<String>,
}

impl StockParams {
    fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref().filter(|s| !s.is_empty())
    }

    fn date(&self) -> Option<&str> {
        self.date.as_deref().filter(|s| !s.is_empty())
    }

    fn time(&self) -> Option<&str> {
        self.time.as_deref().filter(|s| !s.is_empty())
    }
}

fn flag(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

#[derive(Debug, Serialize)]
pub struct InsightResponse {
    pub insight: String,
}

#[derive(Debug, Serialize)]
pub struct SentimentResponse {
    pub sentiment: String,
}

fn parse_body<T: serde::de::DeserializeOwned>(
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<T> {
    let Json(value) = body.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Error::PayloadTooLarge
        } else {
            Error::Validation(format!("Invalid request body: {}", e))
        }
    })?;
    serde_json::from_value(value).map_err(|e| Error::Validation(format!("Invalid request body: {}", e)))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: "stockchat-server".to_string(),
    })
}

/// Snapshot retrieval: full snapshot, symbol history or a single record
pub async fn get_stock(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StockParams>,
) -> Result<Json<Value>> {
    if flag(&params.all) {
        let records = state.lookup.all_records(params.date(), params.time()).await?;
        return Ok(Json(serde_json::to_value(records)?));
    }

    if flag(&params.history) {
        if let Some(symbol) = params.symbol() {
            let series = state.lookup.history(symbol).await?;
            return Ok(Json(serde_json::to_value(series)?));
        }
    }

    let Some(symbol) = params.symbol() else {
        return Err(Error::Validation(
            "No symbol provided. Please provide a ?symbol=... query parameter.".into(),
        ));
    };

    let enrichment = Enrichment {
        realtime: flag(&params.realtime),
        sentiment: flag(&params.sentiment),
    };

    let record = state
        .lookup
        .find(symbol, params.date(), params.time(), enrichment)
        .await?;
    Ok(Json(Value::Object(record.into_inner())))
}

/// LLM insight for a single stock or an advanced screen
pub async fn post_insights(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<InsightResponse>> {
    state.insights.narrator()?;
    let request: InsightRequest = parse_body(body)?;

    let insight = state.insights.generate(request).await?;
    debug!(
        kind = ?insight.kind,
        rules = ?insight.applied_rules,
        chars = insight.text.len(),
        "Insight ready"
    );

    Ok(Json(InsightResponse {
        insight: insight.text,
    }))
}

/// Portfolio analytics
pub async fn post_portfolio(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let invalid = || Error::Validation("Invalid portfolio data".into());

    let Json(mut value) = body.map_err(|_| invalid())?;
    let items = match value.get_mut("portfolio").map(Value::take) {
        Some(items @ Value::Array(_)) => items,
        _ => return Err(invalid()),
    };
    let items: Vec<PortfolioItem> = serde_json::from_value(items).map_err(|_| invalid())?;

    let analytics = analyze_portfolio(&items, |symbol| state.config.sector_for(symbol));
    Ok(Json(analytics))
}

/// Portfolio endpoint description
pub async fn get_portfolio() -> Json<Value> {
    Json(json!({
        "message": "Portfolio Analytics API",
        "endpoints": {
            "POST /api/portfolio": "Analyze portfolio data and return insights"
        }
    }))
}

/// Headline sentiment for a symbol
pub async fn post_sentiment(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<SentimentResponse>> {
    state.insights.narrator()?;
    let request: SentimentRequest = parse_body(body)
        .map_err(|_| Error::Validation("Missing symbol or newsData".into()))?;

    let sentiment = state.insights.news_sentiment(request).await?;
    Ok(Json(SentimentResponse { sentiment }))
}
