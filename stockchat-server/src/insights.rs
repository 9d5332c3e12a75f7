//! Insight generation: query classification, data gathering and the LLM call.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use stockchat_common::{Error, LlmConfig, Result};

use crate::analysis::{apply_overrides, compress_history, InsightOverrides};
use crate::narrative::{prompts, NarrativeGenerator, NarrativeRequest};
use crate::screener::{QueryKind, ScreeningEngine};
use crate::snapshot::{SnapshotRepository, StockRecord};

const NO_ANALYSIS: &str = "No analysis available";
const NO_SENTIMENT: &str = "No sentiment generated.";

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub user_input: Option<String>,
    /// Record supplied by the client instead of the latest snapshot's
    #[serde(default)]
    pub stock_data: Option<Value>,
    /// History supplied by the client instead of a rebuilt series
    #[serde(default)]
    pub history: Option<Value>,
    #[serde(flatten)]
    pub overrides: InsightOverrides,
}

impl InsightRequest {
    /// Free-text query: `userInput` when present, else `symbol`.
    pub fn query(&self) -> &str {
        non_empty(self.user_input.as_deref())
            .or_else(|| non_empty(self.symbol.as_deref()))
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentRequest {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub news_data: Option<Vec<String>>,
    #[serde(default)]
    pub pdf_text: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Generated insight plus how it was produced.
#[derive(Debug, Clone)]
pub struct Insight {
    pub text: String,
    pub kind: QueryKind,
    pub applied_rules: Vec<&'static str>,
}

// ============================================================================
// Insight Service
// ============================================================================

pub struct InsightService {
    repository: Arc<SnapshotRepository>,
    screener: Arc<ScreeningEngine>,
    narrator: Option<Arc<dyn NarrativeGenerator>>,
    llm: LlmConfig,
}

impl InsightService {
    pub fn new(
        repository: Arc<SnapshotRepository>,
        screener: Arc<ScreeningEngine>,
        narrator: Option<Arc<dyn NarrativeGenerator>>,
        llm: LlmConfig,
    ) -> Self {
        Self {
            repository,
            screener,
            narrator,
            llm,
        }
    }

    /// The configured generator, or a configuration error when no API key
    /// was provided.
    pub fn narrator(&self) -> Result<&Arc<dyn NarrativeGenerator>> {
        self.narrator
            .as_ref()
            .ok_or_else(|| Error::Config("OpenAI API key not set".into()))
    }

    pub async fn generate(&self, request: InsightRequest) -> Result<Insight> {
        let narrator = self.narrator()?;
        let query = request.query().to_string();

        if query.is_empty() {
            return Err(Error::Validation("Missing symbol or userInput".into()));
        }

        let kind = self.screener.classify(&query);
        info!(query = %query, kind = ?kind, "Generating insight");

        match kind {
            QueryKind::SingleSymbol => {
                let text = self.single_stock(narrator, &request, &query).await?;
                Ok(Insight {
                    text,
                    kind,
                    applied_rules: Vec::new(),
                })
            }
            QueryKind::AdvancedScreen => {
                let (text, applied_rules) = self.advanced_screen(narrator, &query).await?;
                Ok(Insight {
                    text,
                    kind,
                    applied_rules,
                })
            }
        }
    }

    async fn single_stock(
        &self,
        narrator: &Arc<dyn NarrativeGenerator>,
        request: &InsightRequest,
        query: &str,
    ) -> Result<String> {
        let symbol = non_empty(request.symbol.as_deref()).unwrap_or(query);

        let stock_data = request.stock_data.clone().filter(|v| !v.is_null());
        let record = match stock_data.map(StockRecord::try_from) {
            Some(Ok(record)) => record,
            Some(Err(_)) => return Err(Error::Validation("stockData must be an object".into())),
            None => {
                let snapshot = self.repository.fetch_latest().await?;
                match snapshot.find(symbol) {
                    Some(record) => record.clone(),
                    None => {
                        warn!(symbol = %symbol, key = %snapshot.key.name, "Symbol not in latest snapshot");
                        StockRecord::default()
                    }
                }
            }
        };
        let merged = apply_overrides(record, &request.overrides);

        let history = match request.history.clone().filter(|h| !h.is_null()) {
            Some(history) => Some(history),
            None => match self.repository.build_historical_series(symbol).await {
                Ok(aggregation) => {
                    debug!(
                        symbol = %symbol,
                        entries = aggregation.series.len(),
                        skipped = aggregation.skipped_count,
                        "Attaching history"
                    );
                    Some(serde_json::to_value(compress_history(&aggregation.series))?)
                }
                Err(e) => {
                    debug!(symbol = %symbol, error = %e, "No history attached");
                    None
                }
            },
        };

        let prompt = prompts::stock_evaluation_prompt(&merged, history.as_ref())?;
        let request = NarrativeRequest::new(&self.llm.insight_model, prompt)
            .with_max_tokens(self.llm.insight_max_tokens)
            .with_temperature(self.llm.insight_temperature);

        let text = narrator.generate(request).await?;
        Ok(text.unwrap_or_else(|| NO_ANALYSIS.to_string()))
    }

    async fn advanced_screen(
        &self,
        narrator: &Arc<dyn NarrativeGenerator>,
        query: &str,
    ) -> Result<(String, Vec<&'static str>)> {
        let snapshot = self.repository.fetch_latest().await.map_err(|e| {
            warn!(error = %e, "Failed to load snapshot for screening");
            Error::upstream_with_details("Failed to fetch stock data", e.to_string())
        })?;

        let outcome = self.screener.filter_by_query(&snapshot.records, query);
        info!(
            scanned = outcome.total_scanned,
            selected = outcome.len(),
            rules = ?outcome.applied_rules,
            "Screen applied"
        );

        let prompt = prompts::screen_analysis_prompt(query, &outcome.records)?;
        let request = NarrativeRequest::new(&self.llm.insight_model, prompt)
            .with_max_tokens(self.llm.insight_max_tokens)
            .with_temperature(self.llm.insight_temperature);

        let text = narrator
            .generate(request)
            .await?
            .unwrap_or_else(|| NO_ANALYSIS.to_string());
        Ok((text, outcome.applied_rules))
    }

    /// Headline sentiment for one symbol.
    pub async fn news_sentiment(&self, request: SentimentRequest) -> Result<String> {
        let narrator = self.narrator()?;

        let (symbol, headlines) = match (non_empty(request.symbol.as_deref()), &request.news_data) {
            (Some(symbol), Some(headlines)) => (symbol, headlines),
            _ => return Err(Error::Validation("Missing symbol or newsData".into())),
        };

        let has_research = request.pdf_text.as_deref().is_some_and(|t| !t.is_empty());
        let request = NarrativeRequest::new(
            &self.llm.sentiment_model,
            prompts::sentiment_user_prompt(symbol, headlines, has_research),
        )
        .with_system(prompts::sentiment_system_prompt(symbol))
        .with_max_tokens(self.llm.sentiment_max_tokens)
        .with_temperature(self.llm.sentiment_temperature);

        let text = narrator.generate(request).await?;
        Ok(text.unwrap_or_else(|| NO_SENTIMENT.to_string()))
    }
}
