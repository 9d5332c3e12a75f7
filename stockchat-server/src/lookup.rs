//! Snapshot lookups behind `GET /api/stock`.

use std::sync::Arc;

use tracing::warn;

use stockchat_common::{Error, Result};

use crate::analysis::{market_sentiment, price_change_between};
use crate::snapshot::{SnapshotRepository, StockRecord};

/// Optional enrichments of a single-stock lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct Enrichment {
    /// Compare against the previous snapshot's close price
    pub realtime: bool,
    /// Attach the technical/valuation sentiment
    pub sentiment: bool,
}

pub struct StockLookup {
    repository: Arc<SnapshotRepository>,
}

impl StockLookup {
    pub fn new(repository: Arc<SnapshotRepository>) -> Self {
        Self { repository }
    }

    /// Explicit snapshot name for `date`/`time`, or the latest eligible one.
    async fn target_name(&self, date: Option<&str>, time: Option<&str>) -> Result<String> {
        if let Some(date) = date {
            return self.repository.key_for(date, time).ok_or_else(|| {
                Error::Validation("Invalid date or time. Use date=YYYY-MM-DD and time=HH-MM".into())
            });
        }
        self.repository
            .resolve_latest()
            .await
            .map(|key| key.name)
            .ok_or_else(|| Error::upstream("No data file found in bucket"))
    }

    /// Every record of the selected snapshot.
    pub async fn all_records(
        &self,
        date: Option<&str>,
        time: Option<&str>,
    ) -> Result<Vec<StockRecord>> {
        let name = self.target_name(date, time).await?;
        let snapshot = self.repository.fetch_snapshot(&name).await?;
        Ok(snapshot.records)
    }

    /// Dated series of the records matching `symbol`.
    pub async fn history(&self, symbol: &str) -> Result<Vec<StockRecord>> {
        let aggregation = self.repository.build_historical_series(symbol).await?;
        if !aggregation.is_complete() {
            warn!(
                symbol = %symbol,
                skipped = aggregation.skipped_count,
                "History built from a partial set of snapshots"
            );
        }
        Ok(aggregation.series)
    }

    /// First record matching `symbol`, optionally enriched.
    pub async fn find(
        &self,
        symbol: &str,
        date: Option<&str>,
        time: Option<&str>,
        enrichment: Enrichment,
    ) -> Result<StockRecord> {
        let name = self.target_name(date, time).await?;
        let snapshot = self.repository.fetch_snapshot(&name).await?;

        let mut record = snapshot
            .find(symbol)
            .cloned()
            .ok_or_else(|| Error::NotFound("Symbol or company not found".into()))?;

        if enrichment.realtime {
            self.attach_price_change(&mut record, symbol).await;
        }

        if enrichment.sentiment {
            let sentiment = market_sentiment(&record);
            record.insert("marketSentiment", sentiment.as_str());
        }

        Ok(record)
    }

    /// Best effort: a missing or unreadable previous snapshot leaves the
    /// record unchanged.
    async fn attach_price_change(&self, record: &mut StockRecord, symbol: &str) {
        let Some(previous_key) = self.repository.previous_snapshot_key().await else {
            return;
        };

        let previous = match self.repository.fetch_snapshot(&previous_key.name).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(key = %previous_key.name, error = %e, "Previous snapshot unavailable");
                return;
            }
        };

        if let Some(previous_record) = previous.find(symbol) {
            let change = price_change_between(record, previous_record);
            record.insert("priceChange", change.change);
            record.insert("priceChangePercent", change.change_percent);
            record.insert("isPositive", change.is_positive());
        }
    }
}
