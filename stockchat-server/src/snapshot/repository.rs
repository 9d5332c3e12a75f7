//! Snapshot repository.
//!
//! Every call re-lists the bucket; there is no caching layer. Only snapshots
//! inside the trailing history window (183 days by default, measured from
//! the wall clock at call time) are eligible.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use stockchat_common::StorageConfig;

use super::{BlobStore, Snapshot, SnapshotError, SnapshotKey, SnapshotNaming, StockRecord};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// A snapshot left out of a historical aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedSnapshot {
    pub key: String,
    pub reason: String,
}

/// Per-symbol series plus the snapshots that could not be read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalAggregation {
    /// Matching records in ascending snapshot order, each with `date` set
    pub series: Vec<StockRecord>,
    pub skipped_count: usize,
    pub skipped_reasons: Vec<SkippedSnapshot>,
}

impl HistoricalAggregation {
    /// True when no snapshot was skipped.
    pub fn is_complete(&self) -> bool {
        self.skipped_count == 0
    }
}

/// Lists, resolves and fetches snapshots from a blob store.
pub struct SnapshotRepository {
    store: Arc<dyn BlobStore>,
    naming: SnapshotNaming,
    window_days: i64,
    concurrency: usize,
}

impl SnapshotRepository {
    pub fn new(store: Arc<dyn BlobStore>, config: &StorageConfig) -> Self {
        Self {
            store,
            naming: SnapshotNaming::new(config.prefix.clone(), config.suffix.clone()),
            window_days: i64::from(config.history_window_days),
            concurrency: config.history_concurrency.max(1),
        }
    }

    pub fn naming(&self) -> &SnapshotNaming {
        &self.naming
    }

    /// Object name for an explicit date and optional time, if well formed.
    pub fn key_for(&self, date: &str, time: Option<&str>) -> Option<String> {
        self.naming.key_for(date, time)
    }

    /// Eligible snapshot keys, ascending by timestamp.
    ///
    /// A failed listing yields an empty list.
    pub async fn list_eligible_snapshot_keys(&self) -> Vec<SnapshotKey> {
        self.list_eligible_snapshot_keys_at(Utc::now()).await
    }

    pub async fn list_eligible_snapshot_keys_at(&self, now: DateTime<Utc>) -> Vec<SnapshotKey> {
        let names = match self.store.list_objects(self.naming.prefix()).await {
            Ok(names) => names,
            Err(e) => {
                warn!(store = self.store.name(), error = %e, "Snapshot listing failed");
                return Vec::new();
            }
        };

        let cutoff = now.timestamp_millis() - self.window_days * MILLIS_PER_DAY;

        let mut keys: Vec<SnapshotKey> = names
            .iter()
            .filter(|name| self.naming.matches_convention(name))
            .map(|name| self.naming.parse(name))
            .filter(|key| key.timestamp_ms >= cutoff)
            .collect();
        keys.sort();

        debug!(
            listed = names.len(),
            eligible = keys.len(),
            window_days = self.window_days,
            "Resolved eligible snapshots"
        );
        keys
    }

    /// Most recent eligible snapshot key.
    pub async fn resolve_latest(&self) -> Option<SnapshotKey> {
        self.list_eligible_snapshot_keys().await.pop()
    }

    /// Second most recent eligible snapshot key.
    pub async fn previous_snapshot_key(&self) -> Option<SnapshotKey> {
        let mut keys = self.list_eligible_snapshot_keys().await;
        keys.pop()?;
        keys.pop()
    }

    /// Fetch and parse the snapshot stored under `name`.
    pub async fn fetch_snapshot(&self, name: &str) -> Result<Snapshot, SnapshotError> {
        let body = self.store.fetch_object(name).await?;
        Snapshot::from_slice(self.naming.parse(name), &body)
    }

    /// Fetch the most recent eligible snapshot.
    pub async fn fetch_latest(&self) -> Result<Snapshot, SnapshotError> {
        let key = self.resolve_latest().await.ok_or(SnapshotError::NoSnapshot)?;
        self.fetch_snapshot(&key.name).await
    }

    /// First record of `snapshot` whose name contains `symbol_query`.
    pub fn find_in_snapshot<'a>(
        &self,
        snapshot: &'a Snapshot,
        symbol_query: &str,
    ) -> Option<&'a StockRecord> {
        snapshot.find(symbol_query)
    }

    /// Rebuild the series of records matching `symbol_query` across all
    /// eligible snapshots.
    pub async fn build_historical_series(
        &self,
        symbol_query: &str,
    ) -> Result<HistoricalAggregation, SnapshotError> {
        self.build_historical_series_at(symbol_query, Utc::now()).await
    }

    /// Snapshots that fail to fetch or parse are skipped and reported; the
    /// call only fails when no snapshot contains the symbol.
    pub async fn build_historical_series_at(
        &self,
        symbol_query: &str,
        now: DateTime<Utc>,
    ) -> Result<HistoricalAggregation, SnapshotError> {
        let keys = self.list_eligible_snapshot_keys_at(now).await;
        let scanned = keys.len();

        // `buffered` yields in input order, so the series stays ascending.
        let results: Vec<(SnapshotKey, Result<Snapshot, SnapshotError>)> = stream::iter(keys)
            .map(|key| async move {
                let result = self.fetch_snapshot(&key.name).await;
                (key, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut series = Vec::new();
        let mut skipped_reasons = Vec::new();

        for (key, result) in results {
            match result {
                Ok(snapshot) => {
                    if let Some(record) = snapshot.find(symbol_query) {
                        series.push(record.with_date(key.iso_date().unwrap_or_default()));
                    }
                }
                Err(e) => {
                    warn!(key = %key.name, error = %e, "Skipping unreadable snapshot");
                    skipped_reasons.push(SkippedSnapshot {
                        key: key.name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            symbol = %symbol_query,
            scanned,
            found = series.len(),
            skipped = skipped_reasons.len(),
            "Historical series built"
        );

        if series.is_empty() {
            return Err(SnapshotError::NoHistory {
                symbol: symbol_query.to_string(),
            });
        }

        Ok(HistoricalAggregation {
            series,
            skipped_count: skipped_reasons.len(),
            skipped_reasons,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::MemoryBlobStore;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap()
    }

    fn repo(store: MemoryBlobStore) -> SnapshotRepository {
        SnapshotRepository::new(Arc::new(store), &StorageConfig::default())
    }

    #[tokio::test]
    async fn test_window_excludes_old_and_malformed() {
        let store = MemoryBlobStore::new();
        store.put("tickertape_custom_screener_2024-01-01_10-00.json", "[]");
        store.put("tickertape_custom_screener_2025-06-30_10-00.json", "[]");
        store.put("tickertape_custom_screener_2025-03-01_10-00.json", "[]");
        store.put("tickertape_custom_screener_latest.json", "[]");
        store.put("unrelated.json", "[]");

        let keys = repo(store).list_eligible_snapshot_keys_at(now()).await;
        let names: Vec<_> = keys.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "tickertape_custom_screener_2025-03-01_10-00.json",
                "tickertape_custom_screener_2025-06-30_10-00.json",
            ]
        );
    }

    #[tokio::test]
    async fn test_listing_failure_is_empty() {
        let store = MemoryBlobStore::new();
        store.put("tickertape_custom_screener_2025-06-30_10-00.json", "[]");
        store.fail_listing();

        let repo = repo(store);
        assert!(repo.list_eligible_snapshot_keys_at(now()).await.is_empty());
        assert!(matches!(
            repo.fetch_latest().await,
            Err(SnapshotError::NoSnapshot)
        ));
    }

    #[tokio::test]
    async fn test_history_skips_unreadable_snapshots() {
        let store = MemoryBlobStore::new();
        store.put(
            "tickertape_custom_screener_2025-06-01_10-00.json",
            r#"[{"Name": "Reliance Industries", "Close Price": "2900"}]"#,
        );
        store.put("tickertape_custom_screener_2025-06-02_10-00.json", "{broken");
        store.put(
            "tickertape_custom_screener_2025-06-03_10-00.json",
            r#"[{"Name": "Reliance Industries", "Close Price": "2950"}]"#,
        );

        let agg = repo(store)
            .build_historical_series_at("reliance", now())
            .await
            .unwrap();

        assert_eq!(agg.series.len(), 2);
        assert_eq!(agg.skipped_count, 1);
        assert!(!agg.is_complete());
        assert_eq!(
            agg.skipped_reasons[0].key,
            "tickertape_custom_screener_2025-06-02_10-00.json"
        );
        assert_eq!(agg.series[0].date(), Some("2025-06-01T10:00:00Z"));
        assert_eq!(agg.series[1].date(), Some("2025-06-03T10:00:00Z"));
    }

    #[tokio::test]
    async fn test_history_not_found() {
        let store = MemoryBlobStore::new();
        store.put(
            "tickertape_custom_screener_2025-06-01_10-00.json",
            r#"[{"Name": "Infosys"}]"#,
        );

        let err = repo(store)
            .build_historical_series_at("reliance", now())
            .await
            .unwrap_err();
        assert!(matches!(err, SnapshotError::NoHistory { .. }));
    }
}
