//! Timestamped screener snapshots and the repository that reads them.
//!
//! A snapshot is one scrape of the full screener universe, stored as a JSON
//! array of records under a timestamped object name. The repository lists,
//! resolves and fetches snapshots and rebuilds per-symbol history from them.

pub mod key;
pub mod record;
pub mod repository;
pub mod store;

pub use key::{SnapshotKey, SnapshotNaming};
pub use record::{metrics, parse_leading_number, StockRecord};
pub use repository::{HistoricalAggregation, SkippedSnapshot, SnapshotRepository};
pub use store::{BlobStore, GcsBlobStore, MemoryBlobStore};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use stockchat_common::Error;

/// Failures while reading snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The listing call failed
    #[error("snapshot listing failed: {0}")]
    Listing(String),

    /// No eligible snapshot exists
    #[error("no snapshot available")]
    NoSnapshot,

    /// Fetching an object failed or returned a non-success status
    #[error("failed to fetch {key}: {message}")]
    Fetch {
        key: String,
        status: Option<u16>,
        message: String,
    },

    /// The object body is not a JSON array
    #[error("failed to parse {key}: {message}")]
    Parse { key: String, message: String },

    /// No eligible snapshot contained the symbol
    #[error("no history for {symbol}")]
    NoHistory { symbol: String },
}

impl From<SnapshotError> for Error {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::Listing(message) => {
                Error::upstream_with_details("Failed to list data files", message)
            }
            SnapshotError::NoSnapshot => Error::upstream("No data file found in bucket"),
            SnapshotError::Fetch { key, .. } => {
                Error::upstream(format!("Failed to fetch data from remote source: {}", key))
            }
            SnapshotError::Parse { message, .. } => {
                Error::upstream_with_details("Failed to fetch or parse data", message)
            }
            SnapshotError::NoHistory { .. } => {
                Error::NotFound("No historical data found for symbol".into())
            }
        }
    }
}

/// One parsed snapshot.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub key: SnapshotKey,
    pub records: Vec<StockRecord>,
}

impl Snapshot {
    /// Parse a snapshot body. Array items that are not objects are dropped.
    pub fn from_slice(key: SnapshotKey, body: &[u8]) -> Result<Self, SnapshotError> {
        let value: Value = serde_json::from_slice(body).map_err(|e| SnapshotError::Parse {
            key: key.name.clone(),
            message: e.to_string(),
        })?;

        let Value::Array(items) = value else {
            return Err(SnapshotError::Parse {
                key: key.name.clone(),
                message: "expected a JSON array of records".into(),
            });
        };

        let total = items.len();
        let records: Vec<StockRecord> = items
            .into_iter()
            .filter_map(|item| StockRecord::try_from(item).ok())
            .collect();

        if records.len() != total {
            debug!(
                key = %key.name,
                dropped = total - records.len(),
                "Dropped non-object snapshot items"
            );
        }

        Ok(Self { key, records })
    }

    /// First record whose `Name` contains `query`, case-insensitively.
    pub fn find(&self, query: &str) -> Option<&StockRecord> {
        self.records.iter().find(|r| r.name_contains(query))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
