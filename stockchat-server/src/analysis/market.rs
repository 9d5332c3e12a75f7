//! Per-record market indicators and history compression.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::snapshot::{metrics, StockRecord};

// ============================================================================
// Price change
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceChange {
    pub change: f64,
    /// Percent of the previous price; 0 when the previous price is not positive
    pub change_percent: f64,
}

impl PriceChange {
    pub fn is_positive(&self) -> bool {
        self.change >= 0.0
    }
}

pub fn price_change(current: f64, previous: f64) -> PriceChange {
    let change = current - previous;
    let change_percent = if previous > 0.0 {
        change / previous * 100.0
    } else {
        0.0
    };
    PriceChange {
        change,
        change_percent,
    }
}

/// Close-price change between two captures of the same stock.
pub fn price_change_between(current: &StockRecord, previous: &StockRecord) -> PriceChange {
    price_change(
        current.numeric_metric(metrics::CLOSE_PRICE, 0.0),
        previous.numeric_metric(metrics::CLOSE_PRICE, 0.0),
    )
}

// ============================================================================
// Sentiment
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl MarketSentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for MarketSentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Technical/valuation sentiment: oversold and cheap with good returns is
/// bullish, overbought and expensive is bearish.
pub fn market_sentiment(record: &StockRecord) -> MarketSentiment {
    let rsi = record.numeric_metric(metrics::RSI_14D, 50.0);
    let pe = record.numeric_metric(metrics::PE_RATIO, 0.0);
    let roe = record.numeric_metric(metrics::RETURN_ON_EQUITY, 0.0);

    if rsi < 30.0 && pe < 15.0 && roe > 15.0 {
        MarketSentiment::Bullish
    } else if rsi > 70.0 && pe > 25.0 {
        MarketSentiment::Bearish
    } else {
        MarketSentiment::Neutral
    }
}

// ============================================================================
// History compression
// ============================================================================

const UNCHANGED_IDENTITY_FIELDS: &[&str] = &[metrics::DATE, metrics::SYMBOL, metrics::NAME];

/// Reduce a series to per-entry changes.
///
/// Each output entry keeps `date` and only the fields whose value differs
/// from the previous entry; `Name` and `symbol` are dropped.
pub fn compress_history(series: &[StockRecord]) -> Vec<Map<String, Value>> {
    let empty = Map::new();
    let mut previous = &empty;
    let mut compressed = Vec::with_capacity(series.len());

    for entry in series {
        let mut diff = Map::new();
        if let Some(date) = entry.get(metrics::DATE) {
            diff.insert(metrics::DATE.to_string(), date.clone());
        }

        for (key, value) in entry.fields() {
            if UNCHANGED_IDENTITY_FIELDS.contains(&key.as_str()) {
                continue;
            }
            if previous.get(key) != Some(value) {
                diff.insert(key.clone(), value.clone());
            }
        }

        compressed.push(diff);
        previous = entry.fields();
    }

    compressed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> StockRecord {
        StockRecord::try_from(value).unwrap()
    }

    #[test]
    fn test_price_change() {
        let pc = price_change(110.0, 100.0);
        assert_eq!(pc.change, 10.0);
        assert!((pc.change_percent - 10.0).abs() < 1e-9);
        assert!(pc.is_positive());

        let pc = price_change(90.0, 0.0);
        assert_eq!(pc.change_percent, 0.0);
    }

    #[test]
    fn test_price_change_between_records() {
        let current = record(json!({ "Close Price": "95" }));
        let previous = record(json!({ "Close Price": "100" }));
        let pc = price_change_between(&current, &previous);
        assert_eq!(pc.change, -5.0);
        assert!(!pc.is_positive());
    }

    #[test]
    fn test_market_sentiment() {
        let bullish = record(json!({
            "RSI – 14D": "25", "PE Ratio": "12", "Return on Equity": "20"
        }));
        let bearish = record(json!({ "RSI – 14D": "75", "PE Ratio": "40" }));
        let neutral = record(json!({}));

        assert_eq!(market_sentiment(&bullish), MarketSentiment::Bullish);
        assert_eq!(market_sentiment(&bearish), MarketSentiment::Bearish);
        assert_eq!(market_sentiment(&neutral), MarketSentiment::Neutral);
        assert_eq!(MarketSentiment::Bullish.to_string(), "bullish");
    }

    #[test]
    fn test_compress_history_keeps_changes_only() {
        let series = vec![
            record(json!({ "Name": "TCS", "date": "d1", "Close Price": "100", "PE Ratio": "30" })),
            record(json!({ "Name": "TCS", "date": "d2", "Close Price": "105", "PE Ratio": "30" })),
        ];

        let compressed = compress_history(&series);
        assert_eq!(compressed.len(), 2);
        assert_eq!(
            Value::Object(compressed[0].clone()),
            json!({ "date": "d1", "Close Price": "100", "PE Ratio": "30" })
        );
        assert_eq!(
            Value::Object(compressed[1].clone()),
            json!({ "date": "d2", "Close Price": "105" })
        );
    }
}
