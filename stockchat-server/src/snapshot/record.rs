//! Stock records as they appear in a screener snapshot.
//!
//! A record is an open mapping from metric name to value. Most metrics are
//! string-encoded numbers ("18.4", "25,000 Cr", "3.2%"), so every numeric
//! read goes through [`StockRecord::numeric_metric`].

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names used by the screener dataset.
pub mod metrics {
    pub const NAME: &str = "Name";
    pub const DATE: &str = "date";
    pub const SYMBOL: &str = "symbol";
    pub const CLOSE_PRICE: &str = "Close Price";
    pub const MARKET_CAP: &str = "↓Market Cap";
    pub const RETURN_ON_EQUITY: &str = "Return on Equity";
    pub const PE_RATIO: &str = "PE Ratio";
    pub const DEBT_TO_EQUITY: &str = "Debt to Equity";
    pub const FREE_CASH_FLOW: &str = "Free Cash Flow";
    pub const DIVIDEND_YIELD: &str = "Dividend Yield";
    pub const EPS_GROWTH_1Y: &str = "1Y Historical EPS Growth";
    pub const REVENUE_GROWTH_1Y: &str = "1Y Historical Revenue Growth";
    pub const SUB_SECTOR: &str = "Sub-Sector";
    pub const RSI_14D: &str = "RSI – 14D";
    pub const PROMOTER_HOLDING: &str = "Promoter Holding";
    pub const FII_HOLDING: &str = "Foreign Institutional Holding";
    pub const DII_HOLDING: &str = "Domestic Institutional Holding";
    pub const EARNINGS_PER_SHARE: &str = "Earnings Per Share";
    pub const ROCE: &str = "ROCE";
    pub const NET_PROFIT_MARGIN: &str = "Net Profit Margin";
    pub const ANALYST_BUY_RECOS: &str = "Percentage Buy Reco's";
}

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").unwrap());

/// Parse the longest numeric prefix of `text` ("18.5%" → 18.5, "12abc" → 12).
///
/// Returns `None` for empty or non-numeric text.
pub fn parse_leading_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    LEADING_NUMBER
        .find(trimmed)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// One stock's metrics within a snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockRecord(Map<String, Value>);

impl StockRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// The record's `Name` field, if it is a string.
    pub fn name(&self) -> Option<&str> {
        self.text(metrics::NAME)
    }

    /// The `date` field attached to historical entries.
    pub fn date(&self) -> Option<&str> {
        self.text(metrics::DATE)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// A string-valued field.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Numeric value of a metric, with `fallback` for missing, empty or
    /// unparsable values.
    ///
    /// JSON numbers are used as-is; strings are read by their leading
    /// numeric prefix.
    pub fn numeric_metric(&self, key: &str, fallback: f64) -> f64 {
        match self.0.get(key) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(fallback),
            Some(Value::String(s)) => parse_leading_number(s).unwrap_or(fallback),
            _ => fallback,
        }
    }

    /// Case-insensitive substring match of `query` against `Name`.
    pub fn name_contains(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.name()
            .is_some_and(|name| name.to_lowercase().contains(&needle))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Copy of this record with the snapshot date attached.
    pub fn with_date(&self, date: impl Into<String>) -> Self {
        let mut dated = self.clone();
        dated.insert(metrics::DATE, date.into());
        dated
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for StockRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for StockRecord {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> StockRecord {
        StockRecord::try_from(value).unwrap()
    }

    #[test]
    fn test_parse_leading_number() {
        assert_eq!(parse_leading_number("18.5"), Some(18.5));
        assert_eq!(parse_leading_number("18.5%"), Some(18.5));
        assert_eq!(parse_leading_number("  -3.2 Cr"), Some(-3.2));
        assert_eq!(parse_leading_number(".5"), Some(0.5));
        assert_eq!(parse_leading_number("1e3"), Some(1000.0));
        assert_eq!(parse_leading_number("1,234"), Some(1.0));
        assert_eq!(parse_leading_number("NA"), None);
        assert_eq!(parse_leading_number(""), None);
    }

    #[test]
    fn test_numeric_metric_fallbacks() {
        let r = record(json!({
            "Return on Equity": "22.4",
            "PE Ratio": 18,
            "Debt to Equity": "",
            "Dividend Yield": "NA",
            "RSI – 14D": null
        }));

        assert_eq!(r.numeric_metric(metrics::RETURN_ON_EQUITY, 0.0), 22.4);
        assert_eq!(r.numeric_metric(metrics::PE_RATIO, 999.0), 18.0);
        assert_eq!(r.numeric_metric(metrics::DEBT_TO_EQUITY, 999.0), 999.0);
        assert_eq!(r.numeric_metric(metrics::DIVIDEND_YIELD, 0.0), 0.0);
        assert_eq!(r.numeric_metric(metrics::RSI_14D, 50.0), 50.0);
        assert_eq!(r.numeric_metric("Missing", 7.0), 7.0);
    }

    #[test]
    fn test_name_contains_is_case_insensitive() {
        let r = record(json!({ "Name": "Tata Motors Ltd" }));
        assert!(r.name_contains("TATA"));
        assert!(r.name_contains("motors"));
        assert!(!r.name_contains("steel"));
    }

    #[test]
    fn test_non_string_name_never_matches() {
        let r = record(json!({ "Name": 42 }));
        assert!(!r.name_contains("42"));
    }

    #[test]
    fn test_with_date_leaves_source_untouched() {
        let r = record(json!({ "Name": "Infosys" }));
        let dated = r.with_date("2025-06-14T15:38:00Z");
        assert_eq!(dated.date(), Some("2025-06-14T15:38:00Z"));
        assert!(r.date().is_none());
    }

    #[test]
    fn test_try_from_rejects_non_objects() {
        assert!(StockRecord::try_from(json!([1, 2])).is_err());
    }
}
