//! User-supplied metric overrides for single-stock insights.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::snapshot::{metrics, StockRecord};

/// Optional values the user typed in, keyed by their request field names.
///
/// Values are kept as raw JSON: users send numbers or strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightOverrides {
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub eps: Option<Value>,
    #[serde(default)]
    pub roe: Option<Value>,
    #[serde(default)]
    pub roce: Option<Value>,
    #[serde(default)]
    pub net_margin: Option<Value>,
    #[serde(default)]
    pub debt_equity: Option<Value>,
    #[serde(default)]
    pub promoter_holding: Option<Value>,
    #[serde(default)]
    pub rsi: Option<Value>,
    #[serde(default)]
    pub analyst_ratings: Option<Value>,
}

impl InsightOverrides {
    /// Dataset field name paired with each override, in merge order.
    fn pairs(&self) -> [(&'static str, &Option<Value>); 9] {
        [
            (metrics::CLOSE_PRICE, &self.price),
            (metrics::EARNINGS_PER_SHARE, &self.eps),
            (metrics::RETURN_ON_EQUITY, &self.roe),
            (metrics::ROCE, &self.roce),
            (metrics::NET_PROFIT_MARGIN, &self.net_margin),
            (metrics::DEBT_TO_EQUITY, &self.debt_equity),
            (metrics::PROMOTER_HOLDING, &self.promoter_holding),
            (metrics::RSI_14D, &self.rsi),
            (metrics::ANALYST_BUY_RECOS, &self.analyst_ratings),
        ]
    }

    /// Whether any override would change a record.
    pub fn is_empty(&self) -> bool {
        self.pairs()
            .iter()
            .all(|(_, value)| !value.as_ref().is_some_and(is_truthy))
    }
}

/// JSON truthiness: null, false, 0, NaN and "" are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Merge truthy overrides onto `record` under their dataset field names.
pub fn apply_overrides(mut record: StockRecord, overrides: &InsightOverrides) -> StockRecord {
    for (field, value) in overrides.pairs() {
        if let Some(value) = value.as_ref().filter(|v| is_truthy(v)) {
            record.insert(field, value.clone());
        }
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!(12.5)));
    }

    #[test]
    fn test_apply_overrides_maps_field_names() {
        let overrides: InsightOverrides = serde_json::from_value(json!({
            "price": 1500,
            "netMargin": "18%",
            "rsi": 0,
            "analystRatings": "80"
        }))
        .unwrap();

        let base = StockRecord::try_from(json!({ "Name": "Infosys", "RSI – 14D": "45" })).unwrap();
        let merged = apply_overrides(base, &overrides);

        assert_eq!(merged.get("Close Price"), Some(&json!(1500)));
        assert_eq!(merged.get("Net Profit Margin"), Some(&json!("18%")));
        assert_eq!(merged.get("RSI – 14D"), Some(&json!("45")));
        assert_eq!(merged.get("Percentage Buy Reco's"), Some(&json!("80")));
        assert!(!overrides.is_empty());
    }

    #[test]
    fn test_empty_overrides() {
        assert!(InsightOverrides::default().is_empty());
        let zeroes: InsightOverrides =
            serde_json::from_value(json!({ "price": 0, "eps": "" })).unwrap();
        assert!(zeroes.is_empty());
    }
}
