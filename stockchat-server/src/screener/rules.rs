//! Keyword-triggered screening rules.
//!
//! Each rule fires when any of its trigger phrases appears in the
//! lower-cased query. Triggered rules narrow the working set in table order;
//! a rule with a sort re-orders the survivors, so the last sorting rule wins.

use serde::Serialize;

use crate::snapshot::{metrics, parse_leading_number, StockRecord};

// ============================================================================
// Market cap
// ============================================================================

/// Market capitalisation tier, in the dataset's own unit (crores).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarketCapCategory {
    Large,
    Mid,
    Small,
}

const LARGE_CAP_FLOOR: f64 = 20_000.0;
const MID_CAP_FLOOR: f64 = 5_000.0;

/// Tier of a currency-formatted cap string ("25,000 Cr" → Large).
///
/// Everything except digits and dots is stripped before parsing; an
/// unparsable value counts as 0 and lands in `Small`.
pub fn categorize_market_cap(cap: &str) -> MarketCapCategory {
    let digits: String = cap
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value = parse_leading_number(&digits).unwrap_or(0.0);

    if value >= LARGE_CAP_FLOOR {
        MarketCapCategory::Large
    } else if value >= MID_CAP_FLOOR {
        MarketCapCategory::Mid
    } else {
        MarketCapCategory::Small
    }
}

fn market_cap_of(record: &StockRecord) -> MarketCapCategory {
    match record.get(metrics::MARKET_CAP) {
        Some(serde_json::Value::String(s)) => categorize_market_cap(s),
        Some(serde_json::Value::Number(n)) => categorize_market_cap(&n.to_string()),
        _ => categorize_market_cap(""),
    }
}

// ============================================================================
// Predicates and sorts
// ============================================================================

/// Numeric metric read with a fallback for missing or unparsable values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metric {
    pub key: &'static str,
    pub fallback: f64,
}

impl Metric {
    pub const fn new(key: &'static str, fallback: f64) -> Self {
        Self { key, fallback }
    }

    pub fn read(&self, record: &StockRecord) -> f64 {
        record.numeric_metric(self.key, self.fallback)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Predicate {
    MarketCap(MarketCapCategory),
    Above(Metric, f64),
    Below(Metric, f64),
    /// Strictly between the two bounds
    Between(Metric, f64, f64),
    Equals(Metric, f64),
    /// Sum of two metrics above a threshold
    SumAbove(Metric, Metric, f64),
    /// Lower-cased `Sub-Sector` contains the needle
    SubSectorContains(&'static str),
}

impl Predicate {
    pub fn matches(&self, record: &StockRecord) -> bool {
        match *self {
            Self::MarketCap(category) => market_cap_of(record) == category,
            Self::Above(metric, threshold) => metric.read(record) > threshold,
            Self::Below(metric, threshold) => metric.read(record) < threshold,
            Self::Between(metric, low, high) => {
                let v = metric.read(record);
                v > low && v < high
            }
            Self::Equals(metric, value) => metric.read(record) == value,
            Self::SumAbove(a, b, threshold) => a.read(record) + b.read(record) > threshold,
            Self::SubSectorContains(needle) => record
                .text(metrics::SUB_SECTOR)
                .is_some_and(|s| s.to_lowercase().contains(needle)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortSpec {
    pub metric: Metric,
    pub order: SortOrder,
}

impl SortSpec {
    const fn desc(metric: Metric) -> Option<Self> {
        Some(Self {
            metric,
            order: SortOrder::Descending,
        })
    }

    const fn asc(metric: Metric) -> Option<Self> {
        Some(Self {
            metric,
            order: SortOrder::Ascending,
        })
    }

    /// Stable in-place sort; equal keys keep their relative order.
    pub fn apply(&self, records: &mut [&StockRecord]) {
        records.sort_by(|a, b| {
            let (x, y) = (self.metric.read(a), self.metric.read(b));
            let ord = x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal);
            match self.order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });
    }
}

// ============================================================================
// Rule table
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenRule {
    pub name: &'static str,
    pub triggers: &'static [&'static str],
    pub predicate: Predicate,
    pub sort: Option<SortSpec>,
    /// Rules sharing a group are alternatives; only the first triggered one applies
    pub exclusive_group: Option<&'static str>,
}

impl ScreenRule {
    /// Whether any trigger phrase occurs in the lower-cased query.
    pub fn is_triggered(&self, lower_query: &str) -> bool {
        self.triggers.iter().any(|t| lower_query.contains(t))
    }
}

const ROE: Metric = Metric::new(metrics::RETURN_ON_EQUITY, 0.0);
const PE: Metric = Metric::new(metrics::PE_RATIO, 0.0);
const PE_FOR_SORT: Metric = Metric::new(metrics::PE_RATIO, 999.0);
const DEBT_TO_EQUITY: Metric = Metric::new(metrics::DEBT_TO_EQUITY, 999.0);
const FCF: Metric = Metric::new(metrics::FREE_CASH_FLOW, 0.0);
const DIVIDEND_YIELD: Metric = Metric::new(metrics::DIVIDEND_YIELD, 0.0);
const EPS_GROWTH: Metric = Metric::new(metrics::EPS_GROWTH_1Y, 0.0);
const REVENUE_GROWTH: Metric = Metric::new(metrics::REVENUE_GROWTH_1Y, 0.0);
const RSI: Metric = Metric::new(metrics::RSI_14D, 50.0);
const PROMOTER: Metric = Metric::new(metrics::PROMOTER_HOLDING, 0.0);
const FII: Metric = Metric::new(metrics::FII_HOLDING, 0.0);
const DII: Metric = Metric::new(metrics::DII_HOLDING, 0.0);

const MARKET_CAP_GROUP: Option<&str> = Some("market_cap");

/// The screening rules, in application order.
pub const DEFAULT_RULES: &[ScreenRule] = &[
    ScreenRule {
        name: "large_cap",
        triggers: &["large cap", "large-cap"],
        predicate: Predicate::MarketCap(MarketCapCategory::Large),
        sort: None,
        exclusive_group: MARKET_CAP_GROUP,
    },
    ScreenRule {
        name: "mid_cap",
        triggers: &["mid cap", "mid-cap"],
        predicate: Predicate::MarketCap(MarketCapCategory::Mid),
        sort: None,
        exclusive_group: MARKET_CAP_GROUP,
    },
    ScreenRule {
        name: "small_cap",
        triggers: &["small cap", "small-cap"],
        predicate: Predicate::MarketCap(MarketCapCategory::Small),
        sort: None,
        exclusive_group: MARKET_CAP_GROUP,
    },
    ScreenRule {
        name: "high_roe",
        triggers: &["highest roe", "high roe"],
        predicate: Predicate::Above(ROE, 15.0),
        sort: SortSpec::desc(ROE),
        exclusive_group: None,
    },
    ScreenRule {
        name: "low_pe",
        triggers: &["low p/e", "low pe", "undervalued"],
        predicate: Predicate::Between(PE, 0.0, 25.0),
        sort: SortSpec::asc(PE_FOR_SORT),
        exclusive_group: None,
    },
    ScreenRule {
        name: "zero_debt",
        triggers: &["zero debt", "no debt"],
        predicate: Predicate::Equals(DEBT_TO_EQUITY, 0.0),
        sort: None,
        exclusive_group: None,
    },
    ScreenRule {
        name: "free_cash_flow",
        triggers: &["free cash flow", "fcf"],
        predicate: Predicate::Above(FCF, 0.0),
        sort: None,
        exclusive_group: None,
    },
    ScreenRule {
        name: "dividend",
        triggers: &["dividend", "high dividend"],
        predicate: Predicate::Above(DIVIDEND_YIELD, 1.0),
        sort: SortSpec::desc(DIVIDEND_YIELD),
        exclusive_group: None,
    },
    ScreenRule {
        name: "eps_growth",
        triggers: &["eps growth", "earnings growth"],
        predicate: Predicate::Above(EPS_GROWTH, 10.0),
        sort: SortSpec::desc(EPS_GROWTH),
        exclusive_group: None,
    },
    ScreenRule {
        name: "revenue_growth",
        triggers: &["revenue growth", "sales growth"],
        predicate: Predicate::Above(REVENUE_GROWTH, 10.0),
        sort: SortSpec::desc(REVENUE_GROWTH),
        exclusive_group: None,
    },
    ScreenRule {
        name: "fmcg",
        triggers: &["fmcg"],
        predicate: Predicate::SubSectorContains("fmcg"),
        sort: None,
        exclusive_group: None,
    },
    ScreenRule {
        name: "banking",
        triggers: &["bank", "banking"],
        predicate: Predicate::SubSectorContains("bank"),
        sort: None,
        exclusive_group: None,
    },
    ScreenRule {
        name: "it",
        triggers: &["it", "software"],
        predicate: Predicate::SubSectorContains("it"),
        sort: None,
        exclusive_group: None,
    },
    ScreenRule {
        name: "auto",
        triggers: &["auto", "automobile"],
        predicate: Predicate::SubSectorContains("auto"),
        sort: None,
        exclusive_group: None,
    },
    ScreenRule {
        name: "oversold",
        triggers: &["oversold", "rsi"],
        predicate: Predicate::Below(RSI, 30.0),
        sort: None,
        exclusive_group: None,
    },
    ScreenRule {
        name: "overbought",
        triggers: &["overbought"],
        predicate: Predicate::Above(RSI, 70.0),
        sort: None,
        exclusive_group: None,
    },
    ScreenRule {
        name: "promoter_holding",
        triggers: &["promoter holding", "promoter stake"],
        predicate: Predicate::Above(PROMOTER, 50.0),
        sort: None,
        exclusive_group: None,
    },
    ScreenRule {
        name: "institutional_holding",
        triggers: &["institutional", "fii", "dii"],
        predicate: Predicate::SumAbove(FII, DII, 20.0),
        sort: None,
        exclusive_group: None,
    },
];
