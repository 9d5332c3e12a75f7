//! Analysis helpers layered on top of snapshot records.

pub mod market;
pub mod overrides;
pub mod portfolio;

pub use market::{
    compress_history, market_sentiment, price_change, price_change_between, MarketSentiment,
    PriceChange,
};
pub use overrides::{apply_overrides, is_truthy, InsightOverrides};
pub use portfolio::{analyze_portfolio, risk_metrics, PortfolioAnalytics, PortfolioItem, RiskMetrics};
