//! Query screener.
//!
//! Turns a free-text query into either a single-company lookup or a
//! keyword-driven screen over the latest snapshot.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                       ScreeningEngine                         │
//! ├───────────────────────────────────────────────────────────────┤
//! │                                                               │
//! │  query ──▶ SymbolRecognizer ──▶ SingleSymbol / AdvancedScreen │
//! │                                          │                    │
//! │                                          ▼                    │
//! │             snapshot records ──▶ rule chain ──▶ top N         │
//! │                                  (filter, sort)               │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use stockchat_server::screener::{QueryKind, ScreeningEngine};
//!
//! let engine = ScreeningEngine::from_config(&config.screener);
//! if engine.classify(query) == QueryKind::AdvancedScreen {
//!     let outcome = engine.filter_by_query(&snapshot.records, query);
//! }
//! ```

pub mod classifier;
pub mod engine;
pub mod rules;

pub use classifier::{QueryKind, RegistrySymbolRecognizer, SymbolRecognizer};
pub use engine::{RuleResult, ScreeningEngine, ScreeningOutcome};
pub use rules::{categorize_market_cap, MarketCapCategory, ScreenRule, DEFAULT_RULES};
