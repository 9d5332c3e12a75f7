//! Query classification.
//!
//! A query either names one company ("INFOSYS", "TCS stock") or describes a
//! screen over the whole universe ("high roe small cap IT stocks").

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use stockchat_common::ScreenerConfig;

/// How a free-text query should be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    SingleSymbol,
    AdvancedScreen,
}

/// Decides whether a query names a single ticker.
pub trait SymbolRecognizer: Send + Sync {
    fn is_symbol(&self, query: &str) -> bool;
}

/// Ticker-like query shapes, matched against the upper-cased query.
static SYMBOL_SHAPES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^[A-Z]{2,10}$",
        r"^[A-Z]{2,10}\s*\([A-Z]+\)$",
        r"(?i)^[A-Z]{2,10}\s+stock$",
        r"(?i)^[A-Z]{2,10}\s+share$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Recognizer backed by a configurable ticker registry plus the ticker-like
/// shapes above.
#[derive(Debug, Clone, Default)]
pub struct RegistrySymbolRecognizer {
    symbols: HashSet<String>,
}

impl RegistrySymbolRecognizer {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            symbols: symbols
                .into_iter()
                .map(|s| s.as_ref().trim().to_uppercase())
                .collect(),
        }
    }

    pub fn from_config(config: &ScreenerConfig) -> Self {
        Self::new(config.symbols.iter().map(|entry| entry.symbol.as_str()))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl SymbolRecognizer for RegistrySymbolRecognizer {
    fn is_symbol(&self, query: &str) -> bool {
        let clean = query.trim().to_uppercase();

        if self.symbols.contains(&clean) {
            return true;
        }

        SYMBOL_SHAPES.iter().any(|shape| shape.is_match(&clean))
    }
}
