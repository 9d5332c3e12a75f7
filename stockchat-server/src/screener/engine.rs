//! Screening engine.
//!
//! Classifies queries and reduces a snapshot to a bounded candidate set for
//! advanced screens.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use stockchat_common::ScreenerConfig;

use crate::snapshot::StockRecord;

use super::classifier::{QueryKind, RegistrySymbolRecognizer, SymbolRecognizer};
use super::rules::{ScreenRule, DEFAULT_RULES};

// ============================================================================
// Screening Outcome
// ============================================================================

/// How many records one rule let through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleResult {
    pub rule: &'static str,
    pub passed: usize,
    pub eliminated: usize,
}

impl RuleResult {
    fn new(rule: &'static str, input_count: usize, passed: usize) -> Self {
        Self {
            rule,
            passed,
            eliminated: input_count.saturating_sub(passed),
        }
    }
}

/// Result of screening a snapshot against a query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningOutcome {
    /// Surviving records, truncated to the result limit
    pub records: Vec<StockRecord>,
    /// Names of the rules the query triggered, in application order
    pub applied_rules: Vec<&'static str>,
    pub total_scanned: usize,
    pub rule_results: Vec<RuleResult>,
}

impl ScreeningOutcome {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// Screening Engine
// ============================================================================

pub struct ScreeningEngine {
    recognizer: Arc<dyn SymbolRecognizer>,
    rules: Vec<ScreenRule>,
    result_limit: usize,
}

impl ScreeningEngine {
    pub fn new(recognizer: Arc<dyn SymbolRecognizer>, result_limit: usize) -> Self {
        Self {
            recognizer,
            rules: DEFAULT_RULES.to_vec(),
            result_limit,
        }
    }

    /// Engine with the registry recognizer and limit from configuration.
    pub fn from_config(config: &ScreenerConfig) -> Self {
        Self::new(
            Arc::new(RegistrySymbolRecognizer::from_config(config)),
            config.result_limit,
        )
    }

    pub fn classify(&self, query: &str) -> QueryKind {
        if self.recognizer.is_symbol(query) {
            QueryKind::SingleSymbol
        } else {
            QueryKind::AdvancedScreen
        }
    }

    /// Rules fired by `query`, in table order. Within an exclusive group
    /// only the first triggered rule is kept.
    pub fn triggered_rules(&self, query: &str) -> Vec<&ScreenRule> {
        let lower = query.to_lowercase();
        let mut groups_taken = HashSet::new();

        self.rules
            .iter()
            .filter(|rule| rule.is_triggered(&lower))
            .filter(|rule| match rule.exclusive_group {
                Some(group) => groups_taken.insert(group),
                None => true,
            })
            .collect()
    }

    /// Apply every triggered rule to `records` and keep the first
    /// `result_limit` survivors. `records` is never modified.
    pub fn filter_by_query(&self, records: &[StockRecord], query: &str) -> ScreeningOutcome {
        let mut working: Vec<&StockRecord> = records.iter().collect();
        let mut applied_rules = Vec::new();
        let mut rule_results = Vec::new();

        for rule in self.triggered_rules(query) {
            let before = working.len();
            working.retain(|record| rule.predicate.matches(record));

            if let Some(sort) = &rule.sort {
                sort.apply(&mut working);
            }

            debug!(
                rule = rule.name,
                before,
                after = working.len(),
                "Applied screening rule"
            );

            applied_rules.push(rule.name);
            rule_results.push(RuleResult::new(rule.name, before, working.len()));
        }

        let records_out: Vec<StockRecord> = working
            .into_iter()
            .take(self.result_limit)
            .cloned()
            .collect();

        ScreeningOutcome {
            records: records_out,
            applied_rules,
            total_scanned: records.len(),
            rule_results,
        }
    }
}
