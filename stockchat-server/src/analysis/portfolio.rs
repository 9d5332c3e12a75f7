//! Portfolio analytics.
//!
//! Pure computation over the holdings the client sends; nothing here touches
//! snapshots or the LLM.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const RISK_FREE_RATE: f64 = 0.02;
const PERFORMER_COUNT: usize = 3;
const CONCENTRATION_LIMIT: f64 = 0.3;
const SECTOR_LIMIT: f64 = 0.4;
const REVIEW_LOSS_PERCENT: f64 = -10.0;
const MIN_HOLDINGS: usize = 5;
const HIGH_VOLATILITY: f64 = 0.2;
const OTHER_SECTOR: &str = "Other";

/// One position as tracked by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub shares: f64,
    #[serde(default)]
    pub avg_price: f64,
    #[serde(default)]
    pub current_price: f64,
    #[serde(default)]
    pub total_value: f64,
    #[serde(default)]
    pub gain_loss: f64,
    #[serde(default)]
    pub gain_loss_percent: f64,
}

impl PortfolioItem {
    pub fn cost(&self) -> f64 {
        self.shares * self.avg_price
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    /// Population standard deviation of position returns (fractions)
    pub volatility: f64,
    pub beta: f64,
    pub sharpe_ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioAnalytics {
    pub total_value: f64,
    pub total_cost: f64,
    pub total_gain_loss: f64,
    pub total_gain_loss_percent: f64,
    pub top_performers: Vec<PortfolioItem>,
    pub worst_performers: Vec<PortfolioItem>,
    pub sector_breakdown: BTreeMap<String, f64>,
    pub risk_metrics: RiskMetrics,
    pub recommendations: Vec<String>,
}

pub fn risk_metrics(items: &[PortfolioItem]) -> RiskMetrics {
    if items.is_empty() {
        return RiskMetrics {
            volatility: 0.0,
            beta: 1.0,
            sharpe_ratio: 0.0,
        };
    }

    let n = items.len() as f64;
    let returns: Vec<f64> = items.iter().map(|i| i.gain_loss_percent / 100.0).collect();
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let volatility = variance.sqrt();

    let sharpe_ratio = if volatility > 0.0 {
        (mean - RISK_FREE_RATE) / volatility
    } else {
        0.0
    };

    RiskMetrics {
        volatility,
        beta: 1.0,
        sharpe_ratio,
    }
}

/// Analyse `items`, resolving sectors with `sector_of` (unknown symbols go
/// to "Other").
pub fn analyze_portfolio<'a, F>(items: &[PortfolioItem], sector_of: F) -> PortfolioAnalytics
where
    F: Fn(&str) -> Option<&'a str>,
{
    let total_value: f64 = items.iter().map(|i| i.total_value).sum();
    let total_cost: f64 = items.iter().map(PortfolioItem::cost).sum();
    let total_gain_loss = total_value - total_cost;
    let total_gain_loss_percent = if total_cost > 0.0 {
        total_gain_loss / total_cost * 100.0
    } else {
        0.0
    };

    let mut by_performance = items.to_vec();
    by_performance.sort_by(|a, b| {
        b.gain_loss_percent
            .partial_cmp(&a.gain_loss_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let top_performers: Vec<_> = by_performance.iter().take(PERFORMER_COUNT).cloned().collect();
    let worst_performers: Vec<_> = by_performance
        .iter()
        .rev()
        .take(PERFORMER_COUNT)
        .cloned()
        .collect();

    let mut sector_breakdown = BTreeMap::new();
    for item in items {
        let sector = sector_of(&item.symbol).unwrap_or(OTHER_SECTOR);
        *sector_breakdown.entry(sector.to_string()).or_insert(0.0) += item.total_value;
    }

    let mut analytics = PortfolioAnalytics {
        total_value,
        total_cost,
        total_gain_loss,
        total_gain_loss_percent,
        top_performers,
        worst_performers,
        sector_breakdown,
        risk_metrics: risk_metrics(items),
        recommendations: Vec::new(),
    };
    analytics.recommendations = recommendations(items, &analytics);
    analytics
}

fn recommendations(items: &[PortfolioItem], analytics: &PortfolioAnalytics) -> Vec<String> {
    let mut out = Vec::new();

    // First of equally large holdings wins.
    let largest = items.iter().fold(None::<&PortfolioItem>, |max, item| match max {
        Some(m) if item.total_value <= m.total_value => Some(m),
        _ => Some(item),
    });

    if analytics.total_value > 0.0 {
        if let Some(top) = largest {
            if top.total_value / analytics.total_value > CONCENTRATION_LIMIT {
                out.push(format!(
                    "Consider diversifying - {} represents over 30% of your portfolio",
                    top.symbol
                ));
            }
        }

        let max_sector = analytics
            .sector_breakdown
            .values()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        if max_sector / analytics.total_value > SECTOR_LIMIT {
            out.push(
                "Your portfolio is heavily concentrated in one sector. Consider diversifying across sectors."
                    .to_string(),
            );
        }
    }

    if let Some(worst) = analytics.worst_performers.first() {
        if worst.gain_loss_percent < REVIEW_LOSS_PERCENT {
            out.push(format!(
                "Consider reviewing {} - down {:.1}%",
                worst.symbol,
                worst.gain_loss_percent.abs()
            ));
        }
    }

    if items.len() < MIN_HOLDINGS {
        out.push("Consider adding more stocks to diversify your portfolio".to_string());
    }

    if analytics.risk_metrics.volatility > HIGH_VOLATILITY {
        out.push(
            "Your portfolio shows high volatility. Consider adding defensive stocks or bonds."
                .to_string(),
        );
    }

    if out.is_empty() {
        out.push("Your portfolio looks well-balanced! Keep monitoring your positions.".to_string());
    }

    out
}
