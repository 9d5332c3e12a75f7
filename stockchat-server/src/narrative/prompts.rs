//! Prompt templates.

use serde::Serialize;

use stockchat_common::Result;

const CLOSING_STYLE: &str = "Use simple language, clear headers, bullet points, and markdown tables. \
Be friendly and explain concepts clearly. Focus on actionable insights and practical investment advice.";

const EVALUATION_FRAMEWORK: &str = r#"# AI Evaluation Framework

## 1. Financial Strength
- **Metrics:** ROE, ROCE, Net Profit Margin, Free Cash Flow, Debt/Equity, Interest Coverage
- **Why Invest:** Positive cash flow, ROE > 15%, Debt/Equity < 0.5, stable earnings
- **Why Not Invest:** High leverage (D/E > 1), negative FCF, low interest coverage → distress risk

## 2. Growth Potential
- **Scenarios:**
  - Bear → EPS drops 10%
  - Base → EPS grows 20%
  - Bull → EPS grows 50%
- **Why Invest:** Stable or improving EPS; sector tailwinds
- **Why Not Invest:** Past EPS decline, inconsistent performance, no growth catalysts

## 3. Valuation
- **Calculations:**
  - Forecasted Price = EPS_next_year × PE_multiple
  - Bear: -10% EPS, PE 15
  - Base: +20% EPS, PE 25
  - Bull: +50% EPS, PE 35
- **Why Invest:** Current PE < Sector PE, Forward PE < Current PE
- **Why Not Invest:** Overvalued PE, market has priced in full upside

## 4. Ownership & Trust
- **Check:** Promoter Holding, Pledged Shares %, FII/DII Holdings
- **Why Invest:** High promoter skin-in-the-game (>50%), 0% pledging
- **Why Not Invest:** >10% pledged shares, promoter selling, no institutional trust

## 5. Market Sentiment & Technicals
- **Signals:** RSI, % below 52W High, Analyst ratings
- **Why Invest:** RSI < 40 (oversold), positive analyst consensus
- **Why Not Invest:** RSI > 70 (overbought), no analyst coverage = low conviction

## 6. Price Forecast Table (1Y)
Create a markdown table:
| Scenario | EPS | PE | Forecasted Price | % Gain/Loss |
|---|---|---|---|---|
| Bear | (calc) | 15 | (calc) | (calc) |
| Base | (calc) | 25 | (calc) | (calc) |
| Bull | (calc) | 35 | (calc) | (calc) |

## 7. ₹100,000 Investment Simulation
- Compute: Units = 100000 / current price
- Projected portfolio value under each scenario
- Output as markdown table:
| Scenario | Exit Value | Gain/Loss |
|---|---|---|
| Bear | (calc) | (calc) |
| Base | (calc) | (calc) |
| Bull | (calc) | (calc) |

## 8. Investment Approach for ₹100,000
- Decide on Lump Sum vs Tranches
- If tranches, suggest price points and allocation per tranche
- Explain reasoning

## 9. Final Recommendation Block
- **Verdict:** Invest / Watch / Avoid - Explain Why
- **Type:** Core / Speculative / High-risk - Explain Why
- **Why Invest:** Summarized pros from all sections - Explain Why
- **Why Not Invest:** Summarized risks from all sections - Explain Why
- **Suggested Allocation:** e.g., 5-10% - Explain Why
- **Hold Period:** Recommend a time window (e.g., 6-12 months, 12-24 months) and explain why
- **Triggers to Monitor:** List key triggers (e.g., promoter pledging decrease, quarterly EPS beat, MF/FII entry, etc.)"#;

const SCREEN_SECTIONS: &str = "Please provide a comprehensive analysis with:

1. **Query Interpretation** - What the user is looking for and why it's important
2. **Screening Criteria Used** - Explain the specific filters applied and their significance
3. **Top Recommendations** - 5-10 best stocks with detailed reasons for selection
4. **Risk Assessment** - Potential risks and considerations for this type of investment
5. **Investment Strategy** - How to approach these stocks (timing, allocation, etc.)
6. **Portfolio Allocation** - Suggested allocation for ₹100,000 investment
7. **Monitoring Triggers** - What to watch for (earnings, news, technical indicators)
8. **Additional Insights** - Any other relevant analysis or recommendations";

/// Single-company evaluation prompt over the merged record and its
/// (compressed) history.
pub fn stock_evaluation_prompt<S, H>(stock: &S, history: Option<&H>) -> Result<String>
where
    S: Serialize + ?Sized,
    H: Serialize + ?Sized,
{
    let stock_json = serde_json::to_string_pretty(stock)?;
    let history_block = match history {
        Some(history) => format!(
            "Historical Data:\n{}",
            serde_json::to_string_pretty(history)?
        ),
        None => String::new(),
    };

    Ok(format!(
        "You are a senior investment analyst. Use the following AI Evaluation Framework to analyze the stock \
and produce a detailed, strategic investment evaluation. For every section, explain both \"Why Invest\" and \
\"Why Not Invest\" using the logic and metrics provided. Use markdown tables and clear headers. Be actionable and strategic.

Stock Data:
{stock_json}

{history_block}

---

{EVALUATION_FRAMEWORK}

---

{CLOSING_STYLE}"
    ))
}

/// Prompt for an advanced screen over the surviving records.
pub fn screen_analysis_prompt<R>(query: &str, records: &R) -> Result<String>
where
    R: Serialize + ?Sized,
{
    let records_json = serde_json::to_string_pretty(records)?;

    Ok(format!(
        "You are a senior investment analyst. The user has asked: \"{query}\"

I have analyzed the Indian stock market and applied sophisticated filtering based on your criteria. \
Here are the top stocks that match your requirements:

{records_json}

{SCREEN_SECTIONS}

{CLOSING_STYLE}"
    ))
}

/// System instruction for headline sentiment.
pub fn sentiment_system_prompt(symbol: &str) -> String {
    format!(
        "You are a financial analyst. Analyze the sentiment (positive, negative, neutral) for the stock {symbol} \
based on the following news and social headlines. Summarize the overall sentiment and mention any notable \
trends or risks. If PDF research is mentioned, acknowledge it as a future enhancement."
    )
}

/// Numbered headline list, with a note when broker research text was attached.
pub fn sentiment_user_prompt(symbol: &str, headlines: &[String], has_research_text: bool) -> String {
    let numbered: Vec<String> = headlines
        .iter()
        .enumerate()
        .map(|(i, headline)| format!("{}. {}", i + 1, headline))
        .collect();

    let mut prompt = format!(
        "Recent news and social headlines for {}:\n{}",
        symbol,
        numbered.join("\n")
    );

    if has_research_text {
        prompt.push_str(
            "\n\n(Placeholder) Broker research PDF text is available but not yet processed.",
        );
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stock_prompt_with_history() {
        let prompt =
            stock_evaluation_prompt(&json!({ "Name": "Infosys" }), Some(&json!([{ "date": "d" }])))
                .unwrap();
        assert!(prompt.contains("\"Name\": \"Infosys\""));
        assert!(prompt.contains("Historical Data:"));
        assert!(prompt.contains("## 9. Final Recommendation Block"));
    }

    #[test]
    fn test_stock_prompt_without_history() {
        let prompt = stock_evaluation_prompt::<_, serde_json::Value>(&json!({}), None).unwrap();
        assert!(!prompt.contains("Historical Data:"));
    }

    #[test]
    fn test_screen_prompt_quotes_query() {
        let prompt = screen_analysis_prompt("zero debt", &json!([])).unwrap();
        assert!(prompt.contains("The user has asked: \"zero debt\""));
        assert!(prompt.contains("8. **Additional Insights**"));
    }

    #[test]
    fn test_sentiment_user_prompt() {
        let headlines = vec!["Q1 beat".to_string(), "New CEO".to_string()];
        let prompt = sentiment_user_prompt("TCS", &headlines, false);
        assert_eq!(
            prompt,
            "Recent news and social headlines for TCS:\n1. Q1 beat\n2. New CEO"
        );
        assert!(sentiment_user_prompt("TCS", &headlines, true).contains("(Placeholder)"));
    }

    #[test]
    fn test_sentiment_system_prompt_names_symbol() {
        assert!(sentiment_system_prompt("WIPRO").contains("for the stock WIPRO"));
    }
}
