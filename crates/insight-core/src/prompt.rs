//! Prompt Templates

use crate::evidence::{EvidenceSet, truncate_chars};

/// Character budget for market data embedded in the strategy prompt
pub const MAX_MARKET_DATA_CHARS: usize = 2000;

/// Fixed instruction sent with every completion request
pub const JSON_ONLY_INSTRUCTION: &str = "You are a crypto wallet analyst. \
Reply with exactly one JSON value and nothing else: no prose, no markdown, no code fences.";

const INSIGHT_TEMPLATE: &str = r#"Analyze the following wallet transactions and generate 3-5 actionable insights. Focus on:
- Gas fee trends and optimization opportunities
- Portfolio diversification patterns
- Swap opportunities and timing
- Trading volume trends
- Risk indicators

Transactions data:
{evidence}

Return a JSON array with objects containing:
- "title": string (short, catchy title)
- "description": string (detailed explanation)
- "impactScore": integer (0-10, where 10 is highest impact)
- "type": string (one of: "gas", "portfolio", "swap", "volume", "general")

Example format:
[
  {
    "title": "Gas fees increased by 13%",
    "description": "Your gas fees increased by 13% this week compared to last week. Consider batching transactions or using Layer 2 solutions.",
    "impactScore": 7,
    "type": "gas"
  }
]

Return ONLY valid JSON, no markdown formatting."#;

/// Prompt asking for an insight array over the given evidence
pub fn insight_prompt(evidence: &EvidenceSet) -> String {
    INSIGHT_TEMPLATE.replace("{evidence}", evidence.as_str())
}

/// Prompt asking for a single strategy object.
///
/// Goal and market data are placed positionally, so neither can inject text
/// into the other's slot.
pub fn strategy_prompt(goal: &str, market_data: &serde_json::Value) -> String {
    let mut market = market_data.to_string();
    truncate_chars(&mut market, MAX_MARKET_DATA_CHARS);
    let goal = goal.trim();

    format!(
        r#"The user has the following financial goal: "{goal}"

Current market data:
{market}

Generate a realistic DeFi or crypto investment strategy to achieve this goal. Include:
- Strategy overview (diversification approach, key tokens/DeFi protocols)
- Timeline (realistic timeframes)
- Risk rating (1-10, where 10 is highest risk)
- Specific suggestions (actionable steps)
- Expected return range (realistic percentage)

Return a JSON object with:
{{
  "strategy": string (detailed strategy description),
  "timeline": string (e.g., "6 months", "1 year"),
  "risk": integer (1-10),
  "suggestion": string (actionable steps),
  "expectedReturn": string (e.g., "15-25%")
}}

Return ONLY valid JSON, no markdown formatting."#
    )
}
