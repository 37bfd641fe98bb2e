//! Response Validation
//!
//! Turns a provider's text into typed records. Providers are told to answer
//! with bare JSON, but often wrap it in markdown fences anyway; those are
//! stripped first. Anything that does not match the record shape is rejected
//! as a whole: a response never yields a partially-built record.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{InsightError, Result};
use crate::model::{InsightRecord, InsightType, MAX_IMPACT_SCORE, MAX_RISK, MIN_RISK, StrategyRecord};

const FENCE: &str = "```";

/// Remove markdown code-fence markers (with an optional language tag) and trim.
///
/// Idempotent: text without markers only loses surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(idx) = rest.find(FENCE) {
        out.push_str(&rest[..idx]);
        rest = &rest[idx + FENCE.len()..];

        let tag_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        let tag = &rest[..tag_len];
        let tag_ends_line = rest[tag_len..].starts_with(char::is_whitespace);
        if tag_len > 0 && (tag_ends_line || tag.eq_ignore_ascii_case("json")) {
            rest = &rest[tag_len..];
        }
    }
    out.push_str(rest);

    out.trim().to_string()
}

#[derive(Deserialize)]
struct RawInsight {
    title: String,
    description: String,
    #[serde(rename = "impactScore")]
    impact_score: f64,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStrategy {
    strategy: String,
    timeline: String,
    risk: f64,
    suggestion: String,
    expected_return: String,
}

/// Parse a provider answer into a non-empty list of insights.
///
/// Accepts a bare array or an `{"insights": [...]}` wrapper. Scores are
/// rounded and clamped to 0-10.
pub fn parse_insights(raw: &str) -> Result<Vec<InsightRecord>> {
    let value: Value = parse_json(raw)?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("insights") {
            Some(Value::Array(items)) => items,
            _ => return Err(InsightError::InvalidResponse("expected a JSON array of insights".into())),
        },
        _ => return Err(InsightError::InvalidResponse("expected a JSON array of insights".into())),
    };

    if items.is_empty() {
        return Err(InsightError::InvalidResponse("insight array is empty".into()));
    }

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            let raw: RawInsight = serde_json::from_value(item)
                .map_err(|e| InsightError::InvalidResponse(format!("insight {idx}: {e}")))?;
            validate_insight(raw).map_err(|msg| InsightError::InvalidResponse(format!("insight {idx}: {msg}")))
        })
        .collect()
}

fn validate_insight(raw: RawInsight) -> std::result::Result<InsightRecord, String> {
    if raw.title.trim().is_empty() {
        return Err("title is empty".into());
    }
    let kind = InsightType::parse(&raw.kind).ok_or_else(|| format!("unknown type {:?}", raw.kind))?;
    let impact_score = clamp_score(raw.impact_score, 0, MAX_IMPACT_SCORE)
        .ok_or_else(|| "impactScore is not a finite number".to_string())?;

    Ok(InsightRecord {
        title: raw.title,
        description: raw.description,
        impact_score,
        kind,
    })
}

/// Parse a provider answer into a single strategy.
///
/// Accepts a bare object or a `{"strategy": {...}}` wrapper. Risk is rounded
/// and clamped to 1-10.
pub fn parse_strategy(raw: &str) -> Result<StrategyRecord> {
    let mut value: Value = parse_json(raw)?;

    if value.get("strategy").is_some_and(Value::is_object) {
        value = value["strategy"].take();
    }
    if !value.is_object() {
        return Err(InsightError::InvalidResponse("expected a JSON object".into()));
    }

    let raw: RawStrategy =
        serde_json::from_value(value).map_err(|e| InsightError::InvalidResponse(format!("strategy: {e}")))?;
    let risk = clamp_score(raw.risk, MIN_RISK, MAX_RISK)
        .ok_or_else(|| InsightError::InvalidResponse("risk is not a finite number".into()))?;

    Ok(StrategyRecord {
        strategy: raw.strategy,
        timeline: raw.timeline,
        risk,
        suggestion: raw.suggestion,
        expected_return: raw.expected_return,
    })
}

fn parse_json(raw: &str) -> Result<Value> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str(&cleaned).map_err(|e| InsightError::InvalidResponse(format!("not JSON: {e}")))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_score(score: f64, min: u8, max: u8) -> Option<u8> {
    score
        .is_finite()
        .then(|| score.round().clamp(f64::from(min), f64::from(max)) as u8)
}
