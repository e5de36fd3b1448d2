//! Structured-reply extraction from free-form provider text.
//!
//! Providers are asked for JSON but routinely wrap it in prose or
//! markdown fences. The rules here are deliberately treated as policy:
//! prefer a fenced code block, fall back to the first bare brace span,
//! require the `action` field, default everything else.

use crate::llm::ProviderReply;
use poker_common::Alternative;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::warn;

/// Parse a provider's raw text into a structured reply.
///
/// Returns None when no JSON object can be found or the mandatory
/// `action` field is missing; "no reply" is an ordinary value here, not
/// an error condition.
pub fn parse_provider_reply(text: &str) -> Option<ProviderReply> {
    let json_str = extract_json(text)?;

    let value: Value = match serde_json::from_str(&json_str) {
        Ok(v) => v,
        Err(e) => {
            warn!("JSON parse error in provider reply: {}", e);
            return None;
        }
    };

    let action = match value.get("action").and_then(|a| a.as_str()) {
        Some(a) if !a.is_empty() => a.to_string(),
        _ => {
            warn!("Missing 'action' in provider reply");
            return None;
        }
    };

    Some(ProviderReply {
        action,
        amount: value.get("amount").and_then(|a| a.as_f64()),
        confidence: value
            .get("confidence")
            .and_then(|c| c.as_f64())
            .unwrap_or(0.75),
        reasoning: value
            .get("reasoning")
            .and_then(|r| r.as_str())
            .unwrap_or("")
            .to_string(),
        alternatives: parse_alternatives(value.get("alternatives")),
    })
}

/// Find the JSON payload: fenced block first, then bare braces.
fn extract_json(text: &str) -> Option<String> {
    static FENCED: OnceLock<Regex> = OnceLock::new();
    static BARE: OnceLock<Regex> = OnceLock::new();

    let fenced = FENCED.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("valid fence regex")
    });
    if let Some(cap) = fenced.captures(text) {
        return Some(cap[1].to_string());
    }

    let bare = BARE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid brace regex"));
    bare.find(text).map(|m| m.as_str().to_string())
}

fn parse_alternatives(value: Option<&Value>) -> Vec<Alternative> {
    value
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|alt| {
                    let action = alt.get("action").and_then(|a| a.as_str())?;
                    Some(Alternative {
                        action: action.to_string(),
                        confidence: alt.get("confidence").and_then(|c| c.as_f64()).unwrap_or(0.5),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}
