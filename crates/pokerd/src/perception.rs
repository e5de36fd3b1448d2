//! Observation intake.
//!
//! Raw extractor output arrives as loosely structured JSON. This module
//! normalizes it into a `GameState`: tolerant field extraction, card
//! spelling normalization, and per-field confidence coercion. A missing
//! or empty confidence map is filled with a neutral 0.5 for every field
//! here, at the intake boundary, so downstream validation only ever sees
//! scores the extractor (or this normalizer) actually committed to.

use async_trait::async_trait;
use poker_common::{cards, GameState, PokerError, Position};
use serde_json::Value;
use std::collections::HashMap;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;

const NEUTRAL_CONFIDENCE: f64 = 0.5;
const CONFIDENCE_FIELDS: [&str; 4] = ["hole_cards", "board", "pot", "stacks"];

/// Source of raw table observations. One call, at most one frame.
///
/// Sources hand back the raw payload untouched; the pipeline runs
/// `normalize_observation` itself so intake latency is measured where
/// the rest of the stage latencies are.
#[async_trait]
pub trait Perception: Send {
    /// Next raw observation, or `None` when the source is exhausted.
    async fn observe(&mut self) -> Result<Option<Value>, PokerError>;
}

/// Reads one JSON observation per line from stdin.
///
/// Lines that fail to parse are logged and skipped rather than ending
/// the stream; an upstream extractor hiccup should not kill the daemon.
pub struct StdinPerception {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinPerception {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinPerception {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Perception for StdinPerception {
    async fn observe(&mut self) -> Result<Option<Value>, PokerError> {
        loop {
            let line = self
                .lines
                .next_line()
                .await
                .map_err(|e| PokerError::Sensing(format!("stdin read failed: {}", e)))?;

            let Some(line) = line else {
                return Ok(None);
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<Value>(trimmed) {
                Ok(raw) => return Ok(Some(raw)),
                Err(e) => {
                    warn!("Skipping unparseable observation line: {}", PokerError::Json(e));
                }
            }
        }
    }
}

/// Normalize a raw extractor payload into a `GameState`.
pub fn normalize_observation(raw: &Value) -> GameState {
    let hole_cards = card_list(raw.get("hole_cards"));
    let board = card_list(raw.get("board"));

    let position = raw
        .get("position")
        .and_then(|v| v.as_str())
        .map(parse_position)
        .unwrap_or(Position::Unknown);

    let confidence = normalize_confidence(raw.get("confidence"));

    GameState {
        hole_cards,
        board,
        pot: number_field(raw.get("pot")),
        your_stack: number_field(raw.get("your_stack")),
        position,
        action_on_you: raw
            .get("action_on_you")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        confidence,
    }
}

fn card_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|cards_raw| {
            cards_raw
                .iter()
                .filter_map(|c| c.as_str())
                .map(|c| cards::normalize_card(c).unwrap_or_else(|| c.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn number_field(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().trim_start_matches('$').parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn parse_position(text: &str) -> Position {
    match text.to_ascii_uppercase().as_str() {
        "UTG" => Position::Utg,
        "MP" => Position::Mp,
        "CO" => Position::Co,
        "BTN" => Position::Btn,
        "SB" => Position::Sb,
        "BB" => Position::Bb,
        _ => Position::Unknown,
    }
}

/// Coerce the confidence field into a per-field score map. Anything
/// other than a JSON object resets to empty; an empty map is then
/// filled with the neutral score for every known field.
fn normalize_confidence(value: Option<&Value>) -> HashMap<String, f64> {
    let mut confidence: HashMap<String, f64> = match value {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(k, v)| v.as_f64().map(|score| (k.clone(), score)))
            .collect(),
        Some(other) if !other.is_null() => {
            warn!("Confidence is not an object, resetting");
            HashMap::new()
        }
        _ => HashMap::new(),
    };

    if confidence.is_empty() {
        for field in CONFIDENCE_FIELDS {
            confidence.insert(field.to_string(), NEUTRAL_CONFIDENCE);
        }
    }

    confidence
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_observation_passes_through() {
        let raw = json!({
            "hole_cards": ["As", "Kh"],
            "board": ["Qh", "Js", "Tc"],
            "pot": 450.0,
            "your_stack": 2500.0,
            "position": "BTN",
            "action_on_you": true,
            "confidence": {"hole_cards": 0.9, "board": 0.85, "pot": 0.8, "stacks": 0.9},
        });
        let state = normalize_observation(&raw);
        assert_eq!(state.hole_cards, vec!["As", "Kh"]);
        assert_eq!(state.board.len(), 3);
        assert_eq!(state.pot, 450.0);
        assert_eq!(state.position, Position::Btn);
        assert!(state.action_on_you);
        assert_eq!(state.confidence["hole_cards"], 0.9);
    }

    #[test]
    fn test_missing_confidence_filled_with_neutral() {
        let raw = json!({"hole_cards": ["As", "Kh"], "pot": 10.0});
        let state = normalize_observation(&raw);
        assert_eq!(state.confidence.len(), 4);
        for field in CONFIDENCE_FIELDS {
            assert_eq!(state.confidence[field], 0.5);
        }
    }

    #[test]
    fn test_non_object_confidence_resets_then_fills() {
        let raw = json!({"confidence": 0.9});
        let state = normalize_observation(&raw);
        assert_eq!(state.confidence.len(), 4);
        assert_eq!(state.confidence["pot"], 0.5);
    }

    #[test]
    fn test_cards_are_normalized() {
        let raw = json!({"hole_cards": ["ah", "KD"], "board": ["10c"]});
        let state = normalize_observation(&raw);
        assert_eq!(state.hole_cards, vec!["Ah", "Kd"]);
        assert_eq!(state.board, vec!["Tc"]);
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let raw = json!({"pot": "45.50", "your_stack": "$1200"});
        let state = normalize_observation(&raw);
        assert_eq!(state.pot, 45.5);
        assert_eq!(state.your_stack, 1200.0);
    }

    #[test]
    fn test_unknown_position_and_defaults() {
        let raw = json!({"position": "HJ"});
        let state = normalize_observation(&raw);
        assert_eq!(state.position, Position::Unknown);
        assert!(!state.action_on_you);
        assert_eq!(state.pot, 0.0);
        assert!(state.hole_cards.is_empty());
    }

    #[test]
    fn test_lowercase_position_accepted() {
        let raw = json!({"position": "btn"});
        let state = normalize_observation(&raw);
        assert_eq!(state.position, Position::Btn);
    }
}
