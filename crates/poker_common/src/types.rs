//! Data models for game state, baseline decisions, and recommendations.
//!
//! All models deserialize leniently: the perception collaborator may emit
//! partial or malformed payloads, and missing fields default instead of
//! failing the whole observation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Table positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Position {
    #[serde(rename = "UTG")]
    Utg,
    #[serde(rename = "MP")]
    Mp,
    #[serde(rename = "CO")]
    Co,
    #[serde(rename = "BTN")]
    Btn,
    #[serde(rename = "SB")]
    Sb,
    #[serde(rename = "BB")]
    Bb,
    #[default]
    #[serde(other, rename = "UNKNOWN")]
    Unknown,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Utg => "UTG",
            Position::Mp => "MP",
            Position::Co => "CO",
            Position::Btn => "BTN",
            Position::Sb => "SB",
            Position::Bb => "BB",
            Position::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Poker actions a decision can recommend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Fold,
    Check,
    Call,
    Bet,
    Raise,
    AllIn,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Fold => "FOLD",
            Action::Check => "CHECK",
            Action::Call => "CALL",
            Action::Bet => "BET",
            Action::Raise => "RAISE",
            Action::AllIn => "ALL_IN",
        }
    }

    /// Whether this action commits chips and therefore carries a sizing.
    pub fn has_sizing(&self) -> bool {
        matches!(self, Action::Bet | Action::Raise | Action::AllIn)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation of the table, as produced by the perception
/// collaborator once per capture cycle.
///
/// Immutable after construction. Confidence values are per-field scores
/// in [0, 1]; an empty map means the observation carries no confidence
/// information at all (the validator fails closed on it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GameState {
    #[serde(default)]
    pub hole_cards: Vec<String>,
    #[serde(default)]
    pub board: Vec<String>,
    #[serde(default)]
    pub pot: f64,
    #[serde(default)]
    pub your_stack: f64,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub action_on_you: bool,
    #[serde(default)]
    pub confidence: HashMap<String, f64>,
}

/// Deterministic baseline produced by the policy cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineDecision {
    pub action: Action,
    pub sizing: Option<f64>,
    pub confidence: f64,
    /// Descriptive range label from the snapshot (e.g. "top 15%").
    pub range: Option<String>,
    /// False when the decision is a default because no table entry
    /// matched; keeps "data missing" distinguishable from "policy says
    /// check".
    pub table_hit: bool,
}

/// Alternative action offered by a reasoning provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub action: String,
    pub confidence: f64,
}

/// Sentinel provider label for the guaranteed no-provider path.
pub const BASELINE_ONLY_PROVIDER: &str = "baseline_only";

/// Final recommendation emitted by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Display action, possibly with sizing (e.g. "RAISE to $4.50").
    pub action: String,
    pub amount: Option<f64>,
    pub confidence: f64,
    pub reasoning: String,
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
    /// Baseline this recommendation was computed against.
    pub baseline: Option<BaselineDecision>,
    /// Which provider produced it, or [`BASELINE_ONLY_PROVIDER`].
    pub llm_provider: String,
    /// True iff any fallback occurred (non-primary provider or baseline).
    pub fallback_used: bool,
}

/// One recorded decision, as persisted by the decision log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandRecord {
    pub session_id: String,
    pub hand_number: u64,
    pub timestamp: DateTime<Utc>,
    pub position: Position,
    pub hole_cards: Vec<String>,
    pub board: Vec<String>,
    pub pot: f64,
    pub stack: f64,
    pub baseline: Option<BaselineDecision>,
    pub recommendation: Option<Recommendation>,
    pub action_taken: Option<String>,
    pub outcome: Option<String>,
    pub amount_won: Option<f64>,
    pub vision_confidence: f64,
    pub latency_ms: u64,
}

/// Aggregate statistics for one session, fed into provider prompts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub hands_played: u64,
    /// Voluntarily-put-money-in-pot percentage.
    pub vpip: f64,
    /// Win rate in currency units per hour.
    pub win_rate: f64,
}
