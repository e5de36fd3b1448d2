//! Game state lifecycle: hand-boundary detection and session tracking.
//!
//! Consumes validated observations and detects when a new hand has
//! begun from the observation sequence alone (no explicit signal). A
//! boundary increments the hand counter and resets the validator's
//! history window so stale frames cannot poison the new hand.

use crate::validator::ConfidenceValidator;
use poker_common::GameState;
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

/// Manages the current hand state, hand numbering, and session identity.
pub struct GameStateManager {
    validator: ConfidenceValidator,
    current_state: Option<GameState>,
    hand_number: u64,
    session_id: String,
}

impl GameStateManager {
    pub fn new(buffer_size: usize, confidence_threshold: f64) -> Self {
        let session_id = new_session_id();
        info!("Game state manager initialized (session={})", session_id);
        Self {
            validator: ConfidenceValidator::new(buffer_size, confidence_threshold),
            current_state: None,
            hand_number: 0,
            session_id,
        }
    }

    /// Run one observation through validation and boundary detection.
    ///
    /// Returns (accepted, confidence, state). A rejected observation
    /// yields no state and leaves the current hand untouched.
    pub fn process_observation(&mut self, observation: GameState) -> (bool, f64, Option<GameState>) {
        let (accepted, confidence) = self.validator.validate(&observation);

        if !accepted {
            warn!("Low confidence state: {:.0}%", confidence * 100.0);
            return (false, confidence, None);
        }

        if is_hand_boundary(&observation, self.current_state.as_ref()) {
            self.hand_number += 1;
            self.validator.reset();
            info!("New hand detected: #{}", self.hand_number);
        }

        self.current_state = Some(observation.clone());

        (true, confidence, Some(observation))
    }

    pub fn current_state(&self) -> Option<&GameState> {
        self.current_state.as_ref()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn hand_number(&self) -> u64 {
        self.hand_number
    }

    /// Start a fresh session: new id, counter back to zero, history gone.
    pub fn reset_session(&mut self) {
        self.session_id = new_session_id();
        self.hand_number = 0;
        self.current_state = None;
        self.validator.reset();
        info!("Session reset (new session={})", self.session_id);
    }
}

/// Hand-boundary heuristics, evaluated in order.
///
/// The no-previous rule must come first: a first observation is always a
/// new hand regardless of its field values, and the field comparisons
/// below only make sense once that case is ruled out.
pub fn is_hand_boundary(new_state: &GameState, previous: Option<&GameState>) -> bool {
    let current = match previous {
        Some(state) => state,
        None => return true, // First hand
    };

    // Board decreased
    if new_state.board.len() < current.board.len() {
        return true;
    }

    // Pot reset (dropped below 50% of previous)
    if new_state.pot < current.pot * 0.5 {
        return true;
    }

    // Hole cards changed (both sides non-empty)
    if !new_state.hole_cards.is_empty() && !current.hole_cards.is_empty() {
        let new_cards: HashSet<&str> = new_state.hole_cards.iter().map(String::as_str).collect();
        let old_cards: HashSet<&str> = current.hole_cards.iter().map(String::as_str).collect();
        if new_cards != old_cards {
            return true;
        }
    }

    false
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()[..8].to_string()
}
