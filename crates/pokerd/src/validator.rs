//! Temporal confidence validation for perception output.
//!
//! Keeps a short rolling window of raw observations and scores each new
//! one against both its own per-field confidence and its plausibility
//! relative to the immediately preceding frame. Implausible transitions
//! (hole cards mutating, board cards vanishing, pot shrinking) drag the
//! final confidence down without being outright rejections on their own.

use poker_common::GameState;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, warn};

const STABLE: f64 = 1.0;
const INCONCLUSIVE: f64 = 0.5;
const PENALIZED: f64 = 0.3;

/// Rolling-window temporal validator.
pub struct ConfidenceValidator {
    buffer_size: usize,
    threshold: f64,
    buffer: VecDeque<GameState>,
}

impl ConfidenceValidator {
    pub fn new(buffer_size: usize, threshold: f64) -> Self {
        debug!(
            "Confidence validator initialized: buffer_size={}, threshold={:.2}",
            buffer_size, threshold
        );
        Self {
            buffer_size,
            threshold,
            buffer: VecDeque::with_capacity(buffer_size),
        }
    }

    /// Validate an observation, returning (accepted, final confidence).
    ///
    /// The observation is appended to the window whether or not it is
    /// accepted, so the window always reflects the last N raw inputs.
    pub fn validate(&mut self, state: &GameState) -> (bool, f64) {
        if self.buffer.len() == self.buffer_size {
            self.buffer.pop_front();
        }
        self.buffer.push_back(state.clone());

        let aggregate = aggregate_confidence(state);

        let final_confidence = if self.buffer.len() >= 2 {
            let consistency = self.check_consistency();
            let combined = aggregate * consistency;
            debug!(
                "Confidence: aggregate={:.2}, consistency={:.2}, final={:.2}",
                aggregate, consistency, combined
            );
            combined
        } else {
            debug!(
                "Confidence: {:.2} (insufficient frames for consistency check)",
                aggregate
            );
            aggregate
        };

        let accepted = final_confidence >= self.threshold;
        if !accepted {
            warn!(
                "Low confidence: {:.2} < {:.2}",
                final_confidence, self.threshold
            );
        }

        (accepted, final_confidence)
    }

    /// Clear the window. Called when a new hand starts.
    pub fn reset(&mut self) {
        self.buffer.clear();
        debug!("Confidence validator buffer reset");
    }

    /// Number of frames currently buffered.
    pub fn buffered_frames(&self) -> usize {
        self.buffer.len()
    }

    /// Mean of the three pairwise checks against the previous frame.
    fn check_consistency(&self) -> f64 {
        let current = &self.buffer[self.buffer.len() - 1];
        let previous = &self.buffer[self.buffer.len() - 2];

        let scores = [
            check_hole_cards(current, previous),
            check_board(current, previous),
            check_pot(current, previous),
        ];
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// Mean of all per-field confidence scores; empty map fails closed to 0.0.
fn aggregate_confidence(state: &GameState) -> f64 {
    if state.confidence.is_empty() {
        return 0.0;
    }
    let sum: f64 = state.confidence.values().sum();
    sum / state.confidence.len() as f64
}

/// Hole cards must not change mid-hand.
fn check_hole_cards(current: &GameState, previous: &GameState) -> f64 {
    let current_cards: HashSet<&str> = current.hole_cards.iter().map(String::as_str).collect();
    let previous_cards: HashSet<&str> = previous.hole_cards.iter().map(String::as_str).collect();

    if current_cards.is_empty() || previous_cards.is_empty() {
        return INCONCLUSIVE;
    }

    if current_cards != previous_cards {
        warn!(
            "Hole cards changed: {:?} -> {:?} (possible new hand or vision error)",
            previous.hole_cards, current.hole_cards
        );
        return PENALIZED;
    }

    STABLE
}

/// Board may only extend: preflop -> flop -> turn -> river.
fn check_board(current: &GameState, previous: &GameState) -> f64 {
    if current.board.is_empty() && previous.board.is_empty() {
        return STABLE;
    }

    if current.board.len() >= previous.board.len() {
        // Every previously seen card must still be in place.
        let altered = previous
            .board
            .iter()
            .zip(current.board.iter())
            .any(|(prev, cur)| prev != cur);
        if altered {
            warn!(
                "Board cards changed unexpectedly: {:?} -> {:?}",
                previous.board, current.board
            );
            return PENALIZED;
        }
        return STABLE;
    }

    // Board shrank: could be a new hand, not necessarily an error.
    warn!(
        "Board cards decreased: {} -> {} cards (possible new hand)",
        previous.board.len(),
        current.board.len()
    );
    INCONCLUSIVE
}

/// Pot may only grow or stay level within a hand.
fn check_pot(current: &GameState, previous: &GameState) -> f64 {
    if current.pot >= previous.pot {
        return STABLE;
    }

    warn!(
        "Pot decreased: {:.2} -> {:.2} (possible new hand or vision error)",
        previous.pot, current.pot
    );
    INCONCLUSIVE
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    fn state(
        hole: &[&str],
        board: &[&str],
        pot: f64,
        confidence: &[(&str, f64)],
    ) -> GameState {
        GameState {
            hole_cards: hole.iter().map(|s| s.to_string()).collect(),
            board: board.iter().map(|s| s.to_string()).collect(),
            pot,
            confidence: confidence
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            ..GameState::default()
        }
    }

    fn confident() -> Vec<(&'static str, f64)> {
        vec![("hole_cards", 0.9), ("board", 0.9), ("pot", 0.9)]
    }

    #[test]
    fn test_first_frame_uses_aggregate_only() {
        let mut v = ConfidenceValidator::new(3, 0.70);
        let s = state(&["Ah", "Kd"], &[], 0.0, &[("hole_cards", 0.8), ("pot", 0.6)]);
        let (accepted, confidence) = v.validate(&s);
        assert!(accepted);
        assert_relative_eq!(confidence, 0.7, epsilon = 1e-9);
    }

    #[test]
    fn test_no_confidence_fields_fails_closed() {
        let mut v = ConfidenceValidator::new(3, 0.70);
        let s = state(&["Ah", "Kd"], &[], 0.0, &[]);
        let (accepted, confidence) = v.validate(&s);
        assert!(!accepted);
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn test_identical_frames_are_fully_consistent() {
        let mut v = ConfidenceValidator::new(3, 0.70);
        let s = state(&["Ah", "Kd"], &["Qh", "Js", "Tc"], 100.0, &confident());
        v.validate(&s);
        let (accepted, confidence) = v.validate(&s);
        assert!(accepted);
        // consistency 1.0 -> final == aggregate
        assert_relative_eq!(confidence, 0.9, epsilon = 1e-9);
    }

    #[test]
    fn test_board_extension_is_consistent() {
        let mut v = ConfidenceValidator::new(3, 0.70);
        v.validate(&state(&["Ah", "Kd"], &["Qh", "Js", "Tc"], 100.0, &confident()));
        let (_, confidence) =
            v.validate(&state(&["Ah", "Kd"], &["Qh", "Js", "Tc", "2d"], 150.0, &confident()));
        assert_relative_eq!(confidence, 0.9, epsilon = 1e-9);
    }

    #[test]
    fn test_hole_card_swap_is_penalized() {
        let mut v = ConfidenceValidator::new(3, 0.70);
        v.validate(&state(&["Ah", "Kd"], &[], 10.0, &confident()));
        let (accepted, confidence) = v.validate(&state(&["7s", "2c"], &[], 10.0, &confident()));
        // checks: hole 0.3, board 1.0, pot 1.0 -> consistency ~0.7667
        assert_relative_eq!(confidence, 0.9 * (0.3 + 1.0 + 1.0) / 3.0, epsilon = 1e-9);
        assert!(!accepted);
    }

    #[test]
    fn test_board_alteration_is_penalized() {
        let mut v = ConfidenceValidator::new(3, 0.70);
        v.validate(&state(&["Ah", "Kd"], &["Qh", "Js", "Tc"], 100.0, &confident()));
        let (_, confidence) =
            v.validate(&state(&["Ah", "Kd"], &["Qh", "9s", "Tc"], 100.0, &confident()));
        assert_relative_eq!(confidence, 0.9 * (1.0 + 0.3 + 1.0) / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_board_shrink_is_inconclusive() {
        let mut v = ConfidenceValidator::new(3, 0.70);
        v.validate(&state(&["Ah", "Kd"], &["Qh", "Js", "Tc"], 100.0, &confident()));
        let (_, confidence) = v.validate(&state(&["Ah", "Kd"], &[], 100.0, &confident()));
        assert_relative_eq!(confidence, 0.9 * (1.0 + 0.5 + 1.0) / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pot_decrease_is_inconclusive() {
        let mut v = ConfidenceValidator::new(3, 0.70);
        v.validate(&state(&["Ah", "Kd"], &[], 100.0, &confident()));
        let (_, confidence) = v.validate(&state(&["Ah", "Kd"], &[], 40.0, &confident()));
        assert_relative_eq!(confidence, 0.9 * (1.0 + 1.0 + 0.5) / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_hole_cards_are_inconclusive() {
        let mut v = ConfidenceValidator::new(3, 0.70);
        v.validate(&state(&[], &[], 0.0, &confident()));
        let (_, confidence) = v.validate(&state(&["Ah", "Kd"], &[], 0.0, &confident()));
        assert_relative_eq!(confidence, 0.9 * (0.5 + 1.0 + 1.0) / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rejected_frames_still_enter_window() {
        let mut v = ConfidenceValidator::new(3, 0.70);
        v.validate(&state(&["Ah", "Kd"], &[], 0.0, &[]));
        assert_eq!(v.buffered_frames(), 1);
        v.validate(&state(&["Ah", "Kd"], &[], 0.0, &[]));
        assert_eq!(v.buffered_frames(), 2);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut v = ConfidenceValidator::new(3, 0.70);
        for _ in 0..5 {
            v.validate(&state(&["Ah", "Kd"], &[], 10.0, &confident()));
        }
        assert_eq!(v.buffered_frames(), 3);
    }

    #[test]
    fn test_reset_clears_window() {
        let mut v = ConfidenceValidator::new(3, 0.70);
        v.validate(&state(&["Ah", "Kd"], &[], 10.0, &confident()));
        v.reset();
        assert_eq!(v.buffered_frames(), 0);
    }
}
