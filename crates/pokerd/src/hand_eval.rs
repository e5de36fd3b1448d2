//! Hand strength bucketing and board texture classification.
//!
//! Rank-frequency heuristics, not a full equity evaluator: the policy
//! tables are keyed on coarse 5-level strength buckets, so anything
//! finer would be discarded at lookup time anyway.

use poker_common::cards::rank_value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// 5-level hand strength bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandStrength {
    Nuts,
    Strong,
    Medium,
    Weak,
    Bluff,
}

impl HandStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandStrength::Nuts => "NUTS",
            HandStrength::Strong => "STRONG",
            HandStrength::Medium => "MEDIUM",
            HandStrength::Weak => "WEAK",
            HandStrength::Bluff => "BLUFF",
        }
    }
}

impl fmt::Display for HandStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Board texture bucket, in match-priority order: a paired board beats
/// any other classification, then flush-prone, then straight-prone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardTexture {
    Paired,
    Wet,
    Coordinated,
    Dry,
}

impl BoardTexture {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardTexture::Paired => "PAIRED",
            BoardTexture::Wet => "WET",
            BoardTexture::Coordinated => "COORDINATED",
            BoardTexture::Dry => "DRY",
        }
    }
}

impl fmt::Display for BoardTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket hand strength from rank frequencies across hole + board.
///
/// Defaults to MEDIUM when either input is missing; the policy cache
/// treats that as "evaluation unavailable", not an error.
pub fn calculate_hand_strength(hole_cards: &[String], board: &[String]) -> HandStrength {
    if hole_cards.is_empty() || board.is_empty() {
        return HandStrength::Medium;
    }

    let hole_ranks: Vec<char> = first_chars(hole_cards);
    let board_ranks: Vec<char> = first_chars(board);

    let mut rank_counts: HashMap<char, usize> = HashMap::new();
    for rank in hole_ranks.iter().chain(board_ranks.iter()) {
        *rank_counts.entry(*rank).or_insert(0) += 1;
    }

    let max_count = rank_counts.values().copied().max().unwrap_or(0);

    match max_count {
        n if n >= 4 => HandStrength::Nuts, // Quads
        3 => {
            // Full house when a second rank also pairs
            let paired_ranks = rank_counts.values().filter(|c| **c >= 2).count();
            if paired_ranks >= 2 {
                HandStrength::Nuts
            } else {
                HandStrength::Strong // Trips
            }
        }
        2 => {
            let pairs = rank_counts.values().filter(|c| **c == 2).count();
            if pairs >= 2 {
                HandStrength::Strong // Two pair
            } else {
                HandStrength::Medium // One pair
            }
        }
        _ => {
            // High card only
            if hole_ranks.iter().any(|r| matches!(r, 'A' | 'K' | 'Q')) {
                HandStrength::Medium
            } else {
                HandStrength::Weak
            }
        }
    }
}

/// Classify board texture; requires a flop (3+ cards), else DRY.
pub fn classify_board_texture(board: &[String]) -> BoardTexture {
    if board.len() < 3 {
        return BoardTexture::Dry;
    }

    let ranks: Vec<char> = first_chars(board);
    let suits: Vec<char> = board.iter().filter_map(|c| c.chars().nth(1)).collect();

    let mut rank_counts: HashMap<char, usize> = HashMap::new();
    for rank in &ranks {
        *rank_counts.entry(*rank).or_insert(0) += 1;
    }
    if rank_counts.values().any(|c| *c >= 2) {
        return BoardTexture::Paired;
    }

    let mut suit_counts: HashMap<char, usize> = HashMap::new();
    for suit in &suits {
        *suit_counts.entry(*suit).or_insert(0) += 1;
    }
    if suit_counts.values().any(|c| *c >= 3) {
        return BoardTexture::Wet;
    }

    if has_straight_potential(&ranks) {
        return BoardTexture::Coordinated;
    }

    BoardTexture::Dry
}

fn first_chars(cards: &[String]) -> Vec<char> {
    cards.iter().filter_map(|c| c.chars().next()).collect()
}

/// Three cards within two-gap reach of each other suggest straight draws.
fn has_straight_potential(ranks: &[char]) -> bool {
    let mut values: Vec<u8> = ranks.iter().filter_map(|r| rank_value(*r)).collect();
    values.sort_unstable_by(|a, b| b.cmp(a));

    if values.len() < 3 {
        return false;
    }

    for window in values.windows(3) {
        let gap1 = window[0] - window[1];
        let gap2 = window[1] - window[2];
        if gap1 <= 2 && gap2 <= 2 {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_quads_are_nuts() {
        let strength = calculate_hand_strength(
            &cards(&["Ah", "Ad"]),
            &cards(&["As", "Ac", "2d"]),
        );
        assert_eq!(strength, HandStrength::Nuts);
    }

    #[test]
    fn test_full_house_is_nuts() {
        let strength = calculate_hand_strength(
            &cards(&["Ah", "Ad"]),
            &cards(&["As", "Kc", "Kd"]),
        );
        assert_eq!(strength, HandStrength::Nuts);
    }

    #[test]
    fn test_trips_are_strong() {
        let strength = calculate_hand_strength(
            &cards(&["Ah", "Ad"]),
            &cards(&["As", "7c", "2d"]),
        );
        assert_eq!(strength, HandStrength::Strong);
    }

    #[test]
    fn test_two_pair_is_strong() {
        let strength = calculate_hand_strength(
            &cards(&["Ah", "Kd"]),
            &cards(&["As", "Kc", "2d"]),
        );
        assert_eq!(strength, HandStrength::Strong);
    }

    #[test]
    fn test_one_pair_is_medium() {
        let strength = calculate_hand_strength(
            &cards(&["Ah", "Kd"]),
            &cards(&["As", "7c", "2d"]),
        );
        assert_eq!(strength, HandStrength::Medium);
    }

    #[test]
    fn test_high_card_with_broadway_is_medium() {
        let strength = calculate_hand_strength(
            &cards(&["Ah", "5d"]),
            &cards(&["9s", "7c", "2d"]),
        );
        assert_eq!(strength, HandStrength::Medium);
    }

    #[test]
    fn test_low_high_card_is_weak() {
        let strength = calculate_hand_strength(
            &cards(&["8h", "5d"]),
            &cards(&["Js", "7c", "2d"]),
        );
        assert_eq!(strength, HandStrength::Weak);
    }

    #[test]
    fn test_missing_inputs_default_to_medium() {
        assert_eq!(
            calculate_hand_strength(&[], &cards(&["Js", "7c", "2d"])),
            HandStrength::Medium
        );
        assert_eq!(
            calculate_hand_strength(&cards(&["Ah", "Kd"]), &[]),
            HandStrength::Medium
        );
    }

    #[test]
    fn test_paired_board() {
        assert_eq!(
            classify_board_texture(&cards(&["Ks", "Kc", "2d"])),
            BoardTexture::Paired
        );
    }

    #[test]
    fn test_paired_beats_flush_prone() {
        // Paired AND three of a suit: paired wins by priority.
        assert_eq!(
            classify_board_texture(&cards(&["Ks", "Kh", "2s", "7s"])),
            BoardTexture::Paired
        );
    }

    #[test]
    fn test_flush_prone_board_is_wet() {
        assert_eq!(
            classify_board_texture(&cards(&["Ks", "9s", "2s"])),
            BoardTexture::Wet
        );
    }

    #[test]
    fn test_connected_board_is_coordinated() {
        assert_eq!(
            classify_board_texture(&cards(&["9s", "8c", "7d"])),
            BoardTexture::Coordinated
        );
    }

    #[test]
    fn test_dry_board() {
        assert_eq!(
            classify_board_texture(&cards(&["Ks", "8c", "2d"])),
            BoardTexture::Dry
        );
    }

    #[test]
    fn test_short_board_is_dry() {
        assert_eq!(classify_board_texture(&cards(&["Ks"])), BoardTexture::Dry);
        assert_eq!(classify_board_texture(&[]), BoardTexture::Dry);
    }
}
