//! Card normalization and hand-class helpers.
//!
//! Cards use the compact two-character form: rank `A K Q J T 9..2`
//! followed by suit `s h d c` (e.g. "Ah", "Td"). Hands normalize to the
//! canonical range key used by the preflop tables: pairs as "AA",
//! suited as "AKs", offsuit as "AKo", higher rank always first.

use regex::Regex;
use std::sync::OnceLock;

const RANKS: &str = "AKQJT98765432";
const SUITS: &str = "shdc";

/// Numeric rank value, ace high. Returns None for unknown ranks.
pub fn rank_value(rank: char) -> Option<u8> {
    match rank {
        'A' => Some(14),
        'K' => Some(13),
        'Q' => Some(12),
        'J' => Some(11),
        'T' => Some(10),
        '2'..='9' => Some(rank as u8 - b'0'),
        _ => None,
    }
}

/// Check card format validity (e.g. "Ah", "Kd", "Ts").
pub fn validate_card(card: &str) -> bool {
    normalize_card(card).is_some()
}

/// Normalize a card to canonical form ("ah" -> "Ah", "10c" -> "Tc").
pub fn normalize_card(card: &str) -> Option<String> {
    // Extractors spell tens both ways; translate before validating.
    let card = match card.strip_prefix("10") {
        Some(rest) => format!("T{}", rest),
        None => card.to_string(),
    };
    let mut chars = card.chars();
    let rank = chars.next()?.to_ascii_uppercase();
    let suit = chars.next()?.to_ascii_lowercase();
    if chars.next().is_some() {
        return None;
    }
    if !RANKS.contains(rank) || !SUITS.contains(suit) {
        return None;
    }
    Some(format!("{}{}", rank, suit))
}

/// Normalize two hole cards to a range key ("AKo", "AKs", "AA").
///
/// Order independent: `normalize_hand(["Ah","Kd"])` equals
/// `normalize_hand(["Kd","Ah"])`. Returns None unless exactly two valid
/// cards are given.
pub fn normalize_hand(cards: &[String]) -> Option<String> {
    if cards.len() != 2 {
        return None;
    }
    let card1 = normalize_card(&cards[0])?;
    let card2 = normalize_card(&cards[1])?;

    let (mut rank1, mut suit1) = split(&card1);
    let (mut rank2, mut suit2) = split(&card2);

    if rank_value(rank1)? < rank_value(rank2)? {
        std::mem::swap(&mut rank1, &mut rank2);
        std::mem::swap(&mut suit1, &mut suit2);
    }

    if rank1 == rank2 {
        Some(format!("{}{}", rank1, rank2))
    } else if suit1 == suit2 {
        Some(format!("{}{}s", rank1, rank2))
    } else {
        Some(format!("{}{}o", rank1, rank2))
    }
}

fn split(card: &str) -> (char, char) {
    let mut chars = card.chars();
    (chars.next().unwrap(), chars.next().unwrap())
}

/// Extract all cards from free-form text ("Ah Kd, 10c" -> ["Ah","Kd","Tc"]).
pub fn parse_cards(text: &str) -> Vec<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN
        .get_or_init(|| Regex::new(r"(?i)(10|[AKQJT98765432])([shdc])").expect("valid card regex"));

    re.captures_iter(text)
        .filter_map(|cap| {
            let rank = cap[1].to_ascii_uppercase();
            let rank = if rank == "10" { "T".to_string() } else { rank };
            normalize_card(&format!("{}{}", rank, &cap[2]))
        })
        .collect()
}
