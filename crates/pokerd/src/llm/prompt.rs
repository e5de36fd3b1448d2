//! Decision prompt construction.
//!
//! One prompt per cycle, shared across every provider attempt so the
//! fallback chain reasons over identical context.

use poker_common::{BaselineDecision, GameState, HandRecord, SessionStats};

/// Build the full decision prompt: situation, baseline, recent history,
/// session statistics, and the JSON answer contract.
pub fn build_decision_prompt(
    state: &GameState,
    baseline: &BaselineDecision,
    history: &[HandRecord],
    stats: &SessionStats,
) -> String {
    let board = if state.board.is_empty() {
        "Preflop".to_string()
    } else {
        state.board.join(" ")
    };

    let baseline_json =
        serde_json::to_string_pretty(baseline).unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"You are a professional poker advisor using GTO strategy as your foundation. Analyze this decision point and provide optimal action.

**Current Situation:**
- Your Hand: {hand}
- Board: {board}
- Pot: ${pot:.2}
- Your Stack: ${stack:.2}
- Position: {position}
- Action on you: {action_on_you}

**GTO Baseline Recommendation:**
```json
{baseline_json}
```

**Recent Hand History (last {history_len} hands):**
{history}

**Session Statistics:**
- Hands Played: {hands_played}
- VPIP: {vpip:.1}%
- Win Rate: ${win_rate:.2}/hour

**Task:**
Provide a recommendation in JSON format:
```json
{{
    "action": "<FOLD|CALL|RAISE>",
    "amount": <numeric amount if RAISE, null otherwise>,
    "confidence": <0.0-1.0>,
    "reasoning": "<detailed explanation>",
    "alternatives": [
        {{"action": "...", "confidence": <0.0-1.0>}}
    ]
}}
```

**Think deeply about:**
1. Hand strength vs opponent range
2. Position and initiative
3. Pot odds and implied odds
4. Board texture and equity distribution
5. Stack-to-pot ratio (SPR)
6. GTO baseline vs exploitative adjustments
"#,
        hand = state.hole_cards.join(" "),
        board = board,
        pot = state.pot,
        stack = state.your_stack,
        position = state.position,
        action_on_you = state.action_on_you,
        baseline_json = baseline_json,
        history_len = history.len().min(5),
        history = format_hand_history(history),
        hands_played = stats.hands_played,
        vpip = stats.vpip,
        win_rate = stats.win_rate,
    )
}

/// Format up to the last 5 recorded hands for context.
fn format_hand_history(history: &[HandRecord]) -> String {
    if history.is_empty() {
        return "No recent hands".to_string();
    }

    let start = history.len().saturating_sub(5);
    history[start..]
        .iter()
        .map(|h| {
            let amount = h.amount_won.unwrap_or(0.0);
            let sign = if amount > 0.0 { "+" } else { "" };
            format!(
                "- Hand #{}: {} -> {} -> {} ({}{:.2})",
                h.hand_number,
                h.hole_cards.join(" "),
                h.action_taken.as_deref().unwrap_or("?"),
                h.outcome.as_deref().unwrap_or("unknown"),
                sign,
                amount,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use poker_common::{Action, Position};

    fn baseline() -> BaselineDecision {
        BaselineDecision {
            action: Action::Raise,
            sizing: Some(3.0),
            confidence: 0.85,
            range: None,
            table_hit: true,
        }
    }

    fn record(hand_number: u64, outcome: &str, amount: f64) -> HandRecord {
        HandRecord {
            session_id: "abc12345".to_string(),
            hand_number,
            timestamp: Utc::now(),
            position: Position::Btn,
            hole_cards: vec!["Ah".to_string(), "Kd".to_string()],
            board: vec![],
            pot: 10.0,
            stack: 1000.0,
            baseline: None,
            recommendation: None,
            action_taken: Some("RAISE".to_string()),
            outcome: Some(outcome.to_string()),
            amount_won: Some(amount),
            vision_confidence: 0.9,
            latency_ms: 250,
        }
    }

    #[test]
    fn test_preflop_prompt_mentions_preflop() {
        let state = GameState {
            hole_cards: vec!["Ah".to_string(), "Kd".to_string()],
            position: Position::Btn,
            ..GameState::default()
        };
        let prompt = build_decision_prompt(&state, &baseline(), &[], &SessionStats::default());
        assert!(prompt.contains("Board: Preflop"));
        assert!(prompt.contains("Your Hand: Ah Kd"));
        assert!(prompt.contains("Position: BTN"));
        assert!(prompt.contains("No recent hands"));
    }

    #[test]
    fn test_prompt_embeds_baseline_json() {
        let state = GameState::default();
        let prompt = build_decision_prompt(&state, &baseline(), &[], &SessionStats::default());
        assert!(prompt.contains(r#""action": "RAISE""#));
    }

    #[test]
    fn test_history_capped_at_five_entries() {
        let history: Vec<HandRecord> = (1..=8).map(|n| record(n, "won", 12.0)).collect();
        let formatted = format_hand_history(&history);
        assert!(!formatted.contains("Hand #3:"));
        assert!(formatted.contains("Hand #4:"));
        assert!(formatted.contains("Hand #8:"));
        assert!(formatted.contains("+12.00"));
    }

    #[test]
    fn test_history_negative_amount_has_no_plus() {
        let formatted = format_hand_history(&[record(1, "lost", -8.5)]);
        assert!(formatted.contains("(-8.50)"));
    }
}
