//! SQLite decision log.
//!
//! Stores every completed decision cycle plus per-session aggregates:
//! - hands: one row per decision (game state, baseline, recommendation, outcome)
//! - sessions: start/end bookkeeping and summary stats
//!
//! Recording must never block a decision. Callers log write failures and
//! keep going; the pipeline treats this store as advisory.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use poker_common::{Action, BaselineDecision, HandRecord, Position, SessionStats};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info};

pub struct DecisionDb {
    conn: Connection,
}

impl DecisionDb {
    /// Open or create the decision database at the given path.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        if let Some(parent) = path_ref.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let conn = Connection::open(path_ref)
            .with_context(|| format!("Failed to open database at {}", path_ref.display()))?;

        // WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS hands (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                hand_number INTEGER NOT NULL,

                position TEXT,
                hole_cards TEXT,
                board TEXT,
                pot REAL,
                stack REAL,

                baseline_action TEXT,
                baseline_sizing REAL,
                baseline_confidence REAL,
                llm_action TEXT,
                llm_amount REAL,
                llm_confidence REAL,
                llm_reasoning TEXT,
                llm_provider TEXT,

                action_taken TEXT,
                outcome TEXT,
                amount_won REAL,

                vision_confidence REAL,
                latency_ms INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_hands_session ON hands(session_id);
            CREATE INDEX IF NOT EXISTS idx_hands_timestamp ON hands(timestamp);

            CREATE TABLE IF NOT EXISTS sessions (
                session_id TEXT PRIMARY KEY,
                start_time TEXT NOT NULL,
                end_time TEXT,
                hands_played INTEGER DEFAULT 0,
                win_loss REAL DEFAULT 0.0,
                avg_latency_ms INTEGER DEFAULT 0
            );
            "#,
        )?;

        info!("Decision database ready: {}", path_ref.display());
        Ok(Self { conn })
    }

    /// Append one completed decision cycle.
    pub fn log_decision(&self, record: &HandRecord) -> Result<()> {
        let (baseline_action, baseline_sizing, baseline_confidence) = match &record.baseline {
            Some(b) => (Some(b.action.as_str()), b.sizing, Some(b.confidence)),
            None => (None, None, None),
        };
        let (llm_action, llm_amount, llm_confidence, llm_reasoning, llm_provider) =
            match &record.recommendation {
                Some(r) => (
                    Some(r.action.clone()),
                    r.amount,
                    Some(r.confidence),
                    Some(r.reasoning.clone()),
                    Some(r.llm_provider.clone()),
                ),
                None => (None, None, None, None, None),
            };

        self.conn.execute(
            "INSERT INTO hands (
                session_id, timestamp, hand_number, position, hole_cards, board, pot, stack,
                baseline_action, baseline_sizing, baseline_confidence,
                llm_action, llm_amount, llm_confidence, llm_reasoning, llm_provider,
                action_taken, outcome, amount_won,
                vision_confidence, latency_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
            params![
                record.session_id,
                record.timestamp.to_rfc3339(),
                record.hand_number,
                record.position.as_str(),
                serde_json::to_string(&record.hole_cards)?,
                serde_json::to_string(&record.board)?,
                record.pot,
                record.stack,
                baseline_action,
                baseline_sizing,
                baseline_confidence,
                llm_action,
                llm_amount,
                llm_confidence,
                llm_reasoning,
                llm_provider,
                record.action_taken,
                record.outcome,
                record.amount_won,
                record.vision_confidence,
                record.latency_ms,
            ],
        )?;

        debug!(
            "Decision logged: session={}, hand={}",
            record.session_id, record.hand_number
        );
        Ok(())
    }

    /// Recent hands for a session, oldest first, at most `limit`.
    pub fn recent_hands(&self, session_id: &str, limit: u32) -> Result<Vec<HandRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, timestamp, hand_number, position, hole_cards, board, pot, stack,
                    baseline_action, baseline_sizing, baseline_confidence,
                    action_taken, outcome, amount_won, vision_confidence, latency_ms
             FROM hands
             WHERE session_id = ?1
             ORDER BY hand_number DESC, id DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![session_id, limit], |row| {
            let timestamp_text: String = row.get(1)?;
            let position_text: String = row.get::<_, Option<String>>(3)?.unwrap_or_default();
            let hole_cards_json: String = row.get::<_, Option<String>>(4)?.unwrap_or_default();
            let board_json: String = row.get::<_, Option<String>>(5)?.unwrap_or_default();
            let baseline_action: Option<String> = row.get(8)?;
            let baseline_sizing: Option<f64> = row.get(9)?;
            let baseline_confidence: Option<f64> = row.get(10)?;

            let baseline = baseline_action.map(|action_text| BaselineDecision {
                action: parse_action(&action_text),
                sizing: baseline_sizing,
                confidence: baseline_confidence.unwrap_or(0.0),
                range: None,
                table_hit: false,
            });

            Ok(HandRecord {
                session_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_text)
                    .map(|t| t.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
                hand_number: row.get(2)?,
                position: parse_position(&position_text),
                hole_cards: serde_json::from_str(&hole_cards_json).unwrap_or_default(),
                board: serde_json::from_str(&board_json).unwrap_or_default(),
                pot: row.get::<_, Option<f64>>(6)?.unwrap_or(0.0),
                stack: row.get::<_, Option<f64>>(7)?.unwrap_or(0.0),
                baseline,
                recommendation: None,
                action_taken: row.get(11)?,
                outcome: row.get(12)?,
                amount_won: row.get(13)?,
                vision_confidence: row.get::<_, Option<f64>>(14)?.unwrap_or(0.0),
                latency_ms: row.get::<_, Option<i64>>(15)?.unwrap_or(0) as u64,
            })
        })?;

        let mut hands: Vec<HandRecord> = rows.collect::<rusqlite::Result<_>>()?;
        hands.reverse();
        Ok(hands)
    }

    /// Aggregate statistics for a session.
    ///
    /// VPIP counts hands where money went in voluntarily (anything but
    /// FOLD or CHECK). Win rate is dollars per hour since session start,
    /// or the raw total when the session is under a minute old.
    pub fn session_stats(&self, session_id: &str) -> Result<SessionStats> {
        let (hands_played, voluntary, total_won): (u64, u64, f64) = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN action_taken NOT IN ('FOLD', 'CHECK') THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(amount_won), 0.0)
             FROM hands
             WHERE session_id = ?1",
            params![session_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)? as u64,
                    row.get::<_, i64>(1)? as u64,
                    row.get(2)?,
                ))
            },
        )?;

        let vpip = if hands_played > 0 {
            100.0 * voluntary as f64 / hands_played as f64
        } else {
            0.0
        };

        let start_time: Option<String> = self
            .conn
            .query_row(
                "SELECT start_time FROM sessions WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;

        let win_rate = match start_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        {
            Some(start) => {
                let hours = (Utc::now() - start.with_timezone(&Utc)).num_seconds() as f64 / 3600.0;
                if hours > 1.0 / 60.0 {
                    total_won / hours
                } else {
                    total_won
                }
            }
            None => total_won,
        };

        Ok(SessionStats {
            hands_played,
            vpip,
            win_rate,
        })
    }

    /// Create a session record if it does not already exist.
    pub fn create_session(&self, session_id: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO sessions (session_id, start_time) VALUES (?1, ?2)",
            params![session_id, Utc::now().to_rfc3339()],
        )?;
        info!("Session created: {}", session_id);
        Ok(())
    }

    /// Close out a session, filling in summary stats.
    pub fn end_session(&self, session_id: &str) -> Result<()> {
        let (hands_played, win_loss, avg_latency): (i64, f64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(amount_won), 0.0), COALESCE(AVG(latency_ms), 0)
             FROM hands
             WHERE session_id = ?1",
            params![session_id],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get::<_, f64>(2)? as i64,
                ))
            },
        )?;

        self.conn.execute(
            "UPDATE sessions
             SET end_time = ?1, hands_played = ?2, win_loss = ?3, avg_latency_ms = ?4
             WHERE session_id = ?5",
            params![
                Utc::now().to_rfc3339(),
                hands_played,
                win_loss,
                avg_latency,
                session_id
            ],
        )?;

        info!(
            "Session ended: {} ({} hands, ${:.2})",
            session_id, hands_played, win_loss
        );
        Ok(())
    }
}

fn parse_action(text: &str) -> Action {
    match text {
        "FOLD" => Action::Fold,
        "CALL" => Action::Call,
        "RAISE" => Action::Raise,
        "BET" => Action::Bet,
        "ALL_IN" => Action::AllIn,
        _ => Action::Check,
    }
}

fn parse_position(text: &str) -> Position {
    match text {
        "UTG" => Position::Utg,
        "MP" => Position::Mp,
        "CO" => Position::Co,
        "BTN" => Position::Btn,
        "SB" => Position::Sb,
        "BB" => Position::Bb,
        _ => Position::Unknown,
    }
}
