//! Decision pipeline.
//!
//! One raw observation in, one outcome out: normalize, validate,
//! detect hand boundaries, look up the policy baseline, run the
//! reasoning chain, record the decision. Recording is advisory; a
//! failed write is logged and the decision still stands.

use crate::db::DecisionDb;
use crate::llm::Orchestrator;
use crate::metrics::PerformanceMetrics;
use crate::perception::normalize_observation;
use crate::policy::StrategyCache;
use crate::state::GameStateManager;
use chrono::Utc;
use poker_common::{GameState, HandRecord, PokerError, Recommendation, SessionStats};
use std::time::Instant;
use tracing::{info, warn};

const HISTORY_LIMIT: u32 = 5;

/// Result of running one observation through the pipeline.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Observation failed temporal validation; no decision was made.
    Rejected { confidence: f64 },
    /// A full decision cycle completed.
    Decision {
        hand_number: u64,
        recommendation: Recommendation,
        vision_confidence: f64,
        latency_ms: u64,
    },
}

pub struct Pipeline {
    state: GameStateManager,
    policy: StrategyCache,
    orchestrator: Orchestrator,
    db: Option<DecisionDb>,
    metrics: PerformanceMetrics,
}

impl Pipeline {
    pub fn new(
        state: GameStateManager,
        policy: StrategyCache,
        orchestrator: Orchestrator,
        db: Option<DecisionDb>,
    ) -> Self {
        Self {
            state,
            policy,
            orchestrator,
            db,
            metrics: PerformanceMetrics::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        self.state.session_id()
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    /// Register the current session in the decision log.
    pub fn start_session(&self) {
        if let Some(db) = &self.db {
            if let Err(e) = db.create_session(self.state.session_id()) {
                warn!("Failed to create session record: {:#}", e);
            }
        }
    }

    /// Run one raw observation payload through the full pipeline.
    pub async fn process(&mut self, raw: &serde_json::Value) -> CycleOutcome {
        let cycle_start = Instant::now();
        self.metrics.increment_frames();

        let intake_start = Instant::now();
        let observation = normalize_observation(raw);
        self.metrics
            .record_vision_latency(intake_start.elapsed().as_secs_f64() * 1000.0);

        let (accepted, confidence, state) = self.state.process_observation(observation);

        let Some(state) = state else {
            self.metrics.increment_low_confidence();
            return CycleOutcome::Rejected { confidence };
        };
        debug_assert!(accepted);

        self.metrics.increment_decisions();

        let policy_start = Instant::now();
        let baseline = self.policy.lookup(
            state.position,
            &state.hole_cards,
            &state.board,
            state.pot,
            state.your_stack,
        );
        self.metrics
            .record_policy_latency(policy_start.elapsed().as_secs_f64() * 1000.0);

        let (history, stats) = self.session_context();

        let llm_start = Instant::now();
        let recommendation = self
            .orchestrator
            .decide(&state, &baseline, &history, &stats)
            .await;
        self.metrics
            .record_llm_latency(llm_start.elapsed().as_secs_f64() * 1000.0);

        if recommendation.fallback_used {
            self.metrics.increment_llm_fallbacks();
        }

        let latency_ms = cycle_start.elapsed().as_millis() as u64;
        self.metrics.record_total_latency(latency_ms as f64);

        self.record_decision(&state, confidence, latency_ms, &recommendation);

        let hand_number = self.state.hand_number();
        info!(
            "Decision #{}: {} [{:.0}%] ({}ms)",
            hand_number,
            recommendation.action,
            recommendation.confidence * 100.0,
            latency_ms
        );

        CycleOutcome::Decision {
            hand_number,
            recommendation,
            vision_confidence: confidence,
            latency_ms,
        }
    }

    /// Close out the session: final metrics, session record.
    pub fn shutdown(&self) {
        self.metrics.log_summary();
        if let Some(db) = &self.db {
            if let Err(e) = db.end_session(self.state.session_id()) {
                warn!("Failed to end session record: {:#}", e);
            }
        }
    }

    fn session_context(&self) -> (Vec<HandRecord>, SessionStats) {
        let Some(db) = &self.db else {
            return (Vec::new(), SessionStats::default());
        };

        let session_id = self.state.session_id();
        let history = db.recent_hands(session_id, HISTORY_LIMIT).unwrap_or_else(|e| {
            warn!("Failed to load hand history: {:#}", e);
            Vec::new()
        });
        let stats = db.session_stats(session_id).unwrap_or_else(|e| {
            warn!("Failed to load session stats: {:#}", e);
            SessionStats::default()
        });
        (history, stats)
    }

    fn record_decision(
        &self,
        state: &GameState,
        vision_confidence: f64,
        latency_ms: u64,
        recommendation: &Recommendation,
    ) {
        let Some(db) = &self.db else {
            return;
        };

        let record = HandRecord {
            session_id: self.state.session_id().to_string(),
            hand_number: self.state.hand_number(),
            timestamp: Utc::now(),
            position: state.position,
            hole_cards: state.hole_cards.clone(),
            board: state.board.clone(),
            pot: state.pot,
            stack: state.your_stack,
            baseline: recommendation.baseline.clone(),
            recommendation: Some(recommendation.clone()),
            action_taken: None,
            outcome: None,
            amount_won: None,
            vision_confidence,
            latency_ms,
        };

        if let Err(e) = db.log_decision(&record) {
            warn!("{}", PokerError::Recording(format!("{:#}", e)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn observation(hole: &[&str], board: &[&str], pot: f64) -> serde_json::Value {
        serde_json::json!({
            "hole_cards": hole,
            "board": board,
            "pot": pot,
            "your_stack": 100.0,
            "confidence": {"hole_cards": 0.95, "board": 0.95, "pot": 0.95},
        })
    }

    fn pipeline_with_db() -> (tempfile::TempDir, Pipeline) {
        let dir = tempdir().unwrap();
        let db = DecisionDb::open_at(dir.path().join("test.db")).unwrap();
        let pipeline = Pipeline::new(
            GameStateManager::new(3, 0.70),
            StrategyCache::unloaded(),
            Orchestrator::with_providers(Vec::new(), Duration::from_millis(10)),
            Some(db),
        );
        (dir, pipeline)
    }

    #[tokio::test]
    async fn test_full_cycle_produces_and_records_decision() {
        let (_dir, mut pipeline) = pipeline_with_db();
        pipeline.start_session();

        let outcome = pipeline.process(&observation(&["Ah", "Kd"], &[], 10.0)).await;
        let CycleOutcome::Decision {
            hand_number,
            recommendation,
            ..
        } = outcome
        else {
            panic!("expected a decision");
        };

        assert_eq!(hand_number, 1);
        // Unloaded policy plus no providers: baseline-only CHECK.
        assert_eq!(recommendation.action, "CHECK");
        assert!(recommendation.fallback_used);

        let snapshot = pipeline.metrics().snapshot();
        assert_eq!(snapshot.frames_processed, 1);
        assert_eq!(snapshot.decisions_made, 1);
        assert_eq!(snapshot.llm_fallback_count, 1);
        // Every stage latency window got fed, intake included.
        assert_eq!(snapshot.vision.samples, 1);
        assert_eq!(snapshot.policy.samples, 1);
        assert_eq!(snapshot.llm.samples, 1);
        assert_eq!(snapshot.total.samples, 1);
    }

    #[tokio::test]
    async fn test_low_confidence_frame_is_rejected_without_decision() {
        let (_dir, mut pipeline) = pipeline_with_db();

        // No confidence map at all: intake fills the neutral 0.5 per
        // field, which still sits under the 0.70 threshold.
        let no_confidence = serde_json::json!({
            "hole_cards": ["Ah", "Kd"],
        });
        let outcome = pipeline.process(&no_confidence).await;
        let CycleOutcome::Rejected { confidence } = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(confidence, 0.5);

        let snapshot = pipeline.metrics().snapshot();
        assert_eq!(snapshot.frames_processed, 1);
        assert_eq!(snapshot.decisions_made, 0);
        assert_eq!(snapshot.low_confidence_count, 1);
    }

    #[tokio::test]
    async fn test_decisions_accumulate_history() {
        let (_dir, mut pipeline) = pipeline_with_db();
        pipeline.start_session();

        pipeline.process(&observation(&["Ah", "Kd"], &[], 10.0)).await;
        pipeline
            .process(&observation(&["Ah", "Kd"], &["Qh", "Js", "Tc"], 30.0))
            .await;

        let (history, stats) = pipeline.session_context();
        assert_eq!(history.len(), 2);
        assert_eq!(stats.hands_played, 2);
    }

    #[tokio::test]
    async fn test_pipeline_without_db_still_decides() {
        let mut pipeline = Pipeline::new(
            GameStateManager::new(3, 0.70),
            StrategyCache::unloaded(),
            Orchestrator::with_providers(Vec::new(), Duration::from_millis(10)),
            None,
        );
        pipeline.start_session();

        let outcome = pipeline.process(&observation(&["Ah", "Kd"], &[], 10.0)).await;
        assert!(matches!(outcome, CycleOutcome::Decision { .. }));
    }
}
