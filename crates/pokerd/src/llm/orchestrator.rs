//! Provider fallback orchestration.
//!
//! Tries providers strictly in configured priority order, each under a
//! hard per-attempt timeout. The first structurally valid reply wins.
//! When every provider is unavailable or fails, the baseline decision
//! itself is synthesized into a recommendation; that path performs no
//! I/O and is always reachable, so `decide` can never fail.

use crate::config::LlmConfig;
use crate::llm::claude_cli::ClaudeCliProvider;
use crate::llm::gemini::GeminiProvider;
use crate::llm::openai::OpenAiProvider;
use crate::llm::{prompt, Provider, ProviderError};
use poker_common::{
    Action, BaselineDecision, GameState, HandRecord, Recommendation, SessionStats,
    BASELINE_ONLY_PROVIDER,
};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub struct Orchestrator {
    providers: Vec<Box<dyn Provider>>,
    attempt_timeout: Duration,
}

impl Orchestrator {
    /// Build the provider chain from config, preserving priority order.
    /// Unknown provider names are logged and skipped.
    pub fn new(config: &LlmConfig) -> Self {
        let mut providers: Vec<Box<dyn Provider>> = Vec::new();
        for name in &config.providers {
            match name.as_str() {
                "claude_cli" => providers.push(Box::new(ClaudeCliProvider::new())),
                "openai" => providers.push(Box::new(OpenAiProvider::new(
                    config.openai_endpoint.clone(),
                    config.openai_model.clone(),
                ))),
                "gemini" => {
                    providers.push(Box::new(GeminiProvider::new(config.gemini_endpoint.clone())))
                }
                other => warn!("Unknown provider '{}' in config, skipping", other),
            }
        }
        info!(
            "LLM orchestrator initialized: {} providers, {}s per attempt",
            providers.len(),
            config.timeout_secs
        );
        Self {
            providers,
            attempt_timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Orchestrator over an explicit provider list (used by tests).
    pub fn with_providers(providers: Vec<Box<dyn Provider>>, attempt_timeout: Duration) -> Self {
        Self {
            providers,
            attempt_timeout,
        }
    }

    /// Availability of each provider, in priority order.
    pub async fn provider_status(&self) -> Vec<(String, bool)> {
        let mut status = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            status.push((provider.name().to_string(), provider.available().await));
        }
        status
    }

    /// Produce the final recommendation. Never fails.
    pub async fn decide(
        &self,
        state: &GameState,
        baseline: &BaselineDecision,
        history: &[HandRecord],
        stats: &SessionStats,
    ) -> Recommendation {
        let start = Instant::now();

        // One prompt, reused across every attempt.
        let prompt = prompt::build_decision_prompt(state, baseline, history, stats);

        for (index, provider) in self.providers.iter().enumerate() {
            if !provider.available().await {
                debug!("{} not available, skipping", provider.name());
                continue;
            }

            info!("Trying {}...", provider.name());

            let attempt = tokio::time::timeout(self.attempt_timeout, provider.attempt(&prompt));
            let result = match attempt.await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(self.attempt_timeout.as_secs())),
            };

            match result {
                Ok(reply) => {
                    let latency_ms = start.elapsed().as_millis();
                    info!(
                        "{} succeeded in {}ms: {}",
                        provider.name(),
                        latency_ms,
                        reply.action
                    );
                    return Recommendation {
                        action: reply.action,
                        amount: reply.amount,
                        confidence: reply.confidence,
                        reasoning: reply.reasoning,
                        alternatives: reply.alternatives,
                        baseline: Some(baseline.clone()),
                        llm_provider: provider.name().to_string(),
                        fallback_used: index != 0,
                    };
                }
                Err(e) => {
                    warn!("{} failed ({}), trying next...", provider.name(), e);
                }
            }
        }

        error!("All LLM providers failed, falling back to baseline only");
        baseline_only_recommendation(baseline)
    }
}

/// Synthesize a recommendation directly from the baseline.
///
/// Pure function of the baseline, no I/O: this is the guaranteed last
/// resort even in full provider outage.
pub fn baseline_only_recommendation(baseline: &BaselineDecision) -> Recommendation {
    let sizing = baseline.sizing.unwrap_or(0.0);
    let action = match baseline.action {
        Action::Raise if sizing > 0.0 => format!("RAISE to ${:.2}", sizing),
        Action::Bet if sizing > 0.0 => format!("BET ${:.2}", sizing),
        other => other.to_string(),
    };

    Recommendation {
        action,
        amount: baseline.sizing,
        confidence: baseline.confidence,
        reasoning: "LLM reasoning unavailable. Using policy baseline only.".to_string(),
        alternatives: Vec::new(),
        baseline: Some(baseline.clone()),
        llm_provider: BASELINE_ONLY_PROVIDER.to_string(),
        fallback_used: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ProviderReply;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct ScriptedProvider {
        name: &'static str,
        available: bool,
        reply: Result<ProviderReply, ProviderError>,
        calls: Arc<AtomicUsize>,
        delay: Option<Duration>,
    }

    impl ScriptedProvider {
        fn ok(name: &'static str, action: &str) -> Self {
            Self {
                name,
                available: true,
                reply: Ok(ProviderReply {
                    action: action.to_string(),
                    amount: None,
                    confidence: 0.8,
                    reasoning: "scripted".to_string(),
                    alternatives: Vec::new(),
                }),
                calls: Arc::new(AtomicUsize::new(0)),
                delay: None,
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                reply: Err(ProviderError::Transport("boom".to_string())),
                ..Self::ok(name, "RAISE")
            }
        }

        fn unavailable(name: &'static str) -> Self {
            Self {
                available: false,
                ..Self::ok(name, "RAISE")
            }
        }

        fn slow(name: &'static str, delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::ok(name, "RAISE")
            }
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn available(&self) -> bool {
            self.available
        }

        async fn attempt(&self, _prompt: &str) -> Result<ProviderReply, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.reply.clone()
        }
    }

    fn baseline() -> BaselineDecision {
        BaselineDecision {
            action: Action::Raise,
            sizing: Some(3.0),
            confidence: 0.85,
            range: None,
            table_hit: true,
        }
    }

    fn check_baseline() -> BaselineDecision {
        BaselineDecision {
            action: Action::Check,
            sizing: Some(0.0),
            confidence: 0.60,
            range: None,
            table_hit: false,
        }
    }

    async fn decide(orchestrator: &Orchestrator) -> Recommendation {
        orchestrator
            .decide(
                &GameState::default(),
                &baseline(),
                &[],
                &SessionStats::default(),
            )
            .await
    }

    #[tokio::test]
    async fn test_primary_provider_wins_without_fallback_flag() {
        let orchestrator = Orchestrator::with_providers(
            vec![
                Box::new(ScriptedProvider::ok("alpha", "RAISE")),
                Box::new(ScriptedProvider::ok("beta", "CALL")),
            ],
            Duration::from_secs(1),
        );
        let rec = decide(&orchestrator).await;
        assert_eq!(rec.llm_provider, "alpha");
        assert!(!rec.fallback_used);
        assert_eq!(rec.action, "RAISE");
    }

    #[tokio::test]
    async fn test_only_third_provider_available() {
        let orchestrator = Orchestrator::with_providers(
            vec![
                Box::new(ScriptedProvider::unavailable("alpha")),
                Box::new(ScriptedProvider::unavailable("beta")),
                Box::new(ScriptedProvider::ok("gamma", "CALL")),
            ],
            Duration::from_secs(1),
        );
        let rec = decide(&orchestrator).await;
        assert_eq!(rec.llm_provider, "gamma");
        assert!(rec.fallback_used);
    }

    #[tokio::test]
    async fn test_failure_falls_through_to_next() {
        let second = ScriptedProvider::ok("beta", "CALL");
        let second_calls = second.calls.clone();
        let orchestrator = Orchestrator::with_providers(
            vec![Box::new(ScriptedProvider::failing("alpha")), Box::new(second)],
            Duration::from_secs(1),
        );
        let rec = decide(&orchestrator).await;
        assert_eq!(rec.llm_provider, "beta");
        assert!(rec.fallback_used);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_winner_stops_the_chain() {
        let second = ScriptedProvider::ok("beta", "CALL");
        let second_calls = second.calls.clone();
        let orchestrator = Orchestrator::with_providers(
            vec![Box::new(ScriptedProvider::ok("alpha", "RAISE")), Box::new(second)],
            Duration::from_secs(1),
        );
        decide(&orchestrator).await;
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let orchestrator = Orchestrator::with_providers(
            vec![
                Box::new(ScriptedProvider::slow("alpha", Duration::from_secs(30))),
                Box::new(ScriptedProvider::ok("beta", "CALL")),
            ],
            Duration::from_millis(50),
        );
        let rec = decide(&orchestrator).await;
        assert_eq!(rec.llm_provider, "beta");
        assert!(rec.fallback_used);
    }

    #[tokio::test]
    async fn test_total_outage_returns_baseline_only_quickly() {
        let orchestrator = Orchestrator::with_providers(
            vec![
                Box::new(ScriptedProvider::unavailable("alpha")),
                Box::new(ScriptedProvider::unavailable("beta")),
            ],
            Duration::from_secs(5),
        );
        let start = Instant::now();
        let rec = decide(&orchestrator).await;
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(rec.llm_provider, BASELINE_ONLY_PROVIDER);
        assert!(rec.fallback_used);
        assert_eq!(rec.action, "RAISE to $3.00");
        assert_eq!(rec.confidence, 0.85);
    }

    #[tokio::test]
    async fn test_empty_provider_list_is_baseline_only() {
        let orchestrator = Orchestrator::with_providers(Vec::new(), Duration::from_secs(1));
        let rec = decide(&orchestrator).await;
        assert_eq!(rec.llm_provider, BASELINE_ONLY_PROVIDER);
    }

    #[test]
    fn test_baseline_only_formats_check_without_sizing() {
        let rec = baseline_only_recommendation(&check_baseline());
        assert_eq!(rec.action, "CHECK");
        assert_eq!(rec.confidence, 0.60);
        assert!(rec.fallback_used);
        assert!(rec.alternatives.is_empty());
    }

    #[test]
    fn test_baseline_only_formats_bet_with_sizing() {
        let rec = baseline_only_recommendation(&BaselineDecision {
            action: Action::Bet,
            sizing: Some(0.66),
            confidence: 0.75,
            range: None,
            table_hit: true,
        });
        assert_eq!(rec.action, "BET $0.66");
    }

    #[tokio::test]
    async fn test_provider_status_reports_in_order() {
        let orchestrator = Orchestrator::with_providers(
            vec![
                Box::new(ScriptedProvider::ok("alpha", "RAISE")),
                Box::new(ScriptedProvider::unavailable("beta")),
            ],
            Duration::from_secs(1),
        );
        let status = orchestrator.provider_status().await;
        assert_eq!(status, vec![("alpha".to_string(), true), ("beta".to_string(), false)]);
    }
}
