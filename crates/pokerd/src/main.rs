//! Poker decision daemon.
//!
//! Reads table observations as JSON lines on stdin, runs each through
//! the decision pipeline, and prints recommendations as JSON lines on
//! stdout.

use anyhow::Result;
use pokerd::config::Config;
use pokerd::db::DecisionDb;
use pokerd::llm::Orchestrator;
use pokerd::perception::{Perception, StdinPerception};
use pokerd::pipeline::{CycleOutcome, Pipeline};
use pokerd::policy::StrategyCache;
use pokerd::state::GameStateManager;
use tracing::{error, info, warn, Level};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    info!("pokerd v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::load();

    let policy = match StrategyCache::load(&config.policy.data_path) {
        Ok(cache) => {
            let stats = cache.stats();
            info!(
                "Policy data loaded: {} preflop positions, {} postflop buckets",
                stats.preflop_positions, stats.postflop_buckets
            );
            cache
        }
        Err(e) => {
            error!("Failed to load policy data: {}", e);
            warn!("Continuing with default actions only");
            StrategyCache::unloaded()
        }
    };

    let db = match DecisionDb::open_at(&config.database.path) {
        Ok(db) => Some(db),
        Err(e) => {
            error!("Failed to open decision database: {:#}", e);
            warn!("Continuing without decision logging");
            None
        }
    };

    let orchestrator = Orchestrator::new(&config.llm);
    for (name, available) in orchestrator.provider_status().await {
        info!(
            "Provider {}: {}",
            name,
            if available { "available" } else { "unavailable" }
        );
    }

    let state = GameStateManager::new(
        config.vision.buffer_size,
        config.vision.confidence_threshold,
    );

    let mut pipeline = Pipeline::new(state, policy, orchestrator, db);
    pipeline.start_session();
    info!("Session {} started, waiting for observations", pipeline.session_id());

    let mut perception = StdinPerception::new();

    loop {
        tokio::select! {
            observation = perception.observe() => {
                match observation {
                    Ok(Some(raw)) => {
                        let outcome = pipeline.process(&raw).await;
                        emit_outcome(&outcome);
                    }
                    Ok(None) => {
                        info!("Observation stream ended");
                        break;
                    }
                    Err(e) => {
                        error!("Observation intake failed: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    pipeline.shutdown();
    info!("Shutdown complete");
    Ok(())
}

fn emit_outcome(outcome: &CycleOutcome) {
    if let CycleOutcome::Decision {
        hand_number,
        recommendation,
        vision_confidence,
        latency_ms,
    } = outcome
    {
        let line = serde_json::json!({
            "hand_number": hand_number,
            "recommendation": recommendation,
            "vision_confidence": vision_confidence,
            "latency_ms": latency_ms,
        });
        println!("{}", line);
    }
}
