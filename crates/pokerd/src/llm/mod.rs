//! Reasoning providers and the fallback orchestrator.
//!
//! Every provider implements the same capability interface: report
//! availability, accept one prompt, return a structured reply or an
//! explicit failure. The orchestrator is the only consumer and never
//! lets a provider failure escape its boundary.

pub mod claude_cli;
pub mod gemini;
pub mod openai;
pub mod orchestrator;
pub mod parser;
pub mod prompt;

pub use orchestrator::Orchestrator;

use async_trait::async_trait;
use poker_common::Alternative;
use thiserror::Error;

/// Structured reply parsed out of a provider's raw output.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    pub action: String,
    pub amount: Option<f64>,
    pub confidence: f64,
    pub reasoning: String,
    pub alternatives: Vec<Alternative>,
}

/// Provider failures. All variants are recovered by the orchestrator;
/// none propagate past it.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Provider not available")]
    Unavailable,

    #[error("Provider timed out after {0}s")]
    Timeout(u64),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Uniform capability interface for external reasoning providers.
///
/// The orchestrator iterates a list of this trait and never inspects
/// concrete provider identity except through `name()` for labeling.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable identifier recorded on recommendations this provider wins.
    fn name(&self) -> &str;

    /// Cheap availability probe; unavailable providers are skipped
    /// without spending any of the attempt budget.
    async fn available(&self) -> bool;

    /// One reasoning attempt. The orchestrator wraps this call in a
    /// hard timeout, so implementations may block on I/O freely but
    /// must be cancellation safe.
    async fn attempt(&self, prompt: &str) -> Result<ProviderReply, ProviderError>;
}
