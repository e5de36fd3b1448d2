//! Error taxonomy for the decision pipeline.
//!
//! Provider failures are deliberately absent: they are fully recovered
//! inside the orchestrator and never cross its boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PokerError {
    /// Perception collaborator failed to produce an observation.
    /// Treated as "no observation this cycle", never fatal.
    #[error("Sensing error: {0}")]
    Sensing(String),

    /// Policy snapshot missing or unreadable at load time.
    /// The cache degrades to always-miss behavior instead of failing startup.
    #[error("Policy data error: {0}")]
    PolicyData(String),

    /// Decision log write failed. The computed recommendation is still
    /// returned to the caller.
    #[error("Recording error: {0}")]
    Recording(String),

    /// Payload failed to parse as JSON. The offending line is skipped.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
