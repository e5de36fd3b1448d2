//! Poker decision co-pilot daemon.
//!
//! Turns a stream of noisy table observations into explainable action
//! recommendations: validate the observation against recent history,
//! track hand boundaries, look up a deterministic baseline from the
//! policy snapshot, then ask external reasoning providers with a bounded
//! fallback chain that always terminates in the baseline itself.

pub mod config;
pub mod db;
pub mod hand_eval;
pub mod llm;
pub mod metrics;
pub mod perception;
pub mod pipeline;
pub mod policy;
pub mod state;
pub mod validator;
