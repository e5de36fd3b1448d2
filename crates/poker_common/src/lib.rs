//! Shared types and helpers for the poker decision co-pilot.
//!
//! Everything here is pure data or pure computation: game-state and
//! recommendation models, card normalization, and the error taxonomy.
//! The daemon crate (`pokerd`) owns all I/O.

pub mod cards;
pub mod error;
pub mod types;

pub use error::PokerError;
pub use types::{
    Action, Alternative, BaselineDecision, GameState, HandRecord, Position, Recommendation,
    SessionStats, BASELINE_ONLY_PROVIDER,
};
