//! Configuration management for pokerd.
//!
//! Loads settings from a TOML file or falls back to defaults. Every
//! component takes its slice of this config by value at construction;
//! there is no ambient global configuration.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Default config file path
pub const CONFIG_PATH: &str = "/etc/pokerd/config.toml";

/// Vision/validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// Minimum final confidence to act on an observation
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Rolling window of raw observations kept for consistency checks
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_confidence_threshold() -> f64 {
    0.70
}

fn default_buffer_size() -> usize {
    3
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            buffer_size: default_buffer_size(),
        }
    }
}

/// Reasoning provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Per-provider attempt timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,

    /// Providers in priority order; the first entry is the primary
    #[serde(default = "default_provider_order")]
    pub providers: Vec<String>,

    /// OpenAI-compatible chat endpoint
    #[serde(default = "default_openai_endpoint")]
    pub openai_endpoint: String,

    /// Model for the OpenAI provider
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// Gemini generateContent endpoint (model baked into path)
    #[serde(default = "default_gemini_endpoint")]
    pub gemini_endpoint: String,
}

fn default_provider_timeout() -> u64 {
    5
}

fn default_provider_order() -> Vec<String> {
    vec![
        "claude_cli".to_string(),
        "openai".to_string(),
        "gemini".to_string(),
    ]
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_openai_model() -> String {
    "gpt-4".to_string()
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        .to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_provider_timeout(),
            providers: default_provider_order(),
            openai_endpoint: default_openai_endpoint(),
            openai_model: default_openai_model(),
            gemini_endpoint: default_gemini_endpoint(),
        }
    }
}

/// Policy snapshot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Directory holding preflop_ranges.json and postflop_buckets.json
    #[serde(default = "default_policy_path")]
    pub data_path: String,
}

fn default_policy_path() -> String {
    "data/policy".to_string()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            data_path: default_policy_path(),
        }
    }
}

/// Decision log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/pokerd.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Capture loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Polling interval between observation checks in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval() -> u64 {
    100
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
        }
    }
}

/// Full daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub vision: VisionConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub capture: CaptureConfig,
}

impl Config {
    /// Load config from the default path, or return defaults
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_PATH).unwrap_or_else(|e| {
            warn!("Config not found, using defaults: {}", e);
            Config::default()
        })
    }

    /// Load config from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }
}
