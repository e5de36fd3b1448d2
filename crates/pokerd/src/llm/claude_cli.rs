//! Claude CLI provider.
//!
//! Shells out to the `claude` binary in print mode. The subprocess is
//! spawned with kill-on-drop so an orchestrator timeout or daemon
//! shutdown cannot leave a reasoning process running.

use crate::llm::{parser, Provider, ProviderError, ProviderReply};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

const CLI_BINARY: &str = "claude";
const AVAILABILITY_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

pub struct ClaudeCliProvider {
    extended_thinking: bool,
}

impl ClaudeCliProvider {
    pub fn new() -> Self {
        Self {
            extended_thinking: true,
        }
    }
}

impl Default for ClaudeCliProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for ClaudeCliProvider {
    fn name(&self) -> &str {
        "claude_cli"
    }

    async fn available(&self) -> bool {
        let probe = Command::new(CLI_BINARY)
            .arg("--version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .status();

        match tokio::time::timeout(AVAILABILITY_PROBE_TIMEOUT, probe).await {
            Ok(Ok(status)) => status.success(),
            _ => false,
        }
    }

    async fn attempt(&self, prompt: &str) -> Result<ProviderReply, ProviderError> {
        let prompt = if self.extended_thinking {
            format!("--extended-thinking\n\n{}", prompt)
        } else {
            prompt.to_string()
        };

        debug!("Executing Claude CLI");

        let output = Command::new(CLI_BINARY)
            .arg("-p")
            .arg(&prompt)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ProviderError::Transport(format!("Failed to spawn claude: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("Claude CLI error ({}): {}", output.status, stderr.trim());
            return Err(ProviderError::Transport(format!(
                "claude exited with {}",
                output.status
            )));
        }

        let response = String::from_utf8_lossy(&output.stdout);
        parser::parse_provider_reply(response.trim())
            .ok_or_else(|| ProviderError::Malformed("No valid JSON in CLI output".to_string()))
    }
}
