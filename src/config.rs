//! Engine configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables for the stepped execution engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Interpreter program invoked for each step.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Wall-clock budget for a single step's subprocess.
    #[serde(default = "default_step_timeout", with = "humantime_serde")]
    pub step_timeout: Duration,

    /// Idle sessions older than this are evicted when new sessions start.
    #[serde(default = "default_session_ttl", with = "humantime_serde")]
    pub session_ttl: Duration,

    /// Hard cap on live sessions; the stalest one is dropped at the cap.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Base URL of the static-analysis service, if one is deployed.
    #[serde(default)]
    pub analyzer_url: Option<String>,
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_step_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_session_ttl() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_max_sessions() -> usize {
    256
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            step_timeout: default_step_timeout(),
            session_ttl: default_session_ttl(),
            max_sessions: default_max_sessions(),
            analyzer_url: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file; absent keys take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}
