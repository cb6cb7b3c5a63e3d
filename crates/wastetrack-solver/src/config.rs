//! Solver configuration from environment.

use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
    /// Per-request HTTP timeout
    pub timeout: Duration,
    /// Honour HTTP(S)_PROXY settings from the environment
    pub use_system_proxy: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            timeout: Duration::from_secs(20),
            use_system_proxy: true,
        }
    }
}

impl SolverConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("WASTETRACK_SOLVER_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            api_key: env::var("WASTETRACK_SOLVER_API_KEY")
                .or_else(|_| env::var("OPENAI_API_KEY"))
                .ok()
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            model: env::var("WASTETRACK_SOLVER_MODEL").unwrap_or(defaults.model),
            temperature: env::var("WASTETRACK_SOLVER_TEMPERATURE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.temperature),
            timeout: env::var("WASTETRACK_SOLVER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            use_system_proxy: env::var("WASTETRACK_SOLVER_NO_PROXY").is_err(),
        }
    }

    /// True when an API key is available.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
