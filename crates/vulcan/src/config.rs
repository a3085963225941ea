//! Configuration for the Vulcan sandbox

use std::env;

/// Sandbox configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Python interpreter used for local execution
    pub python_bin: String,

    /// Default per-invocation timeout in seconds
    pub default_timeout_secs: u64,

    /// Hard cap a caller-supplied timeout is clamped to
    pub max_timeout_secs: u64,
}

impl SandboxConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            python_bin: env::var("SANDBOX_PYTHON_BIN").unwrap_or_else(|_| "python3".to_string()),
            default_timeout_secs: env::var("SANDBOX_DEFAULT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            max_timeout_secs: env::var("SANDBOX_MAX_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }

    /// Clamp a requested timeout to the configured ceiling
    pub fn clamp_timeout(&self, requested_secs: u64) -> u64 {
        requested_secs.clamp(1, self.max_timeout_secs)
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
