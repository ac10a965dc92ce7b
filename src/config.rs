use crate::domain::ports::WindowSpec;
use crate::error::{HandoffError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Settings of the handoff controller and its HTTP backend.
///
/// Every field has a default, so an empty TOML file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HandoffConfig {
    /// Base URL of the backend serving `/url` and `/send`.
    pub server_url: String,
    /// Origin completion signals must come from. Defaults to the origin of
    /// the provider URL returned by `/url`.
    pub provider_origin: Option<String>,
    pub request_timeout_secs: u64,
    /// `/send` answers only once the payment is confirmed, so it gets its own
    /// and much longer bound.
    pub finalize_timeout_secs: u64,
    /// How long the user may take in the provider flow.
    pub completion_timeout_secs: u64,
    pub window: WindowSpec,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            provider_origin: None,
            request_timeout_secs: 30,
            finalize_timeout_secs: 180,
            completion_timeout_secs: 1800,
            window: WindowSpec::default(),
        }
    }
}

impl HandoffConfig {
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| HandoffError::Config(e.to_string()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml(&source)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn finalize_timeout(&self) -> Duration {
        Duration::from_secs(self.finalize_timeout_secs)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }
}
