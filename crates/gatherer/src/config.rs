//! Gatherer configuration

use readers::EndpointConfig;
use serde::{Deserialize, Serialize};

/// Polling cycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GathererConfig {
    /// Maximum stations polled concurrently (default: 4)
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Per-station fetch timeout in seconds (default: 10)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Fetch and postprocess but skip all persistence (default: false)
    #[serde(default)]
    pub dry_run: bool,

    /// Provider endpoint URLs, override-able per provider
    #[serde(default)]
    pub endpoints: EndpointConfig,
}

const fn default_max_workers() -> usize {
    4
}

const fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for GathererConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            request_timeout_secs: default_request_timeout_secs(),
            dry_run: false,
            endpoints: EndpointConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: GathererConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.request_timeout_secs, 10);
        assert!(!config.dry_run);
    }

    #[test]
    fn fields_override_defaults() {
        let config: GathererConfig =
            serde_json::from_str(r#"{"max_workers": 8, "dry_run": true}"#).unwrap();
        assert_eq!(config.max_workers, 8);
        assert!(config.dry_run);
        assert_eq!(config.request_timeout_secs, 10);
    }
}
