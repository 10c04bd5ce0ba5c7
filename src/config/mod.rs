//! Configuration module for the routing core
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. Environment variables (`ACODE_*`)
//! 2. Configuration file (TOML)
//! 3. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use acode_routing::config::RouterConfig;
//!
//! // Load defaults
//! let config = RouterConfig::default();
//! assert_eq!(config.routing.availability_cache_ttl_secs, 5);
//!
//! // Parse from TOML
//! let toml = r#"
//! [routing]
//! default_model = "llama3.2:70b"
//! "#;
//! let config: RouterConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.routing.default_model, "llama3.2:70b");
//! ```

pub mod error;
pub mod fallback;
pub mod logging;
pub mod routing;

pub use error::ConfigError;
pub use fallback::{EscalationPolicy, FallbackConfig};
pub use logging::{LogFormat, LoggingConfig};
pub use routing::RoutingConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the routing core.
///
/// Aggregates the routing table, fallback/circuit-breaker policy, and
/// logging sections. The assistant's outer config loader deserializes
/// its `routing`/`fallback` YAML sections into this shape; the core
/// treats the result as read-only.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Strategy, role table, and availability-cache settings
    pub routing: RoutingConfig,
    /// Fallback chains and circuit-breaker policy
    pub fallback: FallbackConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl RouterConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports ACODE_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("ACODE_DEFAULT_MODEL") {
            self.routing.default_model = model;
        }
        if let Ok(strategy) = std::env::var("ACODE_ROUTING_STRATEGY") {
            if let Ok(s) = strategy.parse() {
                self.routing.strategy = s;
            }
        }

        if let Ok(level) = std::env::var("ACODE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("ACODE_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// The fallback section with the global chain defaulted from the
    /// routing section when the fallback section does not set one.
    ///
    /// Keeps a config that only lists `routing.fallback_chain` working
    /// with the full fallback handler.
    pub fn effective_fallback(&self) -> FallbackConfig {
        let mut fallback = self.fallback.clone();
        if fallback.chain.is_empty() {
            fallback.chain = self.routing.fallback_chain.clone();
        }
        fallback
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.routing.validate()?;
        self.fallback.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::AgentRole;
    use std::path::Path;

    #[test]
    fn test_router_config_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.routing.default_model, "llama3.2:7b");
        assert_eq!(config.fallback.failure_threshold, 5);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_minimal_toml() {
        let toml = r#"
        [routing]
        default_model = "llama3.2:70b"
        "#;

        let config: RouterConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.routing.default_model, "llama3.2:70b");
        assert_eq!(config.routing.availability_cache_ttl_secs, 5); // Default
    }

    #[test]
    fn test_config_parse_full_toml() {
        let toml = r#"
        [routing]
        strategy = "role_based"
        default_model = "llama3.2:7b"
        fallback_chain = ["llama3.2:70b", "llama3.2:13b", "llama3.2:7b"]
        availability_cache_ttl_secs = 10

        [routing.role_models]
        planner = "llama3.2:70b"
        coder = "llama3.2:7b"
        reviewer = "llama3.2:70b"

        [fallback]
        policy = "retry_then_fallback"
        retry_count = 3
        failure_threshold = 4
        cooling_period_secs = 120

        [fallback.role_chains]
        planner = ["llama3.2:70b", "mistral:22b"]

        [logging]
        level = "debug"
        format = "json"
        "#;

        let config: RouterConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.routing.role_models.len(), 3);
        assert_eq!(config.fallback.retry_count, 3);
        assert_eq!(config.fallback.failure_threshold, 4);
        assert_eq!(
            config.fallback.role_chains.get(&AgentRole::Planner).unwrap(),
            &["llama3.2:70b", "mistral:22b"]
        );
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[routing]\ndefault_model = \"phi3:mini\"").unwrap();

        let config = RouterConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.routing.default_model, "phi3:mini");
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = RouterConfig::load(Some(Path::new("/nonexistent/config.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_load_none_returns_defaults() {
        let config = RouterConfig::load(None).unwrap();
        assert_eq!(config.routing.default_model, "llama3.2:7b");
    }

    #[test]
    fn test_config_env_override_default_model() {
        std::env::set_var("ACODE_DEFAULT_MODEL", "qwen2.5:14b");
        let config = RouterConfig::default().with_env_overrides();
        std::env::remove_var("ACODE_DEFAULT_MODEL");

        assert_eq!(config.routing.default_model, "qwen2.5:14b");
    }

    #[test]
    fn test_config_env_override_strategy() {
        std::env::set_var("ACODE_ROUTING_STRATEGY", "single_model");
        let config = RouterConfig::default().with_env_overrides();
        std::env::remove_var("ACODE_ROUTING_STRATEGY");

        assert_eq!(
            config.routing.strategy,
            crate::routing::RoutingStrategy::SingleModel
        );
    }

    #[test]
    fn test_config_env_invalid_strategy_ignored() {
        std::env::set_var("ACODE_ROUTING_STRATEGY", "not-a-strategy");
        let config = RouterConfig::default().with_env_overrides();
        std::env::remove_var("ACODE_ROUTING_STRATEGY");

        // Should keep default, not crash
        assert_eq!(
            config.routing.strategy,
            crate::routing::RoutingStrategy::RoleBased
        );
    }

    #[test]
    fn test_config_env_override_log_level() {
        std::env::set_var("ACODE_LOG_LEVEL", "trace");
        let config = RouterConfig::default().with_env_overrides();
        std::env::remove_var("ACODE_LOG_LEVEL");

        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_effective_fallback_inherits_routing_chain() {
        let config = RouterConfig {
            routing: RoutingConfig {
                fallback_chain: vec!["llama3.2:13b".to_string(), "llama3.2:7b".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };

        let fallback = config.effective_fallback();
        assert_eq!(fallback.chain, ["llama3.2:13b", "llama3.2:7b"]);
    }

    #[test]
    fn test_effective_fallback_keeps_explicit_chain() {
        let config = RouterConfig {
            routing: RoutingConfig {
                fallback_chain: vec!["llama3.2:13b".to_string()],
                ..Default::default()
            },
            fallback: FallbackConfig {
                chain: vec!["mistral:7b".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };

        assert_eq!(config.effective_fallback().chain, ["mistral:7b"]);
    }

    #[test]
    fn test_validate_propagates_section_errors() {
        let config = RouterConfig {
            fallback: FallbackConfig {
                failure_threshold: 0,
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }
}
