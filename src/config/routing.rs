//! Routing configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::error::ConfigError;
use crate::routing::{is_valid_model_id, AgentRole, RoutingStrategy};

/// Routing configuration
///
/// Process-wide policy data: which strategy picks the primary model, the
/// per-role model table, and the global fallback chain. Loaded once at
/// startup and treated as read-only by the routing core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub strategy: RoutingStrategy,
    /// Model used when no role-specific entry applies
    pub default_model: String,
    /// Role -> model overrides (role_based and adaptive strategies)
    #[serde(default)]
    pub role_models: HashMap<AgentRole, String>,
    /// Ordered global fallback chain
    #[serde(default)]
    pub fallback_chain: Vec<String>,
    /// How long availability probe results are cached
    pub availability_cache_ttl_secs: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            strategy: RoutingStrategy::RoleBased,
            default_model: "llama3.2:7b".to_string(),
            role_models: HashMap::new(),
            fallback_chain: Vec::new(),
            availability_cache_ttl_secs: 5,
        }
    }
}

impl RoutingConfig {
    /// Validate the routing table.
    ///
    /// Model ids must be well-formed `name:tag` (optionally `@provider`)
    /// everywhere they appear; a broken table is a startup error, not
    /// something to discover on the first request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_model.is_empty() {
            return Err(ConfigError::MissingField("routing.default_model".to_string()));
        }
        if !is_valid_model_id(&self.default_model) {
            return Err(ConfigError::Validation {
                field: "routing.default_model".to_string(),
                message: format!("'{}' is not a valid model id (name:tag)", self.default_model),
            });
        }

        for (role, model) in &self.role_models {
            if !is_valid_model_id(model) {
                return Err(ConfigError::Validation {
                    field: format!("routing.role_models.{}", role),
                    message: format!("'{}' is not a valid model id (name:tag)", model),
                });
            }
        }

        for (i, model) in self.fallback_chain.iter().enumerate() {
            if !is_valid_model_id(model) {
                return Err(ConfigError::Validation {
                    field: format!("routing.fallback_chain[{}]", i),
                    message: format!("'{}' is not a valid model id (name:tag)", model),
                });
            }
        }

        if self.availability_cache_ttl_secs == 0 {
            return Err(ConfigError::Validation {
                field: "routing.availability_cache_ttl_secs".to_string(),
                message: "TTL must be non-zero".to_string(),
            });
        }

        Ok(())
    }
}
