//! Fallback and circuit-breaker configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::config::error::ConfigError;
use crate::routing::AgentRole;

/// How a failing request escalates to the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EscalationPolicy {
    /// Skip retries, go straight to the fallback chain
    Immediate,
    /// Retry the failing model first, then fall back
    #[default]
    RetryThenFallback,
}

/// Fallback configuration
///
/// Carries the global and per-role chains plus the retry/circuit-breaker
/// numeric policy. Every numeric field is range-checked in [`validate`]
/// so an out-of-range value fails at startup rather than mid-request.
///
/// [`validate`]: FallbackConfig::validate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Ordered global fallback chain
    pub chain: Vec<String>,
    /// Role-specific chains; a non-empty entry overrides the global chain
    pub role_chains: HashMap<AgentRole, Vec<String>>,
    pub policy: EscalationPolicy,
    /// Retries before falling back (0-10)
    pub retry_count: u32,
    /// Delay between retries (100-30000 ms)
    pub retry_delay_ms: u64,
    /// Per-attempt timeout (1000-600000 ms)
    pub timeout_ms: u64,
    /// Failures before a model's circuit opens (1-20)
    pub failure_threshold: u32,
    /// How long an open circuit blocks requests (5-600 s)
    pub cooling_period_secs: u64,
    /// Surface fallback activations to the user
    pub notify_user: bool,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            chain: Vec::new(),
            role_chains: HashMap::new(),
            policy: EscalationPolicy::RetryThenFallback,
            retry_count: 2,
            retry_delay_ms: 1000,
            timeout_ms: 60_000,
            failure_threshold: 5,
            cooling_period_secs: 60,
            notify_user: false,
        }
    }
}

impl FallbackConfig {
    /// The chain that applies to a role: role-specific if configured and
    /// non-empty, otherwise the global chain.
    pub fn effective_chain(&self, role: AgentRole) -> &[String] {
        match self.role_chains.get(&role) {
            Some(chain) if !chain.is_empty() => chain,
            _ => &self.chain,
        }
    }

    /// Cooling period as a [`Duration`].
    pub fn cooling_period(&self) -> Duration {
        Duration::from_secs(self.cooling_period_secs)
    }

    /// Validate all numeric ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_count > 10 {
            return Err(ConfigError::Validation {
                field: "fallback.retry_count".to_string(),
                message: format!("must be between 0 and 10, got {}", self.retry_count),
            });
        }
        if !(100..=30_000).contains(&self.retry_delay_ms) {
            return Err(ConfigError::Validation {
                field: "fallback.retry_delay_ms".to_string(),
                message: format!("must be between 100 and 30000, got {}", self.retry_delay_ms),
            });
        }
        if !(1_000..=600_000).contains(&self.timeout_ms) {
            return Err(ConfigError::Validation {
                field: "fallback.timeout_ms".to_string(),
                message: format!("must be between 1000 and 600000, got {}", self.timeout_ms),
            });
        }
        if !(1..=20).contains(&self.failure_threshold) {
            return Err(ConfigError::Validation {
                field: "fallback.failure_threshold".to_string(),
                message: format!("must be between 1 and 20, got {}", self.failure_threshold),
            });
        }
        if !(5..=600).contains(&self.cooling_period_secs) {
            return Err(ConfigError::Validation {
                field: "fallback.cooling_period_secs".to_string(),
                message: format!(
                    "must be between 5 and 600 seconds, got {}",
                    self.cooling_period_secs
                ),
            });
        }

        Ok(())
    }
}
