//! Routing strategies for primary model selection.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::RoutingConfig;
use crate::routing::context::{AgentRole, RoutingContext};

/// Routing strategy determines how the primary model is chosen for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoutingStrategy {
    /// One model for every role
    SingleModel,

    /// Per-role model table, default model for unconfigured roles
    #[default]
    RoleBased,

    /// Role-based today; task complexity is reserved to steer model size
    Adaptive,
}

impl FromStr for RoutingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single_model" => Ok(RoutingStrategy::SingleModel),
            "role_based" => Ok(RoutingStrategy::RoleBased),
            "adaptive" => Ok(RoutingStrategy::Adaptive),
            _ => Err(format!("Unknown routing strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingStrategy::SingleModel => write!(f, "single_model"),
            RoutingStrategy::RoleBased => write!(f, "role_based"),
            RoutingStrategy::Adaptive => write!(f, "adaptive"),
        }
    }
}

/// Resolve the primary candidate model for a role under the configured
/// strategy. One exhaustive arm per strategy keeps the table
/// compiler-checked.
pub fn select_candidate(config: &RoutingConfig, role: AgentRole, context: &RoutingContext) -> String {
    match config.strategy {
        RoutingStrategy::SingleModel => config.default_model.clone(),
        RoutingStrategy::RoleBased => role_model(config, role),
        RoutingStrategy::Adaptive => {
            // Extension point: context.task_complexity will drive
            // model-size selection; until then adaptive mirrors role-based.
            let _ = context.task_complexity;
            role_model(config, role)
        }
    }
}

fn role_model(config: &RoutingConfig, role: AgentRole) -> String {
    config
        .role_models
        .get(&role)
        .cloned()
        .unwrap_or_else(|| config.default_model.clone())
}
