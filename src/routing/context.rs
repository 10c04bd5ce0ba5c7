//! Per-request routing context and decision values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::routing::mode::OperatingMode;

/// The functional hat a request is made under.
///
/// Drives which configured model handles the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    #[default]
    Default,
    /// Task decomposition and planning
    Planner,
    /// Code generation and editing
    Coder,
    /// Review and verification
    Reviewer,
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentRole::Default => write!(f, "default"),
            AgentRole::Planner => write!(f, "planner"),
            AgentRole::Coder => write!(f, "coder"),
            AgentRole::Reviewer => write!(f, "reviewer"),
        }
    }
}

impl std::str::FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(AgentRole::Default),
            "planner" => Ok(AgentRole::Planner),
            "coder" => Ok(AgentRole::Coder),
            "reviewer" => Ok(AgentRole::Reviewer),
            _ => Err(format!("Unknown agent role: {}", s)),
        }
    }
}

/// Estimated difficulty of the task behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskComplexity {
    Low,
    Medium,
    High,
}

/// A capability a request requires from the selected model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelCapability {
    /// Function/tool calling
    Tools,
    /// Vision/image inputs
    Vision,
    /// Structured JSON output
    JsonMode,
}

/// Per-request routing input. Created fresh per call, never mutated.
#[derive(Debug, Clone, Default)]
pub struct RoutingContext {
    /// Security posture constraining which models may be used
    pub operating_mode: OperatingMode,
    pub task_complexity: Option<TaskComplexity>,
    pub estimated_tokens: Option<u32>,
    /// Explicit model choice that bypasses strategy selection
    pub user_override: Option<String>,
    pub required_capabilities: Vec<ModelCapability>,
    /// Session the request belongs to, for log correlation
    pub session_id: Option<Uuid>,
}

/// The outcome of a routing decision.
///
/// Immutable; safe to log or cache. `fallback_reason` is present exactly
/// when `is_fallback` is set, which the constructors enforce.
#[derive(Debug, Clone, Serialize)]
pub struct RoutingDecision {
    pub model_id: String,
    pub is_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub selection_reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub decision_time_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl RoutingDecision {
    /// A decision that selected the primary candidate directly.
    pub fn primary(
        model_id: impl Into<String>,
        selection_reason: impl Into<String>,
        provider: Option<String>,
        decision_time_ms: u64,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            is_fallback: false,
            fallback_reason: None,
            selection_reason: selection_reason.into(),
            provider,
            decision_time_ms,
            timestamp: Utc::now(),
        }
    }

    /// A decision that reached its model through the fallback chain.
    pub fn fallback(
        model_id: impl Into<String>,
        fallback_reason: impl Into<String>,
        selection_reason: impl Into<String>,
        provider: Option<String>,
        decision_time_ms: u64,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            is_fallback: true,
            fallback_reason: Some(fallback_reason.into()),
            selection_reason: selection_reason.into(),
            provider,
            decision_time_ms,
            timestamp: Utc::now(),
        }
    }
}
