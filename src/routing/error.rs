//! Error taxonomy for routing failures.
//!
//! Each variant maps to a stable `ACODE-RTE-*` code that consumers
//! pattern-match on, and carries the models attempted before failure plus
//! an optional remediation suggestion so failures stay user-actionable.

use thiserror::Error;

use crate::routing::context::{AgentRole, ModelCapability};
use crate::routing::mode::OperatingMode;

/// Errors that can occur during model routing
#[derive(Debug, Error)]
pub enum RoutingError {
    /// No model can serve the request (ACODE-RTE-001)
    #[error("No available model for role {role}: {detail}")]
    NoAvailableModel {
        role: AgentRole,
        detail: String,
        attempted: Vec<String>,
        suggestion: Option<String>,
    },

    /// The model id doesn't parse as `name:tag` (ACODE-RTE-002)
    #[error("Invalid model ID '{model_id}'. Valid format: name:tag or name:tag@provider")]
    InvalidModelId { model_id: String },

    /// The operating mode forbids this model (ACODE-RTE-003)
    #[error("Model '{model_id}' not allowed in {mode} mode")]
    ModeConstraintViolation {
        model_id: String,
        mode: OperatingMode,
        suggestion: Option<String>,
    },

    /// The primary was unavailable and no chain exists (ACODE-RTE-004)
    #[error("No available model for role {role} and no fallback chain configured")]
    NoFallbackChain {
        role: AgentRole,
        attempted: Vec<String>,
        suggestion: Option<String>,
    },

    /// Every chain candidate was skipped or unavailable (ACODE-RTE-004)
    #[error("Fallback chain exhausted for role {role}. No available models. Tried: {}", .attempted.join(", "))]
    FallbackExhausted {
        role: AgentRole,
        attempted: Vec<String>,
        suggestion: Option<String>,
    },

    /// The routing configuration is unusable (ACODE-RTE-005)
    #[error("Invalid routing configuration: {message}")]
    InvalidConfiguration { message: String },

    /// No model satisfies the required capabilities (ACODE-RTE-006)
    #[error("No model supports required capabilities for '{model_id}': {missing:?}")]
    CapabilityMismatch {
        model_id: String,
        missing: Vec<ModelCapability>,
        suggestion: Option<String>,
    },
}

impl RoutingError {
    /// Stable error code for this failure kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            RoutingError::NoAvailableModel { .. } => "ACODE-RTE-001",
            RoutingError::InvalidModelId { .. } => "ACODE-RTE-002",
            RoutingError::ModeConstraintViolation { .. } => "ACODE-RTE-003",
            RoutingError::NoFallbackChain { .. } | RoutingError::FallbackExhausted { .. } => {
                "ACODE-RTE-004"
            }
            RoutingError::InvalidConfiguration { .. } => "ACODE-RTE-005",
            RoutingError::CapabilityMismatch { .. } => "ACODE-RTE-006",
        }
    }

    /// Models attempted before this failure, in order.
    pub fn attempted_models(&self) -> &[String] {
        match self {
            RoutingError::NoAvailableModel { attempted, .. }
            | RoutingError::NoFallbackChain { attempted, .. }
            | RoutingError::FallbackExhausted { attempted, .. } => attempted,
            RoutingError::ModeConstraintViolation { model_id, .. }
            | RoutingError::CapabilityMismatch { model_id, .. } => std::slice::from_ref(model_id),
            RoutingError::InvalidModelId { .. } | RoutingError::InvalidConfiguration { .. } => &[],
        }
    }

    /// Remediation hint, when one exists.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            RoutingError::NoAvailableModel { suggestion, .. }
            | RoutingError::ModeConstraintViolation { suggestion, .. }
            | RoutingError::NoFallbackChain { suggestion, .. }
            | RoutingError::FallbackExhausted { suggestion, .. }
            | RoutingError::CapabilityMismatch { suggestion, .. } => suggestion.as_deref(),
            RoutingError::InvalidModelId { .. } | RoutingError::InvalidConfiguration { .. } => None,
        }
    }
}
