//! Fallback escalation value types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::routing::OperatingMode;

/// Why a fallback was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationTrigger {
    /// The model was not available when selected
    Unavailable,
    /// An inference call to the model failed
    Error,
    /// An inference call to the model timed out
    Timeout,
}

impl std::fmt::Display for EscalationTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EscalationTrigger::Unavailable => write!(f, "unavailable"),
            EscalationTrigger::Error => write!(f, "error"),
            EscalationTrigger::Timeout => write!(f, "timeout"),
        }
    }
}

/// Context for a fallback chain walk.
///
/// `original_model` is the model that failed or was unavailable; the walk
/// never selects it again.
#[derive(Debug, Clone)]
pub struct FallbackContext {
    pub original_model: Option<String>,
    pub trigger: EscalationTrigger,
    pub operating_mode: OperatingMode,
    /// Session the escalation belongs to, for log correlation
    pub session_id: Option<Uuid>,
}

impl FallbackContext {
    /// Context for a model that was unavailable at selection time.
    pub fn unavailable(original_model: impl Into<String>, operating_mode: OperatingMode) -> Self {
        Self {
            original_model: Some(original_model.into()),
            trigger: EscalationTrigger::Unavailable,
            operating_mode,
            session_id: None,
        }
    }

    /// Context with no known primary (caller goes straight to the chain).
    pub fn without_original(operating_mode: OperatingMode) -> Self {
        Self {
            original_model: None,
            trigger: EscalationTrigger::Unavailable,
            operating_mode,
            session_id: None,
        }
    }

    pub fn with_trigger(mut self, trigger: EscalationTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_session(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

/// Outcome of a fallback chain walk.
///
/// Exhaustion is a value, not an error: the caller decides whether to
/// surface it, queue, or abort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackResult {
    pub success: bool,
    /// Selected model on success
    pub model_id: Option<String>,
    /// Human-readable outcome description
    pub reason: String,
    /// Models considered, in walk order
    pub attempted: Vec<String>,
    /// Why each attempted model was skipped (exhaustion only)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub failure_reasons: HashMap<String, String>,
}

impl FallbackResult {
    pub fn succeeded(model_id: impl Into<String>, reason: String, attempted: Vec<String>) -> Self {
        Self {
            success: true,
            model_id: Some(model_id.into()),
            reason,
            attempted,
            failure_reasons: HashMap::new(),
        }
    }

    pub fn failed(reason: String, attempted: Vec<String>) -> Self {
        Self {
            success: false,
            model_id: None,
            reason,
            attempted,
            failure_reasons: HashMap::new(),
        }
    }

    pub fn failed_with_reasons(
        reason: String,
        attempted: Vec<String>,
        failure_reasons: HashMap<String, String>,
    ) -> Self {
        Self {
            success: false,
            model_id: None,
            reason,
            attempted,
            failure_reasons,
        }
    }
}
