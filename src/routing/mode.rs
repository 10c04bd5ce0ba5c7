//! Operating-mode constraint checking.
//!
//! The permission matrix itself lives outside this crate; routing only
//! consults a boolean predicate per model and mode.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::registry::ModelRegistry;

/// Process-wide security posture constraining which models may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Only locally-served models are allowed
    #[default]
    LocalOnly,
    /// No network egress at all; local models only
    Airgapped,
    /// Cloud models permitted alongside local ones
    Burst,
}

impl std::fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperatingMode::LocalOnly => write!(f, "local_only"),
            OperatingMode::Airgapped => write!(f, "airgapped"),
            OperatingMode::Burst => write!(f, "burst"),
        }
    }
}

/// The consumed mode/endpoint constraint check.
pub trait ModePolicy: Send + Sync {
    /// Whether a model may be used under the given operating mode.
    fn is_allowed(&self, model_id: &str, mode: OperatingMode) -> bool;
}

/// Mode policy derived from provider locality.
///
/// LocalOnly and Airgapped admit models served by local providers;
/// Burst admits everything. Models the registry doesn't know pass the
/// check here since their enforcement happens at the endpoint layer.
pub struct LocalityModePolicy {
    registry: Arc<ModelRegistry>,
}

impl LocalityModePolicy {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }
}

impl ModePolicy for LocalityModePolicy {
    fn is_allowed(&self, model_id: &str, mode: OperatingMode) -> bool {
        match self.registry.model_info(model_id) {
            Some(info) => match mode {
                OperatingMode::LocalOnly | OperatingMode::Airgapped => info.is_local,
                OperatingMode::Burst => true,
            },
            None => true,
        }
    }
}
