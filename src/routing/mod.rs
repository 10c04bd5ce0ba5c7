//! Role-aware model routing.
//!
//! This module implements the routing policy that selects which backend
//! model handles a request for a given agent role, validates the choice
//! against the operating mode, and escalates through the fallback chain
//! when the primary model is unavailable.

use std::sync::Arc;
use std::time::Instant;

pub mod context;
pub mod error;
pub mod mode;
pub mod strategies;

pub use context::{AgentRole, ModelCapability, RoutingContext, RoutingDecision, TaskComplexity};
pub use error::RoutingError;
pub use mode::{LocalityModePolicy, ModePolicy, OperatingMode};
pub use strategies::RoutingStrategy;

use crate::config::RoutingConfig;
use crate::fallback::{FallbackContext, FallbackHandler};
use crate::registry::{ModelInfo, ModelRegistry};

/// Check model id syntax: `name:tag`, optionally suffixed `@provider`.
pub fn is_valid_model_id(model_id: &str) -> bool {
    if model_id.trim().is_empty() {
        return false;
    }

    let base = model_id.split('@').next().unwrap_or("");
    match base.split_once(':') {
        Some((name, tag)) => !name.is_empty() && !tag.is_empty(),
        None => false,
    }
}

/// Selects models for agent roles.
///
/// The main entry point of the routing core: resolves a candidate from
/// the configured strategy, validates id syntax and operating-mode
/// constraints, checks availability through the registry's cache, and on
/// a miss delegates to the [`FallbackHandler`]'s chain walk. Thread-safe
/// behind `&self`; one instance serves the whole process.
pub struct RoutingPolicy {
    config: RoutingConfig,
    registry: Arc<ModelRegistry>,
    fallback: Arc<FallbackHandler>,
    mode_policy: Arc<dyn ModePolicy>,
}

impl std::fmt::Debug for RoutingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingPolicy")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RoutingPolicy {
    /// Create a policy using provider locality as the mode constraint.
    ///
    /// Fails with `ACODE-RTE-005` when the routing table is unusable.
    pub fn new(
        config: RoutingConfig,
        registry: Arc<ModelRegistry>,
        fallback: Arc<FallbackHandler>,
    ) -> Result<Self, RoutingError> {
        let mode_policy = Arc::new(LocalityModePolicy::new(registry.clone()));
        Self::with_mode_policy(config, registry, fallback, mode_policy)
    }

    /// Create a policy with an explicit mode constraint implementation.
    pub fn with_mode_policy(
        config: RoutingConfig,
        registry: Arc<ModelRegistry>,
        fallback: Arc<FallbackHandler>,
        mode_policy: Arc<dyn ModePolicy>,
    ) -> Result<Self, RoutingError> {
        config
            .validate()
            .map_err(|e| RoutingError::InvalidConfiguration {
                message: e.to_string(),
            })?;

        Ok(Self {
            config,
            registry,
            fallback,
            mode_policy,
        })
    }

    /// Select the model that should handle a request for a role.
    pub fn get_model(
        &self,
        role: AgentRole,
        context: &RoutingContext,
    ) -> Result<RoutingDecision, RoutingError> {
        let started = Instant::now();

        tracing::info!(
            role = %role,
            strategy = %self.config.strategy,
            session_id = ?context.session_id,
            "routing request"
        );

        // User override bypasses strategy selection but not validation
        if let Some(override_model) = context
            .user_override
            .as_deref()
            .filter(|m| !m.trim().is_empty())
        {
            return self.route_user_override(role, override_model, context, started);
        }

        let candidate = strategies::select_candidate(&self.config, role, context);

        self.validate_model_id(&candidate)?;
        self.check_mode(&candidate, context.operating_mode)?;
        self.check_capabilities(&candidate, context)?;

        if self.registry.is_model_available(&candidate) {
            let decision = RoutingDecision::primary(
                candidate.clone(),
                format!("strategy: {}, role: {}", self.config.strategy, role),
                self.registry.provider_for_model(&candidate),
                elapsed_ms(started),
            );
            self.log_decision(&decision, role);
            return Ok(decision);
        }

        tracing::warn!(
            model_id = %candidate,
            "primary model unavailable, checking fallback chain"
        );

        let decision = self.walk_chain(role, Some(&candidate), context, started)?;
        self.log_decision(&decision, role);
        Ok(decision)
    }

    /// Walk the fallback chain without trying a primary first.
    ///
    /// For callers that already know the primary failed. Returns None
    /// when no fallback is viable.
    pub fn get_fallback_model(
        &self,
        role: AgentRole,
        context: &RoutingContext,
    ) -> Option<RoutingDecision> {
        let started = Instant::now();
        self.walk_chain(role, None, context, started).ok()
    }

    /// Direct availability passthrough to the registry.
    pub fn is_model_available(&self, model_id: &str) -> bool {
        self.registry.is_model_available(model_id)
    }

    /// The registry's full availability-annotated model list, unfiltered.
    pub fn list_available_models(&self) -> Vec<ModelInfo> {
        self.registry.list_available_models()
    }

    fn route_user_override(
        &self,
        role: AgentRole,
        override_model: &str,
        context: &RoutingContext,
        started: Instant,
    ) -> Result<RoutingDecision, RoutingError> {
        tracing::info!(model_id = %override_model, "user override detected");

        self.validate_model_id(override_model)?;
        // Overrides still honor the operating-mode constraint
        self.check_mode(override_model, context.operating_mode)?;

        if !self.registry.is_model_available(override_model) {
            return Err(RoutingError::NoAvailableModel {
                role,
                detail: format!("user override model '{}' is not available", override_model),
                attempted: vec![override_model.to_string()],
                suggestion: Some(format!("Start the model with 'ollama run {}'", override_model)),
            });
        }

        let decision = RoutingDecision::primary(
            override_model,
            "user override",
            self.registry.provider_for_model(override_model),
            elapsed_ms(started),
        );
        self.log_decision(&decision, role);
        Ok(decision)
    }

    /// Shared chain-walk step for predictive (selection-time) and
    /// reactive (post-failure) fallback.
    fn walk_chain(
        &self,
        role: AgentRole,
        primary: Option<&str>,
        context: &RoutingContext,
        started: Instant,
    ) -> Result<RoutingDecision, RoutingError> {
        if !self.fallback.has_chain_for(role) {
            return Err(RoutingError::NoFallbackChain {
                role,
                attempted: primary.map(|m| vec![m.to_string()]).unwrap_or_default(),
                suggestion: Some(
                    "Configure a fallback_chain in routing configuration".to_string(),
                ),
            });
        }

        let mut fallback_context = match primary {
            Some(model) => FallbackContext::unavailable(model, context.operating_mode),
            None => FallbackContext::without_original(context.operating_mode),
        };
        if let Some(session_id) = context.session_id {
            fallback_context = fallback_context.with_session(session_id);
        }

        let result = self.fallback.get_fallback(role, &fallback_context);

        match result.model_id {
            Some(model_id) if result.success => Ok(RoutingDecision::fallback(
                model_id.clone(),
                "primary_unavailable",
                format!("fallback from {}", primary.unwrap_or("none")),
                self.registry.provider_for_model(&model_id),
                elapsed_ms(started),
            )),
            _ => {
                let mut attempted: Vec<String> =
                    primary.map(|m| vec![m.to_string()]).unwrap_or_default();
                attempted.extend(result.attempted);

                let suggestion = attempted
                    .last()
                    .map(|m| format!("Start a model with 'ollama run {}'", m));

                Err(RoutingError::FallbackExhausted {
                    role,
                    attempted,
                    suggestion,
                })
            }
        }
    }

    fn validate_model_id(&self, model_id: &str) -> Result<(), RoutingError> {
        if is_valid_model_id(model_id) {
            Ok(())
        } else {
            Err(RoutingError::InvalidModelId {
                model_id: model_id.to_string(),
            })
        }
    }

    fn check_mode(&self, model_id: &str, mode: OperatingMode) -> Result<(), RoutingError> {
        if self.mode_policy.is_allowed(model_id, mode) {
            return Ok(());
        }

        let suggestion = match mode {
            OperatingMode::LocalOnly => {
                "Use a local model or change operating mode to 'burst'".to_string()
            }
            OperatingMode::Airgapped => {
                "Use an air-gapped model or change operating mode".to_string()
            }
            OperatingMode::Burst => {
                "Choose a model permitted in the current operating mode".to_string()
            }
        };

        Err(RoutingError::ModeConstraintViolation {
            model_id: model_id.to_string(),
            mode,
            suggestion: Some(suggestion),
        })
    }

    fn check_capabilities(
        &self,
        model_id: &str,
        context: &RoutingContext,
    ) -> Result<(), RoutingError> {
        if context.required_capabilities.is_empty() {
            return Ok(());
        }

        // Unknown models pass; capability data lives with the provider
        let Some(capabilities) = self.registry.capabilities_for_model(model_id) else {
            return Ok(());
        };

        let missing: Vec<ModelCapability> = context
            .required_capabilities
            .iter()
            .copied()
            .filter(|capability| match capability {
                ModelCapability::Tools => !capabilities.supports_tools,
                ModelCapability::Vision => !capabilities.supports_vision,
                ModelCapability::JsonMode => !capabilities.supports_json_mode,
            })
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RoutingError::CapabilityMismatch {
                model_id: model_id.to_string(),
                missing,
                suggestion: Some(
                    "Use a model that supports the required capabilities or drop them from the request"
                        .to_string(),
                ),
            })
        }
    }

    fn log_decision(&self, decision: &RoutingDecision, role: AgentRole) {
        tracing::info!(
            role = %role,
            model_id = %decision.model_id,
            fallback = decision.is_fallback,
            reason = %decision.selection_reason,
            provider = ?decision.provider,
            time_ms = decision.decision_time_ms,
            "routing decision"
        );

        metrics::counter!(
            "acode_routing_decisions_total",
            "role" => role.to_string(),
            "fallback" => decision.is_fallback.to_string()
        )
        .increment(1);
        metrics::histogram!("acode_routing_decision_duration_ms")
            .record(decision.decision_time_ms as f64);
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
