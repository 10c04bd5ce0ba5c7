//! Shared test utilities for routing integration tests.
//!
//! Provides reusable provider stubs and config/policy builders to reduce
//! duplication across test files.

#![allow(dead_code)]

use acode_routing::config::{FallbackConfig, RoutingConfig};
use acode_routing::fallback::FallbackHandler;
use acode_routing::registry::{ModelProvider, ModelRegistry, ProviderCapabilities};
use acode_routing::routing::{AgentRole, RoutingPolicy, RoutingStrategy};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Provider stub with controllable health and a probe counter.
pub struct ScriptedProvider {
    name: String,
    models: Vec<String>,
    capabilities: ProviderCapabilities,
    healthy: AtomicBool,
    probes: AtomicU32,
}

impl ScriptedProvider {
    pub fn new(name: &str, models: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            models: models.iter().map(|m| m.to_string()).collect(),
            capabilities: ProviderCapabilities {
                supports_tools: true,
                ..Default::default()
            },
            healthy: AtomicBool::new(true),
            probes: AtomicU32::new(0),
        })
    }

    pub fn down(name: &str, models: &[&str]) -> Arc<Self> {
        let provider = Self::new(name, models);
        provider.set_healthy(false);
        provider
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn probe_count(&self) -> u32 {
        self.probes.load(Ordering::SeqCst)
    }
}

impl ModelProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_models(&self) -> Vec<String> {
        self.models.clone()
    }

    fn capabilities(&self) -> ProviderCapabilities {
        self.capabilities
    }

    fn is_healthy(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.healthy.load(Ordering::SeqCst)
    }
}

/// Registry over the given providers with the default cache TTL.
pub fn make_registry(providers: Vec<Arc<dyn ModelProvider>>) -> Arc<ModelRegistry> {
    Arc::new(ModelRegistry::new(providers))
}

/// Role-based config: planner/reviewer on the 70b model, coder on the 7b.
pub fn role_based_config() -> RoutingConfig {
    let mut config = RoutingConfig {
        strategy: RoutingStrategy::RoleBased,
        default_model: "llama3.2:7b".to_string(),
        ..Default::default()
    };
    config
        .role_models
        .insert(AgentRole::Planner, "llama3.2:70b".to_string());
    config
        .role_models
        .insert(AgentRole::Coder, "llama3.2:7b".to_string());
    config
        .role_models
        .insert(AgentRole::Reviewer, "llama3.2:70b".to_string());
    config
}

/// Fallback handler over the given global chain.
pub fn make_handler(registry: Arc<ModelRegistry>, chain: &[&str]) -> Arc<FallbackHandler> {
    let config = FallbackConfig {
        chain: chain.iter().map(|m| m.to_string()).collect(),
        ..Default::default()
    };
    Arc::new(FallbackHandler::new(registry, config).unwrap())
}

/// Policy wired over a fresh registry and handler (most common pattern).
pub fn make_policy(
    config: RoutingConfig,
    chain: &[&str],
    providers: Vec<Arc<dyn ModelProvider>>,
) -> RoutingPolicy {
    let registry = make_registry(providers);
    let handler = make_handler(registry.clone(), chain);
    RoutingPolicy::new(config, registry, handler).unwrap()
}
