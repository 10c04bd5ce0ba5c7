use super::*;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Provider stub with a probe counter for cache assertions.
struct StubProvider {
    name: String,
    models: Vec<String>,
    capabilities: ProviderCapabilities,
    healthy: AtomicBool,
    probes: AtomicU32,
}

impl StubProvider {
    fn new(name: &str, models: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            models: models.iter().map(|m| m.to_string()).collect(),
            capabilities: ProviderCapabilities {
                supports_tools: true,
                ..Default::default()
            },
            healthy: AtomicBool::new(true),
            probes: AtomicU32::new(0),
        }
    }

    fn unhealthy(self) -> Self {
        self.healthy.store(false, Ordering::SeqCst);
        self
    }

    fn probe_count(&self) -> u32 {
        self.probes.load(Ordering::SeqCst)
    }
}

impl ModelProvider for StubProvider {
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

#[test]
fn advertised_model_on_healthy_provider_is_available() {
    let registry = ModelRegistry::new(vec![Arc::new(StubProvider::new(
        "ollama",
        &["llama3.2:7b"],
    ))]);

    assert!(registry.is_model_available("llama3.2:7b"));
}

#[test]
fn advertised_model_on_unhealthy_provider_is_unavailable() {
    let registry = ModelRegistry::new(vec![Arc::new(
        StubProvider::new("ollama", &["llama3.2:7b"]).unhealthy(),
    )]);

    assert!(!registry.is_model_available("llama3.2:7b"));
}

#[test]
fn unknown_model_is_unavailable() {
    let registry = ModelRegistry::new(vec![Arc::new(StubProvider::new(
        "ollama",
        &["llama3.2:7b"],
    ))]);

    assert!(!registry.is_model_available("nonexistent:model"));
}

#[test]
fn blank_model_id_is_unavailable() {
    let registry = ModelRegistry::new(vec![]);
    assert!(!registry.is_model_available(""));
    assert!(!registry.is_model_available("   "));
}

#[test]
fn availability_is_cached_within_ttl() {
    let provider = Arc::new(StubProvider::new("ollama", &["llama3.2:7b"]));
    let registry = ModelRegistry::new(vec![provider.clone()]);

    for _ in 0..5 {
        assert!(registry.is_model_available("llama3.2:7b"));
    }

    assert_eq!(provider.probe_count(), 1);
}

#[test]
fn availability_reprobes_after_ttl_expiry() {
    let provider = Arc::new(StubProvider::new("ollama", &["llama3.2:7b"]));
    let registry =
        ModelRegistry::with_cache_ttl(vec![provider.clone()], Duration::from_millis(10));

    assert!(registry.is_model_available("llama3.2:7b"));
    std::thread::sleep(Duration::from_millis(25));
    assert!(registry.is_model_available("llama3.2:7b"));

    assert_eq!(provider.probe_count(), 2);
}

#[test]
fn cache_is_keyed_per_model() {
    let provider = Arc::new(StubProvider::new(
        "ollama",
        &["llama3.2:7b", "llama3.2:70b"],
    ));
    let registry = ModelRegistry::new(vec![provider.clone()]);

    registry.is_model_available("llama3.2:7b");
    registry.is_model_available("llama3.2:70b");
    registry.is_model_available("llama3.2:7b");

    assert_eq!(provider.probe_count(), 2);
}

#[test]
fn provider_hint_in_model_id_wins() {
    let registry = ModelRegistry::new(vec![Arc::new(StubProvider::new(
        "ollama",
        &["llama3.2:7b"],
    ))]);

    assert_eq!(
        registry.provider_for_model("llama3.2:7b@vllm").as_deref(),
        Some("vllm")
    );
}

#[test]
fn provider_resolved_from_advertised_models() {
    let registry = ModelRegistry::new(vec![
        Arc::new(StubProvider::new("ollama", &["llama3.2:7b"])),
        Arc::new(StubProvider::new("openai", &["gpt-4:latest"])),
    ]);

    assert_eq!(
        registry.provider_for_model("gpt-4:latest").as_deref(),
        Some("openai")
    );
    assert_eq!(registry.provider_for_model("unknown:model"), None);
}

#[test]
fn model_info_marks_local_providers() {
    let registry = ModelRegistry::new(vec![
        Arc::new(StubProvider::new("ollama", &["llama3.2:7b"])),
        Arc::new(StubProvider::new("openai", &["gpt-4:latest"])),
    ]);

    let local = registry.model_info("llama3.2:7b").unwrap();
    assert!(local.is_local);
    assert!(local.supports_tool_calling);

    let cloud = registry.model_info("gpt-4:latest").unwrap();
    assert!(!cloud.is_local);
}

#[test]
fn model_info_estimates_parameter_count() {
    let registry = ModelRegistry::new(vec![Arc::new(StubProvider::new(
        "ollama",
        &["llama3.2:70b", "phi3:mini"],
    ))]);

    let info = registry.model_info("llama3.2:70b").unwrap();
    assert_eq!(info.parameter_count, 70_000_000_000);

    // Non-numeric tag: unknown
    let info = registry.model_info("phi3:mini").unwrap();
    assert_eq!(info.parameter_count, 0);
}

#[test]
fn list_available_models_is_unfiltered() {
    let registry = ModelRegistry::new(vec![
        Arc::new(StubProvider::new("ollama", &["llama3.2:7b"])),
        Arc::new(StubProvider::new("vllm", &["mistral:7b"]).unhealthy()),
    ]);

    let models = registry.list_available_models();
    assert_eq!(models.len(), 2);

    let up = models.iter().find(|m| m.model_id == "llama3.2:7b").unwrap();
    assert!(up.is_available);

    let down = models.iter().find(|m| m.model_id == "mistral:7b").unwrap();
    assert!(!down.is_available);
}

#[test]
fn supported_models_by_provider_name() {
    let registry = ModelRegistry::new(vec![Arc::new(StubProvider::new(
        "ollama",
        &["llama3.2:7b", "llama3.2:70b"],
    ))]);

    assert_eq!(registry.supported_models("ollama").len(), 2);
    assert_eq!(registry.supported_models("OLLAMA").len(), 2);
    assert!(registry.supported_models("vllm").is_empty());
}

#[test]
fn capabilities_lookup_strips_provider_hint() {
    let registry = ModelRegistry::new(vec![Arc::new(StubProvider::new(
        "ollama",
        &["llama3.2:7b"],
    ))]);

    let caps = registry.capabilities_for_model("llama3.2:7b@ollama").unwrap();
    assert!(caps.supports_tools);
}

#[test]
fn parameter_count_parsing() {
    assert_eq!(estimate_parameter_count("llama3.2:7b"), 7_000_000_000);
    assert_eq!(estimate_parameter_count("qwen2.5:0.5b"), 500_000_000);
    assert_eq!(estimate_parameter_count("llama3.2:70b@ollama"), 70_000_000_000);
    assert_eq!(estimate_parameter_count("no-tag"), 0);
    assert_eq!(estimate_parameter_count("model:latest"), 0);
}
