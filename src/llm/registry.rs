use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{LlmConfig, ProviderEntry};
use crate::errors::{PilotError, PilotResult};
use crate::llm::provider::LlmProvider;
use crate::llm::providers::openai_compatible::OpenAiCompatibleProvider;
use crate::llm::types::CallConfig;

/// Registry of all configured LLM providers, keyed by their config.toml identifier.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    active: String,
    llm_config: LlmConfig,
}

impl ProviderRegistry {
    pub fn register(&mut self, provider: Arc<dyn LlmProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn set_active(&mut self, name: String) -> PilotResult<()> {
        if self.providers.contains_key(&name) {
            self.active = name;
            Ok(())
        } else {
            Err(PilotError::Config(format!("Provider '{name}' not registered")))
        }
    }

    pub fn list_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Human-readable name of the active provider, falling back to its id.
    pub fn active_display_name(&self) -> &str {
        self.llm_config
            .providers
            .get(&self.active)
            .map(|e| e.display_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.active)
    }

    /// Return the active provider together with its per-request settings.
    pub fn active(&self) -> PilotResult<(Arc<dyn LlmProvider>, CallConfig)> {
        let provider = self.providers.get(&self.active).cloned().ok_or_else(|| {
            PilotError::Config(format!(
                "Active provider '{}' not found in registry (known: {})",
                self.active,
                self.list_names().join(", ")
            ))
        })?;
        let cfg = self
            .llm_config
            .providers
            .get(&self.active)
            .map(call_config)
            .ok_or_else(|| {
                PilotError::Config(format!("Provider '{}' has no config entry", self.active))
            })?;
        tracing::debug!(
            provider = %self.active,
            model = %cfg.model,
            stream = cfg.stream,
            "resolved active provider"
        );
        Ok((provider, cfg))
    }

    /// Build a registry from the loaded LLM config.
    /// API keys are read from environment variables named `SCREENPILOT_<ID>_API_KEY`
    /// and fall back to `api_key` in config.toml.
    pub fn from_config(config: &LlmConfig) -> Self {
        let mut registry = Self {
            providers: HashMap::new(),
            active: config.active_provider.clone(),
            llm_config: config.clone(),
        };
        for (id, entry) in &config.providers {
            let api_key = std::env::var(api_key_var(id))
                .unwrap_or_else(|_| entry.api_key.clone().unwrap_or_default());
            if api_key.is_empty() {
                tracing::warn!(provider = %id, "no API key configured");
            }
            let provider = OpenAiCompatibleProvider::new(id.clone(), entry.api_base.clone(), api_key);
            registry.register(Arc::new(provider));
        }
        registry
    }
}

fn api_key_var(id: &str) -> String {
    format!("SCREENPILOT_{}_API_KEY", id.to_uppercase().replace('-', "_"))
}

fn call_config(entry: &ProviderEntry) -> CallConfig {
    CallConfig {
        model: entry.model.clone(),
        stream: entry.stream,
        temperature: entry.temperature,
        max_tokens: entry.max_tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm_config() -> LlmConfig {
        let mut providers = HashMap::new();
        for (id, model) in [("openai", "gpt-4o"), ("local", "qwen2.5-vl")] {
            providers.insert(
                id.to_string(),
                ProviderEntry {
                    display_name: id.to_string(),
                    api_base: "http://localhost:1/v1/chat/completions".into(),
                    model: model.into(),
                    temperature: 0.2,
                    max_tokens: 512,
                    stream: id == "local",
                    api_key: Some("k".into()),
                },
            );
        }
        LlmConfig {
            active_provider: "openai".into(),
            providers,
        }
    }

    #[test]
    fn active_resolves_model_and_settings() {
        let registry = ProviderRegistry::from_config(&llm_config());
        let (provider, cfg) = registry.active().unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(cfg.model, "gpt-4o");
        assert_eq!(cfg.max_tokens, 512);
        assert!(!cfg.stream);
    }

    #[test]
    fn switching_provider() {
        let mut registry = ProviderRegistry::from_config(&llm_config());
        registry.set_active("local".into()).unwrap();
        let (_, cfg) = registry.active().unwrap();
        assert_eq!(cfg.model, "qwen2.5-vl");
        assert!(cfg.stream);
        assert!(registry.set_active("missing".into()).is_err());
        assert_eq!(registry.list_names(), vec!["local", "openai"]);
    }

    #[test]
    fn unknown_active_provider_is_config_error() {
        let mut cfg = llm_config();
        cfg.active_provider = "nope".into();
        let registry = ProviderRegistry::from_config(&cfg);
        assert!(matches!(registry.active(), Err(PilotError::Config(_))));
    }

    #[test]
    fn display_name_follows_active_provider() {
        let mut cfg = llm_config();
        cfg.providers.get_mut("openai").unwrap().display_name = "OpenAI GPT-4o".into();
        cfg.providers.get_mut("local").unwrap().display_name = String::new();
        let mut registry = ProviderRegistry::from_config(&cfg);
        assert_eq!(registry.active_display_name(), "OpenAI GPT-4o");
        registry.set_active("local".into()).unwrap();
        assert_eq!(registry.active_display_name(), "local");
    }

    #[test]
    fn env_var_name_is_uppercased() {
        assert_eq!(api_key_var("my-local"), "SCREENPILOT_MY_LOCAL_API_KEY");
    }
}
