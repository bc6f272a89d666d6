// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::env;

pub const SUPPORTED_PROVIDERS: [&str; 3] = ["anthropic", "openrouter", "openai"];

fn default_timeout_secs() -> u64 {
    60
}
fn default_max_tokens() -> u32 {
    1024
}

/// `[ai]` section. Its absence disables enrichment entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// "anthropic" | "openrouter" | "openai" (case-insensitive)
    pub provider: String,
    pub model: String,
    /// "ENV" (or empty) means: read from the provider's env var.
    #[serde(default)]
    pub api_key: String,
    /// How many of the top-ranked items get enriched; defaults to `max_items`.
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl AiConfig {
    /// Env var consulted for the key of a given provider.
    pub fn key_env_var(provider: &str) -> Option<&'static str> {
        match provider {
            "anthropic" => Some("ANTHROPIC_API_KEY"),
            "openrouter" => Some("OPENROUTER_API_KEY"),
            "openai" => Some("OPENAI_API_KEY"),
            _ => None,
        }
    }

    /// Normalize provider, validate it, and resolve an "ENV" key.
    /// A key that is still missing is not fatal here: the provider call fails
    /// later and every item falls back.
    pub fn resolve(&mut self) -> anyhow::Result<()> {
        self.provider = self.provider.trim().to_lowercase();
        if !SUPPORTED_PROVIDERS.contains(&self.provider.as_str()) {
            anyhow::bail!("Unsupported AI provider in config: {}", self.provider);
        }
        if self.model.trim().is_empty() {
            anyhow::bail!("ai.model must not be empty");
        }

        let wants_env = self.api_key.trim().is_empty() || self.api_key.trim().eq_ignore_ascii_case("env");
        if wants_env {
            self.api_key = Self::key_env_var(&self.provider)
                .and_then(|k| env::var(k).ok())
                .unwrap_or_default();
            if self.api_key.is_empty() {
                tracing::warn!(provider = %self.provider, "no API key for AI provider; enrichment calls will fail and fall back");
            }
        }

        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        Ok(())
    }
}
