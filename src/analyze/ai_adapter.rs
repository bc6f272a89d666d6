//! AI adapter: completion-provider abstraction + concrete providers.
//! A provider takes a system instruction and a user prompt and returns free text;
//! everything else (prompts, parsing, fallbacks) lives in the caller.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ai::AiConfig;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

pub type CompletionFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// Text-completion provider used by enrichment and podcast scripting.
pub trait CompletionProvider: Send + Sync {
    /// One request/response round trip. Errors cover transport, HTTP status
    /// and empty answers alike; callers decide the fallback.
    fn complete<'a>(&'a self, system: &'a str, user: &'a str) -> CompletionFuture<'a>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynProvider = Arc<dyn CompletionProvider>;

/// Factory: build a provider according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock`, returns a deterministic canned provider.
/// * Else builds the configured remote provider.
pub fn build_provider(config: &AiConfig) -> Result<DynProvider> {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Ok(Arc::new(MockProvider::canned()));
    }

    let http = http_client(config.timeout_secs)?;
    let provider: DynProvider = match config.provider.as_str() {
        "anthropic" => Arc::new(AnthropicProvider::new(
            http,
            &config.api_key,
            &config.model,
            config.max_tokens,
        )),
        "openrouter" => Arc::new(ChatCompletionsProvider::openrouter(
            http,
            &config.api_key,
            &config.model,
            config.max_tokens,
        )),
        "openai" => Arc::new(ChatCompletionsProvider::openai(
            http,
            &config.api_key,
            &config.model,
            config.max_tokens,
        )),
        other => return Err(anyhow!("Unknown AI provider: {other}")),
    };
    tracing::info!(provider = provider.name(), model = %config.model, "AI initialized");
    Ok(provider)
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("feed-digest/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("building AI http client")
}

// ------------------------------------------------------------
// Anthropic (Messages API)
// ------------------------------------------------------------

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(http: reqwest::Client, api_key: &str, model: &str, max_tokens: u32) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens,
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct AnthropicMsg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct AnthropicReq<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMsg<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResp {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl CompletionProvider for AnthropicProvider {
    fn complete<'a>(&'a self, system: &'a str, user: &'a str) -> CompletionFuture<'a> {
        Box::pin(async move {
            if self.api_key.is_empty() {
                return Err(anyhow!("anthropic: missing API key"));
            }
            let req = AnthropicReq {
                model: &self.model,
                max_tokens: self.max_tokens,
                system,
                messages: vec![AnthropicMsg {
                    role: "user",
                    content: user,
                }],
            };

            debug!(model = %self.model, "Claude messages request");
            let resp = self
                .http
                .post(format!("{}/messages", self.base_url))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&req)
                .send()
                .await
                .context("anthropic request")?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(anyhow!("Claude API error ({status}): {body}"));
            }
            let body: AnthropicResp = resp.json().await.context("anthropic response body")?;
            body.content
                .into_iter()
                .filter(|b| b.kind == "text")
                .find_map(|b| b.text)
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| anyhow!("No text in Claude response"))
        })
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

// ------------------------------------------------------------
// OpenAI-compatible chat completions (OpenAI, OpenRouter)
// ------------------------------------------------------------

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENROUTER_CHAT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub struct ChatCompletionsProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    endpoint: String,
    name: &'static str,
}

impl ChatCompletionsProvider {
    pub fn openai(http: reqwest::Client, api_key: &str, model: &str, max_tokens: u32) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens,
            endpoint: OPENAI_CHAT_URL.to_string(),
            name: "openai",
        }
    }

    pub fn openrouter(http: reqwest::Client, api_key: &str, model: &str, max_tokens: u32) -> Self {
        Self {
            endpoint: OPENROUTER_CHAT_URL.to_string(),
            name: "openrouter",
            ..Self::openai(http, api_key, model, max_tokens)
        }
    }

    pub fn with_endpoint(mut self, url: &str) -> Self {
        self.endpoint = url.to_string();
        self
    }
}

impl CompletionProvider for ChatCompletionsProvider {
    fn complete<'a>(&'a self, system: &'a str, user: &'a str) -> CompletionFuture<'a> {
        Box::pin(async move {
            if self.api_key.is_empty() {
                return Err(anyhow!("{}: missing API key", self.name));
            }

            #[derive(Serialize)]
            struct Msg<'a> {
                role: &'a str,
                content: &'a str,
            }
            #[derive(Serialize)]
            struct Req<'a> {
                model: &'a str,
                messages: Vec<Msg<'a>>,
                max_tokens: u32,
            }
            #[derive(Deserialize)]
            struct Resp {
                choices: Vec<Choice>,
            }
            #[derive(Deserialize)]
            struct Choice {
                message: ChoiceMsg,
            }
            #[derive(Deserialize)]
            struct ChoiceMsg {
                content: Option<String>,
            }

            let req = Req {
                model: &self.model,
                messages: vec![
                    Msg {
                        role: "system",
                        content: system,
                    },
                    Msg {
                        role: "user",
                        content: user,
                    },
                ],
                max_tokens: self.max_tokens,
            };

            debug!(model = %self.model, provider = self.name, "chat completion request");
            let resp = self
                .http
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&req)
                .send()
                .await
                .with_context(|| format!("{} request", self.name))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(anyhow!("{} API error ({status}): {body}", self.name));
            }
            let body: Resp = resp.json().await.context("chat completion body")?;
            body.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| anyhow!("No response from {}", self.name))
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

// ------------------------------------------------------------
// Mock provider (tests, AI_TEST_MODE=mock)
// ------------------------------------------------------------

type Responder = dyn Fn(&str, &str) -> Result<String> + Send + Sync;

/// Scripted provider: a closure decides the answer from (system, user).
/// Counts calls so tests can assert fan-out.
#[derive(Clone)]
pub struct MockProvider {
    respond: Arc<Responder>,
    calls: Arc<AtomicUsize>,
}

impl MockProvider {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            respond: Arc::new(f),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Same answer for every prompt.
    pub fn fixed(answer: &str) -> Self {
        let answer = answer.to_string();
        Self::new(move |_, _| Ok(answer.clone()))
    }

    /// Every call fails.
    pub fn failing(reason: &str) -> Self {
        let reason = reason.to_string();
        Self::new(move |_, _| Err(anyhow!(reason.clone())))
    }

    /// Deterministic answers: numbers for scoring prompts, a sentence otherwise.
    pub fn canned() -> Self {
        Self::new(|system, _user| {
            if system.contains("Return ONLY a number") {
                Ok("50".to_string())
            } else {
                Ok("Mock summary of the article.".to_string())
            }
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionProvider for MockProvider {
    fn complete<'a>(&'a self, system: &'a str, user: &'a str) -> CompletionFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let out = (self.respond)(system, user);
        Box::pin(async move {
            tokio::task::yield_now().await;
            out
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn canned_mock_answers_by_prompt_kind() {
        let m = MockProvider::canned();
        let n = m.complete("Return ONLY a number from 0-100", "x").await.unwrap();
        assert_eq!(n, "50");
        let s = m.complete("You are a technical news analyst", "x").await.unwrap();
        assert!(s.contains("summary"));
        assert_eq!(m.calls(), 2);
    }

    #[tokio::test]
    async fn missing_key_is_an_error_not_a_request() {
        let http = reqwest::Client::new();
        let p = AnthropicProvider::new(http.clone(), "", "claude-x", 64);
        assert!(p.complete("s", "u").await.is_err());
        let o = ChatCompletionsProvider::openrouter(http, "", "m", 64);
        let err = o.complete("s", "u").await.unwrap_err();
        assert!(err.to_string().contains("openrouter"));
    }

    #[serial_test::serial]
    #[test]
    fn test_mode_env_selects_mock() {
        std::env::set_var("AI_TEST_MODE", "mock");
        let cfg = AiConfig {
            provider: "anthropic".into(),
            model: "m".into(),
            api_key: String::new(),
            top_k: None,
            timeout_secs: 5,
            max_tokens: 16,
        };
        let p = build_provider(&cfg).unwrap();
        assert_eq!(p.name(), "mock");
        std::env::remove_var("AI_TEST_MODE");
    }
}
