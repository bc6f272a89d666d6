// src/config/digest.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::ai::AiConfig;

pub const ENV_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/digest.toml";
pub const DEFAULT_JSON_PATH: &str = "config/digest.json";

pub const DEFAULT_WINDOW_HOURS: u32 = 24;
pub const DEFAULT_MAX_ITEMS: usize = 15;

fn default_window_hours() -> u32 {
    DEFAULT_WINDOW_HOURS
}
fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS
}
fn default_time_zone() -> String {
    "UTC".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedCfg {
    pub url: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchCfg {
    #[serde(default = "FetchCfg::default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "FetchCfg::default_user_agent")]
    pub user_agent: String,
}

impl FetchCfg {
    fn default_timeout() -> u64 {
        20
    }
    fn default_user_agent() -> String {
        concat!("feed-digest/", env!("CARGO_PKG_VERSION")).to_string()
    }
}

impl Default for FetchCfg {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout(),
            user_agent: Self::default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputCfg {
    #[serde(default = "OutputCfg::default_web_dir")]
    pub web_dir: PathBuf,
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "OutputCfg::default_title")]
    pub title: String,
    /// Prometheus text file written at the end of each run.
    #[serde(default)]
    pub metrics_file: Option<PathBuf>,
}

impl OutputCfg {
    fn default_web_dir() -> PathBuf {
        PathBuf::from("public/news")
    }
    fn default_title() -> String {
        "AI Daily Digest".to_string()
    }
}

impl Default for OutputCfg {
    fn default() -> Self {
        Self {
            web_dir: Self::default_web_dir(),
            base_url: String::new(),
            title: Self::default_title(),
            metrics_file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmtpCfg {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub pass: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailCfg {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioCfg {
    #[serde(default)]
    pub account_sid: String,
    #[serde(default)]
    pub auth_token: String,
    #[serde(default)]
    pub from_number: String,
    #[serde(default)]
    pub to_number: String,
    #[serde(default = "TwilioCfg::default_title")]
    pub title: String,
}

impl TwilioCfg {
    fn default_title() -> String {
        "AI Digest".to_string()
    }
}

impl Default for TwilioCfg {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            to_number: String::new(),
            title: Self::default_title(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodcastCfg {
    #[serde(default)]
    pub enabled: bool,
    /// "ENV" (or empty) means: read ELEVENLABS_API_KEY.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "PodcastCfg::default_voice")]
    pub voice_id: String,
    #[serde(default = "PodcastCfg::default_model")]
    pub model_id: String,
    #[serde(default = "PodcastCfg::default_output_dir")]
    pub output_dir: PathBuf,
}

impl PodcastCfg {
    fn default_voice() -> String {
        "IKne3meq5aSn9XLyUdCD".to_string()
    }
    fn default_model() -> String {
        "eleven_multilingual_v2".to_string()
    }
    fn default_output_dir() -> PathBuf {
        PathBuf::from("public/podcasts")
    }
}

impl Default for PodcastCfg {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            voice_id: Self::default_voice(),
            model_id: Self::default_model(),
            output_dir: Self::default_output_dir(),
        }
    }
}

/// Whole-run configuration, built once at startup and passed by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    pub feeds: Vec<FeedCfg>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// IANA name used to derive the date slug.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default)]
    pub fetch: FetchCfg,
    #[serde(default)]
    pub output: OutputCfg,
    #[serde(default)]
    pub ai: Option<AiConfig>,
    #[serde(default)]
    pub smtp: SmtpCfg,
    #[serde(default)]
    pub email: EmailCfg,
    #[serde(default)]
    pub twilio: TwilioCfg,
    #[serde(default)]
    pub podcast: PodcastCfg,
}

impl DigestConfig {
    /// Parsed IANA time zone. Validated at load, so this only fails for
    /// configs built by hand.
    pub fn tz(&self) -> Result<chrono_tz::Tz> {
        self.time_zone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| anyhow!("invalid time_zone {:?}: {e}", self.time_zone))
    }

    /// How many ranked items go to the language model.
    pub fn enrich_top_k(&self) -> usize {
        self.ai
            .as_ref()
            .and_then(|a| a.top_k)
            .unwrap_or(self.max_items)
    }

    /// Env overrides for secrets, then validation.
    fn finish(mut self) -> Result<Self> {
        override_from_env(&mut self.smtp.user, "SMTP_USER");
        override_from_env(&mut self.smtp.pass, "SMTP_PASS");
        override_from_env(&mut self.twilio.account_sid, "TWILIO_ACCOUNT_SID");
        override_from_env(&mut self.twilio.auth_token, "TWILIO_AUTH_TOKEN");

        let pk = self.podcast.api_key.trim();
        if pk.is_empty() || pk.eq_ignore_ascii_case("env") {
            self.podcast.api_key = std::env::var("ELEVENLABS_API_KEY").unwrap_or_default();
        }

        if let Some(ai) = self.ai.as_mut() {
            ai.resolve()?;
        }

        self.feeds.retain(|f| !f.url.trim().is_empty());
        if self.feeds.is_empty() {
            bail!("config lists no feeds");
        }
        self.keywords = self
            .keywords
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if self.keywords.is_empty() {
            tracing::warn!("config lists no keywords; every item will be filtered out");
        }
        self.tz()?;
        Ok(self)
    }
}

fn override_from_env(slot: &mut String, var: &str) {
    if let Ok(v) = std::env::var(var) {
        if !v.trim().is_empty() {
            *slot = v;
        }
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<DigestConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing config {}", path.display()))?;
    cfg.finish()
}

/// Load config using env var + fallbacks:
/// 1) $DIGEST_CONFIG_PATH
/// 2) config/digest.toml
/// 3) config/digest.json
pub fn load_config_default() -> Result<DigestConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!(
                "{ENV_CONFIG_PATH} points to non-existent path {}",
                pb.display()
            ));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_TOML_PATH);
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_JSON_PATH);
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Err(anyhow!(
        "config file missing: set {ENV_CONFIG_PATH} or create {DEFAULT_TOML_PATH}"
    ))
}

fn parse_config(s: &str, hint_ext: &str) -> Result<DigestConfig> {
    if hint_ext == "json" {
        return serde_json::from_str(s).context("invalid JSON config");
    }
    if hint_ext == "toml" {
        return toml::from_str(s).context("invalid TOML config");
    }
    // No usable extension: JSON if it looks like an object, else TOML.
    if s.trim_start().starts_with('{') {
        serde_json::from_str(s).context("invalid JSON config")
    } else {
        toml::from_str(s).context("invalid TOML config")
    }
}
