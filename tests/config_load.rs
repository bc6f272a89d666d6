//! Config loading from disk: explicit path, env var path, env overrides for
//! secrets, and fatal errors.

use feed_digest::config::digest::ENV_CONFIG_PATH;
use feed_digest::config::{load_config_default, load_config_from};
use serial_test::serial;
use std::fs;

const FULL_TOML: &str = r#"
keywords = ["AI", "LLM"]
window_hours = 12
max_items = 5
time_zone = "Europe/Malta"

[[feeds]]
url = "https://a.example/rss"
label = "A"

[[feeds]]
url = "https://b.example/atom"

[output]
web_dir = "out/news"
base_url = "https://example.com/news/"

[ai]
provider = "OpenRouter"
model = "anthropic/claude-sonnet-4.5"
api_key = "ENV"
top_k = 3

[smtp]
host = "smtp.example.com"
port = 465
secure = true
user = "file-user"
pass = "file-pass"

[email]
from = "Digest <digest@example.com>"
to = ["me@example.com"]

[twilio]
account_sid = "AC-file"
from_number = "+15550001111"
to_number = "+15550002222"
"#;

fn clear_env() {
    for k in [
        ENV_CONFIG_PATH,
        "SMTP_USER",
        "SMTP_PASS",
        "TWILIO_ACCOUNT_SID",
        "TWILIO_AUTH_TOKEN",
        "OPENROUTER_API_KEY",
        "ELEVENLABS_API_KEY",
    ] {
        std::env::remove_var(k);
    }
}

#[test]
#[serial]
fn full_toml_loads_with_env_overrides() {
    clear_env();
    std::env::set_var("SMTP_PASS", "env-pass");
    std::env::set_var("TWILIO_AUTH_TOKEN", "env-token");
    std::env::set_var("OPENROUTER_API_KEY", "or-123");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("digest.toml");
    fs::write(&path, FULL_TOML).unwrap();

    let cfg = load_config_from(&path).unwrap();
    assert_eq!(cfg.feeds.len(), 2);
    assert_eq!(cfg.window_hours, 12);
    assert_eq!(cfg.max_items, 5);
    assert_eq!(cfg.enrich_top_k(), 3);
    assert_eq!(cfg.tz().unwrap(), chrono_tz::Europe::Malta);

    let ai = cfg.ai.as_ref().unwrap();
    assert_eq!(ai.provider, "openrouter");
    assert_eq!(ai.api_key, "or-123");

    assert_eq!(cfg.smtp.user, "file-user");
    assert_eq!(cfg.smtp.pass, "env-pass");
    assert_eq!(cfg.smtp.port, Some(465));
    assert_eq!(cfg.twilio.account_sid, "AC-file");
    assert_eq!(cfg.twilio.auth_token, "env-token");
    assert_eq!(cfg.twilio.title, "AI Digest");
    clear_env();
}

#[test]
#[serial]
fn env_path_is_used_and_must_exist() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.json");
    fs::write(
        &path,
        r#"{"feeds":[{"url":"https://c.example/feed"}],"keywords":["rust"]}"#,
    )
    .unwrap();

    std::env::set_var(ENV_CONFIG_PATH, &path);
    let cfg = load_config_default().unwrap();
    assert_eq!(cfg.keywords, vec!["rust".to_string()]);
    assert!(cfg.ai.is_none());

    std::env::set_var(ENV_CONFIG_PATH, dir.path().join("missing.toml"));
    let err = load_config_default().unwrap_err();
    assert!(err.to_string().contains("non-existent"));
    clear_env();
}

#[test]
#[serial]
fn unsupported_provider_is_fatal() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("digest.toml");
    fs::write(
        &path,
        "keywords = [\"ai\"]\n[[feeds]]\nurl = \"https://a.example\"\n[ai]\nprovider = \"gemini\"\nmodel = \"m\"\n",
    )
    .unwrap();
    assert!(load_config_from(&path).is_err());
}

#[test]
#[serial]
fn malformed_file_is_fatal() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("digest.toml");
    fs::write(&path, "keywords = [\"ai\"\n[[feeds]]").unwrap();
    let err = load_config_from(&path).unwrap_err();
    assert!(format!("{err:#}").contains("parsing config"));
    assert!(load_config_from(&dir.path().join("nope.toml")).is_err());
}

#[test]
#[serial]
fn example_config_is_valid() {
    clear_env();
    let cfg = load_config_from(std::path::Path::new("config/digest.example.toml")).unwrap();
    assert_eq!(cfg.feeds.len(), 3);
    assert_eq!(cfg.ai.as_ref().unwrap().provider, "anthropic");
    assert!(!cfg.podcast.enabled);
    assert_eq!(cfg.output.metrics_file.as_deref(), Some(std::path::Path::new("logs/digest.prom")));
}
