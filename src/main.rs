//! feed-digest: daily run entrypoint.
//! Loads config, runs one digest (fetch, rank, enrich, publish) and exits.
//!
//! Exit code 1 only for fatal errors (config missing/invalid, run aborted);
//! failed feeds or sinks are logged and reported in the summary.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use feed_digest::config::{load_config_default, load_config_from};
use feed_digest::metrics::Metrics;
use feed_digest::{logging, run_digest};

#[derive(Parser)]
#[command(name = "feed-digest", version, about = "Fetch, rank, enrich and publish a daily news digest")]
struct Cli {
    /// Path to config file (TOML or JSON). Falls back to $DIGEST_CONFIG_PATH,
    /// then config/digest.toml, then config/digest.json.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip language-model enrichment even if [ai] is configured.
    #[arg(long)]
    no_ai: bool,

    /// Print the run summary as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    logging::init();
    let cli = Cli::parse();

    let loaded = match cli.config.as_deref() {
        Some(p) => load_config_from(p),
        None => load_config_default(),
    };
    let mut cfg = match loaded {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "fatal: configuration");
            return ExitCode::from(1);
        }
    };
    if cli.no_ai {
        cfg.ai = None;
    }

    let metrics = match cfg.output.metrics_file.as_ref() {
        Some(_) => match Metrics::init() {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "metrics disabled");
                None
            }
        },
        None => None,
    };

    let now = Utc::now();
    let summary = match run_digest(&cfg, now).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "run failed");
            return ExitCode::from(1);
        }
    };

    if let (Some(m), Some(path)) = (metrics.as_ref(), cfg.output.metrics_file.as_ref()) {
        if let Err(e) = m.write_to(path, now.timestamp()) {
            tracing::warn!(error = %format!("{e:#}"), "metrics export failed");
        }
    }

    if cli.json {
        match serde_json::to_string_pretty(&summary).context("serializing summary") {
            Ok(s) => println!("{s}"),
            Err(e) => tracing::warn!(error = %format!("{e:#}"), "summary not printed"),
        }
    }

    ExitCode::SUCCESS
}
