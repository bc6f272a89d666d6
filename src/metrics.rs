// src/metrics.rs
//! Prometheus recorder for the batch run. There is no scrape endpoint: the
//! rendered exposition text is written to a file at the end of the run
//! (node-exporter textfile collector style).

use anyhow::{Context, Result};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once per process.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        crate::ingest::ensure_metrics_described();
        crate::analyze::ensure_metrics_described();
        metrics::describe_counter!("sink_deliveries_total", "Digest sink results by sink and outcome.");
        metrics::describe_gauge!("digest_items", "Items in the last digest.");
        metrics::describe_gauge!("digest_last_run_timestamp_seconds", "Unix time of the last completed run.");
        Ok(Self { handle })
    }

    /// Exposition text of everything recorded so far.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Stamp the run and write the exposition text to `path` (parent dirs created).
    pub fn write_to(&self, path: &Path, run_ts_secs: i64) -> Result<()> {
        gauge!("digest_last_run_timestamp_seconds").set(run_ts_secs as f64);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let tmp = path.with_extension("prom.tmp");
        std::fs::write(&tmp, self.render()).with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote metrics");
        Ok(())
    }
}
