// src/notify/page.rs
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{render, Delivery, DigestContext, DigestSink};

/// Writes `{web_dir}/{slug}.html`.
pub struct PageWriter {
    web_dir: PathBuf,
}

impl PageWriter {
    pub fn new(web_dir: PathBuf) -> Self {
        Self { web_dir }
    }

    pub fn page_path(&self, slug: &str) -> PathBuf {
        self.web_dir.join(format!("{slug}.html"))
    }

    pub async fn write(&self, ctx: &DigestContext) -> Result<PathBuf> {
        fs::create_dir_all(&self.web_dir)
            .await
            .with_context(|| format!("creating {}", self.web_dir.display()))?;
        let path = self.page_path(&ctx.slug);
        write_atomic(&path, render::render_page(ctx).as_bytes()).await?;
        tracing::info!(path = %path.display(), items = ctx.items.len(), "wrote HTML page");
        Ok(path)
    }
}

/// Write to a sibling temp file, then rename over the target.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("html.tmp");
    fs::write(&tmp, bytes)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .await
        .with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}

#[async_trait::async_trait]
impl DigestSink for PageWriter {
    fn name(&self) -> &str {
        "page"
    }

    async fn deliver(&self, ctx: &DigestContext) -> Result<Delivery> {
        let path = self.write(ctx).await?;
        Ok(Delivery::Delivered(path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn writes_slug_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let web = dir.path().join("news");
        let w = PageWriter::new(web.clone());
        let ctx = DigestContext {
            slug: "2025-06-10".into(),
            generated_at: Utc::now(),
            title: "Digest".into(),
            page_url: String::new(),
            items: vec![],
        };
        let res = w.deliver(&ctx).await.unwrap();
        let path = web.join("2025-06-10.html");
        assert_eq!(res, Delivery::Delivered(path.display().to_string()));
        let html = std::fs::read_to_string(path).unwrap();
        assert!(html.contains("No matching articles today."));
        assert!(!web.join("2025-06-10.html.tmp").exists());
    }
}
