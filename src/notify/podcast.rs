// src/notify/podcast.rs
//! Two-host audio recap: the completion provider writes a dialogue script for
//! the top items, ElevenLabs voices it chunk by chunk, and the MP3 parts are
//! concatenated into `{output_dir}/{slug}.mp3` next to `{slug}-script.txt`.

use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

use super::{Delivery, DigestContext, DigestSink};
use crate::analyze::{DynProvider, EnrichedItem};
use crate::config::digest::PodcastCfg;

pub const PODCAST_ITEMS: usize = 5;
pub const MAX_CHUNK_CHARS: usize = 1500;

const ELEVENLABS_API: &str = "https://api.elevenlabs.io/v1";

const SCRIPT_SYSTEM: &str = "You write scripts for a daily AI news podcast. Output only the dialogue lines, one speaker turn per line.";

pub fn script_prompt(items: &[EnrichedItem]) -> String {
    let listing: Vec<String> = items
        .iter()
        .take(PODCAST_ITEMS)
        .enumerate()
        .map(|(i, e)| {
            let item = e.item();
            format!(
                "{}. {}\n   Source: {}\n   Summary: {}\n   Business Viability: {}/100\n   Technical Relevance: {}/100\n   Link: {}",
                i + 1,
                item.title,
                item.source,
                e.summary,
                e.viability_score,
                e.technical_score,
                item.link
            )
        })
        .collect();

    format!(
        "You are creating a script for a daily AI news podcast. Two hosts (Alex and Sam) discuss the top AI/tech news in a conversational, engaging way.

Guidelines:
- Keep it conversational and natural, like two friends discussing tech news
- Alex is more technical and analytical
- Sam asks clarifying questions and connects ideas to practical applications
- Total length: 5-8 minutes of dialogue (roughly 1200-2000 words)
- Start with a brief intro, then dive into the articles
- End with a quick recap and sign-off
- Use natural speech patterns (contractions, pauses, enthusiasm)

Today's articles:

{}

Format the script exactly like this:
Alex: [dialogue]
Sam: [dialogue]
Alex: [dialogue]

Make it engaging, informative, and conversational. Start now:",
        listing.join("\n\n")
    )
}

/// Split on line boundaries into chunks of at most `max_chars` characters.
/// Blank lines are dropped; a single over-long line is split at whitespace.
pub fn chunk_script(script: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    let mut push_piece = |piece: &str, chunks: &mut Vec<String>| {
        let len = piece.chars().count();
        if current_len > 0 && current_len + 1 + len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(piece);
        current_len += len;
    };

    for line in script.lines().map(str::trim).filter(|l| !l.is_empty()) {
        for piece in split_long_line(line, max_chars) {
            push_piece(&piece, &mut chunks);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_long_line(line: &str, max_chars: usize) -> Vec<String> {
    if line.chars().count() <= max_chars || max_chars == 0 {
        return vec![line.to_string()];
    }
    let mut out = Vec::new();
    let mut piece = String::new();
    for word in line.split_whitespace() {
        let extra = if piece.is_empty() { 0 } else { 1 };
        if !piece.is_empty() && piece.chars().count() + extra + word.chars().count() > max_chars {
            out.push(std::mem::take(&mut piece));
        }
        if !piece.is_empty() {
            piece.push(' ');
        }
        piece.push_str(word);
        // an unbroken word longer than the limit is hard-cut
        while piece.chars().count() > max_chars {
            let head: String = piece.chars().take(max_chars).collect();
            let rest: String = piece.chars().skip(max_chars).collect();
            out.push(head);
            piece = rest;
        }
    }
    if !piece.is_empty() {
        out.push(piece);
    }
    out
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

#[derive(Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

pub struct PodcastGenerator {
    cfg: PodcastCfg,
    provider: Option<DynProvider>,
    client: Client,
    api_base: String,
}

impl PodcastGenerator {
    pub fn new(cfg: PodcastCfg, provider: Option<DynProvider>) -> Self {
        Self {
            cfg,
            provider,
            client: Client::new(),
            api_base: ELEVENLABS_API.to_string(),
        }
    }

    pub fn with_api_base(mut self, url: &str) -> Self {
        self.api_base = url.trim_end_matches('/').to_string();
        self
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let url = format!("{}/text-to-speech/{}", self.api_base, self.cfg.voice_id);
        let req = TtsRequest {
            text,
            model_id: &self.cfg.model_id,
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
                style: 0.5,
                use_speaker_boost: true,
            },
        };
        let resp = self
            .client
            .post(url)
            .header("xi-api-key", &self.cfg.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .timeout(Duration::from_secs(120))
            .json(&req)
            .send()
            .await
            .context("elevenlabs request")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("ElevenLabs error ({status}): {body}"));
        }
        Ok(resp.bytes().await.context("elevenlabs audio body")?.to_vec())
    }
}

#[async_trait::async_trait]
impl DigestSink for PodcastGenerator {
    fn name(&self) -> &str {
        "podcast"
    }

    async fn deliver(&self, ctx: &DigestContext) -> Result<Delivery> {
        let Some(provider) = self.provider.as_ref() else {
            return Ok(Delivery::Skipped("no AI provider for the podcast script".into()));
        };
        if self.cfg.api_key.trim().is_empty() {
            return Ok(Delivery::Skipped("ElevenLabs API key not configured".into()));
        }
        if ctx.items.is_empty() {
            return Ok(Delivery::Skipped("no articles".into()));
        }

        tracing::info!(items = ctx.items.len().min(PODCAST_ITEMS), "generating podcast script");
        let script = provider
            .complete(SCRIPT_SYSTEM, &script_prompt(&ctx.items))
            .await
            .context("podcast script")?;

        fs::create_dir_all(&self.cfg.output_dir)
            .await
            .with_context(|| format!("creating {}", self.cfg.output_dir.display()))?;
        let script_path: PathBuf = self.cfg.output_dir.join(format!("{}-script.txt", ctx.slug));
        fs::write(&script_path, &script)
            .await
            .with_context(|| format!("writing {}", script_path.display()))?;

        let chunks = chunk_script(&script, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            bail!("podcast script is empty");
        }
        let mut audio = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            tracing::debug!(chunk = i + 1, of = chunks.len(), chars = chunk.chars().count(), "synthesizing");
            let part = self
                .synthesize(chunk)
                .await
                .with_context(|| format!("chunk {}/{}", i + 1, chunks.len()))?;
            audio.extend_from_slice(&part);
        }

        let audio_path = self.cfg.output_dir.join(format!("{}.mp3", ctx.slug));
        fs::write(&audio_path, &audio)
            .await
            .with_context(|| format!("writing {}", audio_path.display()))?;
        tracing::info!(path = %audio_path.display(), bytes = audio.len(), chunks = chunks.len(), "saved podcast audio");
        Ok(Delivery::Delivered(audio_path.display().to_string()))
    }
}
