use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use common::TranscriptConfig;

use super::{TranscriptApi, TranscriptList, TranscriptSegment, TranscriptTrack};

static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z][^>]*>").expect("static markup pattern"));

enum HttpClient {
    Ready(Client),
    /// Proxy routing is on but the credential env var was empty
    MissingProxyKey(String),
}

/// Transcript data source backed by YouTube watch pages and the timedtext
/// endpoint, routed through an authenticated HTTP proxy.
pub struct YouTubeTranscriptApi {
    watch_base_url: String,
    client: HttpClient,
}

impl YouTubeTranscriptApi {
    /// A missing proxy key is not an error here; requests fail when made.
    pub fn from_config(config: &TranscriptConfig, proxy_key: Option<&str>) -> Result<Self> {
        let builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36");

        let client = match (config.use_proxy, proxy_key) {
            (false, _) => HttpClient::Ready(builder.build().context("failed to build reqwest client")?),
            (true, Some(key)) => {
                let proxy_url = config.proxy_url(key)?;
                let proxy = reqwest::Proxy::all(proxy_url.as_str()).context("invalid transcript proxy")?;
                info!(proxy_host = %config.proxy_host, proxy_port = config.proxy_port, "transcript requests routed through proxy");
                HttpClient::Ready(builder.proxy(proxy).build().context("failed to build reqwest client")?)
            }
            (true, None) => HttpClient::MissingProxyKey(config.proxy_key_env.clone()),
        };

        Ok(Self {
            watch_base_url: config.watch_base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn client(&self) -> Result<&Client> {
        match &self.client {
            HttpClient::Ready(client) => Ok(client),
            HttpClient::MissingProxyKey(var) => {
                anyhow::bail!("transcript proxy credential not configured (env var '{}' not set)", var)
            }
        }
    }

    async fn fetch_watch_page(&self, video_id: &str) -> Result<String> {
        let url = format!("{}/watch?v={}", self.watch_base_url, video_id);
        let response = self
            .client()?
            .get(&url)
            .header("Accept-Language", "en-US")
            .send()
            .await
            .context("failed to fetch video page")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("video page fetch failed with status: {}", status);
        }
        response.text().await.context("failed to read video page body")
    }
}

#[async_trait::async_trait]
impl TranscriptApi for YouTubeTranscriptApi {
    async fn fetch_transcript(
        &self,
        video_id: &str,
        languages: &[&str],
    ) -> Result<Option<Vec<TranscriptSegment>>> {
        let list = self.list_transcripts(video_id).await?;
        match list.find_transcript(languages) {
            Some(track) => self.fetch_track(track).await.map(Some),
            None => Ok(None),
        }
    }

    async fn list_transcripts(&self, video_id: &str) -> Result<TranscriptList> {
        let html = self.fetch_watch_page(video_id).await?;
        let list = parse_caption_tracks(video_id, &html)?;
        debug!(
            video_id,
            tracks = ?list.tracks.iter().map(|t| t.language_code.as_str()).collect::<Vec<_>>(),
            "listed caption tracks"
        );
        Ok(list)
    }

    async fn fetch_track(&self, track: &TranscriptTrack) -> Result<Vec<TranscriptSegment>> {
        let mut url = track.base_url.replace("&fmt=srv3", "");
        if let Some(lang) = &track.translate_to {
            url.push_str(&format!("&tlang={}", lang));
        }

        let response = self
            .client()?
            .get(&url)
            .header("Accept-Language", "en-US")
            .send()
            .await
            .context("failed to fetch transcript track")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("transcript fetch failed with status: {}", status);
        }
        let xml = response.text().await.context("failed to read transcript body")?;
        parse_timedtext(&xml).with_context(|| {
            format!("failed to parse {} transcript of video {}", track.language_code, track.video_id)
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionsJson {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
    #[serde(default)]
    translation_languages: Vec<TranslationLanguage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    #[serde(default)]
    name: Option<TrackName>,
    language_code: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    is_translatable: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackName {
    simple_text: Option<String>,
    #[serde(default)]
    runs: Vec<TextRun>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationLanguage {
    language_code: String,
}

/// Read the caption track list embedded in a watch page.
fn parse_caption_tracks(video_id: &str, html: &str) -> Result<TranscriptList> {
    let Some((_, after)) = html.split_once("\"captions\":") else {
        if html.contains("class=\"g-recaptcha\"") {
            anyhow::bail!("video site is rate limiting requests for video {}", video_id);
        }
        if !html.contains("\"playabilityStatus\":") {
            anyhow::bail!("video {} is unavailable", video_id);
        }
        anyhow::bail!("transcripts are disabled for video {}", video_id);
    };
    let json = after
        .split_once(",\"videoDetails")
        .map(|(json, _)| json)
        .unwrap_or(after);

    let captions: CaptionsJson = serde_json::from_str(json)
        .with_context(|| format!("failed to parse caption data for video {}", video_id))?;
    let renderer = captions
        .player_captions_tracklist_renderer
        .with_context(|| format!("transcripts are disabled for video {}", video_id))?;

    let translation_languages: Vec<String> = renderer
        .translation_languages
        .into_iter()
        .map(|l| l.language_code)
        .collect();

    let tracks = renderer
        .caption_tracks
        .into_iter()
        .map(|t| TranscriptTrack {
            video_id: video_id.to_string(),
            language: t
                .name
                .map(|n| n.simple_text.unwrap_or_else(|| n.runs.into_iter().map(|r| r.text).collect()))
                .unwrap_or_else(|| t.language_code.clone()),
            language_code: t.language_code,
            is_generated: t.kind.as_deref() == Some("asr"),
            base_url: t.base_url,
            translation_languages: if t.is_translatable {
                translation_languages.clone()
            } else {
                Vec::new()
            },
            translate_to: None,
        })
        .collect();

    Ok(TranscriptList {
        video_id: video_id.to_string(),
        tracks,
    })
}

/// Parse a timedtext document: `<transcript><text start=".." dur="..">..</text>..`.
fn parse_timedtext(xml: &str) -> Result<Vec<TranscriptSegment>> {
    let mut reader = Reader::from_str(xml);

    let mut segments = Vec::new();
    let mut current: Option<(Duration, Duration)> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"text" => {
                let mut start = Duration::ZERO;
                let mut duration = Duration::ZERO;
                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.as_ref() {
                        b"start" => start = seconds(&attr.unescape_value()?),
                        b"dur" => duration = seconds(&attr.unescape_value()?),
                        _ => {}
                    }
                }
                current = Some((start, duration));
                text.clear();
            }
            Event::Text(t) if current.is_some() => text.push_str(&t.unescape()?),
            Event::End(e) if e.name().as_ref() == b"text" => {
                if let Some((start, duration)) = current.take() {
                    segments.push(TranscriptSegment {
                        text: clean_caption(&text),
                        start,
                        duration,
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(segments)
}

fn seconds(raw: &str) -> Duration {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(Duration::from_secs_f64)
        .unwrap_or(Duration::ZERO)
}

/// Captions arrive double-escaped and sometimes carry inline markup.
fn clean_caption(text: &str) -> String {
    let decoded = quick_xml::escape::unescape(text)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| text.to_string());
    MARKUP.replace_all(&decoded, "").trim().to_string()
}
