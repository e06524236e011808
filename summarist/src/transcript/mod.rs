//! Video transcript acquisition.
//!
//! A transcript is looked up through an ordered list of tiers. Each tier
//! reports `Found`, `NotFound` or `Failed`; only `NotFound` moves on to the
//! next tier, anything else ends the lookup.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::document::Document;
use crate::error::SummaryError;

pub mod video_id;
pub mod youtube;

pub use video_id::extract_video_id;

/// One caption line with its timing.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: Duration,
    pub duration: Duration,
}

/// A caption track the video offers. Nothing is downloaded until the track
/// is materialized through [`TranscriptApi::fetch_track`].
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptTrack {
    pub video_id: String,
    pub language_code: String,
    pub language: String,
    /// Auto-generated (speech recognition) rather than uploaded captions
    pub is_generated: bool,
    pub base_url: String,
    pub translation_languages: Vec<String>,
    /// Target language when this handle asks for a machine translation
    pub translate_to: Option<String>,
}

impl TranscriptTrack {
    pub fn is_translatable(&self) -> bool {
        !self.translation_languages.is_empty()
    }

    /// Handle for the machine translation of this track, if offered.
    pub fn translate(&self, language_code: &str) -> Option<TranscriptTrack> {
        if !self.translation_languages.iter().any(|l| l == language_code) {
            return None;
        }
        Some(TranscriptTrack {
            language_code: language_code.to_string(),
            translate_to: Some(language_code.to_string()),
            translation_languages: Vec::new(),
            ..self.clone()
        })
    }
}

/// All caption tracks of one video.
#[derive(Debug, Clone, Default)]
pub struct TranscriptList {
    pub video_id: String,
    pub tracks: Vec<TranscriptTrack>,
}

impl TranscriptList {
    /// First track matching the language codes in priority order. Uploaded
    /// captions win over generated ones for the same language.
    pub fn find_transcript(&self, language_codes: &[&str]) -> Option<&TranscriptTrack> {
        language_codes.iter().find_map(|code| {
            self.tracks
                .iter()
                .filter(|t| t.language_code == *code)
                .min_by_key(|t| t.is_generated)
        })
    }
}

/// Data source for transcripts.
#[async_trait::async_trait]
pub trait TranscriptApi: Send + Sync {
    /// Fetch the transcript in the first available language of `languages`.
    /// `Ok(None)` means the video has no track in any of them.
    async fn fetch_transcript(
        &self,
        video_id: &str,
        languages: &[&str],
    ) -> Result<Option<Vec<TranscriptSegment>>>;

    /// Enumerate the caption tracks of a video.
    async fn list_transcripts(&self, video_id: &str) -> Result<TranscriptList>;

    /// Download the segments of a track (translated when the handle asks for it).
    async fn fetch_track(&self, track: &TranscriptTrack) -> Result<Vec<TranscriptSegment>>;
}

/// Anything that can be turned into transcript segments.
#[async_trait::async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch_segments(&self) -> Result<Vec<TranscriptSegment>>;
}

/// Segments that were downloaded while the tier ran.
struct FetchedTranscript(Vec<TranscriptSegment>);

#[async_trait::async_trait]
impl TranscriptSource for FetchedTranscript {
    async fn fetch_segments(&self) -> Result<Vec<TranscriptSegment>> {
        Ok(self.0.clone())
    }
}

/// A selected track, downloaded on materialization.
struct TrackHandle<'a> {
    api: &'a dyn TranscriptApi,
    track: TranscriptTrack,
}

#[async_trait::async_trait]
impl TranscriptSource for TrackHandle<'_> {
    async fn fetch_segments(&self) -> Result<Vec<TranscriptSegment>> {
        self.api.fetch_track(&self.track).await
    }
}

/// Lookup tiers, tried in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// `en` requested directly
    Direct,
    /// `en-IN` picked from the track listing
    Regional,
    /// `hi` picked from the listing and machine-translated to `en`
    Translated,
}

impl Tier {
    pub const ORDER: [Tier; 3] = [Tier::Direct, Tier::Regional, Tier::Translated];

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Direct => "direct-en",
            Tier::Regional => "listed-en-IN",
            Tier::Translated => "hi-translated-en",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

enum Attempt<'a> {
    Found {
        source: Box<dyn TranscriptSource + 'a>,
        language: String,
    },
    NotFound,
    Failed(anyhow::Error),
}

/// Runs the tier fallback for a video URL and flattens the winning transcript.
#[derive(Clone)]
pub struct TranscriptAcquirer {
    api: Arc<dyn TranscriptApi>,
}

impl TranscriptAcquirer {
    pub fn new(api: Arc<dyn TranscriptApi>) -> Self {
        Self { api }
    }

    pub async fn acquire(&self, video_url: &str) -> Result<Document, SummaryError> {
        let video_id = extract_video_id(video_url).ok_or(SummaryError::VideoIdInvalid)?;
        // Listed once, shared by the tiers that need it.
        let mut listing: Option<TranscriptList> = None;

        for tier in Tier::ORDER {
            match self.attempt(tier, &video_id, &mut listing).await {
                Attempt::Found { source, language } => {
                    let segments = source
                        .fetch_segments()
                        .await
                        .map_err(|e| SummaryError::Acquisition(e.context(format!("tier {} fetch failed", tier))))?;
                    info!(video_id = %video_id, %tier, segments = segments.len(), "transcript acquired");
                    return transcript_document(video_url, &video_id, &language, tier, &segments);
                }
                Attempt::NotFound => {
                    debug!(video_id = %video_id, %tier, "no transcript at this tier");
                }
                Attempt::Failed(e) => {
                    warn!(video_id = %video_id, %tier, "transcript lookup failed: {:#}", e);
                    return Err(SummaryError::Acquisition(e));
                }
            }
        }

        Err(SummaryError::NoTranscriptAvailable { video_id })
    }

    async fn attempt<'a>(
        &'a self,
        tier: Tier,
        video_id: &str,
        listing: &mut Option<TranscriptList>,
    ) -> Attempt<'a> {
        if tier == Tier::Direct {
            return match self.api.fetch_transcript(video_id, &["en"]).await {
                Ok(Some(segments)) => Attempt::Found {
                    source: Box::new(FetchedTranscript(segments)),
                    language: "en".to_string(),
                },
                Ok(None) => Attempt::NotFound,
                Err(e) => Attempt::Failed(e),
            };
        }

        if listing.is_none() {
            match self.api.list_transcripts(video_id).await {
                Ok(list) => *listing = Some(list),
                Err(e) => return Attempt::Failed(e),
            }
        }

        let track = listing.as_ref().and_then(|list| match tier {
            Tier::Regional => list.find_transcript(&["en-IN"]).cloned(),
            _ => list.find_transcript(&["hi"]).and_then(|hi| {
                if !hi.is_translatable() {
                    debug!(video_id, "hi track offers no machine translation");
                }
                hi.translate("en")
            }),
        });

        match track {
            Some(track) => Attempt::Found {
                language: track.language_code.clone(),
                source: Box::new(TrackHandle {
                    api: self.api.as_ref(),
                    track,
                }),
            },
            None => Attempt::NotFound,
        }
    }
}

fn transcript_document(
    video_url: &str,
    video_id: &str,
    language: &str,
    tier: Tier,
    segments: &[TranscriptSegment],
) -> Result<Document, SummaryError> {
    let text = segments
        .iter()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let doc = Document::new(text).ok_or_else(|| {
        SummaryError::Acquisition(anyhow::anyhow!("transcript for video {} is empty", video_id))
    })?;

    Ok(doc
        .with_metadata("source", video_url)
        .with_metadata("video_id", video_id)
        .with_metadata("language", language)
        .with_metadata("transcript_tier", tier.label()))
}
