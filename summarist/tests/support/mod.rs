// In-process stand-ins for the network collaborators, with call logs.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use summarist::chunker::Chunker;
use summarist::document::Document;
use summarist::llm::summarizer::MapReduceSummarizer;
use summarist::llm::{LlmProvider, LlmRequest, LlmResponse, UsageMetadata};
use summarist::loader::ContentLoader;
use summarist::transcript::{
    TranscriptAcquirer, TranscriptApi, TranscriptList, TranscriptSegment, TranscriptTrack,
};
use summarist::SummaryService;

pub fn segments(texts: &[&str]) -> Vec<TranscriptSegment> {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| TranscriptSegment {
            text: t.to_string(),
            start: Duration::from_secs(i as u64 * 2),
            duration: Duration::from_secs(2),
        })
        .collect()
}

pub fn track(code: &str, generated: bool, translations: &[&str]) -> TranscriptTrack {
    TranscriptTrack {
        video_id: "ABCDEFGHIJK".to_string(),
        language_code: code.to_string(),
        language: code.to_string(),
        is_generated: generated,
        base_url: format!("mock://{}", code),
        translation_languages: translations.iter().map(|s| s.to_string()).collect(),
        translate_to: None,
    }
}

/// What the direct `en` request answers.
pub enum DirectReply {
    Found(Vec<TranscriptSegment>),
    NotFound,
    Fail(&'static str),
}

pub struct MockTranscriptApi {
    pub direct: DirectReply,
    pub listing: std::result::Result<Vec<TranscriptTrack>, &'static str>,
    /// Segments per `base_url`, with `&tlang=xx` appended for translations
    pub tracks: HashMap<String, Vec<TranscriptSegment>>,
    pub calls: Mutex<Vec<String>>,
}

impl MockTranscriptApi {
    pub fn new(direct: DirectReply) -> Self {
        Self {
            direct,
            listing: Ok(Vec::new()),
            tracks: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_listing(mut self, tracks: Vec<TranscriptTrack>) -> Self {
        self.listing = Ok(tracks);
        self
    }

    pub fn with_failing_listing(mut self, reason: &'static str) -> Self {
        self.listing = Err(reason);
        self
    }

    pub fn with_track(mut self, key: &str, texts: &[&str]) -> Self {
        self.tracks.insert(key.to_string(), segments(texts));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl TranscriptApi for MockTranscriptApi {
    async fn fetch_transcript(
        &self,
        _video_id: &str,
        languages: &[&str],
    ) -> Result<Option<Vec<TranscriptSegment>>> {
        self.record(format!("fetch_transcript:{}", languages.join(",")));
        match &self.direct {
            DirectReply::Found(segments) => Ok(Some(segments.clone())),
            DirectReply::NotFound => Ok(None),
            DirectReply::Fail(reason) => Err(anyhow::anyhow!("{}", reason)),
        }
    }

    async fn list_transcripts(&self, video_id: &str) -> Result<TranscriptList> {
        self.record("list".to_string());
        match &self.listing {
            Ok(tracks) => Ok(TranscriptList {
                video_id: video_id.to_string(),
                tracks: tracks.clone(),
            }),
            Err(reason) => Err(anyhow::anyhow!("{}", reason)),
        }
    }

    async fn fetch_track(&self, track: &TranscriptTrack) -> Result<Vec<TranscriptSegment>> {
        let key = match &track.translate_to {
            Some(lang) => format!("{}&tlang={}", track.base_url, lang),
            None => track.base_url.clone(),
        };
        self.record(format!("fetch_track:{}", key));
        self.tracks
            .get(&key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no segments for {}", key))
    }
}

/// Echoing completion service. Map calls answer `partial of <content>`,
/// the reduce call (recognised by its partials) answers `FINAL SUMMARY`.
pub struct MockLlm {
    pub prompts: Mutex<Vec<String>>,
    /// Fail any call whose content contains this marker
    pub fail_on: Option<&'static str>,
    /// Per-call delay derived from the content
    pub delay: fn(&str) -> Duration,
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            fail_on: None,
            delay: |_| Duration::ZERO,
        }
    }

    pub fn failing_on(marker: &'static str) -> Self {
        Self {
            fail_on: Some(marker),
            ..Self::new()
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

pub fn prompt_content(prompt: &str) -> &str {
    prompt
        .split_once("Content:\n")
        .map(|(_, content)| content.trim())
        .unwrap_or(prompt)
}

#[async_trait::async_trait]
impl LlmProvider for MockLlm {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let content = prompt_content(&request.prompt).to_string();

        let delay = (self.delay)(&content);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(marker) = self.fail_on {
            if content.contains(marker) {
                anyhow::bail!("LLM API error 503: upstream unavailable");
            }
        }

        let reply = if content.contains("partial of <") {
            "FINAL SUMMARY".to_string()
        } else {
            format!("partial of <{}>", content)
        };

        Ok(LlmResponse {
            content: reply,
            usage: UsageMetadata {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
            model: "mock-model".to_string(),
        })
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

/// Generic page loader returning canned documents.
pub struct MockLoader {
    pub docs: Vec<Document>,
    pub calls: AtomicUsize,
}

impl MockLoader {
    pub fn new(texts: &[&str]) -> Self {
        Self {
            docs: texts
                .iter()
                .map(|t| Document::new(*t).expect("non-empty mock document"))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ContentLoader for MockLoader {
    async fn load(&self, _url: &str) -> Result<Vec<Document>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.docs.clone())
    }
}

/// Service wired to the given mocks with default chunking.
pub fn service(
    transcripts: Arc<MockTranscriptApi>,
    loader: Arc<MockLoader>,
    llm: Arc<MockLlm>,
) -> SummaryService {
    SummaryService::new(
        TranscriptAcquirer::new(transcripts),
        loader,
        Chunker::default(),
        MapReduceSummarizer::new(llm, 4),
    )
}
