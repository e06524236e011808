use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{info, warn};

use common::{Config, Credentials};

use crate::chunker::Chunker;
use crate::classify::{self, SourceKind};
use crate::document::{Document, SummaryResult};
use crate::error::SummaryError;
use crate::llm::remote::RemoteLlmProvider;
use crate::llm::summarizer::MapReduceSummarizer;
use crate::loader::{ContentLoader, WebPageLoader};
use crate::transcript::youtube::YouTubeTranscriptApi;
use crate::transcript::TranscriptAcquirer;

/// Body of every `/summary` reply: either a summary or an error message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SummaryResponse {
    Summary { summary: String },
    Error { error: String },
}

/// URL in, summary out. Holds only read-only collaborators, so one instance
/// serves concurrent requests.
pub struct SummaryService {
    transcripts: TranscriptAcquirer,
    loader: Arc<dyn ContentLoader>,
    chunker: Chunker,
    summarizer: MapReduceSummarizer,
}

impl SummaryService {
    pub fn new(
        transcripts: TranscriptAcquirer,
        loader: Arc<dyn ContentLoader>,
        chunker: Chunker,
        summarizer: MapReduceSummarizer,
    ) -> Self {
        Self {
            transcripts,
            loader,
            chunker,
            summarizer,
        }
    }

    /// Wire the production collaborators. Missing credentials are passed
    /// through as `None` and reported on first use.
    pub fn from_config(config: &Config, credentials: &Credentials) -> anyhow::Result<Self> {
        let transcript_api =
            YouTubeTranscriptApi::from_config(&config.transcript, credentials.proxy_key.as_deref())?;
        let loader = WebPageLoader::from_config(&config.loader)?;
        let chunker = Chunker::new(config.chunking.max_chunk_size, config.chunking.overlap)?;
        let provider = RemoteLlmProvider::from_config(&config.llm, credentials.llm_api_key.clone());

        if credentials.llm_api_key.is_none() {
            warn!(env = %config.llm.api_key_env, "LLM API key not set; summaries will fail until it is provided");
        }
        if config.transcript.use_proxy && credentials.proxy_key.is_none() {
            warn!(env = %config.transcript.proxy_key_env, "transcript proxy key not set; video summaries will fail until it is provided");
        }

        Ok(Self::new(
            TranscriptAcquirer::new(Arc::new(transcript_api)),
            Arc::new(loader),
            chunker,
            MapReduceSummarizer::new(Arc::new(provider), config.summary.map_concurrency),
        ))
    }

    pub fn model(&self) -> &str {
        self.summarizer.model()
    }

    /// Validate, acquire text, chunk, then map-reduce summarize.
    pub async fn summarize(&self, url: &str) -> Result<SummaryResult, SummaryError> {
        let url = classify::validate(url)?;
        let url = url.as_str();

        let kind = classify::classify(url);
        info!(url, ?kind, "summarizing");

        let docs: Vec<Document> = match kind {
            SourceKind::VideoPlatform => vec![self.transcripts.acquire(url).await?],
            SourceKind::Generic => self.loader.load(url).await.map_err(SummaryError::Acquisition)?,
        };
        if docs.is_empty() {
            return Err(SummaryError::Acquisition(anyhow::anyhow!("no content found at {}", url)));
        }

        let chunks = self.chunker.split(&docs);
        let text = self.summarizer.summarize(&chunks).await?;
        Ok(SummaryResult { text })
    }

    /// `summarize` with every failure, panics included, folded into the
    /// response shape.
    pub async fn respond(&self, url: &str) -> SummaryResponse {
        let result = AssertUnwindSafe(self.summarize(url))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(SummaryError::Unknown(anyhow::anyhow!("summary pipeline panicked: {}", reason)))
            });

        match result {
            Ok(summary) => SummaryResponse::Summary { summary: summary.text },
            Err(e) => {
                if e.is_client_error() {
                    info!("rejected request: {}", e);
                } else {
                    warn!("summary failed: {}", e);
                }
                SummaryResponse::Error {
                    error: e.user_message(),
                }
            }
        }
    }
}
