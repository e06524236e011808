// Map-reduce summarization over chunked text
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::{LlmProvider, LlmRequest, LlmResponse, UsageMetadata};
use crate::document::Chunk;
use crate::error::SummaryError;

/// Instruction used for both the per-chunk pass and the combining pass.
const SUMMARY_PROMPT: &str = "Provide a concise, accurate summary of the following content in around 300 words:
Content:
{text}
";

pub fn summary_prompt(text: &str) -> String {
    SUMMARY_PROMPT.replace("{text}", text)
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Map(usize),
    Reduce,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Map(index) => write!(f, "map phase, chunk {}", index),
            Phase::Reduce => f.write_str("reduce phase"),
        }
    }
}

/// Summarizes every chunk, then summarizes the concatenated partial summaries.
///
/// Always makes `chunks.len() + 1` completion calls; a single chunk still gets
/// a reduce pass so the final text is normalized the same way.
#[derive(Clone)]
pub struct MapReduceSummarizer {
    provider: Arc<dyn LlmProvider>,
    map_concurrency: usize,
}

impl MapReduceSummarizer {
    pub fn new(provider: Arc<dyn LlmProvider>, map_concurrency: usize) -> Self {
        Self {
            provider,
            map_concurrency: map_concurrency.max(1),
        }
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub async fn summarize(&self, chunks: &[Chunk]) -> Result<String, SummaryError> {
        if chunks.is_empty() {
            return Err(SummaryError::Unknown(anyhow::anyhow!("no content to summarize")));
        }
        let started = Instant::now();

        // Built up front: a stream mapping over `&Chunk` makes the request future non-`Send`.
        let calls: Vec<_> = chunks
            .iter()
            .map(|chunk| self.complete(&chunk.text, Phase::Map(chunk.sequence_index)))
            .collect();

        // `buffered` yields in input order whatever order the calls finish in;
        // the first error drops the calls still in flight.
        let partials: Vec<LlmResponse> = stream::iter(calls)
            .buffered(self.map_concurrency)
            .try_collect()
            .await?;

        let mut usage = UsageMetadata::default();
        for partial in &partials {
            usage += &partial.usage;
        }

        let combined = partials
            .iter()
            .map(|p| p.content.trim())
            .collect::<Vec<_>>()
            .join("\n\n");
        debug!(partials = partials.len(), combined_chars = combined.chars().count(), "map phase complete");

        let reduced = self.complete(&combined, Phase::Reduce).await?;
        usage += &reduced.usage;
        let summary = reduced.content.trim();
        if summary.is_empty() {
            return Err(SummaryError::Llm(anyhow::anyhow!("reduce phase returned an empty summary")));
        }

        info!(
            chunks = chunks.len(),
            calls = chunks.len() + 1,
            total_tokens = usage.total_tokens,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "map-reduce summary complete"
        );
        Ok(summary.to_string())
    }

    async fn complete(&self, text: &str, phase: Phase) -> Result<LlmResponse, SummaryError> {
        debug!(%phase, chars = text.chars().count(), "requesting completion");
        self.provider
            .generate(LlmRequest::new(summary_prompt(text)))
            .await
            .map_err(|e| SummaryError::Llm(e.context(format!("{} failed", phase))))
    }
}
