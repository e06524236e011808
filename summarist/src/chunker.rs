use anyhow::{ensure, Result};
use tracing::debug;

use crate::document::{Chunk, Document};

pub const DEFAULT_MAX_CHUNK_SIZE: usize = 2000;
pub const DEFAULT_OVERLAP: usize = 200;

/// Fixed-window text splitter. Sizes are counted in characters so a window
/// never cuts through a multi-byte code point.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_chunk_size: usize,
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl Chunker {
    pub fn new(max_chunk_size: usize, overlap: usize) -> Result<Self> {
        ensure!(max_chunk_size > 0, "max_chunk_size must be positive");
        ensure!(
            overlap < max_chunk_size,
            "overlap ({}) must be smaller than max_chunk_size ({})",
            overlap,
            max_chunk_size
        );
        Ok(Self {
            max_chunk_size,
            overlap,
        })
    }

    /// Split each document in order; indices continue across documents.
    pub fn split(&self, docs: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for doc in docs {
            for text in self.windows(&doc.content) {
                chunks.push(Chunk {
                    text: text.to_string(),
                    sequence_index: chunks.len(),
                });
            }
        }
        debug!(
            documents = docs.len(),
            chunks = chunks.len(),
            max_chunk_size = self.max_chunk_size,
            overlap = self.overlap,
            "split documents"
        );
        chunks
    }

    fn windows<'a>(&self, text: &'a str) -> Vec<&'a str> {
        // Byte offset of every char, plus the end of the string.
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_count = bounds.len() - 1;
        let step = self.max_chunk_size - self.overlap;

        let mut out = Vec::new();
        let mut start = 0;
        while start < char_count {
            let end = (start + self.max_chunk_size).min(char_count);
            out.push(&text[bounds[start]..bounds[end]]);
            if end == char_count {
                break;
            }
            start += step;
        }
        out
    }
}
