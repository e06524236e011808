use std::collections::HashMap;

/// Flattened text pulled from a page or transcript, plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub content: String,
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Returns `None` for blank content; an empty document is never valid.
    pub fn new(content: impl Into<String>) -> Option<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            return None;
        }
        Some(Self {
            content,
            metadata: HashMap::new(),
        })
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A bounded window of document text, numbered in production order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub sequence_index: usize,
}

/// Final output of one summarize call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResult {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_content_is_rejected() {
        assert!(Document::new("").is_none());
        assert!(Document::new(" \n\t ").is_none());
    }

    #[test]
    fn metadata_is_attached() {
        let doc = Document::new("hello")
            .expect("non-empty")
            .with_metadata("source", "https://example.com");
        assert_eq!(doc.metadata.get("source").map(String::as_str), Some("https://example.com"));
    }
}
