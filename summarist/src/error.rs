use thiserror::Error;

/// Everything that can stop a summarize request.
///
/// Client mistakes (`EmptyUrl`, `InvalidUrl`) are raised before any network
/// access. The remaining kinds wrap the failing collaborator's cause.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("URL is empty")]
    EmptyUrl,

    #[error("Invalid URL")]
    InvalidUrl,

    #[error("Invalid YouTube video URL")]
    VideoIdInvalid,

    #[error("No English-like transcript available for this video: {video_id}")]
    NoTranscriptAvailable { video_id: String },

    #[error("content acquisition failed: {0:#}")]
    Acquisition(anyhow::Error),

    #[error("LLM call failed: {0:#}")]
    Llm(anyhow::Error),

    #[error("unexpected failure: {0:#}")]
    Unknown(anyhow::Error),
}

impl SummaryError {
    /// True for errors caused by the request itself rather than a downstream service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, SummaryError::EmptyUrl | SummaryError::InvalidUrl)
    }

    /// Message placed in the `{"error": ...}` response body.
    pub fn user_message(&self) -> String {
        if self.is_client_error() {
            self.to_string()
        } else {
            format!("Something went wrong: {}", self)
        }
    }
}
