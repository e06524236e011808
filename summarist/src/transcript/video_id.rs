use once_cell::sync::Lazy;
use regex::Regex;

/// `v=ID`, `/embed/ID`, `/shorts/ID` or any `/ID` path segment.
static VIDEO_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:v=|/|embed/|shorts/)([0-9A-Za-z_-]{11})").expect("static video id pattern")
});

/// Pull the 11-character video identifier out of a video page URL.
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
