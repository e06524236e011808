use url::Url;

use crate::error::SummaryError;

/// Hosts whose pages are summarized from their transcript.
const VIDEO_HOSTS: &[&str] = &["youtube.com", "youtu.be", "youtube-nocookie.com"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    VideoPlatform,
    Generic,
}

/// Route a URL to the transcript path or the generic page path.
pub fn classify(url: &str) -> SourceKind {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return SourceKind::Generic;
    };
    let Some(host) = parsed.host_str() else {
        return SourceKind::Generic;
    };
    let host = host.to_ascii_lowercase();

    let is_video = VIDEO_HOSTS
        .iter()
        .any(|marker| host == *marker || host.ends_with(&format!(".{}", marker)));

    if is_video {
        SourceKind::VideoPlatform
    } else {
        SourceKind::Generic
    }
}

/// Reject blank and malformed URLs before any work is done.
pub fn validate(url: &str) -> Result<Url, SummaryError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(SummaryError::EmptyUrl);
    }

    let parsed = Url::parse(trimmed).map_err(|_| SummaryError::InvalidUrl)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SummaryError::InvalidUrl);
    }
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(SummaryError::InvalidUrl),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_hosts_are_recognised() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/shorts/dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ",
            "HTTPS://WWW.YOUTUBE.COM/watch?v=dQw4w9WgXcQ",
        ] {
            assert_eq!(classify(url), SourceKind::VideoPlatform, "{}", url);
        }
    }

    #[test]
    fn other_hosts_are_generic() {
        for url in [
            "https://example.com/article",
            "https://example.com/?ref=youtube.com",
            "https://notyoutube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com.evil.example/watch?v=dQw4w9WgXcQ",
            "not a url",
        ] {
            assert_eq!(classify(url), SourceKind::Generic, "{}", url);
        }
    }

    #[test]
    fn blank_urls_are_empty() {
        assert!(matches!(validate(""), Err(SummaryError::EmptyUrl)));
        assert!(matches!(validate("   "), Err(SummaryError::EmptyUrl)));
    }

    #[test]
    fn malformed_urls_are_invalid() {
        for url in ["not a url", "ftp://example.com/file", "mailto:someone@example.com", "https://"] {
            assert!(matches!(validate(url), Err(SummaryError::InvalidUrl)), "{}", url);
        }
    }

    #[test]
    fn well_formed_urls_pass() {
        let url = validate("  https://example.com/a?b=c  ").expect("valid url");
        assert_eq!(url.host_str(), Some("example.com"));
    }
}
