use anyhow::{Context, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use std::io::Cursor;
use std::time::Duration;
use tracing::{info, warn};

use common::LoaderConfig;

use crate::document::Document;

/// Width used when flattening HTML to text.
const TEXT_WIDTH: usize = 100;

/// Fetches a non-video URL and flattens it to text.
#[async_trait::async_trait]
pub trait ContentLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<Vec<Document>>;
}

/// Loader for ordinary web pages: readability main-content extraction with a
/// whole-page fallback.
pub struct WebPageLoader {
    client: Client,
}

impl WebPageLoader {
    pub fn from_config(config: &LoaderConfig) -> Result<Self> {
        if config.accept_invalid_certs {
            warn!("TLS certificate verification is disabled for page fetches");
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ContentLoader for WebPageLoader {
    async fn load(&self, url: &str) -> Result<Vec<Document>> {
        let page_url = url::Url::parse(url).context("failed to parse page URL")?;
        let response = self
            .client
            .get(page_url.clone())
            .send()
            .await
            .context("failed to fetch page")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("page fetch failed with status: {}", status));
        }

        let bytes = response.bytes().await.context("failed to read response body")?;
        let doc = page_document(&page_url, &bytes)?;
        info!(url, chars = doc.content.chars().count(), "loaded page text");
        Ok(vec![doc])
    }
}

fn page_document(url: &url::Url, html: &[u8]) -> Result<Document> {
    let mut reader = Cursor::new(html);
    let main_text = match readability::extractor::extract(&mut reader, url) {
        Ok(product) => match html2text::from_read(product.content.as_bytes(), TEXT_WIDTH) {
            Ok(text) => text,
            Err(e) => {
                warn!("loader: failed to convert extracted HTML to text: {}", e);
                product.text
            }
        },
        Err(e) => {
            warn!("loader: readability failed for {}: {}", url, e);
            String::new()
        }
    };

    let text = if main_text.trim().is_empty() {
        html2text::from_read(html, TEXT_WIDTH).context("failed to convert page to text")?
    } else {
        main_text
    };

    let mut doc = Document::new(text)
        .with_context(|| format!("page {} has no textual content", url))?
        .with_metadata("source", url.as_str());

    let page = Html::parse_document(&String::from_utf8_lossy(html));
    if let Some(title) = select_text(&page, "title") {
        doc = doc.with_metadata("title", title);
    }
    if let Some(lang) = select_attr(&page, "html", "lang") {
        doc = doc.with_metadata("language", lang);
    }
    Ok(doc)
}

fn select_text(page: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let text: String = page.select(&selector).next()?.text().collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn select_attr(page: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    page.select(&selector)
        .next()?
        .value()
        .attr(attr)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
