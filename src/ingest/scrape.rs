//! Support-site scraping.
//!
//! Article discovery walks every anchor on the listing page and keeps the
//! hrefs that contain the configured path fragment. Each article is then
//! fetched and reduced to readable text. The listing fetch is fatal; a
//! single article failing only costs that article.

use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::{info, warn};
use url::Url;

use super::SourceDocument;
use crate::config::BotConfig;
use crate::types::BotError;

/// Scrapes the configured support site into one document per article.
pub async fn scrape_support_site(
    client: &Client,
    config: &BotConfig,
) -> Result<Vec<SourceDocument>, BotError> {
    let mut urls = discover_article_urls(client, &config.base_url, &config.link_substring).await?;
    if let Some(limit) = config.page_limit {
        urls.truncate(limit);
    }
    info!(articles = urls.len(), listing = %config.base_url, "discovered support articles");

    let mut documents = Vec::new();
    for url in urls {
        match fetch_article_text(client, &url).await {
            Ok(text) if text.is_empty() => {
                warn!(%url, "article had no readable text, skipping");
            }
            Ok(text) => documents.push(SourceDocument::web(url.as_str(), text)),
            Err(err) => {
                warn!(%url, error = %err, "article fetch failed, skipping");
            }
        }
    }
    Ok(documents)
}

/// Collects article URLs from the listing page, in first-seen order.
///
/// Relative hrefs are resolved against `base_url`, fragments are dropped,
/// and duplicates are kept only once.
pub async fn discover_article_urls(
    client: &Client,
    base_url: &Url,
    link_substring: &str,
) -> Result<Vec<Url>, BotError> {
    let response = client
        .get(base_url.clone())
        .send()
        .await?
        .error_for_status()?;
    let body = response.text().await?;
    let document = Html::parse_document(&body);
    let selector =
        Selector::parse("a").map_err(|err| BotError::InvalidDocument(err.to_string()))?;

    let mut urls = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if href.starts_with('#') || !href.contains(link_substring) {
            continue;
        }
        if let Ok(mut url) = base_url.join(href) {
            url.set_fragment(None);
            if !urls.iter().any(|existing| existing == &url) {
                urls.push(url);
            }
        }
    }

    if urls.is_empty() {
        return Err(BotError::InvalidDocument(format!(
            "no links containing {link_substring:?} on {base_url}"
        )));
    }

    Ok(urls)
}

async fn fetch_article_text(client: &Client, url: &Url) -> Result<String, BotError> {
    let response = client
        .get(url.clone())
        .send()
        .await?
        .error_for_status()?;
    let body = response.text().await?;
    Ok(visible_text(&body))
}

/// Reduces an HTML page to the text a reader would see.
///
/// Head, script, style, and noscript subtrees disappear entirely. Closing
/// block tags become paragraph breaks so the splitter keeps separators to
/// cut on, remaining markup is stripped, and common entities are decoded.
pub fn visible_text(html: &str) -> String {
    static HIDDEN_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"(?is)<head\b[^>]*>.*?</head\s*>|<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<noscript\b[^>]*>.*?</noscript\s*>",
        )
        .unwrap()
    });
    static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
    static PARAGRAPH_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"(?i)</(?:p|div|section|article|li|ul|ol|h[1-6]|tr|table|blockquote|pre|header|footer|main|nav|figure|dd)\s*>",
        )
        .unwrap()
    });
    static LINE_BREAK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)<br\s*/?\s*>").unwrap());
    static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
    static SOURCE_WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
    static PADDED_NEWLINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" *\n *").unwrap());
    static NEWLINE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

    let stripped = HIDDEN_RE.replace_all(html, "");
    let stripped = COMMENT_RE.replace_all(&stripped, "");
    // Whitespace in markup is presentational; real breaks come from tags.
    let flattened = SOURCE_WS_RE.replace_all(&stripped, " ");
    let broken = PARAGRAPH_RE.replace_all(&flattened, "\n\n");
    let broken = LINE_BREAK_RE.replace_all(&broken, "\n");
    let text = TAG_RE.replace_all(&broken, "");
    let text = decode_entities(&text);

    let text = PADDED_NEWLINE_RE.replace_all(&text, "\n");
    let text = NEWLINE_RUN_RE.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Decodes the entities that show up in practice, leaving the rest alone.
fn decode_entities(input: &str) -> String {
    static ENTITY_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"&(#x?[0-9a-fA-F]+|[a-zA-Z]+);").unwrap());

    if !input.contains('&') {
        return input.to_string();
    }

    ENTITY_RE
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                return u32::from_str_radix(hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .map_or_else(|| caps[0].to_string(), |c| c.to_string());
            }
            if let Some(dec) = name.strip_prefix('#') {
                return dec
                    .parse::<u32>()
                    .ok()
                    .and_then(char::from_u32)
                    .map_or_else(|| caps[0].to_string(), |c| c.to_string());
            }
            match name {
                "amp" => "&".to_string(),
                "lt" => "<".to_string(),
                "gt" => ">".to_string(),
                "quot" => "\"".to_string(),
                "apos" => "'".to_string(),
                "nbsp" => " ".to_string(),
                "rsquo" => "\u{2019}".to_string(),
                "lsquo" => "\u{2018}".to_string(),
                "rdquo" => "\u{201D}".to_string(),
                "ldquo" => "\u{201C}".to_string(),
                "ndash" => "\u{2013}".to_string(),
                "hellip" => "\u{2026}".to_string(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}
