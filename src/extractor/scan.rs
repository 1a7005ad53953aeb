//! Manifest URL discovery in page markup
//!
//! Candidates come from, in order:
//! - `src` / `data-src` of `<video>` and `<source>` elements
//! - `href` of `<a>` and `<link>` elements
//! - absolute `http(s)://...m3u8` tokens anywhere in the raw page, which
//!   catches player configs in inline scripts

use scraper::{Html, Selector};
use url::Url;

const MANIFEST_EXT: &str = ".m3u8";

/// Returns every manifest URL referenced by `html`, deduplicated, in discovery order
///
/// # Example
///
/// ```
/// use m3u8_sweep::extractor::find_manifest_urls;
/// use url::Url;
///
/// let html = r#"<video><source src="/hls/master.m3u8"></video>"#;
/// let base = Url::parse("https://example.com/watch/1").unwrap();
/// let found = find_manifest_urls(html, &base);
/// assert_eq!(found, vec!["https://example.com/hls/master.m3u8".to_string()]);
/// ```
pub fn find_manifest_urls(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut found = Vec::new();

    let attr_sources = [
        ("video[src], source[src]", "src"),
        ("video[data-src], source[data-src]", "data-src"),
        ("a[href], link[href]", "href"),
    ];

    for (selector, attr) in attr_sources {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };

        for element in document.select(&selector) {
            if let Some(value) = element.value().attr(attr) {
                if let Some(url) = resolve_manifest(value, base_url) {
                    push_unique(&mut found, url);
                }
            }
        }
    }

    for token in raw_manifest_tokens(html) {
        if let Some(url) = resolve_manifest(&token, base_url) {
            push_unique(&mut found, url);
        }
    }

    found
}

/// First manifest URL referenced by `html`
pub fn find_manifest_url(html: &str, base_url: &Url) -> Option<String> {
    find_manifest_urls(html, base_url).into_iter().next()
}

fn push_unique(found: &mut Vec<String>, url: String) {
    if !found.contains(&url) {
        found.push(url);
    }
}

/// Resolves a reference against the page and keeps it if it points at an m3u8
fn resolve_manifest(reference: &str, base_url: &Url) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with("data:") || reference.starts_with("blob:") {
        return None;
    }

    let resolved = base_url.join(reference).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }

    if resolved.path().to_ascii_lowercase().ends_with(MANIFEST_EXT) {
        Some(resolved.to_string())
    } else {
        None
    }
}

/// Pulls absolute `http(s)://` tokens containing `.m3u8` out of raw text
///
/// Script sources often escape slashes as `\/`, which is undone first.
fn raw_manifest_tokens(text: &str) -> Vec<String> {
    let text = text.replace("\\/", "/");
    let mut tokens = Vec::new();
    let mut rest = text.as_str();

    while let Some(start) = find_scheme(rest) {
        let candidate = &rest[start..];
        let end = candidate
            .find(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>' | '`' | '\\'))
            .unwrap_or(candidate.len());
        let token = &candidate[..end];

        if token.to_ascii_lowercase().contains(MANIFEST_EXT) {
            tokens.push(token.to_string());
        }
        rest = &candidate[end.max(1)..];
    }

    tokens
}

fn find_scheme(text: &str) -> Option<usize> {
    match (text.find("https://"), text.find("http://")) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}
