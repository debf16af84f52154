//! Readable-content extraction.
//!
//! A compact Readability-style pass: score every plausible content
//! container by text mass, punctuation density, link density, and class/id
//! hints, then keep the best one. The goal is boilerplate removal for the
//! mail pipeline, not pixel-perfect fidelity, so the scorer is deliberately
//! small and falls back to `<body>` rather than failing on unusual pages.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::{PaperboyError, Result};

/// Configuration for content extraction.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Minimum character count for an element to be scored at all.
    pub min_candidate_chars: usize,
    /// Weight applied when class/id hints look like content.
    pub positive_weight: f64,
    /// Weight applied when class/id hints look like chrome.
    pub negative_weight: f64,
    /// Characters of text per density point.
    pub chars_per_point: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_candidate_chars: 25,
            positive_weight: 25.0,
            negative_weight: -25.0,
            chars_per_point: 100,
        }
    }
}

/// The result of boilerplate removal: a title and the main-content HTML.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedArticle {
    /// Best available title, if the document names one anywhere.
    pub title: Option<String>,
    /// Simplified HTML fragment with navigation and chrome stripped.
    pub content: String,
}

/// Tags considered as potential content containers.
const CANDIDATE_TAGS: &str = "article, main, section, div, td, blockquote";

const POSITIVE_HINTS: &str = r"(?i)(article|body|content|entry|main|page|post|text|blog|story)";
const NEGATIVE_HINTS: &str =
    r"(?i)(banner|breadcrumbs?|comment|disqus|foot|header|menu|nav|related|rss|share|sidebar|sponsor|pagination|pager|popup|promo)";

/// Extracts the readable article from a full HTML document.
///
/// Never fails on well-formed HTML: when no candidate scores above zero
/// the whole `<body>` is returned. [`PaperboyError::NoContent`] is only
/// returned for documents with no body or no text at all.
pub fn extract_article(html: &str, config: &ExtractConfig) -> Result<ExtractedArticle> {
    let doc = Html::parse_document(html);

    let title = document_title(&doc);
    let content = select_content(&doc, config)?;

    Ok(ExtractedArticle { title, content })
}

/// Resolves the document title: `<title>`, then `og:title`, then the
/// first `<h1>`.
fn document_title(doc: &Html) -> Option<String> {
    let title_sel = selector("title");
    if let Some(el) = doc.select(&title_sel).next() {
        let text = el.text().collect::<String>().trim().to_string();
        if !text.is_empty() {
            return Some(text);
        }
    }

    let og_sel = selector(r#"meta[property="og:title"]"#);
    if let Some(el) = doc.select(&og_sel).next()
        && let Some(content) = el.value().attr("content")
    {
        let content = content.trim();
        if !content.is_empty() {
            return Some(content.to_string());
        }
    }

    let h1_sel = selector("h1");
    doc.select(&h1_sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Picks the highest-scoring content container, falling back to `<body>`.
fn select_content(doc: &Html, config: &ExtractConfig) -> Result<String> {
    let body_sel = selector("body");
    let body = doc.select(&body_sel).next().ok_or(PaperboyError::NoContent)?;

    if body.text().collect::<String>().trim().is_empty() {
        return Err(PaperboyError::NoContent);
    }

    let candidate_sel = selector(CANDIDATE_TAGS);
    let mut best: Option<(f64, ElementRef<'_>)> = None;

    for element in doc.select(&candidate_sel) {
        let text: String = element.text().collect();
        if text.chars().count() < config.min_candidate_chars {
            continue;
        }

        let score = score_element(&element, &text, config);
        if best.as_ref().is_none_or(|(top, _)| score > *top) {
            best = Some((score, element));
        }
    }

    match best {
        Some((score, element)) if score > 0.0 => Ok(element.inner_html()),
        _ => Ok(body.inner_html()),
    }
}

/// Scores one candidate element.
fn score_element(element: &ElementRef<'_>, text: &str, config: &ExtractConfig) -> f64 {
    let base = base_tag_score(element.value().name());
    let hints = class_id_weight(element, config);
    let density = content_density(text, config);
    let link_penalty = 1.0 - link_density(element, text);

    (base + hints + density) * link_penalty
}

/// Base score from the tag name, highest for semantic content containers.
fn base_tag_score(tag: &str) -> f64 {
    match tag {
        "article" | "main" => 10.0,
        "section" => 8.0,
        "div" => 5.0,
        "td" | "blockquote" => 3.0,
        _ => 0.0,
    }
}

/// Class/id hint weight: positive hints win over negative ones.
fn class_id_weight(element: &ElementRef<'_>, config: &ExtractConfig) -> f64 {
    let positive = Regex::new(POSITIVE_HINTS).unwrap();
    let negative = Regex::new(NEGATIVE_HINTS).unwrap();

    let mut hint = String::new();
    if let Some(id) = element.value().attr("id") {
        hint.push_str(id);
        hint.push(' ');
    }
    if let Some(class) = element.value().attr("class") {
        hint.push_str(class);
    }

    if positive.is_match(&hint) {
        config.positive_weight
    } else if negative.is_match(&hint) {
        config.negative_weight
    } else {
        0.0
    }
}

/// Text-mass score: characters and commas both indicate prose.
fn content_density(text: &str, config: &ExtractConfig) -> f64 {
    let char_score = ((text.chars().count() / config.chars_per_point) as f64).min(3.0);
    let comma_score = (text.matches(',').count() as f64).min(3.0);
    char_score + comma_score
}

/// Share of the element's text that lives inside links, 0.0 to 1.0.
fn link_density(element: &ElementRef<'_>, text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }

    let link_sel = selector("a");
    let link_chars: usize = element
        .select(&link_sel)
        .map(|a| a.text().collect::<String>().chars().count())
        .sum();

    (link_chars as f64 / total as f64).min(1.0)
}

/// Parses a selector literal known to be valid.
fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head><title>Test Article</title></head>
        <body>
            <nav class="sidebar menu">
                <a href="/">Home</a> <a href="/about">About</a> <a href="/archive">Archive</a>
            </nav>
            <article class="post-content">
                <h1>Article Title</h1>
                <p>This is a long paragraph with lots of content, commas, and meaningful sentences
                   to make sure it wins the scoring pass against the navigation.</p>
                <p>A second paragraph with more prose, further text mass, and even more commas
                   so the candidate is clearly the main content container.</p>
            </article>
            <footer class="footer">Copyright</footer>
        </body>
        </html>
    "#;

    #[test]
    fn test_extract_picks_article_over_nav() {
        let article = extract_article(ARTICLE_HTML, &ExtractConfig::default()).unwrap();
        assert!(article.content.contains("long paragraph"));
        assert!(!article.content.contains("Archive"));
    }

    #[test]
    fn test_extract_title_from_title_element() {
        let article = extract_article(ARTICLE_HTML, &ExtractConfig::default()).unwrap();
        assert_eq!(article.title.as_deref(), Some("Test Article"));
    }

    #[test]
    fn test_title_falls_back_to_og_title() {
        let html = r#"<html><head><meta property="og:title" content="Og Title"></head>
            <body><p>Enough text for fallback extraction here.</p></body></html>"#;
        let article = extract_article(html, &ExtractConfig::default()).unwrap();
        assert_eq!(article.title.as_deref(), Some("Og Title"));
    }

    #[test]
    fn test_title_falls_back_to_h1() {
        let html = "<html><body><h1>Heading Title</h1><p>Some body text to extract.</p></body></html>";
        let article = extract_article(html, &ExtractConfig::default()).unwrap();
        assert_eq!(article.title.as_deref(), Some("Heading Title"));
    }

    #[test]
    fn test_minimal_document_falls_back_to_body() {
        let html = "<html><title>Hi There</title><body><p>Hello</p></body></html>";
        let article = extract_article(html, &ExtractConfig::default()).unwrap();
        assert_eq!(article.title.as_deref(), Some("Hi There"));
        assert!(article.content.contains("Hello"));
    }

    #[test]
    fn test_empty_body_is_no_content() {
        let html = "<html><head><title>Empty</title></head><body>   </body></html>";
        let result = extract_article(html, &ExtractConfig::default());
        assert!(matches!(result, Err(PaperboyError::NoContent)));
    }

    #[test]
    fn test_no_title_yields_none() {
        let html = "<html><body><p>Body text without any heading at all.</p></body></html>";
        let article = extract_article(html, &ExtractConfig::default()).unwrap();
        assert_eq!(article.title, None);
    }

    #[test]
    fn test_negative_hints_penalize_chrome() {
        let cfg = ExtractConfig::default();
        let html = Html::parse_fragment(r#"<div class="sidebar promo">text</div>"#);
        let sel = Selector::parse("div").unwrap();
        let el = html.select(&sel).next().unwrap();
        assert_eq!(class_id_weight(&el, &cfg), cfg.negative_weight);
    }

    #[test]
    fn test_link_density_all_links() {
        let html = Html::parse_fragment(r#"<div><a href="/">only link text</a></div>"#);
        let sel = Selector::parse("div").unwrap();
        let el = html.select(&sel).next().unwrap();
        let text: String = el.text().collect();
        assert!(link_density(&el, &text) > 0.99);
    }

    #[test]
    fn test_article_serializes() {
        let article = ExtractedArticle { title: Some("T".into()), content: "<p>c</p>".into() };
        let json = serde_json::to_string(&article).unwrap();
        assert!(json.contains(r#""title":"T""#));
    }
}
