//! HTML to Markdown conversion and filename-safe titles.

use regex::Regex;

use crate::{PaperboyError, Result};

/// Configuration for Markdown conversion.
#[derive(Debug, Clone, Default)]
pub struct MarkdownConfig {
    /// Strip images from the output.
    pub strip_images: bool,
    /// Include the title as an H1 heading at the start of the content.
    pub include_title_heading: bool,
}

/// Characters that may not appear in a cache filename stem.
///
/// Each match is replaced with a single underscore, one per character,
/// so existing cache filenames stay stable. `_` itself is not in the set,
/// which makes sanitization idempotent.
const FORBIDDEN: &str = r"[?./\\'#:•\s]";

/// Produces a filesystem-safe filename stem from a title.
///
/// # Example
///
/// ```rust
/// use paperboy_core::markdown::sanitize_title;
///
/// assert_eq!(sanitize_title("Hi There"), "Hi_There");
/// assert_eq!(sanitize_title("What? A/B. Test"), "What__A_B__Test");
/// ```
pub fn sanitize_title(title: &str) -> String {
    let forbidden = Regex::new(FORBIDDEN).unwrap();
    forbidden.replace_all(title, "_").into_owned()
}

/// Converts an HTML fragment to Markdown.
pub fn convert_to_markdown(html: &str, title: Option<&str>, config: &MarkdownConfig) -> Result<String> {
    let mut output = String::new();

    if config.include_title_heading
        && let Some(title) = title
    {
        output.push_str(&format!("# {}\n\n", title));
    }

    let processed_html = if config.strip_images { strip_images(html)? } else { html.to_string() };

    let markdown = htmd::convert(&processed_html).map_err(|e| PaperboyError::Extraction(e.to_string()))?;
    output.push_str(&markdown);

    Ok(output)
}

/// Strip all img tags from HTML.
fn strip_images(html: &str) -> Result<String> {
    let mut output = Vec::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![lol_html::element!("img", |el| {
                el.remove_and_keep_content();
                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    match rewriter.write(html.as_bytes()) {
        Ok(_) => {}
        Err(_) => return Ok(html.to_string()),
    }

    match rewriter.end() {
        Ok(_) => {
            if output.is_empty() {
                Ok(html.to_string())
            } else {
                String::from_utf8(output).map_err(|e| PaperboyError::Extraction(e.to_string()))
            }
        }
        Err(_) => Ok(html.to_string()),
    }
}
