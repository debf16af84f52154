//! HTML retrieval over HTTP.
//!
//! One GET per call, bounded by a timeout, no retries. The response status
//! is checked before the body is accepted: a rendered error page is not an
//! article and must not flow into extraction.

use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::{PaperboyError, Result};

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "Mozilla/5.0 (compatible; Paperboy/0.3; +https://github.com/stormlightlabs/paperboy)"
                .to_string(),
        }
    }
}

/// Validates that the input is an absolute http(s) URL.
///
/// Used both by [`fetch_url`] and by hosts deciding whether an incoming
/// chat message is a link or raw text.
pub fn parse_http_url(input: &str) -> Result<Url> {
    let url = Url::parse(input.trim()).map_err(|e| PaperboyError::InvalidUrl(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PaperboyError::InvalidUrl(format!(
            "unsupported scheme '{other}' (expected http or https)"
        ))),
    }
}

/// Fetches HTML content from a URL.
///
/// Performs a single HTTP GET and returns the response body as text.
/// Redirects follow the client defaults. A timeout maps to
/// [`PaperboyError::Timeout`], a non-success status to
/// [`PaperboyError::BadStatus`].
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    let parsed_url = parse_http_url(url)?;

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(PaperboyError::Http)?;

    let response = client
        .get(parsed_url.clone())
        .header("User-Agent", &config.user_agent)
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                PaperboyError::Timeout { timeout: config.timeout }
            } else {
                PaperboyError::Http(e)
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(PaperboyError::BadStatus { status: status.as_u16(), url: parsed_url.to_string() });
    }

    let content = response.text().await.map_err(|e| {
        if e.is_timeout() {
            PaperboyError::Timeout { timeout: config.timeout }
        } else {
            PaperboyError::Http(e)
        }
    })?;

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 30);
        assert!(config.user_agent.contains("Paperboy"));
    }

    #[test]
    fn test_parse_http_url_accepts_https() {
        assert!(parse_http_url("https://example.com/article").is_ok());
        assert!(parse_http_url("http://example.com").is_ok());
    }

    #[test]
    fn test_parse_http_url_rejects_garbage() {
        assert!(matches!(parse_http_url("not-a-url"), Err(PaperboyError::InvalidUrl(_))));
        assert!(matches!(parse_http_url("read this later"), Err(PaperboyError::InvalidUrl(_))));
    }

    #[test]
    fn test_parse_http_url_rejects_other_schemes() {
        assert!(matches!(parse_http_url("ftp://example.com/file"), Err(PaperboyError::InvalidUrl(_))));
        assert!(matches!(parse_http_url("file:///etc/passwd"), Err(PaperboyError::InvalidUrl(_))));
    }

    #[test]
    fn test_fetch_url_invalid() {
        let config = FetchConfig::default();
        let result = std::thread::spawn(move || {
            tokio::runtime::Runtime::new()
                .unwrap()
                .block_on(fetch_url("not-a-url", &config))
        })
        .join()
        .unwrap();

        assert!(matches!(result, Err(PaperboyError::InvalidUrl(_))));
    }
}
