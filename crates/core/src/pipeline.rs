//! The fetch → extract → convert → package pipeline.
//!
//! One [`Pipeline`] value holds the configuration; every run gets its own
//! [`CacheLedger`] supplied by the caller, so cleanup is explicit and two
//! runs can never delete each other's files. Control flow for a URL:
//! fetch → extract → Markdown → write `<cache_dir>/<title>.md` → package
//! `<cache_dir>/<title>.epub` via the external converter.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use crate::extract::{ExtractConfig, extract_article};
use crate::fetch::{FetchConfig, fetch_url};
use crate::ledger::CacheLedger;
use crate::markdown::{MarkdownConfig, convert_to_markdown, sanitize_title};
use crate::{PaperboyError, Result};

/// Title used when neither the caller nor the document provides one.
const FALLBACK_TITLE: &str = "untitled";

/// External converter configuration.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Program invoked to turn Markdown into EPUB.
    pub program: PathBuf,
    /// Time budget for one invocation, in seconds.
    pub timeout: u64,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self { program: PathBuf::from("pandoc"), timeout: 120 }
    }
}

/// The files produced by one successful pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// Human-readable article title.
    pub title: String,
    /// Path of the intermediate Markdown file.
    pub markdown_path: PathBuf,
    /// Path of the packaged EPUB.
    pub epub_path: PathBuf,
}

/// Fetches web pages and converts them into mailable documents.
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Directory holding intermediate and output files until cleanup.
    pub cache_dir: PathBuf,
    pub fetch: FetchConfig,
    pub extract: ExtractConfig,
    pub markdown: MarkdownConfig,
    pub convert: ConvertConfig,
}

impl Pipeline {
    /// Creates a pipeline writing into the given cache directory.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            fetch: FetchConfig::default(),
            extract: ExtractConfig::default(),
            markdown: MarkdownConfig::default(),
            convert: ConvertConfig::default(),
        }
    }

    /// Creates a pipeline with the platform cache directory
    /// (`~/.cache/paperboy` on Linux).
    pub fn with_default_cache_dir() -> Self {
        let dir = dirs::cache_dir()
            .map(|d| d.join("paperboy"))
            .unwrap_or_else(|| PathBuf::from(".paperboy-cache"));
        Self::new(dir)
    }

    /// Fetches a URL and converts it into an EPUB in the cache directory.
    ///
    /// Every file written along the way is registered in `ledger` before
    /// this returns, including on failure partway through, so the caller
    /// can always purge.
    pub async fn fetch_and_convert(&self, url: &str, ledger: &mut CacheLedger) -> Result<PipelineRun> {
        info!(url, "fetching");
        let html = fetch_url(url, &self.fetch).await?;
        self.convert_html(&html, None, ledger).await
    }

    /// Converts already-fetched HTML into an EPUB in the cache directory.
    ///
    /// A supplied `title` overrides whatever the document declares.
    pub async fn convert_html(
        &self, html: &str, title: Option<&str>, ledger: &mut CacheLedger,
    ) -> Result<PipelineRun> {
        let article = extract_article(html, &self.extract)?;

        let title = title
            .map(str::to_string)
            .or(article.title)
            .unwrap_or_else(|| FALLBACK_TITLE.to_string());

        let content = convert_to_markdown(&article.content, Some(&title), &self.markdown)?;

        let stem = sanitize_title(&title);
        let markdown_path = self.write_markdown(&stem, &content, ledger)?;
        let epub_path = self.package_epub(&stem, &title, &markdown_path, ledger).await?;

        Ok(PipelineRun { title, markdown_path, epub_path })
    }

    /// Writes raw text as a Markdown cache file, without packaging.
    ///
    /// This is the path taken for plain chat messages: the `.md` file is
    /// mailed directly.
    pub fn convert_text(&self, title: &str, content: &str, ledger: &mut CacheLedger) -> Result<PathBuf> {
        self.write_markdown(&sanitize_title(title), content, ledger)
    }

    /// Writes `<cache_dir>/<stem>.md`, creating the cache directory if
    /// absent, and registers the path.
    pub fn write_markdown(&self, stem: &str, content: &str, ledger: &mut CacheLedger) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.cache_dir)?;

        let path = self.cache_dir.join(format!("{stem}.md"));
        std::fs::write(&path, content)?;
        ledger.register(&path);

        debug!(path = %path.display(), "wrote markdown");
        Ok(path)
    }

    /// Invokes the external converter to produce `<cache_dir>/<stem>.epub`
    /// and registers the output path on success.
    ///
    /// Arguments are passed as a discrete vector; the title never goes
    /// through a shell.
    pub async fn package_epub(
        &self, stem: &str, title: &str, markdown_path: &Path, ledger: &mut CacheLedger,
    ) -> Result<PathBuf> {
        let epub_path = self.cache_dir.join(format!("{stem}.epub"));
        let tool = self.convert.program.display().to_string();

        debug!(tool, output = %epub_path.display(), "packaging");

        let output = Command::new(&self.convert.program)
            .arg("-o")
            .arg(&epub_path)
            .arg("--metadata")
            .arg(format!("title={title}"))
            .arg(markdown_path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(Duration::from_secs(self.convert.timeout), output)
            .await
            .map_err(|_| PaperboyError::ConversionTimeout { tool: tool.clone(), timeout: self.convert.timeout })??;

        if !output.status.success() {
            return Err(PaperboyError::Conversion {
                tool,
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        ledger.register(&epub_path);
        Ok(epub_path)
    }
}
