pub mod error;
pub mod extract;
pub mod fetch;
pub mod ledger;
pub mod markdown;
pub mod pipeline;

pub use error::{PaperboyError, Result};
pub use extract::{ExtractConfig, ExtractedArticle, extract_article};
pub use fetch::{FetchConfig, fetch_url, parse_http_url};
pub use ledger::CacheLedger;
pub use markdown::{MarkdownConfig, convert_to_markdown, sanitize_title};
pub use pipeline::{ConvertConfig, Pipeline, PipelineRun};
