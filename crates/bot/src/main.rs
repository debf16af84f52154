use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use paperboy_core::Pipeline;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod mailer;
mod repl;
mod service;
mod storage;

use config::AppConfig;
use mailer::SmtpMailer;
use service::BotService;
use storage::{DataStore, InMemoryStore, RedisStore};

/// Fetch articles from chat messages and mail them as EPUB
#[derive(Parser, Debug)]
#[command(name = "paperboy")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long, default_value = "config.toml", value_name = "FILE")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn build_pipeline(config: &AppConfig) -> Pipeline {
    let mut pipeline = match &config.fetcher.cache_dir {
        Some(dir) => Pipeline::new(dir),
        None => Pipeline::with_default_cache_dir(),
    };

    pipeline.fetch.timeout = config.fetcher.timeout_seconds;
    pipeline.convert.program = config.fetcher.converter.clone();
    pipeline.convert.timeout = config.fetcher.convert_timeout_seconds;
    pipeline
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = AppConfig::load(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;

    let pipeline = build_pipeline(&config);

    // Fail fast on missing credentials instead of at the first delivery.
    let mailer = SmtpMailer::from_config(&config.email)?;

    let store: Box<dyn DataStore> = match &config.redis {
        Some(redis) => {
            info!(url = %redis.url(), "using redis store");
            Box::new(RedisStore::connect(redis).context("failed to open redis client")?)
        }
        None => {
            info!("using in-memory store");
            Box::new(InMemoryStore::new())
        }
    };

    info!(cache_dir = %pipeline.cache_dir.display(), "starting");

    let service = BotService::new(store, mailer, pipeline);
    repl::run_repl(&service).await
}
