use anyhow::Context;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

use shelf_enrich::Config;

#[derive(Parser, Debug)]
#[command(
    name = "shelf-enrich",
    version,
    about = "Enrich a book-library spreadsheet with Open Library metadata"
)]
struct Cli {
    /// TOML file with run settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Project root that relative paths resolve against
    #[arg(long)]
    root: Option<PathBuf>,

    /// Cleaned input CSV (titulo/title, autor/author, isbn)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Final enriched CSV
    #[arg(long)]
    output: Option<PathBuf>,

    /// Checkpoint CSV, rewritten every --checkpoint-every rows
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Report of rows without a match or with an error
    #[arg(long)]
    failures: Option<PathBuf>,

    /// Directory holding one cached response per title/author pair
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Search endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Pause after each searched row, in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// HTTP timeout, in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[arg(long)]
    checkpoint_every: Option<usize>,

    /// Start from scratch even if a checkpoint exists
    #[arg(long, action = ArgAction::SetTrue)]
    no_resume: bool,

    /// Enable debug logs
    #[arg(long, action = ArgAction::SetTrue)]
    debug: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(root) = self.root {
            config.root = root;
        }
        if let Some(input) = self.input {
            config.input = input;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(checkpoint) = self.checkpoint {
            config.checkpoint = checkpoint;
        }
        if let Some(failures) = self.failures {
            config.failures = failures;
        }
        if let Some(cache_dir) = self.cache_dir {
            config.cache_dir = cache_dir;
        }
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(interval) = self.interval_ms {
            config.request_interval_ms = interval;
        }
        if let Some(timeout) = self.timeout_ms {
            config.request_timeout_ms = timeout;
        }
        if let Some(every) = self.checkpoint_every {
            config.checkpoint_every = every;
        }
        if self.no_resume {
            config.resume = false;
        }

        Ok(config.resolved())
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = cli.into_config()?;
    log::debug!("config: {:?}", config);

    let summary = shelf_enrich::run(config).context("enrichment run failed")?;
    println!(
        "{} rows: {} matched, {} without match, {} errors ({} resumed, {} from cache, {} fetched) in {:.1}s",
        summary.total,
        summary.matched,
        summary.unmatched,
        summary.failed,
        summary.resumed,
        summary.cache_hits,
        summary.remote_calls,
        summary.elapsed.as_secs_f64()
    );
    Ok(())
}
