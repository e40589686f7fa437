use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{EnrichError, Result};

pub const DEFAULT_ENDPOINT: &str = "https://openlibrary.org/search.json";
pub const DEFAULT_USER_AGENT: &str = "shelf-enrich/0.1";

/// Everything a run needs. Relative paths resolve against `root`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub root: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
    pub checkpoint: PathBuf,
    pub failures: PathBuf,
    pub cache_dir: PathBuf,
    pub endpoint: String,
    pub user_agent: String,
    pub result_limit: usize,
    pub request_timeout_ms: u64,
    pub request_interval_ms: u64,
    pub checkpoint_every: usize,
    pub resume: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            input: PathBuf::from("data/processed/minha_biblioteca_clean.csv"),
            output: PathBuf::from("data/processed/biblioteca_enriquecida.csv"),
            checkpoint: PathBuf::from("data/interim/biblioteca_enriquecida_checkpoint.csv"),
            failures: PathBuf::from("data/interim/enriquecimento_falhas_ta.csv"),
            cache_dir: PathBuf::from("data/interim/cache_search_titulo_autor"),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            result_limit: 10,
            request_timeout_ms: 20_000,
            request_interval_ms: 1_300,
            checkpoint_every: 20,
            resume: true,
        }
    }
}

impl Config {
    /// Default layout under `root`, with every path already resolved.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
        .resolved()
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|err| EnrichError::Config(err.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| EnrichError::io(format!("failed to read config {}", path.display()), err))?;
        Self::from_toml_str(&raw)
    }

    /// Joins relative paths onto `root`.
    pub fn resolved(mut self) -> Self {
        let root = self.root.clone();
        for path in [
            &mut self.input,
            &mut self.output,
            &mut self.checkpoint,
            &mut self.failures,
            &mut self.cache_dir,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.checkpoint_every == 0 {
            return Err(EnrichError::Config(
                "checkpoint_every must be at least 1".to_string(),
            ));
        }
        if self.result_limit == 0 {
            return Err(EnrichError::Config("result_limit must be at least 1".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(EnrichError::Config(
                "request_timeout_ms must be at least 1".to_string(),
            ));
        }
        if self.endpoint.trim().is_empty() {
            return Err(EnrichError::Config("endpoint must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }
}
