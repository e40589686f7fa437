use std::path::PathBuf;

/// Failures of a single cache operation. Never fatal to a run: a read
/// failure is a miss, a write failure is logged and dropped.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache entry {path} is not a valid envelope: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("connection failed: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("search response body is not valid JSON: {0}")]
    MalformedBody(#[source] serde_json::Error),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Csv {
        context: String,
        #[source]
        source: csv::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl EnrichError {
    /// Sorts a reqwest failure into timeout / connection / other.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else if err.is_connect() {
            Self::Connect(err)
        } else {
            Self::Transport(err)
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn csv(context: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            context: context.into(),
            source,
        }
    }

    /// Short name recorded in an `error:<kind>` provenance tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "Timeout",
            Self::Connect(_) => "ConnectionError",
            Self::Transport(_) => "TransportError",
            Self::MalformedBody(_) => "MalformedBody",
            Self::Io { .. } => "IoError",
            Self::Csv { .. } => "CsvError",
            Self::Config(_) => "ConfigError",
            Self::Cache(_) => "CacheError",
        }
    }
}

pub type Result<T, E = EnrichError> = std::result::Result<T, E>;
