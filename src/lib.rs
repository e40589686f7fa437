//! Enriches a cleaned book-library spreadsheet with metadata from an
//! Open Library compatible search endpoint.
//!
//! Rows are searched by title and author, the best candidate is picked by a
//! small overlap heuristic, and responses are cached on disk so repeated runs
//! do not hit the network again.

pub mod batch;
pub mod cache;
pub mod config;
pub mod enrich;
pub mod error;
pub mod models;
pub mod normalize;
pub mod scoring;
pub mod search;
pub mod table;

pub use batch::{BatchRunner, RunSummary};
pub use config::Config;
pub use error::{CacheError, EnrichError};
pub use models::{EnrichedRow, InputRow, Provenance, SearchDoc, SearchEnvelope};

/// Runs one full enrichment pass with `config`.
pub fn run(config: Config) -> error::Result<RunSummary> {
    BatchRunner::new(config)?.run()
}
