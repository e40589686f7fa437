use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::enrich::enrich_row;
use crate::error::Result;
use crate::models::{EnrichedRow, InputRow, Provenance};
use crate::search::{ResponseOrigin, SearchClient};
use crate::table;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub failed: usize,
    pub resumed: usize,
    pub cache_hits: usize,
    pub remote_calls: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn failures(&self) -> usize {
        self.unmatched + self.failed
    }

    fn record(&mut self, row: &EnrichedRow) {
        self.total += 1;
        match row.provenance {
            Provenance::Matched => self.matched += 1,
            Provenance::NoMatch => self.unmatched += 1,
            Provenance::Failed(_) => self.failed += 1,
        }
    }
}

/// Rows produced so far plus checkpoint rows still waiting to be reused,
/// queued per isbn so duplicated isbns resume one for one.
#[derive(Debug, Default)]
pub struct RunState {
    rows: Vec<EnrichedRow>,
    processed: HashMap<String, VecDeque<EnrichedRow>>,
}

impl RunState {
    pub fn from_checkpoint(rows: Vec<EnrichedRow>) -> Self {
        let mut processed: HashMap<String, VecDeque<EnrichedRow>> = HashMap::new();
        for row in rows {
            processed.entry(row.isbn.clone()).or_default().push_back(row);
        }
        Self {
            rows: vec![],
            processed,
        }
    }

    fn take_processed(&mut self, isbn: &str) -> Option<EnrichedRow> {
        self.processed.get_mut(isbn)?.pop_front()
    }

    pub fn rows(&self) -> &[EnrichedRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<EnrichedRow> {
        self.rows
    }
}

/// Drives every input row through the enricher, one at a time.
pub struct BatchRunner {
    config: Config,
    client: SearchClient,
}

impl BatchRunner {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let cache = CacheStore::open(&config.cache_dir)?;
        let client = SearchClient::new(&config, cache)?;
        Ok(Self { config, client })
    }

    pub fn run(&self) -> Result<RunSummary> {
        let inputs = table::read_input(&self.config.input)?;
        log::info!(
            "Starting enrichment of {} rows from {}",
            inputs.len(),
            self.config.input.display()
        );

        let mut state = self.initial_state();
        let summary = self.process(&inputs, &mut state);
        let rows = state.into_rows();

        table::write_rows(&self.config.output, &rows)?;
        log::info!("Final output saved to {}", self.config.output.display());

        let failures = rows
            .iter()
            .filter(|row| row.provenance.is_failure())
            .cloned()
            .collect::<Vec<_>>();
        if failures.is_empty() {
            log::info!("No failures");
        } else {
            table::write_rows(&self.config.failures, &failures)?;
            log::warn!(
                "{} failures saved to {}",
                failures.len(),
                self.config.failures.display()
            );
        }

        Ok(summary)
    }

    /// Runs the row loop, filling `state`. Never fails: a row that cannot be
    /// enriched is recorded with an `error:<kind>` provenance.
    pub fn process(&self, inputs: &[InputRow], state: &mut RunState) -> RunSummary {
        let started = Instant::now();
        let total = inputs.len();
        let mut summary = RunSummary::default();

        for (index, input) in inputs.iter().enumerate() {
            let position = index + 1;

            if let Some(row) = state.take_processed(&input.isbn) {
                log::debug!("[{}/{}] {} already in checkpoint", position, total, input.isbn);
                summary.record(&row);
                summary.resumed += 1;
                state.rows.push(row);
                continue;
            }

            let row = match enrich_row(&self.client, input) {
                Ok(outcome) => {
                    match outcome.origin {
                        ResponseOrigin::Cache => summary.cache_hits += 1,
                        ResponseOrigin::Remote => summary.remote_calls += 1,
                    }
                    log::info!(
                        "[{}/{}] {} -> {} | pages={} | year={}",
                        position,
                        total,
                        input.isbn,
                        outcome.row.provenance,
                        display_opt(outcome.row.pages),
                        display_opt(outcome.row.first_publish_year)
                    );
                    outcome.row
                }
                Err(err) => {
                    log::warn!("[{}/{}] ERROR {}: {}", position, total, input.isbn, err);
                    EnrichedRow::failed(input, err.kind())
                }
            };
            summary.record(&row);
            state.rows.push(row);

            if position % self.config.checkpoint_every == 0 {
                self.save_checkpoint(state.rows());
            }

            let interval = self.config.request_interval();
            if !interval.is_zero() {
                std::thread::sleep(interval);
            }
        }

        summary.elapsed = started.elapsed();
        log::info!("Finished in {:.1}s", summary.elapsed.as_secs_f64());
        summary
    }

    fn initial_state(&self) -> RunState {
        if !self.config.resume {
            return RunState::default();
        }
        match load_checkpoint(&self.config.checkpoint) {
            Ok(Some(rows)) => {
                log::info!(
                    "Resuming with {} rows from {}",
                    rows.len(),
                    self.config.checkpoint.display()
                );
                RunState::from_checkpoint(rows)
            }
            Ok(None) => RunState::default(),
            Err(err) => {
                log::warn!("Ignoring unreadable checkpoint: {}", err);
                RunState::default()
            }
        }
    }

    fn save_checkpoint(&self, rows: &[EnrichedRow]) {
        match table::write_rows(&self.config.checkpoint, rows) {
            Ok(()) => log::info!(
                "Checkpoint of {} rows saved to {}",
                rows.len(),
                self.config.checkpoint.display()
            ),
            Err(err) => log::warn!("Checkpoint not saved: {}", err),
        }
    }
}

pub fn load_checkpoint(path: &Path) -> Result<Option<Vec<EnrichedRow>>> {
    if !path.exists() {
        return Ok(None);
    }
    table::read_rows(path).map(Some)
}

fn display_opt(value: Option<i64>) -> String {
    value
        .map(|value| value.to_string())
        .unwrap_or_else(|| "-".to_string())
}
