use reqwest::blocking::Client;
use std::sync::OnceLock;
use std::time::Duration;

use crate::cache::{cache_key, CacheLookup, CacheStore};
use crate::config::Config;
use crate::error::{EnrichError, Result};
use crate::models::SearchEnvelope;

static SEARCH_DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOrigin {
    Cache,
    Remote,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub envelope: SearchEnvelope,
    pub origin: ResponseOrigin,
}

/// Title+author search against an Open Library compatible `search.json`,
/// served from the on-disk cache when possible.
pub struct SearchClient {
    http: Client,
    endpoint: String,
    user_agent: String,
    limit: usize,
    cache: CacheStore,
}

impl SearchClient {
    pub fn new(config: &Config, cache: CacheStore) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(EnrichError::from_transport)?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            user_agent: config.user_agent.clone(),
            limit: config.result_limit,
            cache,
        })
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Non-success HTTP answers come back as an empty envelope carrying the
    /// status; only transport and body-decoding failures are errors.
    pub fn search(&self, title: &str, author: &str) -> Result<SearchOutcome> {
        let debug_enabled = search_debug_enabled();
        let key = cache_key(title, author);

        match self.cache.get(&key) {
            CacheLookup::Hit(envelope) => {
                if debug_enabled {
                    log::info!("[search-debug] cache hit key={} status={}", key, envelope.status);
                }
                return Ok(SearchOutcome {
                    envelope,
                    origin: ResponseOrigin::Cache,
                });
            }
            CacheLookup::Corrupt(err) => {
                log::warn!("Ignoring unreadable cache entry, fetching again: {}", err);
            }
            CacheLookup::Miss => {}
        }

        let url = self.search_url(title, author);
        if debug_enabled {
            log::info!("[search-debug] http start url={}", url);
        }

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .map_err(EnrichError::from_transport)?;

        let status = response.status();
        let envelope = if status.is_success() {
            let body = response.text().map_err(EnrichError::from_transport)?;
            let mut envelope = serde_json::from_str::<SearchEnvelope>(&body)
                .map_err(EnrichError::MalformedBody)?;
            envelope.status = status.as_u16();
            envelope
        } else {
            SearchEnvelope::empty(status.as_u16())
        };

        if debug_enabled {
            log::info!(
                "[search-debug] http done url={} status={} docs={}",
                url,
                status,
                envelope.docs().len()
            );
        }

        if let Err(err) = self.cache.put(&key, &envelope) {
            log::debug!("Cache write skipped: {}", err);
        }

        Ok(SearchOutcome {
            envelope,
            origin: ResponseOrigin::Remote,
        })
    }

    fn search_url(&self, title: &str, author: &str) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!(
            "{}{}title={}&author={}&limit={}",
            self.endpoint,
            separator,
            urlencoding::encode(title),
            urlencoding::encode(author),
            self.limit
        )
    }
}

fn search_debug_enabled() -> bool {
    *SEARCH_DEBUG_ENABLED.get_or_init(|| {
        std::env::var("SHELF_ENRICH_DEBUG")
            .map(|value| {
                let lowered = value.trim().to_ascii_lowercase();
                lowered == "1" || lowered == "true" || lowered == "yes" || lowered == "on"
            })
            .unwrap_or(false)
    })
}
