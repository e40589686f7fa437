use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CacheError, EnrichError, Result};
use crate::models::SearchEnvelope;
use crate::normalize::normalize;

/// Fingerprint of a (title, author) query. Pairs that differ only in case,
/// accents or surrounding whitespace share a key.
pub fn cache_key(title: &str, author: &str) -> String {
    let raw = format!("{}|{}", normalize(title), normalize(author));
    let digest = Sha256::digest(raw.as_bytes());
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}

#[derive(Debug)]
pub enum CacheLookup {
    Hit(SearchEnvelope),
    Miss,
    /// Present but unreadable. Callers treat this as a miss.
    Corrupt(CacheError),
}

/// Search responses on disk, one `<key>.json` file per query.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| {
            EnrichError::Cache(CacheError::Io {
                path: dir.clone(),
                source,
            })
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub fn get(&self, key: &str) -> CacheLookup {
        let path = self.entry_path(key);
        if !path.exists() {
            return CacheLookup::Miss;
        }
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(source) => return CacheLookup::Corrupt(CacheError::Io { path, source }),
        };
        match serde_json::from_str::<SearchEnvelope>(&raw) {
            Ok(envelope) => CacheLookup::Hit(envelope),
            Err(source) => CacheLookup::Corrupt(CacheError::Json { path, source }),
        }
    }

    pub fn put(&self, key: &str, envelope: &SearchEnvelope) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        let body = serde_json::to_string(envelope).map_err(|source| CacheError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, body).map_err(|source| CacheError::Io { path, source })
    }
}
