use std::fs;
use std::path::Path;

use crate::error::{EnrichError, Result};
use crate::models::{EnrichedRow, InputRow};

pub fn read_input(path: &Path) -> Result<Vec<InputRow>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|err| EnrichError::csv(format!("failed to open input {}", path.display()), err))?;
    reader
        .deserialize::<InputRow>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| EnrichError::csv(format!("failed to read input {}", path.display()), err))
}

pub fn read_rows(path: &Path) -> Result<Vec<EnrichedRow>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|err| EnrichError::csv(format!("failed to open {}", path.display()), err))?;
    reader
        .deserialize::<EnrichedRow>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| EnrichError::csv(format!("failed to read {}", path.display()), err))
}

/// Overwrites `path` with `rows`. The header is written even with no rows.
pub fn write_rows(path: &Path, rows: &[EnrichedRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            EnrichError::io(format!("failed to create {}", parent.display()), err)
        })?;
    }

    let context = || format!("failed to write {}", path.display());
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|err| EnrichError::csv(context(), err))?;
    writer
        .write_record(EnrichedRow::COLUMNS)
        .map_err(|err| EnrichError::csv(context(), err))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|err| EnrichError::csv(context(), err))?;
    }
    writer
        .flush()
        .map_err(|err| EnrichError::io(context(), err))
}
