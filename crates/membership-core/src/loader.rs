use std::fs;
use std::path::{Path, PathBuf};

use membership_parser::{parse_membership_export, ParserError};
use thiserror::Error;
use tracing::{debug, info};

use crate::dataset::{prepare_dataset, DatasetError, EnrichedDataset, PreparationOptions};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read export {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse export: {0}")]
    Parser(#[from] ParserError),
    #[error("failed to prepare dataset: {0}")]
    Dataset(#[from] DatasetError),
}

pub fn load_dataset(path: &Path, options: &PreparationOptions) -> Result<EnrichedDataset, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), bytes = content.len(), "read membership export");
    load_dataset_from_str(&content, options)
}

pub fn load_dataset_from_str(
    content: &str,
    options: &PreparationOptions,
) -> Result<EnrichedDataset, LoadError> {
    let export = parse_membership_export(content)?;
    if !export.ignored_columns.is_empty() {
        debug!(columns = ?export.ignored_columns, "ignoring unrecognised export columns");
    }
    Ok(prepare_dataset(&export, options)?)
}
