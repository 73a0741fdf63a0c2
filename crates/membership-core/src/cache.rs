use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::dataset::{EnrichedDataset, PreparationOptions};
use crate::loader::{load_dataset, LoadError};

/// Holds the enriched dataset for the lifetime of its owner.
///
/// The export is read, enriched and classified on the first successful
/// [`RecordCache::get`]; later calls return the stored dataset without
/// touching the file again. A failed load leaves the cache empty so the next
/// call retries.
#[derive(Debug)]
pub struct RecordCache {
    path: PathBuf,
    options: PreparationOptions,
    dataset: OnceCell<EnrichedDataset>,
}

impl RecordCache {
    pub fn new(path: impl Into<PathBuf>, options: PreparationOptions) -> Self {
        Self {
            path: path.into(),
            options,
            dataset: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &PreparationOptions {
        &self.options
    }

    pub fn is_loaded(&self) -> bool {
        self.dataset.get().is_some()
    }

    pub fn get(&self) -> Result<&EnrichedDataset, LoadError> {
        if let Some(dataset) = self.dataset.get() {
            debug!(path = %self.path.display(), "record cache hit");
            return Ok(dataset);
        }
        self.dataset
            .get_or_try_init(|| load_dataset(&self.path, &self.options))
    }
}
