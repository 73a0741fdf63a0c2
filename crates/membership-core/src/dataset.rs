use chrono::NaiveDateTime;
use membership_parser::ParsedExport;
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::classifier::{apply_classification, ClassificationTables};
use crate::columns::{CONSULTATION_TYPE, LIMITED_BENEFIT};
use crate::savings::{apply_estimated_savings, is_valid_discount_rate, DEFAULT_DISCOUNT_RATE};
use crate::selection::{distinct_holders, HolderView, SelectionError};
use crate::temporal::enrich_temporal;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
    #[error("discount rate {0} must be within [0, 1)")]
    InvalidDiscountRate(f64),
}

/// Inputs to the one-time enrichment of an export.
#[derive(Debug, Clone)]
pub struct PreparationOptions {
    pub reference: NaiveDateTime,
    pub discount_rate: f64,
    pub tables: ClassificationTables,
}

impl PreparationOptions {
    pub fn new(reference: NaiveDateTime) -> Self {
        Self {
            reference,
            discount_rate: DEFAULT_DISCOUNT_RATE,
            tables: ClassificationTables::default(),
        }
    }

    pub fn with_discount_rate(mut self, discount_rate: f64) -> Self {
        self.discount_rate = discount_rate;
        self
    }

    pub fn with_tables(mut self, tables: ClassificationTables) -> Self {
        self.tables = tables;
        self
    }
}

/// The enriched, classified record set. Built once per export and only read
/// afterwards.
#[derive(Debug, Clone)]
pub struct EnrichedDataset {
    frame: DataFrame,
    fingerprint: String,
    reference: NaiveDateTime,
}

impl EnrichedDataset {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// blake3 hash of the export text this dataset was built from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn reference(&self) -> NaiveDateTime {
        self.reference
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    pub fn holders(&self) -> Result<Vec<String>, SelectionError> {
        Ok(distinct_holders(&self.frame)?)
    }

    pub fn select_holder(&self, holder: &str) -> Result<HolderView, SelectionError> {
        HolderView::new(&self.frame, holder)
    }
}

/// Runs temporal enrichment, classification and savings estimation over a
/// parsed export frame.
pub fn enrich_frame(df: &DataFrame, options: &PreparationOptions) -> Result<DataFrame, DatasetError> {
    if !is_valid_discount_rate(options.discount_rate) {
        return Err(DatasetError::InvalidDiscountRate(options.discount_rate));
    }

    let enriched = enrich_temporal(df, options.reference)?;
    let classified = apply_classification(&enriched, &options.tables)?;
    let estimated = apply_estimated_savings(&classified, options.discount_rate)?;

    Ok(estimated)
}

pub fn prepare_dataset(
    export: &ParsedExport,
    options: &PreparationOptions,
) -> Result<EnrichedDataset, DatasetError> {
    let frame = enrich_frame(&export.df, options)?;

    let consultations = frame.height() - frame.column(CONSULTATION_TYPE)?.null_count();
    let limited_benefits = frame.height() - frame.column(LIMITED_BENEFIT)?.null_count();
    debug!(consultations, limited_benefits, "classified records");
    info!(
        rows = frame.height(),
        fingerprint = %export.file_hash,
        reference = %options.reference,
        "prepared membership dataset"
    );

    Ok(EnrichedDataset {
        frame,
        fingerprint: export.file_hash.clone(),
        reference: options.reference,
    })
}
