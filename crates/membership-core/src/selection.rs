use std::collections::HashSet;

use polars::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::columns::{PRIMARY_HOLDER, YEAR};

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
    #[error("no records for primary holder '{0}'")]
    UnknownHolder(String),
    #[error("no records for primary holder '{holder}' in {year}")]
    NoData { holder: String, year: i32 },
}

/// Distinct primary holders in first-seen order.
pub fn distinct_holders(df: &DataFrame) -> PolarsResult<Vec<String>> {
    let holders = df.column(PRIMARY_HOLDER)?.str()?;
    let mut seen = HashSet::new();
    Ok(holders
        .into_iter()
        .flatten()
        .filter(|holder| seen.insert(*holder))
        .map(str::to_string)
        .collect())
}

/// Distinct order years in first-seen order.
pub fn distinct_years(df: &DataFrame) -> PolarsResult<Vec<i32>> {
    let years = df.column(YEAR)?.i32()?;
    let mut seen = HashSet::new();
    Ok(years
        .into_iter()
        .flatten()
        .filter(|year| seen.insert(*year))
        .collect())
}

pub fn filter_by_holder(df: &DataFrame, holder: &str) -> PolarsResult<DataFrame> {
    let mask = df.column(PRIMARY_HOLDER)?.str()?.equal(holder);
    df.filter(&mask)
}

pub fn filter_by_year(df: &DataFrame, year: i32) -> PolarsResult<DataFrame> {
    let mask = df.column(YEAR)?.i32()?.equal(year);
    df.filter(&mask)
}

/// Records of one primary holder. The year choices offered to a caller are
/// the years observed in this view, so a year can only be picked after the
/// holder.
#[derive(Debug, Clone)]
pub struct HolderView {
    holder: String,
    frame: DataFrame,
    years: Vec<i32>,
}

impl HolderView {
    pub fn new(df: &DataFrame, holder: &str) -> Result<Self, SelectionError> {
        let frame = filter_by_holder(df, holder)?;
        if frame.is_empty() {
            return Err(SelectionError::UnknownHolder(holder.to_string()));
        }
        let years = distinct_years(&frame)?;
        debug!(holder, rows = frame.height(), years = ?years, "selected holder");

        Ok(Self {
            holder: holder.to_string(),
            frame,
            years,
        })
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// The first observed year, which a dashboard preselects.
    pub fn default_year(&self) -> Option<i32> {
        self.years.first().copied()
    }

    pub fn select_year(&self, year: i32) -> Result<SelectedView, SelectionError> {
        let frame = filter_by_year(&self.frame, year)?;
        if frame.is_empty() {
            return Err(SelectionError::NoData {
                holder: self.holder.clone(),
                year,
            });
        }
        debug!(holder = %self.holder, year, rows = frame.height(), "selected year");

        Ok(SelectedView {
            holder: self.holder.clone(),
            year,
            frame,
        })
    }
}

/// Records of one primary holder in one order year. Never empty.
#[derive(Debug, Clone)]
pub struct SelectedView {
    holder: String,
    year: i32,
    frame: DataFrame,
}

impl SelectedView {
    pub fn holder(&self) -> &str {
        &self.holder
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }
}
