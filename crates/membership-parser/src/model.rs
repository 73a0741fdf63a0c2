use std::fmt;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Source columns the dashboard reads from a membership export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportColumn {
    PrimaryHolder,
    PrimaryHolderNo,
    BeneficiaryNo,
    Plan,
    ProductTemplateId,
    DateOrder,
    BeneficiaryDob,
    DependentDob,
    ActualAmount,
    TotalQty,
}

impl ExportColumn {
    pub const ALL: [ExportColumn; 10] = [
        ExportColumn::PrimaryHolder,
        ExportColumn::PrimaryHolderNo,
        ExportColumn::BeneficiaryNo,
        ExportColumn::Plan,
        ExportColumn::ProductTemplateId,
        ExportColumn::DateOrder,
        ExportColumn::BeneficiaryDob,
        ExportColumn::DependentDob,
        ExportColumn::ActualAmount,
        ExportColumn::TotalQty,
    ];

    pub fn canonical_name(&self) -> &'static str {
        match self {
            ExportColumn::PrimaryHolder => "primary_holder",
            ExportColumn::PrimaryHolderNo => "primary_holder_no",
            ExportColumn::BeneficiaryNo => "beneficiary_no",
            ExportColumn::Plan => "plan",
            ExportColumn::ProductTemplateId => "product_template_id",
            ExportColumn::DateOrder => "date_order",
            ExportColumn::BeneficiaryDob => "beneficiary_dob",
            ExportColumn::DependentDob => "dependent_dob",
            ExportColumn::ActualAmount => "actual_amount",
            ExportColumn::TotalQty => "total_qty",
        }
    }
}

impl fmt::Display for ExportColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

impl TryFrom<&str> for ExportColumn {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_ascii_lowercase();
        ExportColumn::ALL
            .into_iter()
            .find(|column| column.canonical_name() == lower)
            .ok_or_else(|| format!("unknown export column '{lower}'"))
    }
}

/// A parsed export: one row per claim line, typed columns named after
/// [`ExportColumn::canonical_name`].
#[derive(Debug, Clone)]
pub struct ParsedExport {
    pub file_hash: String,
    pub df: DataFrame,
    pub ignored_columns: Vec<String>,
}

impl ParsedExport {
    pub fn row_count(&self) -> usize {
        self.df.height()
    }
}
