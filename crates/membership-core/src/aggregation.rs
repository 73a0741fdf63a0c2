use std::collections::{BTreeMap, BTreeSet, HashMap};

use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::classifier::{ConsultationType, LimitedBenefit};
use crate::columns::{
    ACTUAL_AMOUNT, BENEFICIARY_NO, CONSULTATION_TYPE, ESTIMATED_SAVINGS, LIMITED_BENEFIT, MONTH,
    PRIMARY_HOLDER_NO, TOTAL_QTY,
};

#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
    #[error("selection contains no records")]
    EmptyView,
    #[error("records in the selection disagree on entitlement (total_qty values {values:?})")]
    InconsistentEntitlement { values: Vec<i64> },
}

/// Entitlement count for a holder and year.
///
/// A recorded count of zero is replaced by one so usage ratios stay defined;
/// `recorded` keeps the value found in the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Entitlement {
    pub value: i64,
    pub recorded: i64,
}

impl Entitlement {
    pub fn from_recorded(recorded: i64) -> Self {
        let value = if recorded == 0 { 1 } else { recorded };
        Self { value, recorded }
    }

    pub fn substituted(&self) -> bool {
        self.value != self.recorded
    }
}

/// Reads the shared `total_qty` of a selection. Every record must carry the
/// same value.
pub fn resolve_entitlement(df: &DataFrame) -> Result<Entitlement, AggregationError> {
    let qty = df.column(TOTAL_QTY)?.i64()?;
    let values: BTreeSet<i64> = qty.into_iter().map(|value| value.unwrap_or(0)).collect();

    match values.len() {
        0 => Err(AggregationError::EmptyView),
        1 => {
            let recorded = values.into_iter().next().unwrap_or(0);
            Ok(Entitlement::from_recorded(recorded))
        }
        _ => Err(AggregationError::InconsistentEntitlement {
            values: values.into_iter().collect(),
        }),
    }
}

/// Per-benefit record counts; every category is present, zero when unused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenefitUsage {
    pub counts: BTreeMap<LimitedBenefit, i64>,
}

impl BenefitUsage {
    pub fn get(&self, benefit: LimitedBenefit) -> i64 {
        self.counts.get(&benefit).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsultationUsage {
    pub counts: BTreeMap<ConsultationType, i64>,
}

impl ConsultationUsage {
    pub fn get(&self, kind: ConsultationType) -> i64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }
}

pub fn limited_benefit_usage(df: &DataFrame) -> PolarsResult<BenefitUsage> {
    let labels = df.column(LIMITED_BENEFIT)?.str()?;
    let mut counts: BTreeMap<LimitedBenefit, i64> =
        LimitedBenefit::ALL.into_iter().map(|b| (b, 0)).collect();

    for label in labels.into_iter().flatten() {
        if let Ok(benefit) = LimitedBenefit::try_from(label) {
            *counts.entry(benefit).or_insert(0) += 1;
        }
    }

    Ok(BenefitUsage { counts })
}

pub fn consultation_usage(df: &DataFrame) -> PolarsResult<ConsultationUsage> {
    let labels = df.column(CONSULTATION_TYPE)?.str()?;
    let mut counts: BTreeMap<ConsultationType, i64> =
        ConsultationType::ALL.into_iter().map(|c| (c, 0)).collect();

    for label in labels.into_iter().flatten() {
        if let Ok(kind) = ConsultationType::try_from(label) {
            *counts.entry(kind).or_insert(0) += 1;
        }
    }

    Ok(ConsultationUsage { counts })
}

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Abbreviated English month name for chart axes; empty outside 1..=12.
pub fn month_label(month: u32) -> &'static str {
    match month {
        1..=12 => MONTH_ABBREVIATIONS[(month - 1) as usize],
        _ => "",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthPoint {
    pub month: u32,
    pub label: &'static str,
    pub value: f64,
}

/// Values grouped by order month, ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlySeries {
    pub points: Vec<MonthPoint>,
}

impl MonthlySeries {
    fn from_map(values: BTreeMap<u32, f64>) -> Self {
        let points = values
            .into_iter()
            .map(|(month, value)| MonthPoint {
                month,
                label: month_label(month),
                value,
            })
            .collect();
        Self { points }
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.points.iter().map(|point| point.label).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.value).collect()
    }

    pub fn value_for(&self, month: u32) -> Option<f64> {
        self.points
            .iter()
            .find(|point| point.month == month)
            .map(|point| point.value)
    }

    pub fn total(&self) -> f64 {
        self.points.iter().map(|point| point.value).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn month_at(months: &Int32Chunked, idx: usize) -> Option<u32> {
    months
        .get(idx)
        .and_then(|month| u32::try_from(month).ok())
}

/// Sums a float column per order month. Null values count as zero.
pub fn monthly_sum(df: &DataFrame, value_column: &str) -> PolarsResult<MonthlySeries> {
    let months = df.column(MONTH)?.i32()?;
    let values = df.column(value_column)?.f64()?;

    let mut sums: BTreeMap<u32, f64> = BTreeMap::new();
    for idx in 0..df.height() {
        let Some(month) = month_at(months, idx) else {
            continue;
        };
        *sums.entry(month).or_insert(0.0) += values.get(idx).unwrap_or(0.0);
    }

    Ok(MonthlySeries::from_map(sums))
}

pub fn monthly_spend(df: &DataFrame) -> PolarsResult<MonthlySeries> {
    monthly_sum(df, ACTUAL_AMOUNT)
}

pub fn monthly_estimated_savings(df: &DataFrame) -> PolarsResult<MonthlySeries> {
    monthly_sum(df, ESTIMATED_SAVINGS)
}

/// Average visits per beneficiary per month: records are counted per
/// (month, primary_holder_no, beneficiary_no) and the counts averaged within
/// each month. Records missing either identifier are left out.
pub fn monthly_visit_rate(df: &DataFrame) -> PolarsResult<MonthlySeries> {
    let months = df.column(MONTH)?.i32()?;
    let holder_nos = df.column(PRIMARY_HOLDER_NO)?.str()?;
    let beneficiary_nos = df.column(BENEFICIARY_NO)?.str()?;

    let mut visits: HashMap<(u32, &str, &str), u32> = HashMap::new();
    for idx in 0..df.height() {
        let (Some(month), Some(holder_no), Some(beneficiary_no)) = (
            month_at(months, idx),
            holder_nos.get(idx),
            beneficiary_nos.get(idx),
        ) else {
            continue;
        };
        *visits.entry((month, holder_no, beneficiary_no)).or_insert(0) += 1;
    }

    let mut per_month: BTreeMap<u32, (u32, u32)> = BTreeMap::new();
    for ((month, _, _), count) in visits {
        let entry = per_month.entry(month).or_insert((0, 0));
        entry.0 += count;
        entry.1 += 1;
    }

    let rates = per_month
        .into_iter()
        .map(|(month, (total, beneficiaries))| (month, total as f64 / beneficiaries as f64))
        .collect();

    Ok(MonthlySeries::from_map(rates))
}

/// Used/unused split of the annual health check entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DonutTotals {
    pub used: i64,
    /// Negative when usage exceeds the entitlement; reported as is.
    pub unused: i64,
    pub used_percentage: f64,
}

impl DonutTotals {
    pub fn new(used: i64, entitlement: Entitlement) -> Self {
        let unused = entitlement.value.saturating_sub(used);
        let total = used.saturating_add(unused);
        let used_percentage = used as f64 / total as f64 * 100.0;
        Self {
            used,
            unused,
            used_percentage,
        }
    }
}

pub fn health_check_donut(usage: &BenefitUsage, entitlement: Entitlement) -> DonutTotals {
    DonutTotals::new(usage.get(LimitedBenefit::AnnualHealthCheck), entitlement)
}
