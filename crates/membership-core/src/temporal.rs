use chrono::{DateTime, Datelike, NaiveDateTime};
use polars::prelude::*;

use crate::columns::{
    BENEFICIARY_AGE, BENEFICIARY_DOB, DATE, DATE_ORDER, DEPENDENT_AGE, DEPENDENT_DOB, MONTH, YEAR,
};

/// Age reported when a birth date is missing or unreadable.
pub const UNKNOWN_AGE: i32 = -1;
pub const DAYS_PER_YEAR: f64 = 365.25;

const MICROS_PER_DAY: i64 = 86_400 * 1_000_000;

pub fn reference_micros(reference: NaiveDateTime) -> i64 {
    reference.and_utc().timestamp_micros()
}

/// Whole years between `dob_micros` and `reference_micros` using a fixed
/// 365.25-day year. Elapsed time is floored to whole days first and the
/// year count is truncated toward zero.
pub fn age_in_years(dob_micros: Option<i64>, reference_micros: i64) -> i32 {
    match dob_micros {
        Some(dob) => {
            let days = (reference_micros - dob).div_euclid(MICROS_PER_DAY);
            (days as f64 / DAYS_PER_YEAR) as i32
        }
        None => UNKNOWN_AGE,
    }
}

/// Adds `date`, `year`, `month`, `beneficiary_age` and `dependent_age`.
///
/// Every age in the batch is measured against the same `reference` instant.
/// Year and month come from the order timestamp itself, not from the derived
/// date column.
pub fn enrich_temporal(df: &DataFrame, reference: NaiveDateTime) -> PolarsResult<DataFrame> {
    let len = df.height();
    let now_micros = reference_micros(reference);

    let order = df.column(DATE_ORDER)?.datetime()?;
    let beneficiary_dob = df.column(BENEFICIARY_DOB)?.datetime()?;
    let dependent_dob = df.column(DEPENDENT_DOB)?.datetime()?;

    let mut dates: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut years: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut months: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut beneficiary_ages: Vec<i32> = Vec::with_capacity(len);
    let mut dependent_ages: Vec<i32> = Vec::with_capacity(len);

    for idx in 0..len {
        let order_ts = order
            .get(idx)
            .and_then(DateTime::from_timestamp_micros)
            .map(|dt| dt.naive_utc());

        match order_ts {
            Some(ts) => {
                dates.push(Some(days_since_epoch(ts)));
                years.push(Some(ts.year()));
                months.push(Some(ts.month() as i32));
            }
            None => {
                dates.push(None);
                years.push(None);
                months.push(None);
            }
        }

        beneficiary_ages.push(age_in_years(beneficiary_dob.get(idx), now_micros));
        dependent_ages.push(age_in_years(dependent_dob.get(idx), now_micros));
    }

    let date_series = Series::new(DATE.into(), dates).cast(&DataType::Date)?;

    let mut output = df.clone();
    output.with_column(date_series)?;
    output.with_column(Series::new(YEAR.into(), years))?;
    output.with_column(Series::new(MONTH.into(), months))?;
    output.with_column(Series::new(BENEFICIARY_AGE.into(), beneficiary_ages))?;
    output.with_column(Series::new(DEPENDENT_AGE.into(), dependent_ages))?;

    Ok(output)
}

fn days_since_epoch(ts: NaiveDateTime) -> i32 {
    ts.and_utc().timestamp().div_euclid(86_400) as i32
}
