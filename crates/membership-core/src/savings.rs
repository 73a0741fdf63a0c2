use polars::prelude::*;

use crate::columns::{ACTUAL_AMOUNT, ESTIMATED_SAVINGS};

/// Discount the membership price is assumed to carry against list price.
pub const DEFAULT_DISCOUNT_RATE: f64 = 0.20;

/// The list-price markup implied by `discount_rate`:
/// `actual_amount / (1 - discount_rate) - actual_amount`.
pub fn estimated_savings(actual_amount: f64, discount_rate: f64) -> f64 {
    actual_amount / (1.0 - discount_rate) - actual_amount
}

pub fn is_valid_discount_rate(discount_rate: f64) -> bool {
    (0.0..1.0).contains(&discount_rate)
}

pub fn apply_estimated_savings(df: &DataFrame, discount_rate: f64) -> PolarsResult<DataFrame> {
    let amounts = df.column(ACTUAL_AMOUNT)?.f64()?;

    let savings: Vec<Option<f64>> = amounts
        .into_iter()
        .map(|amount| amount.map(|value| estimated_savings(value, discount_rate)))
        .collect();

    let mut output = df.clone();
    output.with_column(Series::new(ESTIMATED_SAVINGS.into(), savings))?;
    Ok(output)
}
