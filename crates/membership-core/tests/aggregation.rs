mod common;

use anyhow::Result;
use polars::prelude::*;

use membership_core::aggregation::{
    consultation_usage, health_check_donut, limited_benefit_usage, month_label, monthly_spend,
    monthly_visit_rate, resolve_entitlement, AggregationError, DonutTotals, Entitlement,
    MonthlySeries,
};
use membership_core::classifier::{ConsultationType, LimitedBenefit};

use common::{assert_close, fixture_dataset};

#[test]
fn zero_entitlement_is_replaced_by_one() -> Result<()> {
    let df = df!("total_qty" => &[0i64, 0, 0])?;
    let entitlement = resolve_entitlement(&df)?;

    assert_eq!(entitlement.value, 1);
    assert_eq!(entitlement.recorded, 0);
    assert!(entitlement.substituted());
    Ok(())
}

#[test]
fn recorded_entitlement_is_kept() -> Result<()> {
    let df = df!("total_qty" => &[10i64, 10])?;
    let entitlement = resolve_entitlement(&df)?;

    assert_eq!(entitlement, Entitlement { value: 10, recorded: 10 });
    assert!(!entitlement.substituted());
    Ok(())
}

#[test]
fn disagreeing_entitlements_fail() -> Result<()> {
    let df = df!("total_qty" => &[2i64, 3, 2])?;
    let err = resolve_entitlement(&df).unwrap_err();

    assert!(matches!(
        err,
        AggregationError::InconsistentEntitlement { ref values } if values == &vec![2, 3]
    ));
    Ok(())
}

#[test]
fn empty_selection_has_no_entitlement() -> Result<()> {
    let df = df!("total_qty" => Vec::<i64>::new())?;
    assert!(matches!(
        resolve_entitlement(&df),
        Err(AggregationError::EmptyView)
    ));
    Ok(())
}

#[test]
fn donut_splits_the_entitlement() {
    let donut = DonutTotals::new(3, Entitlement::from_recorded(10));
    assert_eq!(donut.used, 3);
    assert_eq!(donut.unused, 7);
    assert_close(donut.used_percentage, 30.0);
}

#[test]
fn overused_donut_goes_negative() {
    let donut = DonutTotals::new(4, Entitlement::from_recorded(2));
    assert_eq!(donut.unused, -2);
    assert_close(donut.used_percentage, 200.0);
}

#[test]
fn usage_counts_cover_every_category() -> Result<()> {
    let df = df!(
        "limited_benefit" => &[Some("ECG"), None, Some("ECG"), Some("Home Care")],
        "consultation_type" => &[None, Some("Doctor Consultation"), None, None]
    )?;

    let benefits = limited_benefit_usage(&df)?;
    assert_eq!(benefits.counts.len(), LimitedBenefit::ALL.len());
    assert_eq!(benefits.get(LimitedBenefit::Ecg), 2);
    assert_eq!(benefits.get(LimitedBenefit::HomeCare), 1);
    assert_eq!(benefits.get(LimitedBenefit::Ambulance), 0);

    let consultations = consultation_usage(&df)?;
    assert_eq!(consultations.counts.len(), ConsultationType::ALL.len());
    assert_eq!(consultations.get(ConsultationType::Doctor), 1);
    assert_eq!(consultations.get(ConsultationType::Eye), 0);
    Ok(())
}

#[test]
fn monthly_spend_sums_by_month() -> Result<()> {
    let dataset = fixture_dataset();
    let view = dataset.select_holder("Acme Ltd")?.select_year(2023)?;
    let spend = monthly_spend(view.frame())?;

    assert_eq!(spend.labels(), vec!["Jan", "Feb"]);
    assert_eq!(spend.values().len(), 2);
    assert!(!spend.is_empty());
    assert_close(spend.value_for(1).unwrap(), 3000.0);
    assert_close(spend.value_for(2).unwrap(), 2400.0);
    assert_eq!(spend.value_for(3), None);
    assert_close(spend.total(), 5400.0);
    Ok(())
}

#[test]
fn visit_rate_averages_per_beneficiary() -> Result<()> {
    let dataset = fixture_dataset();
    let view = dataset.select_holder("Acme Ltd")?.select_year(2023)?;
    let rate = monthly_visit_rate(view.frame())?;

    // Jan: B001 twice. Feb: B001 once, B002 twice.
    assert_close(rate.value_for(1).unwrap(), 2.0);
    assert_close(rate.value_for(2).unwrap(), 1.5);
    Ok(())
}

#[test]
fn visit_rate_skips_records_without_identifiers() -> Result<()> {
    let df = df!(
        "month" => &[4i32, 4, 4],
        "primary_holder_no" => &[Some("H1"), Some("H1"), None],
        "beneficiary_no" => &[Some("B1"), Some("B1"), Some("B2")]
    )?;
    let rate = monthly_visit_rate(&df)?;

    assert_eq!(rate.points.len(), 1);
    assert_close(rate.value_for(4).unwrap(), 2.0);
    Ok(())
}

#[test]
fn health_check_donut_for_fixture() -> Result<()> {
    let dataset = fixture_dataset();
    let view = dataset.select_holder("Acme Ltd")?.select_year(2023)?;
    let usage = limited_benefit_usage(view.frame())?;
    let donut = health_check_donut(&usage, resolve_entitlement(view.frame())?);

    assert_eq!(donut.used, 1);
    assert_eq!(donut.unused, 1);
    assert_close(donut.used_percentage, 50.0);
    Ok(())
}

#[test]
fn month_labels() {
    assert_eq!(month_label(1), "Jan");
    assert_eq!(month_label(9), "Sep");
    assert_eq!(month_label(12), "Dec");
    assert_eq!(month_label(0), "");
    assert_eq!(month_label(13), "");
}

#[test]
fn series_over_no_records_is_empty() -> Result<()> {
    let df = df!(
        "month" => Vec::<i32>::new(),
        "actual_amount" => Vec::<f64>::new()
    )?;
    let spend = monthly_spend(&df)?;

    assert!(spend.is_empty());
    assert_eq!(spend, MonthlySeries::default());
    assert!(spend.values().is_empty());
    assert_eq!(spend.total(), 0.0);
    Ok(())
}
