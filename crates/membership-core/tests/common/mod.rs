#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use membership_core::dataset::{prepare_dataset, EnrichedDataset, PreparationOptions};
use membership_parser::parse_membership_export;

pub fn fixture_path() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../membership-parser/tests/data")
        .join("membership_export.csv")
}

pub fn fixture() -> String {
    std::fs::read_to_string(fixture_path()).expect("read fixture")
}

pub fn reference() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 30)
        .unwrap()
        .and_time(NaiveTime::MIN)
}

pub fn fixture_dataset() -> EnrichedDataset {
    let export = parse_membership_export(&fixture()).expect("parse fixture");
    prepare_dataset(&export, &PreparationOptions::new(reference())).expect("prepare fixture")
}

pub const EXPORT_HEADER: &str = ",primary_holder,primary_holder_no,beneficiary_no,plan,product_template_id,date_order,beneficiary_dob,dependent_dob,actual_amount,total_qty";

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
