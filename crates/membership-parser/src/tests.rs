use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};

use crate::errors::ParserError;
use crate::model::ExportColumn;
use crate::schema::EXPORT_COLUMNS;
use crate::{parse_membership_export, parse_timestamp_micros};

fn fixture(path: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_path = base.join("tests/data").join(path);
    fs::read_to_string(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

fn midnight_micros(year: i32, month: u32, day: u32) -> i64 {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_time(NaiveTime::MIN)
        .and_utc()
        .timestamp_micros()
}

#[test]
fn parses_membership_export_fixture() {
    let content = fixture("membership_export.csv");
    let parsed = parse_membership_export(&content).expect("export parse failed");

    assert_eq!(parsed.df.get_column_names(), EXPORT_COLUMNS);
    assert_eq!(parsed.row_count(), 8);
    assert_eq!(parsed.ignored_columns, vec!["partner_name".to_string()]);
    assert_eq!(parsed.file_hash.len(), 64);

    let holders = parsed.df.column("primary_holder").unwrap().str().unwrap();
    assert_eq!(holders.get(0), Some("Acme Ltd"));
    assert_eq!(holders.get(7), Some("Beta Co"));

    let template_ids = parsed.df.column("product_template_id").unwrap().i64().unwrap();
    assert_eq!(template_ids.get(1), Some(3185));

    let qty = parsed.df.column("total_qty").unwrap().i64().unwrap();
    assert_eq!(qty.get(5), Some(3));
    assert_eq!(qty.get(6), Some(0));
}

#[test]
fn unreadable_birth_dates_are_null() {
    let content = fixture("membership_export.csv");
    let parsed = parse_membership_export(&content).unwrap();

    let beneficiary = parsed.df.column("beneficiary_dob").unwrap().datetime().unwrap();
    assert_eq!(beneficiary.get(0), Some(midnight_micros(1980, 4, 12)));
    assert_eq!(beneficiary.get(4), None);

    let dependent = parsed.df.column("dependent_dob").unwrap().datetime().unwrap();
    assert_eq!(dependent.get(0), None);
    assert_eq!(dependent.get(2), Some(midnight_micros(2021, 3, 15)));
}

#[test]
fn first_column_is_dropped_even_when_named() {
    let content = "\
primary_holder,primary_holder,primary_holder_no,beneficiary_no,plan,product_template_id,date_order,beneficiary_dob,dependent_dob,actual_amount,total_qty
ignored,Acme Ltd,H001,B001,Premium,3179,2023-01-05,,,10,1
";
    let parsed = parse_membership_export(content).expect("index column should be skipped");
    let holders = parsed.df.column("primary_holder").unwrap().str().unwrap();
    assert_eq!(holders.get(0), Some("Acme Ltd"));
}

#[test]
fn float_formatted_integers_are_accepted() {
    let content = "\
,primary_holder,primary_holder_no,beneficiary_no,plan,product_template_id,date_order,beneficiary_dob,dependent_dob,actual_amount,total_qty
0,Acme Ltd,H001,B001,Premium,3179.0,2023-01-05T09:15:00,,,,2.0
";
    let parsed = parse_membership_export(content).unwrap();
    let template_ids = parsed.df.column("product_template_id").unwrap().i64().unwrap();
    assert_eq!(template_ids.get(0), Some(3179));
    let amounts = parsed.df.column("actual_amount").unwrap().f64().unwrap();
    assert_eq!(amounts.get(0), Some(0.0));
    let qty = parsed.df.column("total_qty").unwrap().i64().unwrap();
    assert_eq!(qty.get(0), Some(2));
}

#[test]
fn missing_required_column_is_rejected() {
    let content = "\
,primary_holder,primary_holder_no,beneficiary_no,plan,product_template_id,date_order,beneficiary_dob,actual_amount,total_qty
0,Acme Ltd,H001,B001,Premium,3179,2023-01-05,,10,1
";
    let err = parse_membership_export(content).unwrap_err();
    assert!(matches!(
        err,
        ParserError::MissingColumn {
            column: "dependent_dob"
        }
    ));
}

#[test]
fn invalid_order_date_reports_line() {
    let content = "\
,primary_holder,primary_holder_no,beneficiary_no,plan,product_template_id,date_order,beneficiary_dob,dependent_dob,actual_amount,total_qty
0,Acme Ltd,H001,B001,Premium,3179,2023-01-05,,,10,1
1,Acme Ltd,H001,B001,Premium,3179,yesterday,,,10,1
";
    match parse_membership_export(content).unwrap_err() {
        ParserError::DataRow { line_index, message } => {
            assert_eq!(line_index, 3);
            assert!(message.contains("date_order"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn header_only_export_is_empty() {
    let content = ",primary_holder,primary_holder_no,beneficiary_no,plan,product_template_id,date_order,beneficiary_dob,dependent_dob,actual_amount,total_qty\n";
    assert!(matches!(
        parse_membership_export(content),
        Err(ParserError::EmptyData)
    ));
}

#[test]
fn timestamp_layouts() {
    let expected = midnight_micros(2023, 1, 5);
    assert_eq!(parse_timestamp_micros("2023-01-05"), Some(expected));
    assert_eq!(parse_timestamp_micros("01/05/2023"), Some(expected));
    assert_eq!(parse_timestamp_micros("01/05/2023 00:00:00"), Some(expected));
    assert_eq!(parse_timestamp_micros("2023-01-05 00:00:00"), Some(expected));
    assert_eq!(parse_timestamp_micros("2023-01-05 00:00:00.000"), Some(expected));
    assert_eq!(parse_timestamp_micros(" NaT "), None);
    assert_eq!(parse_timestamp_micros(""), None);
    assert_eq!(parse_timestamp_micros("13/13/2023"), None);
}

#[test]
fn slash_dates_are_month_first_with_or_without_time() {
    let date_only = parse_timestamp_micros("05/01/2023");
    assert_eq!(date_only, Some(midnight_micros(2023, 5, 1)));
    assert_eq!(parse_timestamp_micros("05/01/2023 00:00"), date_only);
    assert_eq!(parse_timestamp_micros("05/01/2023 00:00:00"), date_only);
    // day 25 cannot be a month
    assert_eq!(parse_timestamp_micros("25/01/2023"), None);
}

#[test]
fn out_of_range_integer_reports_line() {
    let content = "\
,primary_holder,primary_holder_no,beneficiary_no,plan,product_template_id,date_order,beneficiary_dob,dependent_dob,actual_amount,total_qty
0,Acme Ltd,H001,B001,Premium,3179,2023-01-05,,,100,1e19
";
    match parse_membership_export(content).unwrap_err() {
        ParserError::DataRow { line_index, message } => {
            assert_eq!(line_index, 2);
            assert!(message.contains("out of integer range"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn export_column_names_round_trip() {
    for column in ExportColumn::ALL {
        assert_eq!(ExportColumn::try_from(column.canonical_name()), Ok(column));
    }
    assert_eq!(
        ExportColumn::try_from(" Primary_Holder "),
        Ok(ExportColumn::PrimaryHolder)
    );
    assert!(ExportColumn::try_from("partner_name").is_err());
}
