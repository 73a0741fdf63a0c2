use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use csv::StringRecord;
use polars::prelude::*;

use crate::errors::ParserError;
use crate::model::{ExportColumn, ParsedExport};
use crate::schema::nullable_columns;

/// Parses a membership/claims CSV export.
///
/// The first column is the row index written by the exporting tool and is
/// always dropped. The remaining columns are matched by header name; columns
/// the dashboard does not read are reported in `ignored_columns`.
pub fn parse_membership_export(content: &str) -> Result<ParsedExport, ParserError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let header = records.next().ok_or(ParserError::FormatMismatch {
        reason: "export missing header row".to_string(),
    })??;
    let layout = ColumnLayout::from_header(&header)?;

    let mut columns = ExportColumns::default();
    for (row_idx, record) in records.enumerate() {
        let record = record?;
        // header is line 1
        let line_index = row_idx + 2;

        if record.len() != header.len() {
            return Err(ParserError::DataRow {
                line_index,
                message: format!(
                    "expected {} fields but found {}",
                    header.len(),
                    record.len()
                ),
            });
        }
        if record.iter().all(str::is_empty) {
            continue;
        }

        columns.push_row(&layout, &record, line_index)?;
    }

    if columns.is_empty() {
        return Err(ParserError::EmptyData);
    }

    let df = columns.into_dataframe()?;
    let file_hash = blake3::hash(content.as_bytes()).to_hex().to_string();

    Ok(ParsedExport {
        file_hash,
        df,
        ignored_columns: layout.ignored,
    })
}

struct ColumnLayout {
    positions: HashMap<ExportColumn, usize>,
    ignored: Vec<String>,
}

impl ColumnLayout {
    fn from_header(header: &StringRecord) -> Result<Self, ParserError> {
        if header.len() < 2 {
            return Err(ParserError::FormatMismatch {
                reason: format!(
                    "expected an index column followed by data columns, found {} columns",
                    header.len()
                ),
            });
        }

        let mut positions = HashMap::new();
        let mut ignored = Vec::new();

        for (idx, name) in header.iter().enumerate().skip(1) {
            match ExportColumn::try_from(name) {
                Ok(column) => {
                    if positions.insert(column, idx).is_some() {
                        return Err(ParserError::FormatMismatch {
                            reason: format!("column '{column}' appears more than once"),
                        });
                    }
                }
                Err(_) => ignored.push(name.to_string()),
            }
        }

        for column in ExportColumn::ALL {
            if !positions.contains_key(&column) {
                return Err(ParserError::MissingColumn {
                    column: column.canonical_name(),
                });
            }
        }

        Ok(Self { positions, ignored })
    }

    fn cell<'r>(&self, record: &'r StringRecord, column: ExportColumn) -> &'r str {
        self.positions
            .get(&column)
            .and_then(|&idx| record.get(idx))
            .unwrap_or_default()
    }
}

#[derive(Default)]
struct ExportColumns {
    primary_holder: Vec<String>,
    primary_holder_no: Vec<Option<String>>,
    beneficiary_no: Vec<Option<String>>,
    plan: Vec<Option<String>>,
    product_template_id: Vec<Option<i64>>,
    date_order: Vec<i64>,
    beneficiary_dob: Vec<Option<i64>>,
    dependent_dob: Vec<Option<i64>>,
    actual_amount: Vec<f64>,
    total_qty: Vec<i64>,
}

impl ExportColumns {
    fn is_empty(&self) -> bool {
        self.date_order.is_empty()
    }

    fn push_row(
        &mut self,
        layout: &ColumnLayout,
        record: &StringRecord,
        line_index: usize,
    ) -> Result<(), ParserError> {
        use ExportColumn::*;

        let holder = required_text(layout.cell(record, PrimaryHolder), PrimaryHolder, line_index)?;

        let raw_order = layout.cell(record, DateOrder);
        let date_order =
            parse_timestamp_micros(raw_order).ok_or_else(|| ParserError::DataRow {
                line_index,
                message: format!("invalid {} '{raw_order}'", DateOrder),
            })?;

        let template_id =
            parse_optional_i64(layout.cell(record, ProductTemplateId), ProductTemplateId, line_index)?;
        let actual_amount =
            parse_optional_f64(layout.cell(record, ActualAmount), ActualAmount, line_index)?
                .unwrap_or(0.0);
        let total_qty =
            parse_optional_i64(layout.cell(record, TotalQty), TotalQty, line_index)?.unwrap_or(0);

        self.primary_holder.push(holder);
        self.primary_holder_no
            .push(clean_optional(layout.cell(record, PrimaryHolderNo)));
        self.beneficiary_no
            .push(clean_optional(layout.cell(record, BeneficiaryNo)));
        self.plan.push(clean_optional(layout.cell(record, Plan)));
        self.product_template_id.push(template_id);
        self.date_order.push(date_order);
        // unreadable birth dates become null and surface later as the unknown age
        self.beneficiary_dob
            .push(parse_timestamp_micros(layout.cell(record, BeneficiaryDob)));
        self.dependent_dob
            .push(parse_timestamp_micros(layout.cell(record, DependentDob)));
        self.actual_amount.push(actual_amount);
        self.total_qty.push(total_qty);

        Ok(())
    }

    fn into_dataframe(self) -> Result<DataFrame, ParserError> {
        use ExportColumn::*;

        let datetime = DataType::Datetime(TimeUnit::Microseconds, None);
        let as_datetime = |column: ExportColumn, values: Series| {
            values
                .cast(&datetime)
                .map_err(|err| ParserError::Validation {
                    message: format!("failed to cast {column} to datetime: {err}"),
                })
        };

        let cols: Vec<Column> = vec![
            Series::new(PrimaryHolder.canonical_name().into(), self.primary_holder).into(),
            Series::new(PrimaryHolderNo.canonical_name().into(), self.primary_holder_no).into(),
            Series::new(BeneficiaryNo.canonical_name().into(), self.beneficiary_no).into(),
            Series::new(Plan.canonical_name().into(), self.plan).into(),
            Series::new(ProductTemplateId.canonical_name().into(), self.product_template_id)
                .into(),
            as_datetime(
                DateOrder,
                Series::new(DateOrder.canonical_name().into(), self.date_order),
            )?
            .into(),
            as_datetime(
                BeneficiaryDob,
                Series::new(BeneficiaryDob.canonical_name().into(), self.beneficiary_dob),
            )?
            .into(),
            as_datetime(
                DependentDob,
                Series::new(DependentDob.canonical_name().into(), self.dependent_dob),
            )?
            .into(),
            Series::new(ActualAmount.canonical_name().into(), self.actual_amount).into(),
            Series::new(TotalQty.canonical_name().into(), self.total_qty).into(),
        ];

        DataFrame::new(cols).map_err(|err| ParserError::Validation {
            message: format!("failed to build export dataframe: {err}"),
        })
    }
}

/// Parses the timestamp layouts seen in membership exports into
/// microseconds since the epoch. Returns `None` for empty or unreadable cells.
pub fn parse_timestamp_micros(value: &str) -> Option<i64> {
    static DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ];
    // slash dates are month-first with or without a time
    static DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

    let trimmed = value.trim();
    if is_missing(trimmed) {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.and_utc().timestamp_micros());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date.and_time(NaiveTime::MIN).and_utc().timestamp_micros());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local().and_utc().timestamp_micros());
    }

    None
}

fn is_missing(value: &str) -> bool {
    value.is_empty()
        || value.eq_ignore_ascii_case("nan")
        || value.eq_ignore_ascii_case("nat")
        || value.eq_ignore_ascii_case("none")
}

fn clean_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if is_missing(trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn required_text(
    value: &str,
    column: ExportColumn,
    line_index: usize,
) -> Result<String, ParserError> {
    match clean_optional(value) {
        Some(text) => Ok(text),
        None if nullable_columns().contains(&column) => Ok(String::new()),
        None => Err(ParserError::DataRow {
            line_index,
            message: format!("column '{column}' must not be empty"),
        }),
    }
}

// both bounds are exact powers of two; the upper one is one past i64::MAX
const I64_FLOAT_MIN: f64 = i64::MIN as f64;
const I64_FLOAT_MAX: f64 = -(i64::MIN as f64);

fn parse_optional_i64(
    value: &str,
    column: ExportColumn,
    line_index: usize,
) -> Result<Option<i64>, ParserError> {
    let trimmed = value.trim();
    if is_missing(trimmed) {
        return Ok(None);
    }
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Ok(Some(parsed));
    }

    // exports written from float columns carry a trailing ".0"
    match trimmed.parse::<f64>() {
        Ok(parsed)
            if parsed.fract() == 0.0 && parsed >= I64_FLOAT_MIN && parsed < I64_FLOAT_MAX =>
        {
            Ok(Some(parsed as i64))
        }
        Ok(parsed) if parsed.fract() == 0.0 => Err(ParserError::DataRow {
            line_index,
            message: format!("column '{column}' value {trimmed} is out of integer range"),
        }),
        _ => Err(ParserError::DataRow {
            line_index,
            message: format!("failed to parse column '{column}' as integer: '{trimmed}'"),
        }),
    }
}

fn parse_optional_f64(
    value: &str,
    column: ExportColumn,
    line_index: usize,
) -> Result<Option<f64>, ParserError> {
    let trimmed = value.trim();
    if is_missing(trimmed) {
        return Ok(None);
    }

    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|err| ParserError::DataRow {
            line_index,
            message: format!("failed to parse column '{column}' as float: {err}"),
        })
}
