//! Column names of the enriched record frame.
//!
//! Source columns keep the names produced by `membership-parser`; the
//! constants below name the columns added by enrichment and classification.

pub const PRIMARY_HOLDER: &str = "primary_holder";
pub const PRIMARY_HOLDER_NO: &str = "primary_holder_no";
pub const BENEFICIARY_NO: &str = "beneficiary_no";
pub const PLAN: &str = "plan";
pub const PRODUCT_TEMPLATE_ID: &str = "product_template_id";
pub const DATE_ORDER: &str = "date_order";
pub const BENEFICIARY_DOB: &str = "beneficiary_dob";
pub const DEPENDENT_DOB: &str = "dependent_dob";
pub const ACTUAL_AMOUNT: &str = "actual_amount";
pub const TOTAL_QTY: &str = "total_qty";

pub const DATE: &str = "date";
pub const YEAR: &str = "year";
pub const MONTH: &str = "month";
pub const BENEFICIARY_AGE: &str = "beneficiary_age";
pub const DEPENDENT_AGE: &str = "dependent_age";
pub const CONSULTATION_TYPE: &str = "consultation_type";
pub const LIMITED_BENEFIT: &str = "limited_benefit";
pub const ESTIMATED_SAVINGS: &str = "estimated_savings";

/// Columns appended by [`crate::dataset::prepare_dataset`], in order.
pub const DERIVED_COLUMNS: [&str; 8] = [
    DATE,
    YEAR,
    MONTH,
    BENEFICIARY_AGE,
    DEPENDENT_AGE,
    CONSULTATION_TYPE,
    LIMITED_BENEFIT,
    ESTIMATED_SAVINGS,
];
