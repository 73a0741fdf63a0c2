use crate::model::ExportColumn;

/// Column order of the frame produced by the export parser.
pub const EXPORT_COLUMNS: [&str; 10] = [
    "primary_holder",
    "primary_holder_no",
    "beneficiary_no",
    "plan",
    "product_template_id",
    "date_order",
    "beneficiary_dob",
    "dependent_dob",
    "actual_amount",
    "total_qty",
];

/// Columns that may hold empty cells without failing the row.
pub fn nullable_columns() -> &'static [ExportColumn] {
    use ExportColumn::*;
    &[
        PrimaryHolderNo,
        BeneficiaryNo,
        Plan,
        ProductTemplateId,
        BeneficiaryDob,
        DependentDob,
        ActualAmount,
        TotalQty,
    ]
}
