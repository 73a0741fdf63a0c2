pub mod errors;
mod export;
pub mod model;
pub mod schema;

pub use errors::ParserError;
pub use export::{parse_membership_export, parse_timestamp_micros};
pub use model::{ExportColumn, ParsedExport};

#[cfg(test)]
mod tests;
