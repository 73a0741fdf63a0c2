use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("export format mismatch: {reason}")]
    FormatMismatch { reason: String },

    #[error("export is missing required column '{column}'")]
    MissingColumn { column: &'static str },

    #[error("CSV error: {source}")]
    Csv {
        #[source]
        source: csv::Error,
    },

    #[error("data row {line_index} invalid: {message}")]
    DataRow { line_index: usize, message: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("export did not contain any data rows")]
    EmptyData,
}

impl From<csv::Error> for ParserError {
    fn from(source: csv::Error) -> Self {
        ParserError::Csv { source }
    }
}
