use thiserror::Error;

/// Errors raised while reading or validating donation datasets
#[derive(Error, Debug)]
pub enum DataError {
    #[error("CSV file must contain required columns (missing: {})", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("CSV file contains no data rows")]
    Empty,

    #[error("Parse error on line {line}, column {column}: {message}")]
    Parse {
        line: u64,
        column: String,
        message: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for data operations
pub type DataResult<T> = Result<T, DataError>;

impl DataError {
    /// Create a parse error with row and column context
    pub fn parse_error<S: Into<String>>(line: u64, column: &str, message: S) -> Self {
        DataError::Parse {
            line,
            column: column.to_string(),
            message: message.into(),
        }
    }
}
