use thiserror::Error;

/// Schema problems found while turning a raw table into typed records.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("row {row}, column '{column}': {reason}")]
    InvalidValue {
        row: usize,
        column: String,
        reason: String,
    },
}

impl DataError {
    pub(crate) fn invalid(row: usize, column: &str, reason: impl Into<String>) -> Self {
        DataError::InvalidValue {
            row,
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}
