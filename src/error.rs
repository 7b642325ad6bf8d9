use thiserror::Error;

/// Errors surfaced by the clustering and aggregation pipeline and its
/// CSV data source.
#[derive(Debug, Error)]
pub enum GeoClusterError {
    /// A required column is missing or a value cannot be used as typed.
    /// `row` is 1-based and counts data rows only; `0` refers to the header.
    #[error("malformed {table} input at row {row}, column {column}: {reason}")]
    MalformedInput {
        table: &'static str,
        row: usize,
        column: String,
        reason: String,
    },

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("{labels} cluster labels supplied for {locations} locations")]
    LengthMismatch { locations: usize, labels: usize },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl GeoClusterError {
    pub(crate) fn malformed(
        table: &'static str,
        row: usize,
        column: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        GeoClusterError::MalformedInput {
            table,
            row,
            column: column.into(),
            reason: reason.into(),
        }
    }
}
