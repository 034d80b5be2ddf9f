//! Error types shared by every pipeline stage.

use std::path::PathBuf;

/// Errors raised while loading, transforming or charting a sales table.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to load {}: {reason}", .path.display())]
    Load { path: PathBuf, reason: String },

    #[error("column '{0}' not found in table")]
    MissingColumn(String),

    #[error("cannot convert column '{column}': {reason}")]
    Conversion { column: String, reason: String },

    #[error("column '{0}' already exists")]
    DuplicateColumn(String),

    #[error("column '{column}' has an unsupported type: {reason}")]
    Type { column: String, reason: String },

    #[error("computing column '{column}' failed at row {row}")]
    Computation {
        column: String,
        row: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to render chart: {0}")]
    Render(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn conversion(column: &str, reason: impl Into<String>) -> Self {
        Self::Conversion {
            column: column.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn type_mismatch(column: &str, reason: impl Into<String>) -> Self {
        Self::Type {
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_column() {
        let err = Error::MissingColumn("SALES".to_string());
        assert_eq!(err.to_string(), "column 'SALES' not found in table");

        let err = Error::conversion("ORDERDATE", "bad value");
        assert!(err.to_string().contains("ORDERDATE"));
    }

    #[test]
    fn test_computation_keeps_source() {
        use std::error::Error as _;

        let err = Error::Computation {
            column: "DISCOUNT_PCT".to_string(),
            row: 3,
            source: anyhow::anyhow!("division by zero"),
        };
        assert_eq!(err.to_string(), "computing column 'DISCOUNT_PCT' failed at row 3");
        assert_eq!(err.source().unwrap().to_string(), "division by zero");
    }
}
