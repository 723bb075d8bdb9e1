//! Error types for domain model construction and validation.

use thiserror::Error;

/// Errors produced when constructing or validating domain values.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("grid has no rows")]
    EmptyGrid,

    #[error("grid row {row} is empty")]
    EmptyRow { row: usize },

    #[error("grid is ragged: row {row} has {got} cells, expected {expected}")]
    RaggedGrid {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("cell value {value} at ({row}, {col}) is outside 0..=9")]
    CellOutOfRange { value: u8, row: usize, col: usize },

    #[error("unparseable grid cell: {token:?}")]
    UnparseableCell { token: String },

    #[error("puzzle has no training examples")]
    EmptyTrainingSet,

    #[error("puzzle has no test inputs")]
    EmptyTestSet,

    #[error("attempt has no training results")]
    EmptyTrainResults,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ragged_grid_display_names_both_lengths() {
        let err = DomainError::RaggedGrid {
            row: 2,
            expected: 4,
            got: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("row 2"));
        assert!(msg.contains("expected 4"));
    }

    #[test]
    fn test_cell_out_of_range_display() {
        let err = DomainError::CellOutOfRange {
            value: 12,
            row: 0,
            col: 1,
        };
        assert!(err.to_string().contains("12"));
        assert!(err.to_string().contains("outside 0..=9"));
    }
}
