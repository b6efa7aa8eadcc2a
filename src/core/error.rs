use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("Cannot parse config: {0}")]
    ConfigParsingError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Metadata error: {0}")]
    MetadataError(String),
    #[error("Cannot open partition {partition}: {reason}")]
    PartitionOpen { partition: usize, reason: String },
    #[error("Corrupt column {column} in partition {partition}: {reason}")]
    CorruptColumn {
        partition: usize,
        column: usize,
        reason: String,
    },
    #[error(
        "Resume offset {skip} does not fit partition {partition} holding {row_count} rows"
    )]
    ResumeMismatch {
        partition: usize,
        row_count: u64,
        skip: u64,
    },
    #[error("Partitions hold {actual} rows, table reports {expected}")]
    RowCountMismatch { expected: u64, actual: u64 },
    #[error("Type mismatch in column {column}: expected {expected}, got {actual}")]
    TypeMismatch {
        column: usize,
        expected: String,
        actual: String,
    },
}

impl FrameError {
    pub(crate) fn corrupt(partition: usize, column: usize, reason: impl Into<String>) -> Self {
        FrameError::CorruptColumn {
            partition,
            column,
            reason: reason.into(),
        }
    }

    /// True for faults raised by the storage underneath the cursor, as opposed
    /// to configuration or fixture problems.
    pub fn is_storage_fault(&self) -> bool {
        matches!(
            self,
            FrameError::IoError(_)
                | FrameError::PartitionOpen { .. }
                | FrameError::CorruptColumn { .. }
                | FrameError::ResumeMismatch { .. }
                | FrameError::RowCountMismatch { .. }
        )
    }
}

impl From<std::io::Error> for FrameError {
    fn from(err: std::io::Error) -> Self {
        FrameError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for FrameError {
    fn from(err: serde_json::Error) -> Self {
        FrameError::MetadataError(err.to_string())
    }
}
