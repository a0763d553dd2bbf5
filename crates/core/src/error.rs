use std::path::PathBuf;

use thiserror::Error;

/// Violations of the tree's structural rules. These indicate misuse and are
/// never silently absorbed.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("path '{path}' is not inside tree root '{root}'")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("own statistics for '{0}' were already recorded")]
    OwnStatsAlreadySet(String),

    #[error("subtree '{0}' was already aggregated")]
    AlreadyAggregated(String),

    #[error("'{0}' already carries totals folded in while it was built")]
    TotalsAlreadyFolded(String),
}

/// Fatal scan failures.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Per-record failures of the line-record format. Always recoverable.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("expected 8 fields, found {found}")]
    FieldCount { found: usize },

    #[error("undecodable record: {0}")]
    Decode(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_error_converts_into_scan_error() {
        let err: ScanError = TreeError::AlreadyAggregated("/data".into()).into();
        assert!(matches!(err, ScanError::Tree(TreeError::AlreadyAggregated(_))));
        assert_eq!(err.to_string(), "subtree '/data' was already aggregated");
    }

    #[test]
    fn field_count_display() {
        let err = RecordError::FieldCount { found: 5 };
        assert_eq!(err.to_string(), "expected 8 fields, found 5");
    }
}
