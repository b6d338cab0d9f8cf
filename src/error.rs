//! Error types for engagement aggregation.
//!
//! Single-principal aggregation is all-or-nothing: any of these aborts the
//! call. Batch aggregation records per-principal failures instead and only
//! surfaces `PartialBatchFailure` when the caller asks for strict results.

use thiserror::Error;

use crate::db::DbError;

#[derive(Debug, Error)]
pub enum EngagementError {
    /// Principal is missing, soft-deleted, or not of role `principal`.
    #[error("Principal not found: {principal_id}")]
    NotFound { principal_id: String },

    #[error("Record store call failed: {0}")]
    Dependency(#[from] DbError),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{failed} of {total} principals failed to aggregate", total = failed + succeeded)]
    PartialBatchFailure { failed: usize, succeeded: usize },
}

impl EngagementError {
    /// Short machine-readable tag, used in logs and batch failure records.
    pub fn kind(&self) -> &'static str {
        match self {
            EngagementError::NotFound { .. } => "not_found",
            EngagementError::Dependency(_) => "dependency_error",
            EngagementError::Validation(_) => "validation_error",
            EngagementError::PartialBatchFailure { .. } => "partial_batch_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_and_kinds() {
        let err = EngagementError::NotFound {
            principal_id: "p-9".into(),
        };
        assert_eq!(err.to_string(), "Principal not found: p-9");
        assert_eq!(err.kind(), "not_found");

        let err = EngagementError::PartialBatchFailure {
            failed: 1,
            succeeded: 2,
        };
        assert_eq!(err.to_string(), "1 of 3 principals failed to aggregate");

        let err: EngagementError = DbError::Backend("timeout".into()).into();
        assert_eq!(err.kind(), "dependency_error");
        assert!(err.to_string().contains("timeout"));
    }
}
