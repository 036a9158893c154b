use std::path::PathBuf;

use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Every variant is fatal for the current run; unparseable judge answers are
/// not errors and never reach this type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Schema mismatch in {}: {detail}", path.display())]
    SchemaMismatch { path: PathBuf, detail: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Judge '{judge}' failed: {source}")]
    Service {
        judge: String,
        #[source]
        source: LlmError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl AppError {
    pub fn schema(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        AppError::SchemaMismatch {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// True for failures of the external text service, the only kind that
    /// leaves resumable partial work behind.
    pub fn is_service(&self) -> bool {
        matches!(self, AppError::Service { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_mentions_path() {
        let err = AppError::MissingInput(PathBuf::from("people.csv"));
        assert_eq!(err.to_string(), "Input file not found: people.csv");
    }

    #[test]
    fn test_service_error_names_judge() {
        let err = AppError::Service {
            judge: "gemini-1.5-flash".to_string(),
            source: LlmError::EmptyContent,
        };
        assert!(err.is_service());
        assert!(err.to_string().contains("gemini-1.5-flash"));
    }

    #[test]
    fn test_schema_helper_builds_mismatch() {
        let err = AppError::schema("progress.csv", "missing column 'cv_2_id'");
        assert!(!err.is_service());
        assert!(matches!(err, AppError::SchemaMismatch { .. }));
        assert!(err.to_string().contains("cv_2_id"));
    }
}
