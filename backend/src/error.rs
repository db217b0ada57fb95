//! Error types for the price import/export pipeline.
//!
//! One enum per layer, converted upwards with `From` so `?` works across
//! layer boundaries:
//!
//! - [`ArchiveError`] - zip container errors
//! - [`CsvError`] - CSV parsing and serialization errors
//! - [`StoreError`] - storage errors (always a persistence failure)
//! - [`PipelineError`] - import/export orchestration errors
//! - [`ServerError`] - HTTP layer errors
//! - [`ConfigError`] - environment configuration errors
//!
//! Every pipeline failure is classified by [`ErrorKind`], which is what the
//! HTTP layer uses to pick a status code.

use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Error Classification
// =============================================================================

/// Client-facing category of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Payload is not a valid container or not valid CSV.
    Format,
    /// No CSV member at the root of the container.
    NotFound,
    /// CSV has a header but no data rows.
    EmptyDataset,
    /// Storage failure; the unit of work was rolled back.
    Persistence,
    /// Failure while building a response (export packaging).
    Internal,
}

impl ErrorKind {
    /// True when the failure is caused by the uploaded payload.
    pub fn is_client_error(self) -> bool {
        matches!(self, ErrorKind::Format | ErrorKind::NotFound | ErrorKind::EmptyDataset)
    }
}

// =============================================================================
// Archive Errors
// =============================================================================

/// Errors from the zip container codec.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Bytes are not a readable zip container.
    #[error("container unreadable: {0}")]
    Unreadable(String),

    /// No root-level `.csv` entry in the container.
    #[error("no tabular member: archive has no .csv file at its root")]
    NoTabularMember,

    /// Writing the export container failed.
    #[error("failed to write archive: {0}")]
    Write(String),
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        ArchiveError::Unreadable(err.to_string())
    }
}

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors from the CSV codec.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Content cannot be decoded as CSV.
    #[error("invalid CSV at line {line}: {message}")]
    Malformed { line: u64, message: String },

    /// Header only, or nothing at all.
    #[error("CSV file must contain at least a header and one data row")]
    EmptyDataset,

    /// Serializing records failed.
    #[error("failed to write CSV: {0}")]
    Write(String),
}

impl CsvError {
    pub fn malformed(line: u64, message: impl Into<String>) -> Self {
        CsvError::Malformed {
            line,
            message: message.into(),
        }
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors from a [`crate::store::PriceStore`]. All of them are persistence
/// failures: the unit of work that raised them has been rolled back.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not reach the database or build the pool.
    #[error("database connection failed: {0}")]
    Connection(String),

    /// A statement failed.
    #[error("query failed: {0}")]
    Query(String),

    /// A row violated a column constraint.
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// The transaction could not be committed.
    #[error("commit failed: {0}")]
    Commit(String),
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(err: tokio_postgres::Error) -> Self {
        // Class 23 is "integrity constraint violation", 22 is "data exception"
        // (value too long, numeric overflow).
        let constraint = err
            .code()
            .map(|state| {
                let code = state.code();
                code.starts_with("23") || code.starts_with("22")
            })
            .unwrap_or(false);

        if constraint {
            StoreError::Constraint(err.to_string())
        } else if err.is_closed() {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::Query(err.to_string())
        }
    }
}

impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        StoreError::Connection(err.to_string())
    }
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Import/export orchestration errors.
///
/// Every stage failure ends the request; nothing is retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Container error.
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Storage error.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// Map the failure onto the client-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Archive(ArchiveError::Unreadable(_)) => ErrorKind::Format,
            PipelineError::Archive(ArchiveError::NoTabularMember) => ErrorKind::NotFound,
            PipelineError::Archive(ArchiveError::Write(_)) => ErrorKind::Internal,
            PipelineError::Csv(CsvError::Malformed { .. }) => ErrorKind::Format,
            PipelineError::Csv(CsvError::EmptyDataset) => ErrorKind::EmptyDataset,
            PipelineError::Csv(CsvError::Write(_)) => ErrorKind::Internal,
            PipelineError::Store(_) => ErrorKind::Persistence,
        }
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl ServerError {
    /// Pipeline classification, when the failure came from a pipeline.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ServerError::Pipeline(err) => Some(err.kind()),
            ServerError::BadRequest(_) => None,
        }
    }

    /// Payload problems are 400, everything else is 500.
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(err) if err.kind().is_client_error() => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Invalid configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable is set but cannot be parsed.
    #[error("invalid value for {name}: '{value}'")]
    InvalidVar { name: &'static str, value: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for container operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // ArchiveError -> PipelineError
        let pipeline_err: PipelineError = ArchiveError::NoTabularMember.into();
        assert_eq!(pipeline_err.kind(), ErrorKind::NotFound);
        assert!(pipeline_err.to_string().contains("no tabular member"));

        // CsvError -> PipelineError
        let pipeline_err: PipelineError = CsvError::EmptyDataset.into();
        assert_eq!(pipeline_err.kind(), ErrorKind::EmptyDataset);

        // StoreError -> PipelineError
        let pipeline_err: PipelineError = StoreError::Commit("boom".into()).into();
        assert_eq!(pipeline_err.kind(), ErrorKind::Persistence);
        assert!(!pipeline_err.kind().is_client_error());
    }

    #[test]
    fn test_format_errors_are_client_errors() {
        let unreadable: PipelineError = ArchiveError::Unreadable("bad magic".into()).into();
        let malformed: PipelineError = CsvError::malformed(3, "invalid UTF-8").into();

        assert_eq!(unreadable.kind(), ErrorKind::Format);
        assert_eq!(malformed.kind(), ErrorKind::Format);
        assert!(unreadable.kind().is_client_error());
        assert!(malformed.to_string().contains("line 3"));
    }

    #[test]
    fn test_server_status_codes() {
        let empty = ServerError::from(PipelineError::from(CsvError::EmptyDataset));
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

        let store = ServerError::from(PipelineError::from(StoreError::Query("timeout".into())));
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.kind(), Some(ErrorKind::Persistence));

        let bad = ServerError::BadRequest("No file provided".into());
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        assert_eq!(bad.kind(), None);
    }

    #[test]
    fn test_packaging_failures_are_internal() {
        let err: PipelineError = ArchiveError::Write("disk full".into()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
