//! Errors surfaced at the request boundary.
//!
//! Each stage of the pipeline has its own error type (`RenderError` in the
//! renderer, `ArtifactError` in the store). Handlers only deal with
//! [`ReportError`], which wraps both and knows which HTTP status each
//! failure maps to.

use crate::report::artifact::ArtifactError;
use crate::report::renderer::RenderError;
use actix_web::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// Catch-all for aggregation, I/O and worker faults.
    #[error("{0}")]
    Processing(String),
}

impl ReportError {
    pub fn processing(message: impl Into<String>) -> Self {
        Self::Processing(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ReportError::Artifact(ArtifactError::InvalidName(_)) => StatusCode::BAD_REQUEST,
            ReportError::Artifact(ArtifactError::NotFound(_)) => StatusCode::NOT_FOUND,
            ReportError::Artifact(ArtifactError::Forbidden(_)) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<tokio::task::JoinError> for ReportError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Processing(format!("Task join error: {}", err))
    }
}
