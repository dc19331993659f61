//! Pipeline error types.

use thiserror::Error;
use tokensync_session::SessionError;

/// Errors that escape a pipeline phase.
///
/// Per-chunk remote failures never surface here; they degrade to a partial
/// failure recorded on the pipeline state.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
