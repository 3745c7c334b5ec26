// src/error.rs

use thiserror::Error;

use crate::readiness::FileState;

/// Errors that can escape the extraction pipeline.
///
/// The free-text paths (cleanup, line parse, query answering) never
/// fail by contract; everything here comes from the invoice row
/// grammar, the remote file lifecycle, or plain I/O, and each variant
/// names the stage so callers can tell a service failure from a
/// parsing one.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A line-item row matched the grammar but a numeric column
    /// refused to coerce.
    #[error("line item row failed numeric coercion: {row:?}")]
    RowCoercion { row: String },

    /// The remote service reported a terminal state for an uploaded
    /// file; it will never become usable.
    #[error("remote file {name:?} entered terminal state {state:?}")]
    Processing { name: String, state: FileState },

    /// The readiness wait gave up after the configured poll cap.
    #[error("remote file {name:?} still processing after {polls} polls")]
    PollLimit { name: String, polls: u32 },

    /// The model service answered with a non-success response.
    #[error("model service error during {stage}: {detail}")]
    Service { stage: &'static str, detail: String },

    #[error("http transport error")]
    Http(#[from] reqwest::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
