//! Value model error types.

use thiserror::Error;

/// Errors raised while manipulating runtime values.
#[derive(Debug, Error)]
pub enum Error {
    /// A property path tried to descend through a value that is not an object.
    #[error("cannot descend into non-object value at '{path}'")]
    NotAnObject { path: String },

    /// An empty property path was supplied.
    #[error("empty property path")]
    EmptyPath,

    /// JSON conversion failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
