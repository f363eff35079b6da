//! Errors returned while building Chronicle API requests

use thiserror::Error;

/// Failure to build a request or parse a resource name
#[derive(Error, Debug)]
pub enum Error {
    /// Get, activate and deactivate need a path that names a single resource
    #[error("missing resource value")]
    MissingResourceValue,

    /// `runParser` was called without a parser payload
    #[error("no cbn provided")]
    MissingPayload,

    #[error("failed to serialize request body")]
    Serialization(#[from] serde_json::Error),

    /// Fewer than the six tokens of `projects/{p}/locations/{l}/instances/{i}`
    #[error("malformed resource path {0:?}: expected at least 6 segments")]
    MalformedPath(String),

    #[error("invalid resource path {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;
