use crate::artifact::ArtifactError;
use thiserror::Error;

/// Errors returned by the remote buildpack API
#[derive(Error, Debug)]
pub enum PlatformError {
    /// No record matched the requested name or GUID
    #[error("{0} not found")]
    NotFound(String),

    /// The request never produced a response
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API error (status {status}, code {code}): {description}")]
    Api {
        status: u16,
        code: i64,
        description: String,
    },

    /// A response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Client configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The local artifact could not be packaged
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// Failure injected by a test double
    #[error("Operation error: {0}")]
    Operation(String),
}

impl PlatformError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, PlatformError::NotFound(_))
    }
}
