use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while naming or packaging a local buildpack artifact
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// The path could not be resolved or does not exist
    #[error("Failed to resolve {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A regular file was given that is not a zip archive
    #[error("{0} is not a zip archive")]
    NotAnArchive(PathBuf),

    /// Zipping a directory failed
    #[error("Failed to package {0}: {1}")]
    Package(PathBuf, String),

    /// Downloading a remote artifact failed
    #[error("Failed to download {0}: {1}")]
    Download(String, String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
