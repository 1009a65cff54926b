use crate::artifact::ArtifactError;
use crate::platform::PlatformError;
use thiserror::Error;

/// Terminal failure of a reconcile operation
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A remote call failed
    #[error("Remote call failed: {0}")]
    Transport(PlatformError),

    /// The local artifact could not be named or packaged
    #[error("Local artifact error: {0}")]
    LocalResolution(#[from] ArtifactError),
}

impl From<PlatformError> for ReconcileError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Artifact(e) => ReconcileError::LocalResolution(e),
            e => ReconcileError::Transport(e),
        }
    }
}
