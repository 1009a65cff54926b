use crate::reconcile::ReconcileError;
use crate::state::StateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("Failed to reconcile buildpack {0}: {1}")]
    Reconcile(String, ReconcileError),

    #[error("Failed to access state: {0}")]
    State(#[from] StateError),

    #[error("Buildpack {0} is not managed")]
    NotManaged(String),

    #[error("{failed} of {total} buildpacks failed to reconcile")]
    Incomplete { failed: usize, total: usize },
}
