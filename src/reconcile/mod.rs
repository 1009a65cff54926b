pub mod diff;
pub mod error;
pub mod reconciler;
pub mod resource;

pub use diff::{Field, FieldDiff};
pub use error::ReconcileError;
pub use reconciler::{Convergence, CreateOutcome, Plan, Reconciler};
pub use resource::ResourceState;
