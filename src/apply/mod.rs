pub mod applier;
pub mod error;
pub mod report;

pub use applier::Applier;
pub use error::ApplyError;
pub use report::{ApplyReport, ResourceOutcome};

#[cfg(test)]
mod tests;
