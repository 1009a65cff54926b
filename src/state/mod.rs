pub mod error;
pub mod fake;
pub mod models;
pub mod sqlite;
pub mod state_store;

pub use error::StateError;
#[allow(unused_imports)]
pub use fake::FakeStateStore;
pub use models::StoredResource;
pub use sqlite::SqliteStateStore;
pub use state_store::StateStore;

#[cfg(test)]
mod tests;
