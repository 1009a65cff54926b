use crate::state::error::StateError;
use crate::state::models::StoredResource;
use async_trait::async_trait;
use std::sync::Arc;

/// StateStore trait defining how identities survive between reconcile runs
#[async_trait]
pub trait StateStore: Send + Sync + 'static {
    /// Load the stored identity for a buildpack name
    async fn load(&self, name: &str) -> Result<Option<StoredResource>, StateError>;

    /// Insert or replace the stored identity for `resource.name`
    async fn save(&self, resource: StoredResource) -> Result<(), StateError>;

    /// Forget a buildpack; removing an unknown name is not an error
    async fn remove(&self, name: &str) -> Result<(), StateError>;

    /// Every stored identity, ordered by name
    async fn list(&self) -> Result<Vec<StoredResource>, StateError>;

    /// Forget everything
    async fn clear_all(&self) -> Result<(), StateError>;
}

/// Implementation of StateStore trait for Arc<T> where T implements StateStore
///
/// This allows the applier and the caller to share one store instance.
#[async_trait]
impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    async fn load(&self, name: &str) -> Result<Option<StoredResource>, StateError> {
        (**self).load(name).await
    }

    async fn save(&self, resource: StoredResource) -> Result<(), StateError> {
        (**self).save(resource).await
    }

    async fn remove(&self, name: &str) -> Result<(), StateError> {
        (**self).remove(name).await
    }

    async fn list(&self) -> Result<Vec<StoredResource>, StateError> {
        (**self).list().await
    }

    async fn clear_all(&self) -> Result<(), StateError> {
        (**self).clear_all().await
    }
}
