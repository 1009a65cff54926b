use crate::state::error::StateError;
use crate::state::models::StoredResource;
use crate::state::state_store::StateStore;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// A fake in-memory implementation of the StateStore trait for testing
#[derive(Clone)]
pub struct FakeStateStore {
    resources: Arc<RwLock<BTreeMap<String, StoredResource>>>,
}

#[allow(dead_code)]
impl FakeStateStore {
    /// Create a new empty FakeStateStore
    pub fn new() -> Self {
        FakeStateStore {
            resources: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Seed a stored identity
    pub fn fake_add(&self, resource: StoredResource) {
        let mut resources = self.resources.write().unwrap();
        resources.insert(resource.name.clone(), resource);
    }
}

#[async_trait]
impl StateStore for FakeStateStore {
    async fn load(&self, name: &str) -> Result<Option<StoredResource>, StateError> {
        let resources = self.resources.read().unwrap();
        Ok(resources.get(name).cloned())
    }

    async fn save(&self, resource: StoredResource) -> Result<(), StateError> {
        let mut resources = self.resources.write().unwrap();
        resources.insert(resource.name.clone(), resource);
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<(), StateError> {
        let mut resources = self.resources.write().unwrap();
        resources.remove(name);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<StoredResource>, StateError> {
        let resources = self.resources.read().unwrap();
        Ok(resources.values().cloned().collect())
    }

    async fn clear_all(&self) -> Result<(), StateError> {
        let mut resources = self.resources.write().unwrap();
        resources.clear();
        Ok(())
    }
}

impl Default for FakeStateStore {
    fn default() -> Self {
        Self::new()
    }
}
