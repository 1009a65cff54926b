use crate::reconcile::ResourceState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted identity of one managed buildpack, keyed by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResource {
    pub name: String,
    /// Remote GUID
    pub guid: String,
    /// Last uploaded artifact filename, empty when no artifact is managed
    pub filename: String,
    pub updated_at: DateTime<Utc>,
}

impl StoredResource {
    pub fn new(name: &str, guid: &str, filename: &str) -> Self {
        Self {
            name: name.to_string(),
            guid: guid.to_string(),
            filename: filename.to_string(),
            updated_at: Utc::now(),
        }
    }

    pub fn from_state(state: &ResourceState) -> Self {
        Self::new(&state.name, &state.id, &state.filename)
    }
}
