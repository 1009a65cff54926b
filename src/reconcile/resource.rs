use crate::artifact::{artifact_filename, ArtifactError};
use crate::config::{default_enabled, default_position, BuildpackConfig};
use crate::platform::Buildpack;
use serde::{Deserialize, Serialize};

/// Local view of one managed buildpack.
///
/// `name`, `path`, `position`, `enabled` and `locked` come from configuration on
/// every pass. `id` is the remote GUID (empty until created or adopted, cleared
/// when the record disappears remotely) and `filename` is computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    pub id: String,
    pub name: String,
    pub path: String,
    pub position: i64,
    pub enabled: bool,
    pub locked: bool,
    pub filename: String,
}

impl Default for ResourceState {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            path: String::new(),
            position: default_position(),
            enabled: default_enabled(),
            locked: false,
            filename: String::new(),
        }
    }
}

impl ResourceState {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn from_config(config: &BuildpackConfig) -> Self {
        Self {
            id: String::new(),
            name: config.name.clone(),
            path: config.path.clone().unwrap_or_default(),
            position: config.position,
            enabled: config.enabled,
            locked: config.locked,
            filename: String::new(),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    /// Whether the buildpack is known to exist remotely
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// Build the desired remote record, resolving the artifact filename
    ///
    /// The filename is empty exactly when `path` is empty.
    pub fn desired(&self) -> Result<Buildpack, ArtifactError> {
        let filename = if self.path.is_empty() {
            String::new()
        } else {
            artifact_filename(&self.path)?
        };

        Ok(Buildpack {
            guid: self.id.clone(),
            name: self.name.clone(),
            filename,
            position: Some(self.position),
            enabled: Some(self.enabled),
            locked: Some(self.locked),
        })
    }

    /// Copy observed values back, as a refresh does
    pub(crate) fn absorb(&mut self, observed: &Buildpack) {
        self.name = observed.name.clone();
        self.position = observed.position.unwrap_or_else(default_position);
        self.enabled = observed.enabled.unwrap_or_else(default_enabled);
        self.locked = observed.locked.unwrap_or(false);
        self.filename = if self.path.is_empty() {
            String::new()
        } else {
            observed.filename.clone()
        };
    }
}
