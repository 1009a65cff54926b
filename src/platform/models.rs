use serde::{Deserialize, Serialize};
use std::fmt;

/// A buildpack as the platform reports it.
///
/// `position`, `enabled` and `locked` are tri-state: `None` means the value
/// was never set, which the API treats differently from `false` or `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buildpack {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub filename: String,
    pub position: Option<i64>,
    pub enabled: Option<bool>,
    pub locked: Option<bool>,
}

/// Identifies which control plane (and as whom) a client talks to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity {
    pub api_endpoint: String,
    pub user: Option<String>,
}

impl ClientIdentity {
    pub fn new(api_endpoint: &str, user: Option<&str>) -> Self {
        Self {
            api_endpoint: api_endpoint.trim_end_matches('/').to_string(),
            user: user.map(str::to_string),
        }
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.user {
            Some(user) => write!(f, "{}@{}", user, self.api_endpoint),
            None => write!(f, "{}", self.api_endpoint),
        }
    }
}

/// Wire representation of a v2 list page
#[derive(Debug, Deserialize)]
pub(crate) struct BuildpackPage {
    pub next_url: Option<String>,
    #[serde(default)]
    pub resources: Vec<BuildpackResource>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BuildpackResource {
    pub metadata: ResourceMetadata,
    pub entity: BuildpackEntity,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResourceMetadata {
    pub guid: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct BuildpackEntity {
    pub name: String,
    #[serde(default, skip_serializing)]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

impl From<BuildpackResource> for Buildpack {
    fn from(resource: BuildpackResource) -> Self {
        Buildpack {
            guid: resource.metadata.guid,
            name: resource.entity.name,
            filename: resource.entity.filename.unwrap_or_default(),
            position: resource.entity.position,
            enabled: resource.entity.enabled,
            locked: resource.entity.locked,
        }
    }
}

/// Error body returned by the v2 API
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub description: String,
}
