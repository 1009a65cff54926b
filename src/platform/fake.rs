use crate::artifact::PackagedArtifact;
use crate::platform::client::BuildpackClient;
use crate::platform::error::PlatformError;
use crate::platform::models::{Buildpack, ClientIdentity};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Kinds of remote call tracked by [`FakeBuildpackClient`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    List,
    FindByName,
    Create,
    Update,
    Delete,
    Package,
    Upload,
}

/// An upload received by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    pub guid: String,
    pub filename: String,
    pub artifact_path: PathBuf,
}

/// `FakeBuildpackClient` is an in-memory implementation of the `BuildpackClient` trait for testing purposes.
/// It counts every call, remembers what was sent and can be told to fail specific operations.
#[derive(Clone)]
pub struct FakeBuildpackClient {
    identity: ClientIdentity,
    buildpacks: Arc<Mutex<Vec<Buildpack>>>,
    calls: Arc<Mutex<HashMap<Call, usize>>>,
    updates: Arc<Mutex<Vec<Buildpack>>>,
    uploads: Arc<Mutex<Vec<RecordedUpload>>>,
    fail_calls: Arc<Mutex<HashSet<Call>>>,
}

#[allow(dead_code)]
impl FakeBuildpackClient {
    /// Create a new fake with an empty buildpack collection
    pub fn new() -> Self {
        Self::with_identity(ClientIdentity::new("https://api.fake.local", None))
    }

    pub fn with_identity(identity: ClientIdentity) -> Self {
        FakeBuildpackClient {
            identity,
            buildpacks: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(HashMap::new())),
            updates: Arc::new(Mutex::new(Vec::new())),
            uploads: Arc::new(Mutex::new(Vec::new())),
            fail_calls: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Seed a buildpack directly, bypassing call counting
    pub fn fake_add_buildpack(&self, buildpack: Buildpack) {
        self.buildpacks.lock().unwrap().push(buildpack);
    }

    /// Remove a buildpack out-of-band
    pub fn fake_remove_buildpack(&self, guid: &str) {
        self.buildpacks.lock().unwrap().retain(|b| b.guid != guid);
    }

    /// Change a buildpack out-of-band
    pub fn fake_modify_buildpack(&self, guid: &str, modify: impl FnOnce(&mut Buildpack)) {
        let mut buildpacks = self.buildpacks.lock().unwrap();
        if let Some(buildpack) = buildpacks.iter_mut().find(|b| b.guid == guid) {
            modify(buildpack);
        }
    }

    /// Make every subsequent call of this kind fail
    pub fn fake_fail(&self, call: Call) {
        self.fail_calls.lock().unwrap().insert(call);
    }

    /// Stop failing calls of this kind
    pub fn fake_reset_failure(&self, call: Call) {
        self.fail_calls.lock().unwrap().remove(&call);
    }

    /// Forget every recorded call
    pub fn fake_reset_calls(&self) {
        self.calls.lock().unwrap().clear();
        self.updates.lock().unwrap().clear();
        self.uploads.lock().unwrap().clear();
    }

    /// Number of calls of one kind
    pub fn call_count(&self, call: Call) -> usize {
        self.calls.lock().unwrap().get(&call).copied().unwrap_or(0)
    }

    /// Number of calls that change remote state
    pub fn write_count(&self) -> usize {
        [Call::Create, Call::Update, Call::Delete, Call::Upload]
            .iter()
            .map(|call| self.call_count(*call))
            .sum()
    }

    /// Payloads received by `update`, oldest first
    pub fn updates(&self) -> Vec<Buildpack> {
        self.updates.lock().unwrap().clone()
    }

    /// Uploads received, oldest first
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn buildpack(&self, guid: &str) -> Option<Buildpack> {
        self.buildpacks
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.guid == guid)
            .cloned()
    }

    fn record(&self, call: Call) -> Result<(), PlatformError> {
        *self.calls.lock().unwrap().entry(call).or_insert(0) += 1;
        if self.fail_calls.lock().unwrap().contains(&call) {
            return Err(PlatformError::Operation(format!(
                "Simulated failure for {:?}",
                call
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl BuildpackClient for FakeBuildpackClient {
    fn identity(&self) -> ClientIdentity {
        self.identity.clone()
    }

    async fn list(&self) -> Result<Vec<Buildpack>, PlatformError> {
        self.record(Call::List)?;
        Ok(self.buildpacks.lock().unwrap().clone())
    }

    async fn find_by_name(&self, name: &str) -> Result<Buildpack, PlatformError> {
        self.record(Call::FindByName)?;
        self.buildpacks
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.name == name)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("Buildpack {}", name)))
    }

    async fn create(
        &self,
        name: &str,
        position: Option<i64>,
        enabled: Option<bool>,
        locked: Option<bool>,
    ) -> Result<Buildpack, PlatformError> {
        self.record(Call::Create)?;
        let mut buildpacks = self.buildpacks.lock().unwrap();
        if buildpacks.iter().any(|b| b.name == name) {
            return Err(PlatformError::Api {
                status: 422,
                code: 290001,
                description: format!("The buildpack name is taken: {}", name),
            });
        }

        let buildpack = Buildpack {
            guid: Uuid::new_v4().to_string(),
            name: name.to_string(),
            filename: String::new(),
            position,
            enabled,
            locked,
        };
        buildpacks.push(buildpack.clone());
        Ok(buildpack)
    }

    async fn update(&self, buildpack: &Buildpack) -> Result<Buildpack, PlatformError> {
        self.record(Call::Update)?;
        self.updates.lock().unwrap().push(buildpack.clone());

        let mut buildpacks = self.buildpacks.lock().unwrap();
        let existing = buildpacks
            .iter_mut()
            .find(|b| b.guid == buildpack.guid)
            .ok_or_else(|| PlatformError::NotFound(format!("Buildpack {}", buildpack.guid)))?;
        existing.name = buildpack.name.clone();
        existing.position = buildpack.position;
        existing.enabled = buildpack.enabled;
        existing.locked = buildpack.locked;
        Ok(existing.clone())
    }

    async fn delete(&self, guid: &str) -> Result<(), PlatformError> {
        self.record(Call::Delete)?;
        let mut buildpacks = self.buildpacks.lock().unwrap();
        let before = buildpacks.len();
        buildpacks.retain(|b| b.guid != guid);
        if buildpacks.len() == before {
            return Err(PlatformError::NotFound(format!("Buildpack {}", guid)));
        }
        Ok(())
    }

    async fn package_artifact(&self, path: &str) -> Result<PackagedArtifact, PlatformError> {
        self.record(Call::Package)?;
        Ok(PackagedArtifact::existing(PathBuf::from(path), 0))
    }

    async fn upload(
        &self,
        buildpack: &Buildpack,
        artifact: PackagedArtifact,
        filename: &str,
    ) -> Result<(), PlatformError> {
        self.record(Call::Upload)?;
        self.uploads.lock().unwrap().push(RecordedUpload {
            guid: buildpack.guid.clone(),
            filename: filename.to_string(),
            artifact_path: artifact.path().to_path_buf(),
        });

        let mut buildpacks = self.buildpacks.lock().unwrap();
        let existing = buildpacks
            .iter_mut()
            .find(|b| b.guid == buildpack.guid)
            .ok_or_else(|| PlatformError::NotFound(format!("Buildpack {}", buildpack.guid)))?;
        existing.filename = filename.to_string();
        Ok(())
    }
}

impl Default for FakeBuildpackClient {
    fn default() -> Self {
        Self::new()
    }
}
