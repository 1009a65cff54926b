use crate::artifact::PackagedArtifact;
use crate::platform::error::PlatformError;
use crate::platform::models::{Buildpack, ClientIdentity};
use async_trait::async_trait;
use std::sync::Arc;

/// Client trait defining the operations the reconciler needs from the buildpack API
#[async_trait]
pub trait BuildpackClient: Send + Sync + 'static {
    /// Identity of the control plane this client talks to
    fn identity(&self) -> ClientIdentity;

    /// List every buildpack known to the platform
    async fn list(&self) -> Result<Vec<Buildpack>, PlatformError>;

    /// Find a buildpack by its unique name
    ///
    /// Returns `PlatformError::NotFound` when no buildpack has this name
    async fn find_by_name(&self, name: &str) -> Result<Buildpack, PlatformError>;

    /// Create a buildpack without bits
    async fn create(
        &self,
        name: &str,
        position: Option<i64>,
        enabled: Option<bool>,
        locked: Option<bool>,
    ) -> Result<Buildpack, PlatformError>;

    /// Replace the mutable fields of `buildpack` (keyed by its GUID)
    async fn update(&self, buildpack: &Buildpack) -> Result<Buildpack, PlatformError>;

    /// Delete a buildpack by GUID
    async fn delete(&self, guid: &str) -> Result<(), PlatformError>;

    /// Turn a local path or URL into an uploadable archive
    ///
    /// * `path` - Directory, zip file or web URL
    async fn package_artifact(&self, path: &str) -> Result<PackagedArtifact, PlatformError>;

    /// Upload bits for `buildpack` under `filename`
    async fn upload(
        &self,
        buildpack: &Buildpack,
        artifact: PackagedArtifact,
        filename: &str,
    ) -> Result<(), PlatformError>;
}

/// Implementation of BuildpackClient for Arc<T> where T implements BuildpackClient
///
/// Lets the applier and the tests share one client (and its call counters).
#[async_trait]
impl<T: BuildpackClient + ?Sized> BuildpackClient for Arc<T> {
    fn identity(&self) -> ClientIdentity {
        (**self).identity()
    }

    async fn list(&self) -> Result<Vec<Buildpack>, PlatformError> {
        (**self).list().await
    }

    async fn find_by_name(&self, name: &str) -> Result<Buildpack, PlatformError> {
        (**self).find_by_name(name).await
    }

    async fn create(
        &self,
        name: &str,
        position: Option<i64>,
        enabled: Option<bool>,
        locked: Option<bool>,
    ) -> Result<Buildpack, PlatformError> {
        (**self).create(name, position, enabled, locked).await
    }

    async fn update(&self, buildpack: &Buildpack) -> Result<Buildpack, PlatformError> {
        (**self).update(buildpack).await
    }

    async fn delete(&self, guid: &str) -> Result<(), PlatformError> {
        (**self).delete(guid).await
    }

    async fn package_artifact(&self, path: &str) -> Result<PackagedArtifact, PlatformError> {
        (**self).package_artifact(path).await
    }

    async fn upload(
        &self,
        buildpack: &Buildpack,
        artifact: PackagedArtifact,
        filename: &str,
    ) -> Result<(), PlatformError> {
        (**self).upload(buildpack, artifact, filename).await
    }
}
