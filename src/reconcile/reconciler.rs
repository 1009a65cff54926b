use crate::cache::CollectionCache;
use crate::platform::{Buildpack, BuildpackClient, PlatformError};
use crate::reconcile::diff::{needs_upload, FieldDiff};
use crate::reconcile::error::ReconcileError;
use crate::reconcile::resource::ResourceState;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How `create` obtained its remote record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new record was created remotely
    Created,
    /// A record with the same name already existed and is now managed
    Adopted,
}

/// Remote writes performed by one convergence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Convergence {
    /// Fields sent through `update`; empty when no update was issued
    pub diff: FieldDiff,
    /// Whether the artifact was packaged and uploaded
    pub uploaded: bool,
}

impl Convergence {
    pub fn is_noop(&self) -> bool {
        self.diff.is_empty() && !self.uploaded
    }
}

/// What a reconcile pass would do, computed without remote writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Nothing known locally or remotely; a record will be created
    Create,
    /// A record with this name exists remotely and will be adopted
    Adopt {
        guid: String,
        diff: FieldDiff,
        reupload: bool,
    },
    /// The known record vanished remotely; it will be created again
    Recreate,
    /// The known record differs from the desired state
    Update { diff: FieldDiff, reupload: bool },
    /// Observed state already matches
    NoChange,
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plan::Create => write!(f, "create"),
            Plan::Adopt { guid, .. } => write!(f, "adopt {}", guid),
            Plan::Recreate => write!(f, "recreate (deleted remotely)"),
            Plan::Update { diff, reupload } => {
                write!(f, "update")?;
                if !diff.is_empty() {
                    write!(f, " [{}]", diff)?;
                }
                if *reupload {
                    write!(f, " + upload")?;
                }
                Ok(())
            }
            Plan::NoChange => write!(f, "no change"),
        }
    }
}

/// Converges one buildpack at a time against the remote platform
pub struct Reconciler<C: BuildpackClient> {
    client: C,
    cache: Arc<CollectionCache>,
}

impl<C: BuildpackClient> Reconciler<C> {
    pub fn new(client: C, cache: Arc<CollectionCache>) -> Self {
        Self { client, cache }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn cache(&self) -> &Arc<CollectionCache> {
        &self.cache
    }

    /// Whether a buildpack named `state.name` exists remotely.
    ///
    /// On a match `state.id` is set to the remote GUID.
    pub async fn exists(&self, state: &mut ResourceState) -> Result<bool, ReconcileError> {
        match self.find_existing(&state.name).await? {
            Some(found) => {
                state.id = found.guid;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Create the buildpack, or adopt one that already carries its name, then converge.
    pub async fn create(&self, state: &mut ResourceState) -> Result<CreateOutcome, ReconcileError> {
        let mut desired = state.desired()?;

        let (observed, outcome) = match self.find_existing(&desired.name).await? {
            Some(found) => {
                info!(
                    "Skipping creation of buildpack {}/{} because it already exists",
                    self.client.identity().api_endpoint,
                    desired.name
                );
                state.id = found.guid.clone();
                // The snapshot may predate the record; the name lookup is just as complete.
                let observed = self
                    .cache
                    .find_by_guid(&self.client, &found.guid)
                    .await?
                    .unwrap_or(found);
                (observed, CreateOutcome::Adopted)
            }
            None => {
                let created = self
                    .client
                    .create(
                        &desired.name,
                        desired.position,
                        desired.enabled,
                        desired.locked,
                    )
                    .await?;
                info!("Created buildpack {} ({})", created.name, created.guid);
                state.id = created.guid.clone();
                (created, CreateOutcome::Created)
            }
        };

        desired.guid = observed.guid.clone();
        self.converge(&observed, &desired, &state.path).await?;
        state.filename = desired.filename;
        Ok(outcome)
    }

    /// Refresh `state` from the remote record.
    ///
    /// A record missing remotely clears `state.id` and is not an error.
    pub async fn read(&self, state: &mut ResourceState) -> Result<(), ReconcileError> {
        match self.observe(state).await? {
            Some(observed) => state.absorb(&observed),
            None => self.forget(state),
        }
        Ok(())
    }

    /// Converge the existing remote record towards `state`.
    ///
    /// Returns `None` (and clears `state.id`) when the record vanished remotely.
    pub async fn update(
        &self,
        state: &mut ResourceState,
    ) -> Result<Option<Convergence>, ReconcileError> {
        let mut desired = state.desired()?;

        let Some(observed) = self.observe(state).await? else {
            self.forget(state);
            return Ok(None);
        };

        desired.guid = observed.guid.clone();
        let convergence = self.converge(&observed, &desired, &state.path).await?;
        state.filename = desired.filename;
        Ok(Some(convergence))
    }

    /// Delete the remote record. `state.id` is only cleared on success.
    pub async fn delete(&self, state: &mut ResourceState) -> Result<(), ReconcileError> {
        debug!("Deleting buildpack {} ({})", state.name, state.id);
        self.client.delete(&state.id).await?;
        info!("Deleted buildpack {} ({})", state.name, state.id);
        state.id.clear();
        Ok(())
    }

    /// Apply the minimal remote writes that take `from` to `to`.
    ///
    /// Any field difference sends the whole desired record in one update. The
    /// artifact is uploaded only when `to` names one that differs from `from`.
    pub async fn converge(
        &self,
        from: &Buildpack,
        to: &Buildpack,
        path: &str,
    ) -> Result<Convergence, ReconcileError> {
        let diff = FieldDiff::between(from, to);
        if !diff.is_empty() {
            info!("Updating buildpack {} ({}): {}", to.name, to.guid, diff);
            self.client.update(to).await?;
        }

        let uploaded = needs_upload(from, to);
        if uploaded {
            info!(
                "Uploading {} to buildpack {} (was {:?})",
                to.filename, to.name, from.filename
            );
            let artifact = self.client.package_artifact(path).await?;
            self.client.upload(to, artifact, &to.filename).await?;
        }

        Ok(Convergence { diff, uploaded })
    }

    /// Work out what a reconcile pass would do for `state` without writing anything
    pub async fn plan(&self, state: &ResourceState) -> Result<Plan, ReconcileError> {
        let desired = state.desired()?;

        if state.has_id() {
            return Ok(match self.observe(state).await? {
                None => Plan::Recreate,
                Some(observed) => {
                    let diff = FieldDiff::between(&observed, &desired);
                    let reupload = needs_upload(&observed, &desired);
                    if diff.is_empty() && !reupload {
                        Plan::NoChange
                    } else {
                        Plan::Update { diff, reupload }
                    }
                }
            });
        }

        Ok(match self.find_existing(&desired.name).await? {
            Some(found) => Plan::Adopt {
                diff: FieldDiff::between(&found, &desired),
                reupload: needs_upload(&found, &desired),
                guid: found.guid,
            },
            None => Plan::Create,
        })
    }

    async fn find_existing(&self, name: &str) -> Result<Option<Buildpack>, PlatformError> {
        match self.client.find_by_name(name).await {
            Ok(found) => Ok(Some(found)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn observe(&self, state: &ResourceState) -> Result<Option<Buildpack>, PlatformError> {
        self.cache.find_by_guid(&self.client, &state.id).await
    }

    fn forget(&self, state: &mut ResourceState) {
        warn!(
            "Removing buildpack {}/{} from state because it no longer exists",
            self.client.identity().api_endpoint,
            state.name
        );
        state.id.clear();
    }
}
