use crate::apply::error::ApplyError;
use crate::apply::report::{ApplyReport, ResourceOutcome};
use crate::cache::CollectionCache;
use crate::config::{ApplyConfig, BuildpackConfig};
use crate::platform::BuildpackClient;
use crate::reconcile::{CreateOutcome, Plan, ReconcileError, Reconciler, ResourceState};
use crate::state::{StateStore, StoredResource};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Runs reconcile passes over every declared buildpack and keeps their identities
pub struct Applier<C: BuildpackClient, S: StateStore> {
    reconciler: Reconciler<C>,
    store: S,
    workers: usize,
}

impl<C: BuildpackClient, S: StateStore> Applier<C, S> {
    pub fn new(client: C, store: S, cache: Arc<CollectionCache>, config: &ApplyConfig) -> Self {
        Self {
            reconciler: Reconciler::new(client, cache),
            store,
            workers: config.workers.max(1),
        }
    }

    pub fn reconciler(&self) -> &Reconciler<C> {
        &self.reconciler
    }

    /// Converge every buildpack, up to `workers` at a time.
    ///
    /// A failing buildpack is recorded in the report and does not stop the others.
    pub async fn apply(&self, buildpacks: &[BuildpackConfig]) -> ApplyReport {
        info!(
            "Reconciling {} buildpacks with {} workers",
            buildpacks.len(),
            self.workers
        );

        let mut outcomes: Vec<(String, ResourceOutcome)> = stream::iter(buildpacks)
            .map(|config| async move {
                let outcome = match self.apply_one(config).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!("{}", e);
                        ResourceOutcome::Failed(e.to_string())
                    }
                };
                (config.name.clone(), outcome)
            })
            .buffer_unordered(self.workers)
            .collect()
            .await;
        outcomes.sort_by(|a, b| a.0.cmp(&b.0));

        let report = ApplyReport { outcomes };
        if report.wrote() {
            self.reconciler
                .cache()
                .invalidate(&self.reconciler.client().identity())
                .await;
        }
        info!("Reconcile finished: {}", report);
        report
    }

    async fn apply_one(&self, config: &BuildpackConfig) -> Result<ResourceOutcome, ApplyError> {
        let mut state = ResourceState::from_config(config);
        let mut uploaded = String::new();
        if let Some(stored) = self.store.load(&config.name).await? {
            debug!("Buildpack {} is stored as {}", stored.name, stored.guid);
            state.id = stored.guid;
            uploaded = stored.filename;
        }

        match self.converge(&mut state).await {
            Ok(outcome) => {
                self.store.save(StoredResource::from_state(&state)).await?;
                Ok(outcome)
            }
            Err(e) => {
                // A record created before the failure must stay tracked
                if state.has_id() {
                    warn!(
                        "Keeping identity {} of buildpack {} after failure",
                        state.id, state.name
                    );
                    self.store
                        .save(StoredResource::new(&state.name, &state.id, &uploaded))
                        .await?;
                }
                Err(ApplyError::Reconcile(config.name.clone(), e))
            }
        }
    }

    async fn converge(&self, state: &mut ResourceState) -> Result<ResourceOutcome, ReconcileError> {
        let converged = if state.has_id() {
            self.reconciler.update(state).await?
        } else {
            None
        };

        Ok(match converged {
            Some(convergence) if convergence.is_noop() => ResourceOutcome::Unchanged,
            Some(_) => ResourceOutcome::Updated,
            None => match self.reconciler.create(state).await? {
                CreateOutcome::Created => ResourceOutcome::Created,
                CreateOutcome::Adopted => ResourceOutcome::Adopted,
            },
        })
    }

    /// What `apply` would do for each buildpack, in declaration order
    pub async fn plan(
        &self,
        buildpacks: &[BuildpackConfig],
    ) -> Result<Vec<(String, Plan)>, ApplyError> {
        let mut plans = Vec::with_capacity(buildpacks.len());
        for config in buildpacks {
            let mut state = ResourceState::from_config(config);
            if let Some(stored) = self.store.load(&config.name).await? {
                state.id = stored.guid;
            }
            let plan = self
                .reconciler
                .plan(&state)
                .await
                .map_err(|e| ApplyError::Reconcile(config.name.clone(), e))?;
            plans.push((config.name.clone(), plan));
        }
        Ok(plans)
    }

    /// Refresh one managed buildpack from the platform.
    ///
    /// The stored identity is dropped when the record vanished remotely.
    pub async fn read(
        &self,
        name: &str,
        config: Option<&BuildpackConfig>,
    ) -> Result<ResourceState, ApplyError> {
        let stored = self
            .store
            .load(name)
            .await?
            .ok_or_else(|| ApplyError::NotManaged(name.to_string()))?;

        let mut state = config
            .map(ResourceState::from_config)
            .unwrap_or_else(|| ResourceState::new(name))
            .with_id(&stored.guid);
        self.reconciler
            .read(&mut state)
            .await
            .map_err(|e| ApplyError::Reconcile(name.to_string(), e))?;

        if !state.has_id() {
            self.store.remove(name).await?;
        }
        Ok(state)
    }

    /// GUID of the remote buildpack carrying `name`, if any
    pub async fn exists(&self, name: &str) -> Result<Option<String>, ApplyError> {
        let mut state = ResourceState::new(name);
        let found = self
            .reconciler
            .exists(&mut state)
            .await
            .map_err(|e| ApplyError::Reconcile(name.to_string(), e))?;
        Ok(found.then_some(state.id))
    }

    /// Delete one managed buildpack and forget its identity
    pub async fn delete(&self, name: &str) -> Result<(), ApplyError> {
        let stored = self
            .store
            .load(name)
            .await?
            .ok_or_else(|| ApplyError::NotManaged(name.to_string()))?;

        let mut state = ResourceState::new(name).with_id(&stored.guid);
        match self.reconciler.delete(&mut state).await {
            Ok(()) => {}
            Err(ReconcileError::Transport(e)) if e.is_not_found() => {
                warn!("Buildpack {} ({}) was already deleted", name, stored.guid);
            }
            Err(e) => return Err(ApplyError::Reconcile(name.to_string(), e)),
        }
        self.reconciler
            .cache()
            .invalidate(&self.reconciler.client().identity())
            .await;

        self.store.remove(name).await?;
        Ok(())
    }

    /// Every stored identity, ordered by name
    pub async fn managed(&self) -> Result<Vec<StoredResource>, ApplyError> {
        Ok(self.store.list().await?)
    }

    /// Forget every stored identity and cached collection
    pub async fn reset(&self) -> Result<(), ApplyError> {
        self.store.clear_all().await?;
        self.reconciler.cache().clear().await;
        Ok(())
    }
}
