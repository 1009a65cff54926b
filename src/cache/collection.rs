use crate::config::CacheConfig;
use crate::platform::{Buildpack, BuildpackClient, ClientIdentity, PlatformError};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

struct CachedCollection {
    buildpacks: Arc<Vec<Buildpack>>,
    fetched_at: Instant,
}

/// Snapshot of the remote buildpack collection, one per client identity.
///
/// The first lookup for an identity lists the whole collection; later lookups
/// are served from the snapshot until it expires or is invalidated. Writes made
/// through the client do not refresh the snapshot.
pub struct CollectionCache {
    entries: Mutex<LruCache<ClientIdentity, CachedCollection>>,
    ttl: Option<Duration>,
}

impl CollectionCache {
    /// Create a cache holding at most `capacity` identities
    ///
    /// * `ttl` - Age after which a snapshot is refetched; `None` keeps it for the process lifetime
    pub fn new(capacity: NonZeroUsize, ttl: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self::new(capacity, config.ttl_seconds.map(Duration::from_secs))
    }

    /// Return the cached collection for `client`, listing it on a miss.
    ///
    /// The lock is held while listing so concurrent callers share one fetch.
    pub async fn buildpacks<C: BuildpackClient + ?Sized>(
        &self,
        client: &C,
    ) -> Result<Arc<Vec<Buildpack>>, PlatformError> {
        let identity = client.identity();
        let mut entries = self.entries.lock().await;

        if let Some(cached) = entries.get(&identity) {
            if !self.is_expired(cached) {
                debug!("Cache hit for buildpacks of {}", identity);
                return Ok(cached.buildpacks.clone());
            }
            debug!("Cached buildpacks of {} expired", identity);
        }

        debug!("Listing buildpacks of {}", identity);
        let buildpacks = Arc::new(client.list().await?);
        entries.put(
            identity,
            CachedCollection {
                buildpacks: buildpacks.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(buildpacks)
    }

    /// Look a buildpack up by GUID; `None` when the snapshot has no such record
    pub async fn find_by_guid<C: BuildpackClient + ?Sized>(
        &self,
        client: &C,
        guid: &str,
    ) -> Result<Option<Buildpack>, PlatformError> {
        if guid.is_empty() {
            return Ok(None);
        }
        let buildpacks = self.buildpacks(client).await?;
        Ok(buildpacks.iter().find(|b| b.guid == guid).cloned())
    }

    /// Look a buildpack up by name; `None` when the snapshot has no such record
    #[allow(dead_code)]
    pub async fn find_by_name<C: BuildpackClient + ?Sized>(
        &self,
        client: &C,
        name: &str,
    ) -> Result<Option<Buildpack>, PlatformError> {
        let buildpacks = self.buildpacks(client).await?;
        Ok(buildpacks.iter().find(|b| b.name == name).cloned())
    }

    /// Drop the snapshot of one identity so the next lookup refetches it
    pub async fn invalidate(&self, identity: &ClientIdentity) {
        if self.entries.lock().await.pop(identity).is_some() {
            debug!("Invalidated cached buildpacks of {}", identity);
        }
    }

    /// Drop every snapshot
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Whether a fresh snapshot exists for `identity`
    #[allow(dead_code)]
    pub async fn contains(&self, identity: &ClientIdentity) -> bool {
        let entries = self.entries.lock().await;
        entries
            .peek(identity)
            .map(|cached| !self.is_expired(cached))
            .unwrap_or(false)
    }

    fn is_expired(&self, cached: &CachedCollection) -> bool {
        self.ttl
            .map(|ttl| cached.fetched_at.elapsed() >= ttl)
            .unwrap_or(false)
    }
}
