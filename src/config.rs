use anyhow::{bail, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Environment variable consulted when `platform.access_token` is not set
pub const ACCESS_TOKEN_ENV: &str = "BPR_ACCESS_TOKEN";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub platform: PlatformConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub state: StateConfig,
    #[serde(default)]
    pub apply: ApplyConfig,
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub buildpacks: Vec<BuildpackConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    pub api_endpoint: String,
    pub access_token: Option<String>,
    pub user: Option<String>,
    #[serde(default)]
    pub skip_ssl_validation: bool,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl PlatformConfig {
    /// Token from the file, falling back to the environment
    pub fn resolve_access_token(&self) -> Option<String> {
        self.access_token
            .clone()
            .or_else(|| std::env::var(ACCESS_TOKEN_ENV).ok())
            .filter(|token| !token.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    pub ttl_seconds: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_seconds: Some(300),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    pub db_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplyConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub path: String,
    /// Size in MiB before the log file rolls
    pub size: u64,
    pub max_files: usize,
}

/// One declared buildpack
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildpackConfig {
    pub name: String,
    pub path: Option<String>,
    #[serde(default = "default_position")]
    pub position: i64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub locked: bool,
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_cache_capacity() -> usize {
    16
}

fn default_workers() -> usize {
    4
}

pub fn default_position() -> i64 {
    1
}

pub fn default_enabled() -> bool {
    true
}

impl Config {
    /// Reject configurations the reconciler cannot act on
    pub fn validate(&self) -> Result<()> {
        if self.apply.workers == 0 {
            bail!("apply.workers must be at least 1");
        }
        if self.cache.capacity == 0 {
            bail!("cache.capacity must be at least 1");
        }

        let mut names = HashSet::new();
        for buildpack in &self.buildpacks {
            if buildpack.name.trim().is_empty() {
                bail!("buildpack name must not be empty");
            }
            if buildpack.position < 1 {
                bail!(
                    "buildpack {} has position {}, positions start at 1",
                    buildpack.name,
                    buildpack.position
                );
            }
            if !names.insert(buildpack.name.as_str()) {
                bail!("buildpack {} is declared more than once", buildpack.name);
            }
        }
        Ok(())
    }
}

pub fn load_config(path: &str) -> Result<Config> {
    let config_text = fs::read_to_string(Path::new(path))?;
    let config: Config = toml::from_str(&config_text)?;
    config.validate()?;
    Ok(config)
}
