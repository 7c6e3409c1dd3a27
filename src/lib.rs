//! Notes Orchestrator
//!
//! Agent-facing note and folder management for Slite:
//! - HTTP client with rate limiting and retry/backoff
//! - Local JSON registry mirroring the folder hierarchy
//! - TTL cache for notes and folder lookups
//! - Remote-first note manager emitting CRUD events
//! - MCP server exposing the operations as tools

pub mod cache;
pub mod error;
pub mod events;
pub mod logging;
pub mod mcp;
pub mod meeting;
pub mod notes;
pub mod registry;
pub mod resilience;
pub mod slite;

use anyhow::{Context, Result};
use cache::TtlCache;
use events::EventBus;
use logging::LogConfig;
use notes::NoteManager;
use registry::RegistryStore;
use resilience::{RateLimiter, RetryPolicy};
use serde::Deserialize;
use slite::SliteClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub slite: SliteYamlConfig,
    pub storage: StorageYamlConfig,
    pub retry: RetryYamlConfig,
    pub rate_limit: RateLimitYamlConfig,
    pub logging: LogConfig,
}

/// Remote service section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SliteYamlConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for SliteYamlConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: slite::DEFAULT_BASE_URL.into(),
        }
    }
}

/// Local files and cache lifetimes
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageYamlConfig {
    pub registry_path: PathBuf,
    pub cache_path: PathBuf,
    pub note_ttl_secs: u64,
    pub folder_ttl_secs: u64,
}

impl Default for StorageYamlConfig {
    fn default() -> Self {
        Self {
            registry_path: registry::store::DEFAULT_REGISTRY_FILE.into(),
            cache_path: cache::DEFAULT_CACHE_FILE.into(),
            note_ttl_secs: cache::NOTE_TTL.as_secs(),
            folder_ttl_secs: cache::FOLDER_TTL.as_secs(),
        }
    }
}

/// Retry/backoff section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryYamlConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_jitter_ms: u64,
}

impl Default for RetryYamlConfig {
    fn default() -> Self {
        Self {
            max_attempts: resilience::retry::DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: resilience::retry::DEFAULT_BASE_DELAY.as_millis() as u64,
            max_jitter_ms: resilience::retry::DEFAULT_MAX_JITTER.as_millis() as u64,
        }
    }
}

/// Rate limiter section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitYamlConfig {
    pub max_requests: usize,
    pub window_secs: u64,
}

impl Default for RateLimitYamlConfig {
    fn default() -> Self {
        Self {
            max_requests: resilience::rate_limiter::DEFAULT_MAX_REQUESTS,
            window_secs: resilience::rate_limiter::DEFAULT_TIME_WINDOW.as_secs(),
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub slite_api_key: Option<String>,
    pub slite_base_url: String,
    pub registry_path: PathBuf,
    pub cache_path: PathBuf,
    pub note_ttl: Duration,
    pub folder_ttl: Duration,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window: Duration,
    pub logging: LogConfig,
}

impl Config {
    /// Load configuration from environment variables only.
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. If the file doesn't
    /// exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        let mut logging = yaml.logging;
        if let Ok(file) = std::env::var("NOTES_LOG_FILE") {
            logging.file = Some(file.into());
        }

        Ok(Self {
            slite_api_key: std::env::var("SLITE_API_KEY")
                .ok()
                .or(yaml.slite.api_key)
                .filter(|k| !k.trim().is_empty()),
            slite_base_url: std::env::var("SLITE_BASE_URL").unwrap_or(yaml.slite.base_url),
            registry_path: std::env::var("NOTES_REGISTRY_PATH")
                .map(PathBuf::from)
                .unwrap_or(yaml.storage.registry_path),
            cache_path: std::env::var("NOTES_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or(yaml.storage.cache_path),
            note_ttl: Duration::from_secs(yaml.storage.note_ttl_secs),
            folder_ttl: Duration::from_secs(yaml.storage.folder_ttl_secs),
            max_attempts: env_parse("NOTES_MAX_ATTEMPTS")?.unwrap_or(yaml.retry.max_attempts),
            base_delay: Duration::from_millis(yaml.retry.base_delay_ms),
            max_jitter: Duration::from_millis(yaml.retry.max_jitter_ms),
            rate_limit_max_requests: env_parse("NOTES_RATE_LIMIT")?
                .unwrap_or(yaml.rate_limit.max_requests),
            rate_limit_window: Duration::from_secs(
                env_parse("NOTES_RATE_WINDOW_SECS")?.unwrap_or(yaml.rate_limit.window_secs),
            ),
            logging,
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts)
            .with_base_delay(self.base_delay)
            .with_max_jitter(self.max_jitter)
    }

    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.rate_limit_max_requests, self.rate_limit_window)
    }
}

/// Parse an optional numeric env var; a present but malformed value is an error
fn env_parse<T>(var: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} must be a number, got {:?}", var, raw)),
        Err(_) => Ok(None),
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<NoteManager>,
    pub events: EventBus,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build the client, open the registry and cache, and wire the event bus
    pub fn new(config: Config) -> Result<Self> {
        let api_key = config
            .slite_api_key
            .as_deref()
            .context("SLITE_API_KEY is not set (environment, .env or config.yaml)")?;

        let client = SliteClient::new(&config.slite_base_url, api_key)?
            .with_retry_policy(config.retry_policy())
            .with_rate_limiter(Arc::new(config.rate_limiter()));

        let registry = RegistryStore::open(&config.registry_path).with_context(|| {
            format!("cannot load registry {}", config.registry_path.display())
        })?;
        let cache = TtlCache::open(&config.cache_path);

        let events = EventBus::default();
        let manager = NoteManager::new(Arc::new(client), registry, cache)
            .with_cache_ttls(config.note_ttl, config.folder_ttl)
            .with_event_emitter(Arc::new(events.clone()));

        Ok(Self {
            manager: Arc::new(manager),
            events,
            config: Arc::new(config),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
