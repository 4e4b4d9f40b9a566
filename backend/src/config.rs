use crate::catalog::Catalog;
use crate::error::KidVidError;
use crate::services::aggregator::{AggregationEngine, CachePolicy};
use crate::services::cache::{CacheStore, DiskCache, MemoryCache};
use crate::services::credentials::CredentialPool;
use crate::services::youtube_service::{YouTubeClient, DEFAULT_API_BASE};
use crate::AppState;
use anyhow::{Context, Result};
use env_logger::{Builder, Env};
use log::info;
use rocket::http::Method;
use rocket_cors::{AllowedHeaders, AllowedOrigins, CorsOptions};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Variables read for API keys, in priority order. `YT_API_KEYS` is a comma list.
const KEY_LIST_VAR: &str = "YT_API_KEYS";
const SINGLE_KEY_VARS: &[&str] = &[
    "YT_API_KEY_1",
    "YT_API_KEY_2",
    "YT_API_KEY_3",
    "YOUTUBE_API_KEY_1",
    "YOUTUBE_API_KEY_2",
    "YOUTUBE_API_KEY_3",
    "YT_API_KEY",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Disk,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "disk" | "file" => Ok(CacheBackend::Disk),
            other => Err(format!("unknown cache backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub api_keys: Vec<String>,
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub cache_backend: CacheBackend,
    pub cache_dir: PathBuf,
    pub cache_capacity: usize,
    pub search_ttl: Duration,
    pub feed_ttl: Duration,
    pub catalog_path: Option<PathBuf>,
    pub allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let policy = CachePolicy::default();
        Self {
            port: 10000,
            api_keys: Vec::new(),
            api_base_url: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(10),
            cache_backend: CacheBackend::Memory,
            cache_dir: PathBuf::from("cache"),
            cache_capacity: 500,
            search_ttl: policy.search_ttl,
            feed_ttl: policy.feed_ttl,
            catalog_path: None,
            allowed_origins: Vec::new(),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    lookup(name)
        .and_then(|raw| raw.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn split_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Gathers keys from every supported variable, keeping first occurrences only.
pub fn collect_api_keys(lookup: &impl Fn(&str) -> Option<String>) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    let listed = lookup(KEY_LIST_VAR).unwrap_or_default();
    let singles = SINGLE_KEY_VARS.iter().copied().filter_map(|name| lookup(name));

    for key in split_list(&listed).chain(singles.map(|k| k.trim().to_string())) {
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();
        Self {
            port: parse_or(&lookup, "PORT", defaults.port),
            api_keys: collect_api_keys(&lookup),
            api_base_url: lookup("YOUTUBE_API_BASE").unwrap_or(defaults.api_base_url),
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "UPSTREAM_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
            cache_backend: parse_or(&lookup, "CACHE_BACKEND", defaults.cache_backend),
            cache_dir: lookup("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            cache_capacity: parse_or(&lookup, "CACHE_CAPACITY", defaults.cache_capacity),
            search_ttl: Duration::from_secs(parse_or(
                &lookup,
                "SEARCH_CACHE_TTL_SECS",
                defaults.search_ttl.as_secs(),
            )),
            feed_ttl: Duration::from_secs(parse_or(
                &lookup,
                "FEED_CACHE_TTL_SECS",
                defaults.feed_ttl.as_secs(),
            )),
            catalog_path: lookup("CATALOG_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|raw| split_list(&raw).collect())
                .unwrap_or_default(),
        }
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            search_ttl: self.search_ttl,
            feed_ttl: self.feed_ttl,
        }
    }
}

pub fn init_logger() {
    Builder::from_env(Env::default().default_filter_or("info")).init();
    info!("Starting KidVid backend...");
}

pub fn load_environment() {
    dotenv::dotenv().ok();
}

pub fn create_cache(config: &Config) -> Result<Arc<dyn CacheStore>> {
    Ok(match config.cache_backend {
        CacheBackend::Memory => Arc::new(MemoryCache::new(config.cache_capacity)),
        CacheBackend::Disk => {
            let cache = DiskCache::new(&config.cache_dir, config.cache_capacity)
                .with_context(|| format!("cache dir {}", config.cache_dir.display()))?;
            info!("Cache dir: {}", cache.dir().display());
            Arc::new(cache)
        }
    })
}

pub fn load_catalog(config: &Config) -> Result<Catalog> {
    match &config.catalog_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading catalog {}", path.display()))?;
            let catalog = Catalog::from_json(&raw)
                .with_context(|| format!("parsing catalog {}", path.display()))?;
            info!("Loaded {} buckets from {}", catalog.buckets.len(), path.display());
            Ok(catalog)
        }
        None => Ok(Catalog::default()),
    }
}

/// Fails with `NoCredentialsConfigured` when no key was supplied, so a
/// misconfigured deployment never starts serving.
pub fn create_app_state(config: &Config) -> Result<AppState> {
    let credentials = Arc::new(CredentialPool::new(config.api_keys.clone())?);
    info!("Loaded {} YouTube API keys", credentials.len());

    let youtube = Arc::new(YouTubeClient::new(
        credentials,
        config.api_base_url.clone(),
        config.request_timeout,
    )?);
    let cache = create_cache(config)?;
    let catalog = load_catalog(config)?;

    let engine = AggregationEngine::new(youtube.clone(), cache, catalog, config.cache_policy());
    info!(
        "Cache backend: {:?} (capacity {}, search TTL {}s, feed TTL {}s)",
        config.cache_backend,
        config.cache_capacity,
        config.search_ttl.as_secs(),
        config.feed_ttl.as_secs()
    );

    Ok(AppState {
        engine: Arc::new(engine),
        youtube,
    })
}

pub fn create_cors(config: &Config) -> Result<rocket_cors::Cors> {
    let allowed_origins = if config.allowed_origins.is_empty() {
        AllowedOrigins::all()
    } else {
        AllowedOrigins::some_exact(config.allowed_origins.as_slice())
    };

    let cors = CorsOptions::default()
        .allowed_origins(allowed_origins)
        .allowed_methods(
            vec![Method::Get, Method::Options]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allowed_headers(AllowedHeaders::some(&["Accept", "Content-Type"]))
        .to_cors()
        .map_err(|e| anyhow::anyhow!("Failed to create CORS options: {}", e))?;

    Ok(cors)
}

/// True when `e` is the boot-time "no keys" failure.
pub fn is_missing_credentials(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<KidVidError>(),
        Some(KidVidError::NoCredentialsConfigured)
    )
}
