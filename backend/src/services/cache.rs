use crate::error::Result;
use crate::utils::{slug, stable_hash};
use log::{debug, warn};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Bounded key -> payload store with per-entry expiry.
///
/// Entries are replaced wholesale on `put`; a stale entry reads as a miss and
/// is dropped on that read.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, payload: String, ttl: Duration);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct CacheEntry {
    payload: String,
    written_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        self.written_at.elapsed() < self.ttl
    }
}

/// Process-lifetime LRU store.
pub struct MemoryCache {
    inner: Mutex<LruCache<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let Ok(mut cache) = self.inner.lock() else {
            return None;
        };

        let mut expired = false;
        let result = match cache.get(key) {
            Some(entry) if entry.is_fresh() => Some(entry.payload.clone()),
            Some(_) => {
                expired = true;
                None
            }
            None => None,
        };

        if expired {
            debug!("cache entry '{key}' expired");
            cache.pop(key);
        }

        result
    }

    fn put(&self, key: &str, payload: String, ttl: Duration) {
        if let Ok(mut cache) = self.inner.lock() {
            if let Some((evicted, _)) = cache.push(
                key.to_string(),
                CacheEntry {
                    payload,
                    written_at: Instant::now(),
                    ttl,
                },
            ) {
                if evicted != key {
                    debug!("cache full, evicted '{evicted}'");
                }
            }
        }
    }

    fn len(&self) -> usize {
        self.inner.lock().map(|cache| cache.len()).unwrap_or(0)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiskEnvelope {
    written_at_ms: u64,
    ttl_secs: u64,
    payload: String,
}

/// One JSON file per key. Freshness comes from the write time stored in the
/// file; at capacity the oldest-written file goes first.
pub struct DiskCache {
    dir: PathBuf,
    capacity: usize,
    write_lock: Mutex<()>,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>, capacity: usize) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            capacity: capacity.max(1),
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}-{:08x}.json", slug(key), stable_hash(key)))
    }

    fn entries(&self) -> Vec<(PathBuf, SystemTime)> {
        let Ok(read_dir) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        read_dir
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| {
                let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
                Some((path, modified))
            })
            .collect()
    }

    fn evict_for(&self, incoming: &Path) {
        let mut entries: Vec<_> = self
            .entries()
            .into_iter()
            .filter(|(path, _)| path != incoming)
            .collect();
        if entries.len() < self.capacity {
            return;
        }

        entries.sort_by_key(|(_, modified)| *modified);
        let excess = entries.len() + 1 - self.capacity;
        for (path, _) in entries.into_iter().take(excess) {
            debug!("cache full, evicting {}", path.display());
            if let Err(e) = fs::remove_file(&path) {
                warn!("failed to evict {}: {e}", path.display());
            }
        }
    }

    /// Removes `path` only if it still holds `observed`. Runs under the write
    /// lock so a concurrent `put` to the same key is never deleted.
    fn discard_if_unchanged(&self, path: &Path, observed: &[u8]) {
        let Ok(_guard) = self.write_lock.lock() else {
            return;
        };
        match fs::read(path) {
            Ok(current) if current == observed => {
                if let Err(e) = fs::remove_file(path) {
                    warn!("failed to discard {}: {e}", path.display());
                }
            }
            _ => debug!("{} rewritten since read, keeping it", path.display()),
        }
    }

    fn write_entry(&self, path: &Path, envelope: &DiskEnvelope) -> std::io::Result<()> {
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(envelope)?)?;
        fs::rename(&tmp, path)
    }
}

impl CacheStore for DiskCache {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        let raw = fs::read(&path).ok()?;

        let envelope: DiskEnvelope = match serde_json::from_slice(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("discarding unreadable cache file {}: {e}", path.display());
                self.discard_if_unchanged(&path, &raw);
                return None;
            }
        };

        let age_ms = now_ms().saturating_sub(envelope.written_at_ms);
        if age_ms >= envelope.ttl_secs.saturating_mul(1000) {
            debug!("cache file {} expired", path.display());
            self.discard_if_unchanged(&path, &raw);
            return None;
        }

        Some(envelope.payload)
    }

    fn put(&self, key: &str, payload: String, ttl: Duration) {
        let Ok(_guard) = self.write_lock.lock() else {
            return;
        };

        let path = self.path_for(key);
        self.evict_for(&path);

        let envelope = DiskEnvelope {
            written_at_ms: now_ms(),
            ttl_secs: ttl.as_secs(),
            payload,
        };
        if let Err(e) = self.write_entry(&path, &envelope) {
            warn!("cache write failed for {}: {e}", path.display());
        }
    }

    fn len(&self) -> usize {
        self.entries().len()
    }
}
