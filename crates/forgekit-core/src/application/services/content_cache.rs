//! Two-tier cache of rendered template output.
//!
//! Entries are keyed by template identity and the fingerprint of the render
//! context, and carry the hash of the template bytes they were rendered
//! from. The fingerprint covers every template variable, so a new year or
//! a new forgekit version is a different key. A lookup only hits when the
//! stored template hash still matches the template's current bytes, so an
//! edited template is re-rendered without any explicit invalidation.
//!
//! The memory tier lives as long as the [`ContentCache`] instance. The disk
//! tier is a directory of `<key>.json` files that survives until `clear` or
//! `cleanup`. Cache I/O problems are logged and treated as misses; they
//! never fail a render.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::application::ports::{Filesystem, TemplateSource};
use crate::domain::{RenderContext, TemplateId, sha256_hex};
use crate::error::ForgeResult;

const ENTRY_EXTENSION: &str = "json";

/// One cached render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub content: String,
    pub template_hash: String,
    pub context_hash: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

/// Snapshot of cache size and effectiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub memory_entries: usize,
    pub disk_entries: usize,
    pub total_bytes: u64,
    pub hits: u64,
    pub misses: u64,
}

/// Cache key for a (template, render context) pair.
pub fn cache_key(id: &TemplateId, context_hash: &str) -> String {
    sha256_hex(format!("{id}\n{context_hash}"))
}

/// Rendered-content cache with a memory tier and an on-disk mirror.
pub struct ContentCache {
    source: Arc<dyn TemplateSource>,
    fs: Arc<dyn Filesystem>,
    dir: PathBuf,
    memory: RwLock<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ContentCache {
    /// Create a cache whose disk tier lives in `dir`.
    ///
    /// The directory is created lazily on the first `put`.
    pub fn new(
        source: Arc<dyn TemplateSource>,
        fs: Arc<dyn Filesystem>,
        dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            fs,
            dir: dir.into(),
            memory: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Look up the rendered content of `id` for `context`.
    ///
    /// Returns `None` unless an entry exists whose template hash equals the
    /// hash of the template's current bytes. A deleted template is a miss.
    pub fn get(&self, id: &TemplateId, context: &RenderContext) -> Option<String> {
        let context_hash = context.fingerprint();
        let key = cache_key(id, &context_hash);

        let Ok(bytes) = self.source.read(id) else {
            return self.miss(id, "template unreadable");
        };
        let current = sha256_hex(&bytes);
        let is_fresh =
            |e: &CacheEntry| e.template_hash == current && e.context_hash == context_hash;

        if let Some(entry) = self.memory_get(&key).filter(is_fresh) {
            return self.hit(id, "memory", entry.content);
        }

        match self.disk_get(&key) {
            Some(entry) if is_fresh(&entry) => {
                let content = entry.content.clone();
                self.memory_put(key, entry);
                self.hit(id, "disk", content)
            }
            Some(_) => self.miss(id, "stale"),
            None => self.miss(id, "absent"),
        }
    }

    /// Store `content` as the render of `id` for `context` in both tiers.
    ///
    /// `template_hash` must be the hash of the exact bytes `content` was
    /// rendered from. Last write wins. A failed disk write only loses the
    /// disk copy.
    pub fn put(
        &self,
        id: &TemplateId,
        context: &RenderContext,
        template_hash: &str,
        content: &str,
    ) {
        let context_hash = context.fingerprint();
        let key = cache_key(id, &context_hash);
        let entry = CacheEntry {
            content: content.to_string(),
            template_hash: template_hash.to_string(),
            context_hash,
            created_at: chrono::Utc::now().timestamp_millis(),
        };

        if let Err(e) = self.disk_put(&key, &entry) {
            warn!(template = %id, error = %e, "Cache disk write failed");
        }
        self.memory_put(key, entry);
    }

    /// Empty both tiers. Returns the number of disk entries removed.
    #[instrument(skip_all, fields(dir = %self.dir.display()))]
    pub fn clear(&self) -> ForgeResult<usize> {
        match self.memory.write() {
            Ok(mut map) => map.clear(),
            Err(_) => warn!("Cache memory tier lock poisoned; skipping"),
        }

        let mut removed = 0;
        for path in self.disk_entries()? {
            match self.fs.remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Could not remove cache entry"),
            }
        }

        debug!(removed, "Cache cleared");
        Ok(removed)
    }

    /// Remove disk entries whose modification time is more than `max_age`
    /// in the past. The memory tier is not touched.
    #[instrument(skip_all, fields(max_age_secs = max_age.as_secs()))]
    pub fn cleanup(&self, max_age: Duration) -> usize {
        let entries = match self.disk_entries() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Cache cleanup could not list entries");
                return 0;
            }
        };

        let now = SystemTime::now();
        let mut removed = 0;

        for path in entries {
            let Ok(modified) = self.fs.modified(&path) else {
                continue;
            };
            let age = now.duration_since(modified).unwrap_or_default();
            if age <= max_age {
                continue;
            }
            match self.fs.remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Could not remove cache entry"),
            }
        }

        debug!(removed, "Cache cleanup finished");
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let memory_entries = self.memory.read().map(|m| m.len()).unwrap_or(0);
        let disk = self.disk_entries().unwrap_or_default();
        let total_bytes = disk
            .iter()
            .filter_map(|p| self.fs.file_size(p).ok())
            .sum();

        CacheStats {
            memory_entries,
            disk_entries: disk.len(),
            total_bytes,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    // ── Tiers ────────────────────────────────────────────────────────────

    fn memory_get(&self, key: &str) -> Option<CacheEntry> {
        self.memory.read().ok()?.get(key).cloned()
    }

    fn memory_put(&self, key: String, entry: CacheEntry) {
        match self.memory.write() {
            Ok(mut map) => {
                map.insert(key, entry);
            }
            Err(_) => warn!("Cache memory tier lock poisoned; entry not stored"),
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{ENTRY_EXTENSION}"))
    }

    fn disk_get(&self, key: &str) -> Option<CacheEntry> {
        let path = self.entry_path(key);
        if !self.fs.exists(&path) {
            return None;
        }

        let bytes = match self.fs.read_file(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cache entry unreadable");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Discarding corrupt cache entry");
                if let Err(e) = self.fs.remove_file(&path) {
                    debug!(error = %e, "Corrupt cache entry could not be removed");
                }
                None
            }
        }
    }

    fn disk_put(&self, key: &str, entry: &CacheEntry) -> ForgeResult<()> {
        self.fs.create_dir_all(&self.dir)?;
        let json = serde_json::to_vec(entry).map_err(|e| crate::error::ForgeError::Internal {
            message: format!("cache entry serialization failed: {e}"),
        })?;
        self.fs.write_file(&self.entry_path(key), &json)
    }

    fn disk_entries(&self) -> ForgeResult<Vec<PathBuf>> {
        if !self.fs.is_dir(&self.dir) {
            return Ok(Vec::new());
        }
        Ok(self
            .fs
            .list_dir(&self.dir)?
            .into_iter()
            .filter(|p| p.extension().is_some_and(|ext| ext == ENTRY_EXTENSION))
            .filter(|p| !self.fs.is_dir(p))
            .collect())
    }

    // ── Counters ─────────────────────────────────────────────────────────

    fn hit(&self, id: &TemplateId, tier: &str, content: String) -> Option<String> {
        self.hits.fetch_add(1, Ordering::Relaxed);
        debug!(template = %id, tier, "Cache hit");
        Some(content)
    }

    fn miss(&self, id: &TemplateId, reason: &str) -> Option<String> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(template = %id, reason, "Cache miss");
        None
    }
}

impl std::fmt::Debug for ContentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCache")
            .field("dir", &self.dir)
            .field("source", &self.source.describe())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_depends_on_template_and_config() {
        let a = TemplateId::new("base/package.json.tera").unwrap();
        let b = TemplateId::new("base/README.md.tera").unwrap();

        assert_eq!(cache_key(&a, "h1"), cache_key(&a, "h1"));
        assert_ne!(cache_key(&a, "h1"), cache_key(&a, "h2"));
        assert_ne!(cache_key(&a, "h1"), cache_key(&b, "h1"));
        assert_eq!(cache_key(&a, "h1").len(), 64);
    }

    #[test]
    fn entry_json_shape() {
        let entry = CacheEntry {
            content: "hello".into(),
            template_hash: "t".into(),
            context_hash: "c".into(),
            created_at: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["content"], "hello");
        assert_eq!(json["created_at"], 1_700_000_000_000_i64);

        let back: CacheEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
