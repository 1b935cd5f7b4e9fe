//! Disk-based request-level image cache for persistence across sessions.
//!
//! Each entry is a pair of files named after the request's cache key hash:
//! `<hash>.img` with the raw body and `<hash>.json` with the request and
//! response metadata.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bytes::Bytes;
use chrono::Utc;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tracing::{debug, trace, warn};

use super::http_cache::CachedResponse;
use crate::domain::entities::{PhotoImage, RequestIdentity, ResponseMetadata, decode_image};
use crate::domain::errors::CacheResult;
use crate::domain::ports::RequestImageCache;

/// Maximum disk cache size in bytes (200 MB default).
pub const DEFAULT_MAX_CACHE_SIZE: u64 = 200 * 1024 * 1024;

const BODY_EXT: &str = "img";
const META_EXT: &str = "json";

/// Body bytes and entry count on disk.
#[derive(Debug, Default)]
struct DiskUsage {
    size: u64,
    count: usize,
}

impl DiskUsage {
    fn release(&mut self, size: u64) {
        self.size = self.size.saturating_sub(size);
        self.count = self.count.saturating_sub(1);
    }
}

/// Disk-based cache that persists raw response bodies per request.
///
/// Every change to the files goes through the `usage` lock, so the counters
/// always describe what is on disk.
pub struct DiskImageCache {
    cache_dir: PathBuf,
    max_size: u64,
    usage: Mutex<DiskUsage>,
}

impl DiskImageCache {
    /// Creates a new disk cache in the specified directory.
    ///
    /// # Errors
    /// Returns error if the cache directory cannot be created or read.
    pub fn new(cache_dir: PathBuf, max_size: u64) -> CacheResult<Self> {
        fs::create_dir_all(&cache_dir)?;

        let mut usage = DiskUsage::default();
        for entry in fs::read_dir(&cache_dir)?.flatten() {
            let path = entry.path();
            if has_ext(&path, BODY_EXT)
                && let Ok(meta) = entry.metadata()
            {
                usage.size += meta.len();
                usage.count += 1;
            }
        }

        let cache = Self {
            cache_dir,
            max_size,
            usage: Mutex::new(usage),
        };

        cache.cleanup_if_needed(&mut cache.usage.lock());

        Ok(cache)
    }

    /// Returns the cache directory.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_stem(request: &RequestIdentity) -> String {
        let digest = Sha256::digest(request.cache_key().as_bytes());
        hex::encode(&digest[..16])
    }

    fn body_path(&self, request: &RequestIdentity) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{BODY_EXT}", Self::entry_stem(request)))
    }

    fn meta_path(&self, request: &RequestIdentity) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{META_EXT}", Self::entry_stem(request)))
    }

    /// Returns the stored body for `request`, if the entry still serves it.
    #[must_use]
    pub fn data_for_request(&self, request: &RequestIdentity) -> Option<Bytes> {
        let meta_path = self.meta_path(request);
        let Ok(raw) = fs::read(&meta_path) else {
            trace!(request = %request, "Disk cache miss");
            return None;
        };

        let record: CachedResponse = match serde_json::from_slice(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(path = %meta_path.display(), error = %e, "Corrupt cache metadata");
                self.remove_image_for_request(request);
                return None;
            }
        };

        if !record.matches(request) {
            trace!(request = %request, "Disk cache vary mismatch");
            return None;
        }
        if !record.is_fresh(Utc::now()) {
            debug!(request = %request, "Dropping stale disk cache entry");
            self.remove_image_for_request(request);
            return None;
        }

        let body_path = self.body_path(request);
        let bytes = fs::read(&body_path).ok()?;
        touch(&body_path);
        trace!(request = %request, path = %body_path.display(), "Disk cache hit");
        Some(Bytes::from(bytes))
    }

    /// Stores a response on disk.
    ///
    /// # Errors
    /// Returns error if either file cannot be written.
    pub fn store(
        &self,
        data: &[u8],
        record: &CachedResponse,
        request: &RequestIdentity,
    ) -> CacheResult<()> {
        let metadata = serde_json::to_vec(record)?;
        let body_path = self.body_path(request);

        let mut usage = self.usage.lock();
        if let Ok(old) = fs::metadata(&body_path) {
            usage.release(old.len());
        }

        let written = fs::write(&body_path, data)
            .and_then(|()| fs::write(self.meta_path(request), &metadata));
        if let Err(e) = written {
            let _ = fs::remove_file(&body_path);
            let _ = fs::remove_file(self.meta_path(request));
            return Err(e.into());
        }

        usage.size += data.len() as u64;
        usage.count += 1;

        debug!(request = %request, path = %body_path.display(), size = data.len(), "Stored response in disk cache");

        self.cleanup_if_needed(&mut usage);

        Ok(())
    }

    /// Returns the current body bytes on disk.
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.usage.lock().size
    }

    /// Returns the number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.usage.lock().count
    }

    /// Returns true if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if an entry exists for `request`, fresh or not.
    #[must_use]
    pub fn contains(&self, request: &RequestIdentity) -> bool {
        self.body_path(request).exists()
    }

    /// Removes both files of an entry. Caller holds the usage lock.
    fn remove_entry(body_path: &Path, usage: &mut DiskUsage) -> bool {
        let size = fs::metadata(body_path).map(|m| m.len()).ok();
        let _ = fs::remove_file(body_path.with_extension(META_EXT));
        match (fs::remove_file(body_path), size) {
            (Ok(()), Some(size)) => {
                usage.release(size);
                true
            }
            (Ok(()), None) => false,
            (Err(e), _) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %body_path.display(), error = %e, "Failed to remove cache file");
                }
                false
            }
        }
    }

    /// Deletes least recently used entries until the cache is back under
    /// 90% of its budget.
    fn cleanup_if_needed(&self, usage: &mut DiskUsage) {
        if usage.size <= self.max_size {
            return;
        }

        debug!(
            current_size = usage.size,
            max_size = self.max_size,
            "Disk cache over limit, cleaning up"
        );

        let Ok(entries) = fs::read_dir(&self.cache_dir) else {
            return;
        };

        let mut files: Vec<(PathBuf, SystemTime)> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| has_ext(path, BODY_EXT))
            .filter_map(|path| {
                let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
                Some((path, modified))
            })
            .collect();

        files.sort_by_key(|(_, time)| *time);

        let target = self.max_size - self.max_size / 10;
        let mut freed_count = 0usize;

        for (path, _) in files {
            if usage.size <= target {
                break;
            }
            if Self::remove_entry(&path, usage) {
                debug!(path = %path.display(), "Removed old cache entry");
                freed_count += 1;
            }
        }

        debug!(
            current_size = usage.size,
            freed_count = freed_count,
            "Disk cache cleanup complete"
        );
    }
}

impl RequestImageCache for DiskImageCache {
    fn image_for_request(&self, request: &RequestIdentity) -> Option<PhotoImage> {
        let bytes = self.data_for_request(request)?;
        match decode_image(&bytes) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(request = %request, error = %e, "Failed to decode cached image");
                self.remove_image_for_request(request);
                None
            }
        }
    }

    fn set_image_data(&self, data: Bytes, response: &ResponseMetadata, request: &RequestIdentity) {
        let Some(record) = CachedResponse::storable(request, response) else {
            debug!(request = %request, status = response.status, "Response not storable");
            return;
        };
        if let Err(e) = self.store(&data, &record, request) {
            warn!(request = %request, error = %e, "Failed to cache to disk");
        }
    }

    fn remove_image_for_request(&self, request: &RequestIdentity) {
        let mut usage = self.usage.lock();
        if Self::remove_entry(&self.body_path(request), &mut usage) {
            debug!(request = %request, "Evicted from disk cache");
        }
    }

    fn remove_all_images(&self) {
        let mut usage = self.usage.lock();
        let Ok(entries) = fs::read_dir(&self.cache_dir) else {
            warn!(path = %self.cache_dir.display(), "Failed to read cache dir");
            return;
        };
        for path in entries.flatten().map(|entry| entry.path()) {
            if has_ext(&path, BODY_EXT) {
                Self::remove_entry(&path, &mut usage);
            } else if has_ext(&path, META_EXT) && fs::remove_file(&path).is_err() {
                warn!(path = %path.display(), "Failed to remove cache file");
            }
        }
        debug!(remaining = usage.count, "Cleared disk cache");
    }
}

fn has_ext(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e == ext)
}

/// Bumps the modification time so cleanup treats the entry as recently used.
fn touch(path: &Path) {
    if let Ok(file) = fs::File::options().append(true).open(path) {
        let _ = file.set_modified(SystemTime::now());
    }
}

/// Returns the default cache directory path.
#[must_use]
pub fn default_cache_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "photo-gallery", "photo-gallery").map_or_else(
        || {
            std::env::temp_dir()
                .join("photo-gallery")
                .join("cache")
                .join("images")
        },
        |dirs| dirs.cache_dir().join("images"),
    )
}
