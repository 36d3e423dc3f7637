//! Image cache with reuse-count eviction
//!
//! Every access ages the entries it does not touch; a hit resets the touched
//! entry to zero. When the cache is full the oldest entry goes first. Paths
//! that failed to load are remembered and never retried.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{DecodedImage, ImageLoader};

/// Cache key for images
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageKey {
    /// Resolved file path
    pub path: PathBuf,
    /// Requested width, `None` = derived or original
    pub width: Option<u32>,
    /// Requested height, `None` = derived or original
    pub height: Option<u32>,
}

struct CacheEntry {
    key: ImageKey,
    image: Arc<DecodedImage>,
    /// Accesses to other entries since this one was last used
    counter: u32,
}

/// Per-skin image cache
pub struct ImageCache {
    entries: Vec<CacheEntry>,
    failed: HashSet<PathBuf>,
    capacity: usize,
    base_path: PathBuf,
    loader: Box<dyn ImageLoader>,
    hits: u64,
    misses: u64,
}

impl ImageCache {
    /// Default number of cached images
    pub const DEFAULT_CAPACITY: usize = 100;

    /// `base_path` resolves relative image paths
    pub fn new(loader: Box<dyn ImageLoader>, base_path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            failed: HashSet::new(),
            capacity: capacity.max(1),
            base_path: base_path.into(),
            loader,
            hits: 0,
            misses: 0,
        }
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() { p.to_path_buf() } else { self.base_path.join(p) }
    }

    /// Get an image, loading and scaling it on a miss
    pub fn get(&mut self, path: &str, width: Option<u32>, height: Option<u32>) -> Option<Arc<DecodedImage>> {
        let key = ImageKey {
            path: self.resolve(path),
            width,
            height,
        };

        let found = self.entries.iter().position(|e| e.key == key);
        for (i, entry) in self.entries.iter_mut().enumerate() {
            if Some(i) == found {
                entry.counter = 0;
            } else {
                entry.counter = entry.counter.saturating_add(1);
            }
        }
        if let Some(i) = found {
            self.hits += 1;
            return Some(Arc::clone(&self.entries[i].image));
        }

        self.misses += 1;
        if self.failed.contains(&key.path) {
            return None;
        }

        let image = match self.loader.load(&key.path) {
            Ok(image) if image.frame_count() > 0 => image,
            Ok(_) => {
                tracing::warn!("Image {} has no frames", key.path.display());
                self.failed.insert(key.path);
                return None;
            }
            Err(err) => {
                tracing::warn!("Failed to load image {}: {}", key.path.display(), err);
                self.failed.insert(key.path);
                return None;
            }
        };
        let image = if width.is_some() || height.is_some() { image.resized(width, height) } else { image };
        let image = Arc::new(image);

        if self.entries.len() >= self.capacity {
            self.evict();
        }
        self.entries.push(CacheEntry {
            key,
            image: Arc::clone(&image),
            counter: 0,
        });
        Some(image)
    }

    /// Drop the entry with the highest counter; ties go to the oldest
    fn evict(&mut self) {
        let victim = self
            .entries
            .iter()
            .enumerate()
            .rev()
            .max_by_key(|(_, e)| e.counter)
            .map(|(i, _)| i);
        if let Some(i) = victim {
            let entry = self.entries.remove(i);
            tracing::debug!("Evicted {} from image cache", entry.key.path.display());
        }
    }

    /// True when an entry for this path and scale is cached
    pub fn contains(&self, path: &str, width: Option<u32>, height: Option<u32>) -> bool {
        let key = ImageKey {
            path: self.resolve(path),
            width,
            height,
        };
        self.entries.iter().any(|e| e.key == key)
    }

    /// True when the path is in the negative set
    pub fn has_failed(&self, path: &str) -> bool {
        self.failed.contains(&self.resolve(path))
    }

    /// Clear the cache and the negative set
    pub fn clear(&mut self) {
        self.entries.clear();
        self.failed.clear();
    }

    /// Number of cached images
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("failed", &self.failed.len())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}
