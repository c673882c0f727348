//! Incremental build cache for derived media artifacts.
//!
//! Re-encoding a video or resizing a large image is the bottleneck of a
//! gallery build — a single source can take minutes through the external
//! transcoder. This module is the staleness oracle that lets the build
//! pipeline skip the call when nothing relevant changed since the last run.
//!
//! # Design
//!
//! The cache is keyed by **artifact output path**. Each entry records two
//! facts about the generation that produced the artifact:
//!
//! - **`size`**: the byte size of the *source* file at generation time.
//!   A cheap `stat` per check instead of hashing gigabytes of video on
//!   every run.
//! - **`options`**: the sanitized option set the artifact was generated
//!   with. Catches content-affecting configuration changes — re-encode
//!   quality, target container — that never touch the source file itself.
//!
//! An artifact needs (re)generation unless it exists on disk, has a cache
//! entry, and both the recorded size and the recorded options match the
//! current state. Comparison of options is structural and value-based, so
//! an option set that round-tripped through the cache file compares equal
//! to the freshly computed one.
//!
//! This is deliberately a heuristic, not an integrity check: a source
//! replaced by a different file of identical byte size under identical
//! options is not detected. That trade is intentional — content hashing
//! would change the cost model of every no-op rebuild — and callers should
//! treat the cache as an optimization, never as evidence about file
//! contents.
//!
//! # Storage
//!
//! A single JSON document at [`CACHE_FILENAME`] in the build's working
//! directory: a top-level `version` integer, every other key an artifact
//! output path mapping to its entry. Loaded once at startup and written
//! back in full by [`Cache::flush`]; there are no partial writes.
//!
//! A missing, unreadable, corrupt, or version-mismatched file yields a
//! fresh cache — the worst case is a full rebuild, never a crash and never
//! a partial migration.

use crate::options::{OptionSet, SanitizedOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::Path;

/// Name of the cache file within the working directory.
pub const CACHE_FILENAME: &str = ".media-gal-cache";

/// Version of the cache format. Bump this to invalidate all existing caches
/// when the entry layout or the canonical option encoding changes.
const CACHE_VERSION: u32 = 1;

/// Evidence that one output path was last generated from a source of `size`
/// bytes under `options`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub size: u64,
    pub options: SanitizedOptions,
}

/// On-disk staleness oracle mapping artifact output paths to the source
/// size and option set that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cache {
    version: u32,
    #[serde(flatten)]
    entries: HashMap<String, CacheEntry>,
}

impl Cache {
    /// Create an empty cache at the current format version.
    pub fn new() -> Self {
        Self {
            version: CACHE_VERSION,
            entries: HashMap::new(),
        }
    }

    /// Load the cache from `dir`.
    ///
    /// Never fails: a missing file, unparseable content, a structural
    /// mismatch, or a version other than the current one all produce a
    /// fresh, empty cache.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(CACHE_FILENAME);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => return Self::new(),
        };
        let cache: Self = match serde_json::from_str(&content) {
            Ok(cache) => cache,
            Err(err) => {
                tracing::info!("discarding unreadable cache {}: {err}", path.display());
                return Self::new();
            }
        };
        if cache.version != CACHE_VERSION {
            tracing::info!(
                "discarding cache {} with version {} (current is {CACHE_VERSION})",
                path.display(),
                cache.version,
            );
            return Self::new();
        }
        cache
    }

    /// Whether the artifact at `target` must be (re)generated from `source`
    /// under `options`.
    ///
    /// `true` when the target is missing, unknown to the cache, or recorded
    /// against a different source size or different sanitized options;
    /// `false` only when everything matches. Filesystem errors on the
    /// existence and size checks count as "regenerate" — failing open
    /// re-runs the transcoder, failing closed would ship a stale gallery.
    ///
    /// Pure read: consults only `target`'s existence and `source`'s size,
    /// and never mutates the cache.
    pub fn needs_to_be_generated(&self, source: &Path, target: &Path, options: &OptionSet) -> bool {
        if !target.exists() {
            return true;
        }
        let Some(entry) = self.entries.get(&key(target)) else {
            return true;
        };
        let Ok(size) = std::fs::metadata(source).map(|metadata| metadata.len()) else {
            return true;
        };
        if entry.size != size {
            return true;
        }
        entry.options != options.sanitized()
    }

    /// Record a freshly generated artifact. Call immediately after the
    /// transcoder succeeds; overwrites any previous entry for `target`.
    pub fn record(&mut self, source: &Path, target: &Path, options: &OptionSet) -> io::Result<()> {
        let size = std::fs::metadata(source)?.len();
        self.entries.insert(
            key(target),
            CacheEntry {
                size,
                options: options.sanitized(),
            },
        );
        Ok(())
    }

    /// Write the whole cache to `dir`, replacing any previous file.
    pub fn flush(&self, dir: &Path) -> io::Result<()> {
        let path = dir.join(CACHE_FILENAME);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        tracing::debug!(
            "wrote {} cache entries to {}",
            self.entries.len(),
            path.display(),
        );
        Ok(())
    }

    /// Look up the recorded entry for an output path.
    pub fn entry(&self, target: &Path) -> Option<&CacheEntry> {
        self.entries.get(&key(target))
    }

    /// Number of recorded artifacts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

fn key(target: &Path) -> String {
    target.to_string_lossy().into_owned()
}

/// Summary of cache performance for a build run.
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} generated ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} generated", self.misses)
        }
    }
}
