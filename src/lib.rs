//! # Media Gal
//!
//! The incremental-build core for static media galleries: given source
//! photos, videos and audio tracks plus per-item transformation options, it
//! decides what each derived artifact is called, guarantees that logically
//! identical requests are represented exactly once, and tells the build
//! pipeline which artifacts actually need (re)generating.
//!
//! The expensive work — resizing pixels, re-encoding video and audio,
//! rendering HTML — happens elsewhere: the pipeline invokes an external
//! transcoder with the file names this crate computes, and records the
//! results back into the cache. This crate owns the part where correctness
//! is subtle: artifact identity, option canonicalization, and staleness.
//!
//! # Flow
//!
//! ```text
//! 1. Factory.get(dir, item)            → one shared entity per distinct
//!                                        (resolved source, options) pair
//! 2. entity.thumbnail/reencode/copy    → deterministic output file name,
//!                                        deduplicated within the entity
//! 3. cache.needs_to_be_generated(...)  → skip or invoke the transcoder
//! 4. cache.record(...); cache.flush()  → persist evidence for the next run
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`options`] | Raw option mappings, gallery-default merging, display-key sanitization |
//! | [`fingerprint`] | Canonical encoding of sanitized options + CRC-32 digest |
//! | [`artifact`] | Derived-artifact descriptors and output-path naming |
//! | [`resolve`] | Lexical source-path normalization for dedup keys |
//! | [`media`] | Entity core: sanitized options, fingerprint, derived registry |
//! | [`image`] / [`video`] / [`audio`] | Per-kind entities, lazy probed metadata, factories |
//! | [`probe`] | External probing seam: image headers, ffprobe JSON |
//! | [`cache`] | Persistent staleness oracle (source size + option set) |
//!
//! # Design Decisions
//!
//! ## Names carry identity
//!
//! Every output name embeds the CRC-32 fingerprint of the item's sanitized
//! option set (and the target dimensions, when there are any). Changing a
//! content-affecting option renames the artifact, so stale outputs are
//! never silently overwritten and distinct configurations can coexist in
//! one output tree. Display-only keys — captions, layout hints, EXIF
//! toggles — are stripped before fingerprinting, so editing a caption never
//! triggers a re-encode.
//!
//! ## Size-based staleness, not content hashing
//!
//! The cache compares the source's byte size and the sanitized options
//! against what it recorded at generation time. A `stat` per artifact keeps
//! no-op rebuilds fast on libraries of multi-gigabyte video. The known blind
//! spot — replacing a source with a same-sized file under identical
//! options — is accepted and documented in [`cache`] rather than patched
//! with hashing that would change the cost model.
//!
//! ## Shared entities, not repeated lookups
//!
//! Factories hand out `Rc`-shared entities keyed by (resolved path,
//! fingerprint), so a file referenced from a dozen pages — under any `..`
//! spelling — is probed and derived once, and every reference sees metadata
//! computed by the first. Factory and cache state is owned by the caller
//! and passed in; nothing in this crate is a global.
//!
//! ## Single-threaded by design
//!
//! One build run is one thread: entities are `Rc` + `Cell`/`RefCell`, and
//! the registries have no internal locking. Parallel generation would need
//! the registries behind a lock and `Arc`-shared entities; until then the
//! simpler model keeps the dedup invariants easy to reason about.

pub mod artifact;
pub mod audio;
pub mod cache;
pub mod fingerprint;
pub mod image;
pub mod media;
pub mod options;
pub mod probe;
pub mod resolve;
pub mod video;

#[cfg(test)]
pub(crate) mod test_helpers;
