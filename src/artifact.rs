//! Derived-artifact descriptors and deterministic output naming.
//!
//! Every expensive derivation — a thumbnail, a re-encoded rendition, a
//! template copy — is described by a [`DerivedArtifact`] before any external
//! tool runs. Its output path encodes the full identity of the work:
//!
//! ```text
//! <parent>/<stem>-<fingerprint>[-<width>x<height>].<extension>
//! ```
//!
//! The source stem ties the artifact to its file, the option fingerprint
//! catches configuration changes, and the target dimensions distinguish
//! renditions of the same source. Two requests for the same (source, options,
//! size, extension) tuple therefore collapse onto one path — and one cache
//! entry — while any change to the tuple produces a fresh name instead of
//! clobbering a stale file.

use std::path::{Path, PathBuf};

/// What kind of derivation produced (or will produce) an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Scaled-down preview for gallery grids.
    Thumbnail,
    /// Same content re-encoded into the configured target container.
    Reencode,
    /// Template copy of the source at (possibly resized) display dimensions.
    Copy,
}

/// One derived output of a media source.
///
/// Owned exclusively by the entity that derived it; the entity's registry
/// guarantees at most one artifact object per distinct output path.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedArtifact {
    pub kind: ArtifactKind,
    /// Full output path, alongside the source file.
    pub filepath: PathBuf,
    /// Target pixel dimensions, when the derivation has any.
    pub size: Option<(u32, u32)>,
    /// Fingerprint of the owning entity's sanitized options.
    pub fingerprint: u32,
}

impl DerivedArtifact {
    pub fn new(
        kind: ArtifactKind,
        source: &Path,
        fingerprint: u32,
        size: Option<(u32, u32)>,
        extension: &str,
    ) -> Self {
        Self {
            kind,
            filepath: output_path(source, fingerprint, size, extension),
            size,
            fingerprint,
        }
    }

    /// Basename of the output path — what templates reference.
    pub fn file_name(&self) -> String {
        self.filepath
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Aspect ratio (width / height) for sized artifacts.
    pub fn ratio(&self) -> Option<f64> {
        self.size
            .map(|(width, height)| f64::from(width) / f64::from(height))
    }
}

fn output_path(
    source: &Path,
    fingerprint: u32,
    size: Option<(u32, u32)>,
    extension: &str,
) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut name = format!("{stem}-{fingerprint}");
    if let Some((width, height)) = size {
        name.push_str(&format!("-{width}x{height}"));
    }
    if !extension.is_empty() {
        name.push('.');
        name.push_str(extension);
    }

    match source.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Output naming
    // =========================================================================

    #[test]
    fn sized_artifact_name_carries_fingerprint_and_dimensions() {
        let artifact = DerivedArtifact::new(
            ArtifactKind::Thumbnail,
            Path::new("test.jpg"),
            2745614147,
            Some((100, 150)),
            "jpg",
        );
        assert_eq!(artifact.file_name(), "test-2745614147-100x150.jpg");
    }

    #[test]
    fn unsized_artifact_name_omits_dimensions() {
        let artifact = DerivedArtifact::new(
            ArtifactKind::Reencode,
            Path::new("test.mp3"),
            1140802349,
            None,
            "ogg",
        );
        assert_eq!(artifact.file_name(), "test-1140802349.ogg");
    }

    #[test]
    fn output_path_stays_alongside_source() {
        let artifact = DerivedArtifact::new(
            ArtifactKind::Reencode,
            Path::new("gallery/summer/clip.mp4"),
            7,
            Some((840, 480)),
            "webm",
        );
        assert_eq!(
            artifact.filepath,
            PathBuf::from("gallery/summer/clip-7-840x480.webm")
        );
    }

    #[test]
    fn extension_replaces_source_suffix() {
        let artifact =
            DerivedArtifact::new(ArtifactKind::Thumbnail, Path::new("clip.mp4"), 1, Some((10, 20)), "jpg");
        assert_eq!(artifact.file_name(), "clip-1-10x20.jpg");
    }

    #[test]
    fn same_inputs_produce_identical_paths_across_calls() {
        let a = DerivedArtifact::new(ArtifactKind::Copy, Path::new("a/b.png"), 42, Some((1, 2)), "png");
        let b = DerivedArtifact::new(ArtifactKind::Copy, Path::new("a/b.png"), 42, Some((1, 2)), "png");
        assert_eq!(a.filepath, b.filepath);
    }

    #[test]
    fn different_sizes_produce_distinct_paths() {
        let a = DerivedArtifact::new(ArtifactKind::Thumbnail, Path::new("x.jpg"), 9, Some((100, 200)), "jpg");
        let b = DerivedArtifact::new(ArtifactKind::Thumbnail, Path::new("x.jpg"), 9, Some((150, 300)), "jpg");
        assert_ne!(a.filepath, b.filepath);
    }

    // =========================================================================
    // Ratio
    // =========================================================================

    #[test]
    fn ratio_from_target_dimensions() {
        let artifact =
            DerivedArtifact::new(ArtifactKind::Thumbnail, Path::new("v.mp4"), 1, Some((840, 480)), "jpg");
        assert_eq!(artifact.ratio(), Some(840.0 / 480.0));
    }

    #[test]
    fn ratio_is_none_without_dimensions() {
        let artifact = DerivedArtifact::new(ArtifactKind::Reencode, Path::new("a.mp3"), 1, None, "ogg");
        assert_eq!(artifact.ratio(), None);
    }
}
