//! The source-plus-options core shared by every media entity.
//!
//! An image, video, or audio entity is at heart the same thing: one source
//! file, one sanitized option set, one fingerprint, and a registry of the
//! artifacts derived from it. [`BaseMedia`] owns that core; the per-kind
//! modules ([`crate::image`], [`crate::video`], [`crate::audio`]) layer
//! their specific derivations and lazily probed metadata on top.
//!
//! The derived registry is the first of two deduplication layers: within an
//! entity, requests that compute the same output path share one artifact
//! object, so anything cached on the artifact is computed at most once. The
//! second layer — one entity per distinct (source, options) pair — lives in
//! the per-kind factories.

use crate::artifact::{ArtifactKind, DerivedArtifact};
use crate::fingerprint;
use crate::options::{OptionSet, SanitizedOptions};
use crate::probe::ProbeError;
use crate::resolve::ResolveError;
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

/// Fatal input and probing errors surfaced while building entities or
/// deriving artifacts. None of these are recovered silently: the caller
/// decides whether the item or the whole run dies.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("item reference has no 'name' field")]
    MissingName,
    #[error("({path}) specified resize setting is not a percentage")]
    InvalidResize { path: PathBuf },
    #[error("({path}) has no 'extension' option for re-encoding")]
    MissingExtension { path: PathBuf },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Probe(#[from] ProbeError),
}

/// A gallery item reference as the settings layer hands it over: either a
/// bare source path or a mapping with at least a `name` key.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MediaRef {
    Path(String),
    Options(OptionSet),
}

impl MediaRef {
    /// The per-item options implied by the reference. Bare paths become
    /// `{"name": path}`; structured references without a name are rejected.
    pub fn to_options(&self) -> Result<OptionSet, MediaError> {
        match self {
            MediaRef::Path(path) => {
                let mut options = OptionSet::new();
                options.set_name(path.clone());
                Ok(options)
            }
            MediaRef::Options(options) => {
                if options.name().is_none() {
                    return Err(MediaError::MissingName);
                }
                Ok(options.clone())
            }
        }
    }
}

impl From<&str> for MediaRef {
    fn from(path: &str) -> Self {
        MediaRef::Path(path.to_string())
    }
}

/// One source media file plus its normalized option set.
///
/// Constructed once per distinct (resolved path, fingerprint) pair and never
/// mutated afterwards, except for inserting derived artifacts. The
/// fingerprint is computed at construction and reused for every derivation.
#[derive(Debug)]
pub struct BaseMedia {
    filepath: PathBuf,
    options: SanitizedOptions,
    fingerprint: u32,
    derived: RefCell<BTreeMap<PathBuf, Rc<DerivedArtifact>>>,
}

impl BaseMedia {
    pub(crate) fn new(filepath: PathBuf, merged: &OptionSet) -> Self {
        let options = merged.sanitized();
        let fingerprint = fingerprint::digest(&options);
        Self {
            filepath,
            options,
            fingerprint,
            derived: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn filepath(&self) -> &Path {
        &self.filepath
    }

    pub fn options(&self) -> &SanitizedOptions {
        &self.options
    }

    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }

    /// Insert-or-reuse a derived artifact.
    ///
    /// Two calls that compute the same output path return the same `Rc`, so
    /// per-artifact state is shared rather than duplicated.
    pub(crate) fn derive(
        &self,
        kind: ArtifactKind,
        size: Option<(u32, u32)>,
        extension: &str,
    ) -> Rc<DerivedArtifact> {
        let artifact = DerivedArtifact::new(kind, &self.filepath, self.fingerprint, size, extension);
        Rc::clone(
            self.derived
                .borrow_mut()
                .entry(artifact.filepath.clone())
                .or_insert_with(|| Rc::new(artifact)),
        )
    }

    /// Look up a previously derived artifact by its output path.
    pub fn derived(&self, filepath: &Path) -> Option<Rc<DerivedArtifact>> {
        self.derived.borrow().get(filepath).cloned()
    }

    /// Number of distinct artifacts derived so far.
    pub fn derived_count(&self) -> usize {
        self.derived.borrow().len()
    }

    /// Extension of the source file, without the dot. Empty if the source
    /// has none.
    pub(crate) fn source_extension(&self) -> String {
        self.filepath
            .extension()
            .map(|extension| extension.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
