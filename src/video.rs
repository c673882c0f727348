//! Video entities and their deduplicating factory.
//!
//! Videos derive poster thumbnails (always JPEG) and re-encoded renditions
//! in the configured target container. Player markup additionally needs the
//! source's duration and aspect ratio; both come from a single container
//! probe that runs on first access and is cached on the entity, so a video
//! referenced from several pages is probed once.

use crate::artifact::ArtifactKind;
use crate::media::{BaseMedia, MediaError, MediaRef};
use crate::options::OptionSet;
use crate::probe::{AvMetadata, MediaProbe, ProbeError};
use crate::resolve;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Poster thumbnails are stills, always JPEG regardless of the source
/// container.
const THUMBNAIL_EXTENSION: &str = "jpg";

/// One source video plus its option set.
#[derive(Debug)]
pub struct BaseVideo {
    base: BaseMedia,
    probed: RefCell<Option<AvMetadata>>,
}

impl BaseVideo {
    /// Build an entity from per-item options merged over the gallery-wide
    /// defaults. The merged set must name the source file.
    pub fn new(options: &OptionSet, global_options: &OptionSet) -> Result<Self, MediaError> {
        let merged = OptionSet::merged(global_options, options);
        let name = merged.name().ok_or(MediaError::MissingName)?;
        let filepath = PathBuf::from(name);
        Ok(Self {
            base: BaseMedia::new(filepath, &merged),
            probed: RefCell::new(None),
        })
    }

    pub fn filepath(&self) -> &Path {
        self.base.filepath()
    }

    pub fn fingerprint(&self) -> u32 {
        self.base.fingerprint()
    }

    pub fn base(&self) -> &BaseMedia {
        &self.base
    }

    /// Derive a poster thumbnail at `size`. Returns the output file name.
    pub fn thumbnail(&self, size: (u32, u32)) -> String {
        self.base
            .derive(ArtifactKind::Thumbnail, Some(size), THUMBNAIL_EXTENSION)
            .file_name()
    }

    /// Derive a re-encoded rendition at `size`, in the container named by
    /// the `extension` option.
    pub fn reencode(&self, size: (u32, u32)) -> Result<String, MediaError> {
        let extension = self
            .base
            .options()
            .extension()
            .ok_or_else(|| MediaError::MissingExtension {
                path: self.base.filepath().to_path_buf(),
            })?
            .to_string();
        Ok(self
            .base
            .derive(ArtifactKind::Reencode, Some(size), &extension)
            .file_name())
    }

    /// Duration in seconds, probed once and cached.
    pub fn duration(&self, probe: &dyn MediaProbe) -> Result<f64, MediaError> {
        Ok(self.metadata(probe)?.duration)
    }

    /// Aspect ratio (width / height) of the source, probed once and cached.
    pub fn ratio(&self, probe: &dyn MediaProbe) -> Result<f64, MediaError> {
        let metadata = self.metadata(probe)?;
        let (width, height) = metadata.video_size.ok_or_else(|| ProbeError::Malformed {
            path: self.base.filepath().to_path_buf(),
            reason: "no video stream dimensions".to_string(),
        })?;
        Ok(f64::from(width) / f64::from(height))
    }

    fn metadata(&self, probe: &dyn MediaProbe) -> Result<AvMetadata, MediaError> {
        if let Some(metadata) = self.probed.borrow().as_ref() {
            return Ok(metadata.clone());
        }
        let metadata = probe.av_metadata(self.base.filepath())?;
        *self.probed.borrow_mut() = Some(metadata.clone());
        Ok(metadata)
    }
}

/// Deduplicating registry of [`BaseVideo`]s, keyed by
/// (resolved source path, option fingerprint).
#[derive(Debug, Default)]
pub struct VideoFactory {
    global_options: OptionSet,
    entities: HashMap<(PathBuf, u32), Rc<BaseVideo>>,
}

impl VideoFactory {
    pub fn new(global_options: OptionSet) -> Self {
        Self {
            global_options,
            entities: HashMap::new(),
        }
    }

    /// Resolve `item` against the gallery directory `context` and return the
    /// shared entity for it, creating one on first reference.
    pub fn get(&mut self, context: &Path, item: &MediaRef) -> Result<Rc<BaseVideo>, MediaError> {
        let mut options = item.to_options()?;
        let name = options.name().ok_or(MediaError::MissingName)?.to_string();
        let resolved = resolve::resolve_source(context, Path::new(&name))?;
        options.set_name(resolved.to_string_lossy());

        let entity = BaseVideo::new(&options, &self.global_options)?;
        let key = (resolved, entity.fingerprint());
        Ok(Rc::clone(
            self.entities
                .entry(key)
                .or_insert_with(|| Rc::new(entity)),
        ))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
