//! Image entities and their deduplicating factory.
//!
//! Images derive two artifact kinds: grid thumbnails at explicit dimensions,
//! and template copies at the source's own dimensions scaled by the optional
//! `resize` percentage. Copy sizing needs the source's pixel dimensions,
//! which are probed once per entity and cached — a source referenced from a
//! dozen pages reads its header exactly once, because the factory hands all
//! twelve references the same entity.

use crate::artifact::ArtifactKind;
use crate::media::{BaseMedia, MediaError, MediaRef};
use crate::options::OptionSet;
use crate::probe::MediaProbe;
use crate::resolve;
use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// One source image plus its option set.
#[derive(Debug)]
pub struct BaseImage {
    base: BaseMedia,
    /// Raw `resize` value, captured before sanitization strips it: it only
    /// affects the copy's pixel size, which is already part of the copy's
    /// file name, so it stays out of the fingerprint.
    resize: Option<String>,
    copy_size: Cell<Option<(u32, u32)>>,
}

impl BaseImage {
    /// Build an entity from per-item options merged over the gallery-wide
    /// defaults. The merged set must name the source file.
    pub fn new(options: &OptionSet, global_options: &OptionSet) -> Result<Self, MediaError> {
        let merged = OptionSet::merged(global_options, options);
        let name = merged.name().ok_or(MediaError::MissingName)?;
        let filepath = PathBuf::from(name);
        let resize = merged.resize().map(str::to_string);
        Ok(Self {
            base: BaseMedia::new(filepath, &merged),
            resize,
            copy_size: Cell::new(None),
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

    /// Derive a grid thumbnail at `size`. Returns the output file name.
    pub fn thumbnail(&self, size: (u32, u32)) -> String {
        self.base
            .derive(
                ArtifactKind::Thumbnail,
                Some(size),
                &self.base.source_extension(),
            )
            .file_name()
    }

    /// Derive the template copy, sized from the source scaled by `resize`.
    ///
    /// Repeated calls reuse both the probed dimensions and the artifact, so
    /// a page embedding the same copy twice produces one output.
    pub fn copy(&self, probe: &dyn MediaProbe) -> Result<String, MediaError> {
        let size = self.copy_size(probe)?;
        Ok(self
            .base
            .derive(ArtifactKind::Copy, Some(size), &self.base.source_extension())
            .file_name())
    }

    /// Pixel size of the template copy: the source's dimensions, scaled by
    /// the `resize` percentage when one is set. Probed lazily, cached for
    /// the entity's lifetime.
    pub fn copy_size(&self, probe: &dyn MediaProbe) -> Result<(u32, u32), MediaError> {
        if let Some(size) = self.copy_size.get() {
            return Ok(size);
        }
        let (width, height) = probe.image_dimensions(self.base.filepath())?;
        let size = match self.resize_factor()? {
            Some(factor) => (scale(width, factor), scale(height, factor)),
            None => (width, height),
        };
        self.copy_size.set(Some(size));
        Ok(size)
    }

    /// Parse the `resize` option. Only percentage forms (`"50%"`) are valid;
    /// anything else kills the item.
    fn resize_factor(&self) -> Result<Option<f64>, MediaError> {
        let Some(resize) = self.resize.as_deref() else {
            return Ok(None);
        };
        let percentage = resize
            .strip_suffix('%')
            .and_then(|number| number.trim().parse::<f64>().ok())
            .ok_or_else(|| MediaError::InvalidResize {
                path: self.base.filepath().to_path_buf(),
            })?;
        Ok(Some(percentage / 100.0))
    }
}

fn scale(value: u32, factor: f64) -> u32 {
    (f64::from(value) * factor) as u32
}

/// Deduplicating registry of [`BaseImage`]s.
///
/// One entity per distinct (resolved source path, option fingerprint) pair,
/// shared by every gallery page referencing the file. The registry is owned
/// by the caller and passed into the build pipeline; nothing is global.
#[derive(Debug, Default)]
pub struct ImageFactory {
    global_options: OptionSet,
    entities: HashMap<(PathBuf, u32), Rc<BaseImage>>,
}

impl ImageFactory {
    pub fn new(global_options: OptionSet) -> Self {
        Self {
            global_options,
            entities: HashMap::new(),
        }
    }

    /// Resolve `item` against the gallery directory `context` and return the
    /// shared entity for it, creating one on first reference.
    ///
    /// Spellings that normalize to the same source path — including `..`
    /// traversals — and carry the same option fingerprint yield the same
    /// `Rc`, so metadata probed through one reference is visible to all.
    pub fn get(&mut self, context: &Path, item: &MediaRef) -> Result<Rc<BaseImage>, MediaError> {
        let mut options = item.to_options()?;
        let name = options.name().ok_or(MediaError::MissingName)?.to_string();
        let resolved = resolve::resolve_source(context, Path::new(&name))?;
        options.set_name(resolved.to_string_lossy());

        let entity = BaseImage::new(&options, &self.global_options)?;
        let key = (resolved, entity.fingerprint());
        Ok(Rc::clone(
            self.entities
                .entry(key)
                .or_insert_with(|| Rc::new(entity)),
        ))
    }

    /// Number of distinct entities created so far.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
