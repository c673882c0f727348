//! Audio entities and their deduplicating factory.
//!
//! Audio items are the simplest media kind: gallery settings reference them
//! as bare paths, their options come entirely from the gallery-wide
//! defaults, and the only derivation is a re-encoded rendition in the
//! configured container — no dimensions, so the output name carries just
//! the stem and the option fingerprint. Player markup still wants the
//! track's duration, probed once per entity.

use crate::artifact::ArtifactKind;
use crate::media::{BaseMedia, MediaError};
use crate::options::OptionSet;
use crate::probe::MediaProbe;
use crate::resolve;
use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// One source audio track plus the gallery-wide option set.
#[derive(Debug)]
pub struct BaseAudio {
    base: BaseMedia,
    duration: Cell<Option<f64>>,
}

impl BaseAudio {
    pub fn new(filepath: impl Into<PathBuf>, global_options: &OptionSet) -> Self {
        Self {
            base: BaseMedia::new(filepath.into(), global_options),
            duration: Cell::new(None),
        }
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

    /// Derive the re-encoded rendition, in the container named by the
    /// `extension` option.
    pub fn reencode(&self) -> Result<String, MediaError> {
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
            .derive(ArtifactKind::Reencode, None, &extension)
            .file_name())
    }

    /// Duration in seconds, probed once and cached.
    pub fn duration(&self, probe: &dyn MediaProbe) -> Result<f64, MediaError> {
        if let Some(duration) = self.duration.get() {
            return Ok(duration);
        }
        let metadata = probe.av_metadata(self.base.filepath())?;
        self.duration.set(Some(metadata.duration));
        Ok(metadata.duration)
    }
}

/// Deduplicating registry of [`BaseAudio`]s, keyed by
/// (resolved source path, option fingerprint).
#[derive(Debug, Default)]
pub struct AudioFactory {
    global_options: OptionSet,
    entities: HashMap<(PathBuf, u32), Rc<BaseAudio>>,
}

impl AudioFactory {
    pub fn new(global_options: OptionSet) -> Self {
        Self {
            global_options,
            entities: HashMap::new(),
        }
    }

    /// Resolve `filepath` against the gallery directory `context` and return
    /// the shared entity for it, creating one on first reference.
    pub fn get(&mut self, context: &Path, filepath: &Path) -> Result<Rc<BaseAudio>, MediaError> {
        let resolved = resolve::resolve_source(context, filepath)?;
        let entity = BaseAudio::new(resolved.clone(), &self.global_options);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::tests::MockProbe;
    use crate::probe::AvMetadata;
    use crate::test_helpers::opts;
    use serde_json::json;

    // =========================================================================
    // Fingerprint
    // =========================================================================

    #[test]
    fn fingerprint_covers_the_global_options() {
        let audio = BaseAudio::new("test.mp3", &opts(json!({"extension": "ogg"})));
        assert_eq!(
            audio.fingerprint(),
            crc32fast::hash(br#"{"extension":"ogg"}"#)
        );
    }

    #[test]
    fn display_keys_in_globals_are_ignored() {
        let with_name = BaseAudio::new(
            "test.mp3",
            &opts(json!({"extension": "ogg", "name": "test123test"})),
        );
        let without = BaseAudio::new("test.mp3", &opts(json!({"extension": "ogg"})));
        assert_eq!(with_name.fingerprint(), without.fingerprint());
    }

    // =========================================================================
    // Re-encoding
    // =========================================================================

    #[test]
    fn reencode_twice_shares_one_artifact() {
        let audio = BaseAudio::new("test.mp3", &opts(json!({"extension": "ogg"})));
        audio.reencode().unwrap();
        audio.reencode().unwrap();
        assert_eq!(audio.base().derived_count(), 1);
    }

    #[test]
    fn reencode_file_name_has_no_dimensions() {
        let audio = BaseAudio::new("test.mp3", &opts(json!({"extension": "ogg"})));
        let name = audio.reencode().unwrap();
        assert_eq!(
            name,
            format!("test-{}.ogg", crc32fast::hash(br#"{"extension":"ogg"}"#))
        );
    }

    #[test]
    fn reencode_without_extension_option_is_fatal() {
        let audio = BaseAudio::new("test.mp3", &OptionSet::new());
        assert!(matches!(
            audio.reencode(),
            Err(MediaError::MissingExtension { .. })
        ));
    }

    // =========================================================================
    // Lazy metadata
    // =========================================================================

    #[test]
    fn duration_comes_from_the_probe() {
        let audio = BaseAudio::new("test.mp3", &opts(json!({"extension": "mp3"})));
        let probe = MockProbe::with_av(vec![AvMetadata {
            duration: 10.4,
            video_size: None,
        }]);
        assert_eq!(audio.duration(&probe).unwrap(), 10.4);
    }

    #[test]
    fn duration_is_probed_only_once() {
        let audio = BaseAudio::new("test.mp3", &opts(json!({"extension": "mp3"})));
        let probe = MockProbe::with_av(vec![AvMetadata {
            duration: 10.4,
            video_size: None,
        }]);
        assert_eq!(audio.duration(&probe).unwrap(), 10.4);
        assert_eq!(audio.duration(&probe).unwrap(), 10.4);
        assert_eq!(probe.call_count(), 1);
    }

    #[test]
    fn probe_failure_propagates() {
        let audio = BaseAudio::new("test.mp3", &OptionSet::new());
        let probe = MockProbe::default();
        assert!(matches!(audio.duration(&probe), Err(MediaError::Probe(_))));
    }

    // =========================================================================
    // Factory
    // =========================================================================

    #[test]
    fn different_sources_are_different_entities() {
        let mut factory = AudioFactory::default();
        let first = factory.get(Path::new("gallery"), Path::new("test1.mp3")).unwrap();
        let second = factory.get(Path::new("gallery"), Path::new("test2.mp3")).unwrap();
        assert!(!Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn same_source_in_different_galleries_is_different() {
        let mut factory = AudioFactory::default();
        let first = factory.get(Path::new("gallery1"), Path::new("test.mp3")).unwrap();
        let second = factory.get(Path::new("gallery2"), Path::new("test.mp3")).unwrap();
        assert!(!Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn repeated_reference_returns_the_same_entity() {
        let mut factory = AudioFactory::default();
        let first = factory.get(Path::new("gallery"), Path::new("test.mp3")).unwrap();
        let second = factory.get(Path::new("gallery"), Path::new("test.mp3")).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(factory.len(), 1);
    }

    #[test]
    fn dotdot_spellings_return_the_same_entity() {
        let mut factory = AudioFactory::default();
        let direct = factory.get(Path::new("gallery"), Path::new("test.mp3")).unwrap();
        for (context, name) in [
            ("gallery", "light/../test.mp3"),
            ("light/../gallery", "test.mp3"),
            ("light/../gallery", "light/../test.mp3"),
        ] {
            let aliased = factory
                .get(Path::new(context), Path::new(name))
                .unwrap();
            assert!(Rc::ptr_eq(&direct, &aliased), "{context}/{name}");
        }
        assert_eq!(factory.len(), 1);
    }
}
