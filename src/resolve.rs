//! Source-path normalization for media references.
//!
//! Gallery pages may reference the same source file under different
//! spellings — `gallery/pic.jpg` from the root, `../gallery/pic.jpg` from a
//! sibling. Deduplication keys on the resolved path, so every spelling has
//! to collapse to one canonical form: joined onto the referencing
//! directory, `.`/`..` components folded away, and re-expressed relative to
//! the process working directory.
//!
//! Normalization is purely lexical — referenced files do not have to exist
//! yet, and symlinks are left alone. A reference that climbs out of the
//! working tree has no canonical relative form and is rejected.

use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("cannot determine working directory: {0}")]
    Cwd(#[from] io::Error),
    #[error("{path} escapes the gallery working tree")]
    OutsideTree { path: PathBuf },
}

/// Resolve an item's declared name against the directory referencing it.
///
/// Returns the working-directory-relative canonical path used as the
/// deduplication key and as the entity's source path.
pub fn resolve_source(context: &Path, name: &Path) -> Result<PathBuf, ResolveError> {
    let cwd = std::env::current_dir()?;
    let normalized = normalize(&cwd.join(context).join(name));
    match normalized.strip_prefix(&cwd) {
        Ok(relative) => Ok(relative.to_path_buf()),
        Err(_) => Err(ResolveError::OutsideTree { path: normalized }),
    }
}

/// Fold `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            // Popping at the root is a no-op, matching how absolute paths
            // treat a leading `..`.
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
