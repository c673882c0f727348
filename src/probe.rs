//! Media probing: image headers in-process, audio/video via ffprobe.
//!
//! Entities need a few facts about their sources before any transcoding
//! happens — pixel dimensions to size template copies, duration and aspect
//! ratio for the player markup. The [`MediaProbe`] trait is the single seam
//! for those lookups, so the entity layer stays tool-agnostic and tests can
//! substitute a recording mock.
//!
//! The production [`SystemProbe`] reads still-image headers with the `image`
//! crate (no decode, no subprocess) and shells out to `ffprobe` (or
//! `avprobe`, depending on the configured toolchain) for containers, asking
//! for a JSON document with `format.duration` and per-stream dimensions.
//!
//! Probe failures are never papered over: a missing tool, a non-zero exit,
//! or output that doesn't match the expected shape is an error for the
//! caller. There is no fallback duration and no retry — wrong metadata in a
//! published gallery is worse than a failed build.

use crate::options::OptionSet;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("failed to run {binary} on {path}: {source}")]
    Spawn {
        binary: String,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{binary} failed on {path}: {stderr}")]
    Failed {
        binary: String,
        path: PathBuf,
        stderr: String,
    },
    #[error("unexpected probe output for {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
    #[error("failed to read image header of {path}: {source}")]
    ImageHeader {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Container-level metadata for an audio or video source.
#[derive(Debug, Clone, PartialEq)]
pub struct AvMetadata {
    /// Duration in seconds, from `format.duration`.
    pub duration: f64,
    /// First stream's pixel dimensions; `None` for audio-only sources.
    pub video_size: Option<(u32, u32)>,
}

/// The probing operations entities rely on.
pub trait MediaProbe {
    /// Pixel dimensions of a still image.
    fn image_dimensions(&self, path: &Path) -> Result<(u32, u32), ProbeError>;

    /// Duration and (for video) stream dimensions of a container.
    fn av_metadata(&self, path: &Path) -> Result<AvMetadata, ProbeError>;
}

/// Production probe backed by the `image` crate and the ffmpeg toolchain.
#[derive(Debug, Clone)]
pub struct SystemProbe {
    binary: String,
}

impl SystemProbe {
    /// Pick the probing binary from the gallery-wide `binary` option:
    /// `ffmpeg` (the default toolchain) probes with `ffprobe`, a libav
    /// toolchain with `avprobe`.
    pub fn new(global_options: &OptionSet) -> Self {
        let binary = match global_options.binary() {
            None | Some("ffmpeg") => "ffprobe",
            Some(_) => "avprobe",
        };
        Self {
            binary: binary.to_string(),
        }
    }
}

impl MediaProbe for SystemProbe {
    fn image_dimensions(&self, path: &Path) -> Result<(u32, u32), ProbeError> {
        image::image_dimensions(path).map_err(|source| ProbeError::ImageHeader {
            path: path.to_path_buf(),
            source,
        })
    }

    fn av_metadata(&self, path: &Path) -> Result<AvMetadata, ProbeError> {
        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration:stream=width,height",
                "-print_format",
                "json",
            ])
            .arg(path)
            .output()
            .map_err(|source| ProbeError::Spawn {
                binary: self.binary.clone(),
                path: path.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                binary: self.binary.clone(),
                path: path.to_path_buf(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_av_metadata(&output.stdout, path)
    }
}

#[derive(Deserialize)]
struct ProbeDocument {
    format: ProbeFormat,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: String,
}

#[derive(Deserialize)]
struct ProbeStream {
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

fn parse_av_metadata(stdout: &[u8], path: &Path) -> Result<AvMetadata, ProbeError> {
    let document: ProbeDocument =
        serde_json::from_slice(stdout).map_err(|err| ProbeError::Malformed {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

    let duration = document
        .format
        .duration
        .parse::<f64>()
        .map_err(|_| ProbeError::Malformed {
            path: path.to_path_buf(),
            reason: format!("non-numeric duration {:?}", document.format.duration),
        })?;

    let video_size = document
        .streams
        .iter()
        .find_map(|stream| Some((stream.width?, stream.height?)));

    Ok(AvMetadata {
        duration,
        video_size,
    })
}
