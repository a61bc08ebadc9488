//! TOML timeline manifest.
//!
//! Describes an ordered fragment list on disk for the CLI:
//!
//! ```toml
//! [[fragment]]
//! pcm = "intro.pcm"
//! voice = "younger"
//! delay = 0.5
//!
//! [[fragment]]
//! file = "jingle.wav"
//! trim_start = 1.0
//! trim_end = 3.5
//! ```
//!
//! Relative paths resolve against the manifest's directory.

use crate::audio::trim::TrimRange;
use crate::audio::upload::decode_upload;
use crate::config::VoiceConfig;
use crate::error::{Result, VoxspliceError};
use crate::fragment::{Fragment, VoiceAge};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Parsed manifest.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default, rename = "fragment")]
    pub fragments: Vec<FragmentEntry>,
    #[serde(skip)]
    base_dir: PathBuf,
}

/// One `[[fragment]]` table.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FragmentEntry {
    /// Raw 16-bit mono PCM from the speech service.
    pub pcm: Option<PathBuf>,
    /// Uploaded WAV file.
    pub file: Option<PathBuf>,
    pub speed: Option<f64>,
    pub voice: Option<VoiceAge>,
    #[serde(default)]
    pub delay: f64,
    pub trim_start: Option<f64>,
    pub trim_end: Option<f64>,
}

impl FragmentEntry {
    fn trim_range(&self) -> Option<TrimRange> {
        if self.trim_start.is_none() && self.trim_end.is_none() {
            return None;
        }
        Some(TrimRange::new(
            self.trim_start.unwrap_or(0.0),
            self.trim_end.unwrap_or(f64::INFINITY),
        ))
    }

    fn speed(&self, voice: &VoiceConfig, index: usize) -> Result<f64> {
        match (self.speed, self.voice) {
            (Some(_), Some(_)) => Err(VoxspliceError::manifest(format!(
                "fragment {} sets both speed and voice",
                index
            ))),
            (Some(speed), None) => Ok(speed),
            (None, Some(age)) => Ok(voice.speed_for(age)),
            (None, None) => Ok(voice.speed_for(VoiceAge::Natural)),
        }
    }
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            VoxspliceError::manifest(format!("failed to read {}: {}", path.display(), e))
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse(&contents, base_dir)
    }

    /// Parse manifest text, resolving relative paths against `base_dir`.
    pub fn parse(contents: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut manifest: Manifest = toml::from_str(contents)
            .map_err(|e| VoxspliceError::manifest(e.to_string()))?;
        manifest.base_dir = base_dir.into();
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        for (index, entry) in self.fragments.iter().enumerate() {
            match (&entry.pcm, &entry.file) {
                (None, None) => {
                    return Err(VoxspliceError::manifest(format!(
                        "fragment {} needs either pcm or file",
                        index
                    )));
                }
                (Some(_), Some(_)) => {
                    return Err(VoxspliceError::manifest(format!(
                        "fragment {} sets both pcm and file",
                        index
                    )));
                }
                (Some(_), None) => {
                    if entry.trim_range().is_some() {
                        return Err(VoxspliceError::manifest(format!(
                            "fragment {} trims generated speech, only uploads can be trimmed",
                            index
                        )));
                    }
                }
                (None, Some(_)) => {
                    if entry.speed.is_some() || entry.voice.is_some() {
                        return Err(VoxspliceError::manifest(format!(
                            "fragment {} sets a speed on an upload, only generated speech has one",
                            index
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Read every referenced file and build the fragment list.
    pub fn into_fragments(&self, voice: &VoiceConfig) -> Result<Vec<Fragment>> {
        self.fragments
            .iter()
            .enumerate()
            .map(|(index, entry)| self.build_fragment(index, entry, voice))
            .collect()
    }

    fn build_fragment(
        &self,
        index: usize,
        entry: &FragmentEntry,
        voice: &VoiceConfig,
    ) -> Result<Fragment> {
        let read = |path: &Path| {
            let path = self.resolve(path);
            fs::read(&path).map_err(|e| {
                VoxspliceError::manifest(format!(
                    "fragment {}: failed to read {}: {}",
                    index,
                    path.display(),
                    e
                ))
            })
        };

        let build = || -> Result<Fragment> {
            match (&entry.pcm, &entry.file) {
                (Some(pcm), _) => Fragment::generated_with_speed(
                    read(pcm.as_path())?,
                    entry.speed(voice, index)?,
                    entry.delay,
                ),
                (None, Some(file)) => {
                    let buffer = decode_upload(&read(file.as_path())?)?;
                    Fragment::uploaded(buffer, entry.trim_range(), entry.delay)
                }
                (None, None) => Err(VoxspliceError::manifest(format!(
                    "fragment {} needs either pcm or file",
                    index
                ))),
            }
        };

        // Manifest errors already name the fragment
        build().map_err(|e| match e {
            VoxspliceError::Manifest { .. } => e,
            other => VoxspliceError::Fragment {
                index,
                source: Box::new(other),
            },
        })
    }
}
