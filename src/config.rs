use crate::defaults;
use crate::error::{Result, VoxspliceError};
use crate::fragment::VoiceAge;
use crate::timeline::MixdownMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub voice: VoiceConfig,
}

/// Assembly engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Rate every fragment is brought to before assembly
    pub working_sample_rate: u32,
    /// How multi-channel uploads are folded into the mono output
    pub mixdown: MixdownMode,
    /// Render fragments on parallel threads
    pub parallel: bool,
}

/// Voice persona speed factors
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VoiceConfig {
    pub younger_speed: f64,
    pub older_speed: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            working_sample_rate: defaults::WORKING_SAMPLE_RATE,
            mixdown: MixdownMode::FirstChannel,
            parallel: true,
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            younger_speed: defaults::YOUNGER_VOICE_SPEED,
            older_speed: defaults::OLDER_VOICE_SPEED,
        }
    }
}

impl VoiceConfig {
    /// Speed factor for a persona.
    pub fn speed_for(&self, age: VoiceAge) -> f64 {
        match age {
            VoiceAge::Natural => defaults::DEFAULT_SPEED,
            VoiceAge::Younger => self.younger_speed,
            VoiceAge::Older => self.older_speed,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML or invalid values.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(VoxspliceError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.engine.working_sample_rate == 0 {
            return Err(VoxspliceError::ConfigInvalidValue {
                key: "engine.working_sample_rate".to_string(),
                message: "must be positive".to_string(),
            });
        }
        for (key, speed) in [
            ("voice.younger_speed", self.voice.younger_speed),
            ("voice.older_speed", self.voice.older_speed),
        ] {
            if !(speed.is_finite() && speed > 0.0) {
                return Err(VoxspliceError::ConfigInvalidValue {
                    key: key.to_string(),
                    message: format!("must be a positive number, got {}", speed),
                });
            }
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VOXSPLICE_SAMPLE_RATE → engine.working_sample_rate
    /// - VOXSPLICE_MIXDOWN → engine.mixdown
    /// - VOXSPLICE_PARALLEL → engine.parallel
    ///
    /// Empty or unparsable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(rate) = std::env::var("VOXSPLICE_SAMPLE_RATE")
            && let Ok(rate) = rate.trim().parse::<u32>()
            && rate > 0
        {
            self.engine.working_sample_rate = rate;
        }

        if let Ok(mixdown) = std::env::var("VOXSPLICE_MIXDOWN")
            && let Ok(mixdown) = mixdown.parse::<MixdownMode>()
        {
            self.engine.mixdown = mixdown;
        }

        if let Ok(parallel) = std::env::var("VOXSPLICE_PARALLEL") {
            match parallel.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.engine.parallel = true,
                "0" | "false" | "no" | "off" => self.engine.parallel = false,
                _ => {}
            }
        }

        self
    }

    /// Render as TOML, e.g. for `voxsplice config show`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| VoxspliceError::ConfigSerialize {
            message: e.to_string(),
        })
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/voxsplice/config.toml on Linux
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("voxsplice").join("config.toml"))
            .ok_or_else(|| {
                VoxspliceError::Other("Could not determine config directory".to_string())
            })
    }
}
