//! Fragment descriptors.
//!
//! A fragment is one piece of the final track: either speech PCM from the
//! synthesis service or an audio file the user uploaded. Fragments are plain
//! values owned by the caller; the engine reads them and never keeps state.

use crate::audio::buffer::SampleBuffer;
use crate::audio::trim::TrimRange;
use crate::defaults;
use crate::error::{Result, VoxspliceError};
use crate::timeline::validate_delay;
use serde::{Deserialize, Serialize};

/// Voice-age persona applied to generated speech as a speed factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceAge {
    #[default]
    Natural,
    /// Faster and higher pitched.
    Younger,
    /// Slower and lower pitched.
    Older,
}

impl std::str::FromStr for VoiceAge {
    type Err = VoxspliceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "natural" => Ok(Self::Natural),
            "younger" => Ok(Self::Younger),
            "older" => Ok(Self::Older),
            other => Err(VoxspliceError::invalid(
                "voice",
                format!("expected natural, younger or older, got {:?}", other),
            )),
        }
    }
}

/// Where a fragment's audio comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum FragmentSource {
    /// Raw 16-bit mono PCM at the working rate from the speech service.
    Generated { pcm: Vec<u8>, speed: f64 },
    /// An already decoded upload at its native rate and channel count.
    Uploaded {
        buffer: SampleBuffer,
        trim: Option<TrimRange>,
    },
}

/// One fragment plus the silence that follows it in the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    source: FragmentSource,
    delay: f64,
}

impl Fragment {
    /// # Errors
    /// `InvalidParameter` for a negative or non-finite delay, or a
    /// generated fragment whose speed is not a finite positive number.
    pub fn new(source: FragmentSource, delay: f64) -> Result<Self> {
        validate_delay(delay)?;
        if let FragmentSource::Generated { speed, .. } = &source
            && !(speed.is_finite() && *speed > 0.0)
        {
            return Err(VoxspliceError::invalid(
                "speed",
                format!("must be a positive number, got {}", speed),
            ));
        }
        Ok(Self { source, delay })
    }

    /// Generated speech at normal speed.
    pub fn generated(pcm: Vec<u8>, delay: f64) -> Result<Self> {
        Self::generated_with_speed(pcm, defaults::DEFAULT_SPEED, delay)
    }

    pub fn generated_with_speed(pcm: Vec<u8>, speed: f64, delay: f64) -> Result<Self> {
        Self::new(FragmentSource::Generated { pcm, speed }, delay)
    }

    pub fn uploaded(buffer: SampleBuffer, trim: Option<TrimRange>, delay: f64) -> Result<Self> {
        Self::new(FragmentSource::Uploaded { buffer, trim }, delay)
    }

    pub fn source(&self) -> &FragmentSource {
        &self.source
    }

    /// Trailing silence in seconds.
    pub fn delay(&self) -> f64 {
        self.delay
    }

    pub fn is_generated(&self) -> bool {
        matches!(self.source, FragmentSource::Generated { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_defaults_to_normal_speed() {
        let fragment = Fragment::generated(vec![0u8; 4], 0.5).unwrap();
        assert!(fragment.is_generated());
        assert_eq!(fragment.delay(), 0.5);
        match fragment.source() {
            FragmentSource::Generated { speed, pcm } => {
                assert_eq!(*speed, 1.0);
                assert_eq!(pcm.len(), 4);
            }
            other => panic!("Expected Generated, got {:?}", other),
        }
    }

    #[test]
    fn negative_delay_is_rejected() {
        let result = Fragment::generated(Vec::new(), -1.0);
        assert!(matches!(
            result,
            Err(VoxspliceError::InvalidParameter { ref name, .. }) if name == "delay"
        ));
    }

    #[test]
    fn non_positive_speed_is_rejected() {
        assert!(Fragment::generated_with_speed(Vec::new(), 0.0, 0.0).is_err());
        assert!(Fragment::generated_with_speed(Vec::new(), -2.0, 0.0).is_err());
    }

    #[test]
    fn uploaded_keeps_trim_range() {
        let buffer = SampleBuffer::silence(2, 10, 44100).unwrap();
        let fragment = Fragment::uploaded(buffer, Some(TrimRange::new(0.0, 1.0)), 0.0).unwrap();
        assert!(!fragment.is_generated());
    }

    #[test]
    fn voice_age_parses() {
        assert_eq!("Younger".parse::<VoiceAge>().unwrap(), VoiceAge::Younger);
        assert_eq!("older".parse::<VoiceAge>().unwrap(), VoiceAge::Older);
        assert_eq!(" natural ".parse::<VoiceAge>().unwrap(), VoiceAge::Natural);
        assert!("teen".parse::<VoiceAge>().is_err());
    }
}
