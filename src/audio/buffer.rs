//! In-memory sample buffer shared by every engine stage.

use crate::error::{Result, VoxspliceError};

/// Channel-major float audio with an associated sample rate.
///
/// Samples are nominally in `[-1.0, 1.0]`; values outside that range are
/// tolerated here and clamped when converted to fixed point. Every channel
/// holds the same number of frames. Engine stages never mutate a buffer in
/// place, they build a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Create a buffer from per-channel sample vectors.
    ///
    /// # Errors
    /// `InvalidParameter` for a zero sample rate, `MalformedAudio` when there
    /// are no channels or the channels differ in length.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(VoxspliceError::invalid(
                "sample_rate",
                "must be positive, got 0",
            ));
        }
        let Some(first) = channels.first() else {
            return Err(VoxspliceError::malformed(
                "buffer must have at least one channel",
            ));
        };
        let frames = first.len();
        if let Some((index, channel)) = channels
            .iter()
            .enumerate()
            .find(|(_, channel)| channel.len() != frames)
        {
            return Err(VoxspliceError::malformed(format!(
                "channel {} has {} frames, channel 0 has {}",
                index,
                channel.len(),
                frames
            )));
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Create a single-channel buffer.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::new(vec![samples], sample_rate)
    }

    /// Create a buffer of `frames` zero-valued frames.
    pub fn silence(channel_count: usize, frames: usize, sample_rate: u32) -> Result<Self> {
        if channel_count == 0 {
            return Err(VoxspliceError::invalid(
                "channel_count",
                "must be positive, got 0",
            ));
        }
        Self::new(vec![vec![0.0; frames]; channel_count], sample_rate)
    }

    /// Single zero frame per channel.
    ///
    /// Returned by the degenerate trim and empty-timeline cases so that
    /// consumers always receive something playable. Callers pass the channel
    /// count and rate of an already valid buffer.
    pub(crate) fn placeholder(channel_count: usize, sample_rate: u32) -> Self {
        Self {
            channels: vec![vec![0.0]; channel_count.max(1)],
            sample_rate,
        }
    }

    /// Build from parts that are known to satisfy the invariants.
    pub(crate) fn from_parts(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        debug_assert!(sample_rate > 0);
        debug_assert!(!channels.is_empty());
        debug_assert!(channels.iter().all(|c| c.len() == channels[0].len()));
        Self {
            channels,
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel.
    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Playback duration in seconds.
    pub fn duration(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Samples of one channel, or `None` if `index` is out of range.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Largest absolute sample value across all channels.
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flatten()
            .map(|s| s.abs())
            .fold(0.0f32, f32::max)
    }

    /// Sample at `frame` averaged over all channels.
    pub(crate) fn frame_average(&self, frame: usize) -> f32 {
        let sum: f32 = self.channels.iter().map(|c| c[frame]).sum();
        sum / self.channels.len() as f32
    }
}

/// Convert a duration in seconds to a frame count, rounding down.
///
/// Negative and NaN durations yield zero frames.
pub fn frames_for_seconds(seconds: f64, sample_rate: u32) -> usize {
    // `as` saturates: negatives and NaN become 0
    (seconds * sample_rate as f64).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accepts_equal_length_channels() {
        let buffer = SampleBuffer::new(vec![vec![0.1, 0.2], vec![0.3, 0.4]], 24000).unwrap();
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frame_count(), 2);
        assert_eq!(buffer.sample_rate(), 24000);
        assert_eq!(buffer.channel(1), Some(&[0.3f32, 0.4][..]));
        assert_eq!(buffer.channel(2), None);
    }

    #[test]
    fn new_rejects_ragged_channels() {
        let result = SampleBuffer::new(vec![vec![0.0; 3], vec![0.0; 2]], 24000);
        match result {
            Err(VoxspliceError::MalformedAudio { message }) => {
                assert!(message.contains("channel 1"), "got: {}", message);
            }
            other => panic!("Expected MalformedAudio, got {:?}", other),
        }
    }

    #[test]
    fn new_rejects_zero_rate_and_no_channels() {
        assert!(matches!(
            SampleBuffer::mono(vec![0.0], 0),
            Err(VoxspliceError::InvalidParameter { .. })
        ));
        assert!(matches!(
            SampleBuffer::new(Vec::new(), 24000),
            Err(VoxspliceError::MalformedAudio { .. })
        ));
    }

    #[test]
    fn duration_is_frames_over_rate() {
        let buffer = SampleBuffer::silence(1, 12000, 24000).unwrap();
        assert!((buffer.duration() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn silence_is_all_zero() {
        let buffer = SampleBuffer::silence(2, 100, 8000).unwrap();
        assert_eq!(buffer.channel_count(), 2);
        assert!(buffer.channels().iter().flatten().all(|&s| s == 0.0));
        assert_eq!(buffer.peak(), 0.0);
    }

    #[test]
    fn peak_takes_absolute_maximum() {
        let buffer = SampleBuffer::new(vec![vec![0.2, -0.7], vec![0.5, 0.1]], 8000).unwrap();
        assert!((buffer.peak() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn frame_average_mixes_channels() {
        let buffer = SampleBuffer::new(vec![vec![0.2, 1.0], vec![0.4, -1.0]], 8000).unwrap();
        assert!((buffer.frame_average(0) - 0.3).abs() < 1e-6);
        assert_eq!(buffer.frame_average(1), 0.0);
    }

    #[test]
    fn frames_for_seconds_rounds_down() {
        assert_eq!(frames_for_seconds(1.0, 24000), 24000);
        assert_eq!(frames_for_seconds(0.5, 24000), 12000);
        assert_eq!(frames_for_seconds(0.00004, 24000), 0);
        assert_eq!(frames_for_seconds(-1.0, 24000), 0);
        assert_eq!(frames_for_seconds(f64::NAN, 24000), 0);
    }
}
