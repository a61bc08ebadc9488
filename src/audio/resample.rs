//! Linear-interpolation resampling.
//!
//! Two operations share one interpolation kernel:
//! - [`resample`] changes playback speed. Duration divides by the speed
//!   factor and pitch moves with it, which is how the voice-age personas
//!   are produced.
//! - [`convert_rate`] changes the sample rate while keeping the wall-clock
//!   duration, used to bring uploads to the working rate.

use crate::audio::buffer::SampleBuffer;
use crate::defaults::MAX_FRAMES;
use crate::error::{Result, VoxspliceError};

/// Play `buffer` back `speed` times faster.
///
/// Output index `i` reads the source at position `i * speed`. The output has
/// `floor(frame_count / speed)` frames and keeps the input sample rate. A
/// speed of exactly 1.0 hands the input back untouched.
///
/// # Errors
/// `InvalidParameter` if `speed` is not a finite positive number, or is so
/// small that the output would exceed [`MAX_FRAMES`].
pub fn resample(buffer: SampleBuffer, speed: f64) -> Result<SampleBuffer> {
    if !(speed.is_finite() && speed > 0.0) {
        return Err(VoxspliceError::invalid(
            "speed",
            format!("must be a positive number, got {}", speed),
        ));
    }
    if speed == 1.0 {
        return Ok(buffer);
    }

    let frames = output_frames(
        (buffer.frame_count() as f64 / speed).floor(),
        "speed",
        speed,
    )?;
    let sample_rate = buffer.sample_rate();
    let channels = buffer
        .channels()
        .iter()
        .map(|channel| interpolate(channel, speed, frames))
        .collect();

    Ok(SampleBuffer::from_parts(channels, sample_rate))
}

/// Convert `buffer` to `target_rate` without changing its duration.
///
/// The output has `round(frame_count * target_rate / sample_rate)` frames.
/// A buffer already at `target_rate` is handed back untouched.
///
/// # Errors
/// `InvalidParameter` if `target_rate` is zero or the converted buffer
/// would exceed [`MAX_FRAMES`].
pub fn convert_rate(buffer: SampleBuffer, target_rate: u32) -> Result<SampleBuffer> {
    if target_rate == 0 {
        return Err(VoxspliceError::invalid(
            "target_rate",
            "must be positive, got 0",
        ));
    }
    let source_rate = buffer.sample_rate();
    if source_rate == target_rate {
        return Ok(buffer);
    }

    let step = source_rate as f64 / target_rate as f64;
    let frames = output_frames(
        (buffer.frame_count() as f64 * target_rate as f64 / source_rate as f64).round(),
        "target_rate",
        target_rate,
    )?;
    let channels = buffer
        .channels()
        .iter()
        .map(|channel| interpolate(channel, step, frames))
        .collect();

    Ok(SampleBuffer::from_parts(channels, target_rate))
}

/// Check a computed output length before anything is allocated.
fn output_frames(frames: f64, name: &str, value: impl std::fmt::Display) -> Result<usize> {
    if frames.is_finite() && frames <= MAX_FRAMES as f64 {
        Ok(frames as usize)
    } else {
        Err(VoxspliceError::invalid(
            name,
            format!("{} would produce more than {} frames", value, MAX_FRAMES),
        ))
    }
}

/// Read `samples` at positions `0, step, 2*step, ...` for `len` outputs.
///
/// Positions between two source samples blend them linearly; positions at
/// or past the last sample repeat it.
fn interpolate(samples: &[f32], step: f64, len: usize) -> Vec<f32> {
    let Some(&last) = samples.last() else {
        return vec![0.0; len];
    };

    (0..len)
        .map(|i| {
            let position = i as f64 * step;
            let index = position.floor() as usize;
            if index + 1 >= samples.len() {
                return last;
            }
            let fraction = (position - index as f64) as f32;
            let left = samples[index];
            let right = samples[index + 1];
            left + (right - left) * fraction
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize, rate: u32) -> SampleBuffer {
        let samples = (0..frames).map(|i| i as f32 / frames as f32).collect();
        SampleBuffer::mono(samples, rate).unwrap()
    }

    #[test]
    fn speed_one_is_identity() {
        let buffer = ramp(1000, 24000);
        let result = resample(buffer.clone(), 1.0).unwrap();
        assert_eq!(result, buffer);
    }

    #[test]
    fn younger_voice_shortens() {
        let result = resample(SampleBuffer::silence(1, 24000, 24000).unwrap(), 1.2).unwrap();
        assert_eq!(result.frame_count(), 20000);
        assert_eq!(result.sample_rate(), 24000);
    }

    #[test]
    fn older_voice_lengthens() {
        let result = resample(ramp(17000, 24000), 0.85).unwrap();
        assert_eq!(result.frame_count(), 20000);
    }

    #[test]
    fn frame_count_follows_floor_law() {
        for &speed in &[0.5, 0.75, 0.85, 1.1, 1.2, 1.5, 2.0, 3.3] {
            let buffer = ramp(9973, 24000);
            let expected = (9973.0_f64 / speed).floor() as i64;
            let actual = resample(buffer, speed).unwrap().frame_count() as i64;
            assert!((actual - expected).abs() <= 1, "speed {}", speed);
        }
    }

    #[test]
    fn double_speed_takes_every_other_sample() {
        let buffer = SampleBuffer::mono(vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5], 8000).unwrap();
        let result = resample(buffer, 2.0).unwrap();
        assert_eq!(result.channel(0).unwrap(), &[0.0, 0.2, 0.4]);
    }

    #[test]
    fn half_speed_interpolates_midpoints() {
        let buffer = SampleBuffer::mono(vec![0.0, 1.0], 8000).unwrap();
        let result = resample(buffer, 0.5).unwrap();
        let samples = result.channel(0).unwrap();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], 0.0);
        assert!((samples[1] - 0.5).abs() < 1e-6);
        assert_eq!(samples[2], 1.0);
        assert_eq!(samples[3], 1.0);
    }

    #[test]
    fn resample_keeps_every_channel() {
        let buffer = SampleBuffer::new(vec![vec![0.5; 100], vec![-0.5; 100]], 8000).unwrap();
        let result = resample(buffer, 1.25).unwrap();
        assert_eq!(result.channel_count(), 2);
        assert_eq!(result.frame_count(), 80);
        assert!(result.channel(1).unwrap().iter().all(|&s| s == -0.5));
    }

    #[test]
    fn invalid_speed_is_rejected() {
        for speed in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = resample(ramp(10, 8000), speed);
            assert!(
                matches!(result, Err(VoxspliceError::InvalidParameter { ref name, .. }) if name == "speed"),
                "speed {} should be rejected",
                speed
            );
        }
    }

    #[test]
    fn tiny_speed_is_rejected_before_allocating() {
        let buffer = SampleBuffer::silence(1, 24000, 24000).unwrap();
        match resample(buffer, 1e-300) {
            Err(VoxspliceError::InvalidParameter { name, message }) => {
                assert_eq!(name, "speed");
                assert!(message.contains("frames"), "got: {}", message);
            }
            other => panic!("Expected InvalidParameter, got {:?}", other),
        }
    }

    #[test]
    fn huge_rate_ratio_is_rejected_before_allocating() {
        let buffer = SampleBuffer::silence(1, 24000, 1).unwrap();
        assert!(matches!(
            convert_rate(buffer, u32::MAX),
            Err(VoxspliceError::InvalidParameter { ref name, .. }) if name == "target_rate"
        ));
    }

    #[test]
    fn empty_buffer_stays_empty() {
        let buffer = SampleBuffer::mono(Vec::new(), 8000).unwrap();
        assert_eq!(resample(buffer, 1.5).unwrap().frame_count(), 0);
    }

    #[test]
    fn convert_rate_same_rate_is_identity() {
        let buffer = ramp(1000, 24000);
        assert_eq!(convert_rate(buffer.clone(), 24000).unwrap(), buffer);
    }

    #[test]
    fn convert_rate_preserves_duration() {
        let result = convert_rate(ramp(44100, 44100), 24000).unwrap();
        assert_eq!(result.sample_rate(), 24000);
        assert_eq!(result.frame_count(), 24000);
        assert!((result.duration() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn convert_rate_rounds_frame_count() {
        // 1001 * 24000 / 48000 = 500.5, rounds to 501
        let result = convert_rate(ramp(1001, 48000), 24000).unwrap();
        assert_eq!(result.frame_count(), 501);
    }

    #[test]
    fn upsample_interpolates() {
        let buffer = SampleBuffer::mono(vec![0.0, 1.0, 0.0], 8000).unwrap();
        let result = convert_rate(buffer, 16000).unwrap();
        let samples = result.channel(0).unwrap();
        assert_eq!(samples.len(), 6);
        assert_eq!(samples[0], 0.0);
        assert!((samples[1] - 0.5).abs() < 1e-6);
        assert_eq!(samples[2], 1.0);
        assert!((samples[3] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn constant_signal_keeps_amplitude() {
        let buffer = SampleBuffer::mono(vec![0.25; 4410], 44100).unwrap();
        let result = convert_rate(buffer, 24000).unwrap();
        assert!(result.channel(0).unwrap().iter().all(|&s| (s - 0.25).abs() < 1e-6));
    }

    #[test]
    fn zero_target_rate_is_rejected() {
        assert!(matches!(
            convert_rate(ramp(10, 8000), 0),
            Err(VoxspliceError::InvalidParameter { .. })
        ));
    }
}
