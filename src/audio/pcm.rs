//! Headerless 16-bit little-endian PCM codec.
//!
//! The speech service returns raw PCM with no container, so decoding needs
//! the rate and channel count from the caller.

use crate::audio::buffer::SampleBuffer;
use crate::defaults::{BYTES_PER_SAMPLE, WORKING_SAMPLE_RATE};
use crate::error::{Result, VoxspliceError};

/// Decode interleaved 16-bit little-endian PCM into a sample buffer.
///
/// Each integer `v` becomes `v / 32768.0`.
///
/// # Errors
/// `MalformedAudio` if the byte length is odd or does not hold a whole
/// number of frames, `InvalidParameter` for a zero rate or channel count.
pub fn decode(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<SampleBuffer> {
    if channels == 0 {
        return Err(VoxspliceError::invalid("channels", "must be positive, got 0"));
    }
    if bytes.len() % BYTES_PER_SAMPLE != 0 {
        return Err(VoxspliceError::malformed(format!(
            "PCM byte length {} is not a multiple of {}",
            bytes.len(),
            BYTES_PER_SAMPLE
        )));
    }

    let channel_count = channels as usize;
    let sample_count = bytes.len() / BYTES_PER_SAMPLE;
    if sample_count % channel_count != 0 {
        return Err(VoxspliceError::malformed(format!(
            "{} samples do not divide into {} channels",
            sample_count, channel_count
        )));
    }

    let frames = sample_count / channel_count;
    let mut data = vec![Vec::with_capacity(frames); channel_count];
    for (i, pair) in bytes.chunks_exact(BYTES_PER_SAMPLE).enumerate() {
        let value = i16::from_le_bytes([pair[0], pair[1]]);
        data[i % channel_count].push(value as f32 / 32768.0);
    }

    SampleBuffer::new(data, sample_rate)
}

/// Decode a speech-service payload: mono at the working rate.
pub fn decode_generated(bytes: &[u8]) -> Result<SampleBuffer> {
    decode(bytes, WORKING_SAMPLE_RATE, 1)
}

/// Encode a buffer as interleaved 16-bit little-endian PCM.
///
/// Frames are written in order, channels in channel order within a frame.
pub fn encode(buffer: &SampleBuffer) -> Vec<u8> {
    let channels = buffer.channels();
    let frames = buffer.frame_count();
    let mut bytes = Vec::with_capacity(frames * channels.len() * BYTES_PER_SAMPLE);

    for frame in 0..frames {
        for channel in channels {
            bytes.extend_from_slice(&sample_to_i16(channel[frame]).to_le_bytes());
        }
    }

    bytes
}

/// Clamp to `[-1, 1]` and scale asymmetrically onto the `i16` range.
///
/// Negative samples scale by 32768 and non-negative ones by 32767, so both
/// ends of the float range land exactly on `i16::MIN` and `i16::MAX`.
pub fn sample_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    let scaled = if clamped < 0.0 {
        clamped * 32768.0
    } else {
        clamped * 32767.0
    };
    // NaN casts to 0
    scaled.round() as i16
}

/// Inverse of [`sample_to_i16`].
pub fn i16_to_sample(value: i16) -> f32 {
    if value < 0 {
        value as f32 / 32768.0
    } else {
        value as f32 / 32767.0
    }
}
