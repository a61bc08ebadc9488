//! Decoding of user-uploaded audio files.
//!
//! Uploads can be any WAV flavour a user has lying around, so this goes
//! through `hound` rather than the strict canonical reader in
//! [`crate::audio::wav`].

use crate::audio::buffer::SampleBuffer;
use crate::error::{Result, VoxspliceError};
use hound::{SampleFormat, WavReader};
use std::io::{Cursor, Read};

/// Decode uploaded WAV bytes into a buffer at the file's own rate.
///
/// Integer samples of any bit depth are scaled by `2^(bits - 1)`; float
/// samples are taken as-is. All channels are kept.
///
/// # Errors
/// `UnsupportedFormat` if `hound` cannot parse the stream.
pub fn decode_upload(bytes: &[u8]) -> Result<SampleBuffer> {
    decode_reader(Cursor::new(bytes))
}

/// Decode an uploaded WAV stream from any reader.
pub fn decode_reader<R: Read>(reader: R) -> Result<SampleBuffer> {
    let reader = WavReader::new(reader).map_err(|e| VoxspliceError::UnsupportedFormat {
        message: format!("Failed to parse WAV file: {}", e),
    })?;

    let spec = reader.spec();
    let channel_count = spec.channels as usize;
    if channel_count == 0 {
        return Err(VoxspliceError::UnsupportedFormat {
            message: "WAV file declares zero channels".to_string(),
        });
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>(),
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<_>, _>>()
        }
    }
    .map_err(|e| VoxspliceError::UnsupportedFormat {
        message: format!("Failed to read WAV samples: {}", e),
    })?;

    let frames = interleaved.len() / channel_count;
    let mut channels = vec![Vec::with_capacity(frames); channel_count];
    for frame in interleaved.chunks_exact(channel_count) {
        for (channel, &sample) in channels.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }

    SampleBuffer::new(channels, spec.sample_rate)
}
