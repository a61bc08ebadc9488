//! Canonical 44-byte WAV container for 16-bit PCM.
//!
//! Writing always produces the minimal `RIFF`/`WAVE`/`fmt `/`data` layout.
//! Reading accepts that same layout and nothing looser; arbitrary uploads
//! go through [`crate::audio::upload`] instead.

use crate::audio::buffer::SampleBuffer;
use crate::audio::pcm::{self, i16_to_sample};
use crate::defaults::{BITS_PER_SAMPLE, BYTES_PER_SAMPLE, WAV_HEADER_LEN};
use crate::error::{Result, VoxspliceError};

/// PCM format code in the `fmt ` chunk.
const FORMAT_PCM: u16 = 1;

/// Size of a plain PCM `fmt ` chunk body.
const FMT_CHUNK_LEN: u32 = 16;

/// Wrap a buffer in a canonical WAV header followed by interleaved PCM.
///
/// # Errors
/// `MalformedAudio` if the payload, block alignment or byte rate would not
/// fit its header field.
pub fn write_wav(buffer: &SampleBuffer) -> Result<Vec<u8>> {
    let channels = u16::try_from(buffer.channel_count())
        .map_err(|_| VoxspliceError::malformed("too many channels for a WAV header"))?;
    let sample_rate = buffer.sample_rate();
    let data_len = buffer.frame_count() * buffer.channel_count() * BYTES_PER_SAMPLE;
    let data_size = u32::try_from(data_len)
        .ok()
        .filter(|size| size.checked_add(36).is_some())
        .ok_or_else(|| {
            VoxspliceError::malformed(format!("{} data bytes exceed the WAV size limit", data_len))
        })?;

    let block_align = channels
        .checked_mul(BYTES_PER_SAMPLE as u16)
        .ok_or_else(|| {
            VoxspliceError::malformed(format!(
                "{} channels overflow the WAV block alignment",
                channels
            ))
        })?;
    let byte_rate = sample_rate
        .checked_mul(u32::from(block_align))
        .ok_or_else(|| {
            VoxspliceError::malformed(format!(
                "{} Hz with {} channels overflows the WAV byte rate",
                sample_rate, channels
            ))
        })?;

    let mut bytes = Vec::with_capacity(WAV_HEADER_LEN + data_len);

    // RIFF header
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_size).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    // fmt chunk
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    bytes.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&byte_rate.to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data chunk
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_size.to_le_bytes());

    bytes.extend_from_slice(&pcm::encode(buffer));

    Ok(bytes)
}

/// Parse a canonical WAV byte stream back into a sample buffer.
///
/// Markers must appear in order: `RIFF`, `WAVE`, `fmt `, `data`. A `fmt `
/// chunk longer than 16 bytes is skipped over, but no other chunk may sit
/// between `fmt ` and `data`.
///
/// # Errors
/// `MalformedAudio` on any marker mismatch, a bit depth other than 16, a
/// zero channel count or rate, or a `data` chunk longer than the bytes left.
pub fn read_wav(bytes: &[u8]) -> Result<SampleBuffer> {
    if bytes.len() < WAV_HEADER_LEN {
        return Err(VoxspliceError::malformed(format!(
            "WAV stream is {} bytes, shorter than the {}-byte header",
            bytes.len(),
            WAV_HEADER_LEN
        )));
    }

    expect_marker(bytes, 0, b"RIFF")?;
    expect_marker(bytes, 8, b"WAVE")?;
    expect_marker(bytes, 12, b"fmt ")?;

    let fmt_len = read_u32(bytes, 16) as usize;
    if fmt_len < FMT_CHUNK_LEN as usize {
        return Err(VoxspliceError::malformed(format!(
            "fmt chunk is {} bytes, expected at least {}",
            fmt_len, FMT_CHUNK_LEN
        )));
    }

    let format = read_u16(bytes, 20);
    let channels = read_u16(bytes, 22);
    let sample_rate = read_u32(bytes, 24);
    let bits = read_u16(bytes, 34);

    if bits != BITS_PER_SAMPLE {
        return Err(VoxspliceError::malformed(format!(
            "unsupported bit depth {}, expected {}",
            bits, BITS_PER_SAMPLE
        )));
    }
    if format != FORMAT_PCM {
        return Err(VoxspliceError::malformed(format!(
            "unsupported WAV format code {}, expected {}",
            format, FORMAT_PCM
        )));
    }
    if channels == 0 || sample_rate == 0 {
        return Err(VoxspliceError::malformed(format!(
            "invalid fmt chunk: {} channels at {} Hz",
            channels, sample_rate
        )));
    }

    let data_marker = fmt_len.saturating_add(20);
    let data_start = data_marker.saturating_add(8);
    if bytes.len() < data_start {
        return Err(VoxspliceError::malformed("missing data chunk header"));
    }
    expect_marker(bytes, data_marker, b"data")?;

    let data_len = read_u32(bytes, data_marker + 4) as usize;
    let remaining = bytes.len() - data_start;
    if data_len > remaining {
        return Err(VoxspliceError::malformed(format!(
            "data chunk declares {} bytes but only {} remain",
            data_len, remaining
        )));
    }

    let channel_count = channels as usize;
    let block_align = channel_count * BYTES_PER_SAMPLE;
    if data_len % block_align != 0 {
        return Err(VoxspliceError::malformed(format!(
            "data chunk length {} is not a whole number of {}-byte frames",
            data_len, block_align
        )));
    }

    let frames = data_len / block_align;
    let mut data = vec![Vec::with_capacity(frames); channel_count];
    let payload = &bytes[data_start..data_start + data_len];
    for (i, pair) in payload.chunks_exact(BYTES_PER_SAMPLE).enumerate() {
        let value = i16::from_le_bytes([pair[0], pair[1]]);
        data[i % channel_count].push(i16_to_sample(value));
    }

    SampleBuffer::new(data, sample_rate)
}

fn expect_marker(bytes: &[u8], offset: usize, marker: &[u8; 4]) -> Result<()> {
    let found = &bytes[offset..offset + 4];
    if found == marker {
        Ok(())
    } else {
        Err(VoxspliceError::malformed(format!(
            "expected {:?} marker at offset {}, found {:?}",
            String::from_utf8_lossy(marker),
            offset,
            String::from_utf8_lossy(found)
        )))
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
