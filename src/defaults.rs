//! Default constants for voxsplice.
//!
//! Shared by the engine, the configuration layer and the CLI so the
//! working rate and persona speeds are defined in exactly one place.

/// Working sample rate in Hz.
///
/// The speech service delivers headerless 16-bit mono PCM at this rate, and
/// every buffer is brought to it before timeline assembly.
pub const WORKING_SAMPLE_RATE: u32 = 24000;

/// Speed factor that leaves a fragment untouched.
pub const DEFAULT_SPEED: f64 = 1.0;

/// Speed factor for the "younger voice" persona.
///
/// Faster playback shortens the fragment and raises its pitch.
pub const YOUNGER_VOICE_SPEED: f64 = 1.2;

/// Speed factor for the "older voice" persona.
///
/// Slower playback lengthens the fragment and lowers its pitch.
pub const OLDER_VOICE_SPEED: f64 = 0.85;

/// Size of the canonical RIFF/WAVE header written by the WAV codec.
pub const WAV_HEADER_LEN: usize = 44;

/// Bit depth of every PCM payload the engine reads or writes.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Bytes per 16-bit sample.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Longest buffer, in frames, any stage will allocate.
///
/// A mono 16-bit payload of this length is the most a 32-bit RIFF size
/// field can describe, so nothing longer could be written out anyway.
pub const MAX_FRAMES: usize = (u32::MAX as usize - 36) / BYTES_PER_SAMPLE;
