//! Audio engine primitives.
//!
//! - [`buffer`]: the channel-major sample buffer every stage works on
//! - [`pcm`]: headerless 16-bit PCM codec
//! - [`wav`]: canonical 44-byte WAV container
//! - [`upload`]: lenient decoding of user-supplied WAV files
//! - [`resample`]: speed effects and sample-rate conversion
//! - [`trim`]: time-range extraction

pub mod buffer;
pub mod pcm;
pub mod resample;
pub mod trim;
pub mod upload;
pub mod wav;

pub use buffer::{SampleBuffer, frames_for_seconds};
pub use resample::{convert_rate, resample};
pub use trim::{TrimRange, trim};
pub use wav::{read_wav, write_wav};
