//! voxsplice - audio assembly engine for speech fragments
//!
//! Turns independently produced fragments (synthesized speech PCM, uploaded
//! audio files) into one continuous, correctly timed mono WAV track, with
//! non-destructive trimming and voice-age speed effects along the way.
//!
//! The engine is pure and synchronous: every stage takes a buffer and
//! returns a new one, nothing logs, nothing touches the file system.
//!
//! ```no_run
//! use voxsplice::{Engine, Fragment};
//!
//! # fn main() -> voxsplice::Result<()> {
//! let speech = std::fs::read("hello.pcm")?;
//! let fragments = vec![
//!     Fragment::generated_with_speed(speech.clone(), 1.2, 1.0)?,
//!     Fragment::generated(speech, 0.0)?,
//! ];
//! let export = Engine::default().export(&fragments)?;
//! std::fs::write("out.wav", &export.wav)?;
//! # Ok(())
//! # }
//! ```

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod fragment;
pub mod manifest;
pub mod timeline;

// Engine primitives
pub use audio::{
    SampleBuffer, TrimRange, convert_rate, frames_for_seconds, read_wav, resample, trim,
    write_wav,
};

// Assembly
pub use engine::{Engine, Export};
pub use fragment::{Fragment, FragmentSource, VoiceAge};
pub use timeline::{MixdownMode, Timeline, TimelineItem};

// Error handling
pub use error::{Result, VoxspliceError};

// Config
pub use config::Config;
