//! Timeline assembly.
//!
//! A [`Timeline`] is the ordered list of rendered fragments, each followed by
//! a stretch of silence. Assembly concatenates them into one mono buffer.
//! Output offsets depend on everything before them, so this always runs
//! after all fragments are rendered and walks the items in order.

use crate::audio::buffer::{SampleBuffer, frames_for_seconds};
use crate::defaults::MAX_FRAMES;
use crate::error::{Result, VoxspliceError};
use serde::{Deserialize, Serialize};

/// How a multi-channel fragment is folded into the mono output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MixdownMode {
    /// Keep channel 0 and drop the rest.
    #[default]
    FirstChannel,
    /// Average all channels frame by frame.
    Average,
}

impl std::str::FromStr for MixdownMode {
    type Err = VoxspliceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-channel" | "first" => Ok(Self::FirstChannel),
            "average" | "avg" => Ok(Self::Average),
            other => Err(VoxspliceError::invalid(
                "mixdown",
                format!("expected first-channel or average, got {:?}", other),
            )),
        }
    }
}

/// One rendered fragment and the silence that follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineItem {
    buffer: SampleBuffer,
    delay: f64,
}

impl TimelineItem {
    /// # Errors
    /// `InvalidParameter` if `delay` is negative or not finite.
    pub fn new(buffer: SampleBuffer, delay: f64) -> Result<Self> {
        validate_delay(delay)?;
        Ok(Self { buffer, delay })
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// Trailing silence in seconds.
    pub fn delay(&self) -> f64 {
        self.delay
    }

    fn frames_at(&self, sample_rate: u32) -> Option<usize> {
        self.buffer
            .frame_count()
            .checked_add(frames_for_seconds(self.delay, sample_rate))
    }
}

/// Check a trailing-silence duration.
pub(crate) fn validate_delay(delay: f64) -> Result<()> {
    if delay.is_finite() && delay >= 0.0 {
        Ok(())
    } else {
        Err(VoxspliceError::invalid(
            "delay",
            format!("must be a non-negative number of seconds, got {}", delay),
        ))
    }
}

/// Ordered sequence of fragments ready for assembly.
///
/// Rebuilt for each assembly request; nothing here is persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    items: Vec<TimelineItem>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment followed by `delay` seconds of silence.
    pub fn push(&mut self, buffer: SampleBuffer, delay: f64) -> Result<()> {
        self.items.push(TimelineItem::new(buffer, delay)?);
        Ok(())
    }

    pub fn items(&self) -> &[TimelineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when there are no items.
    ///
    /// [`Timeline::assemble`] returns a one-frame placeholder for an empty
    /// timeline, which looks the same as real one-frame content. Check this
    /// (or [`Timeline::total_frames`]) before assembling to tell them apart.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Output length in frames at `sample_rate`, without the placeholder.
    ///
    /// # Errors
    /// `InvalidParameter` if the delays push the length past [`MAX_FRAMES`].
    pub fn total_frames(&self, sample_rate: u32) -> Result<usize> {
        self.items
            .iter()
            .try_fold(0usize, |total, item| {
                item.frames_at(sample_rate)
                    .and_then(|frames| total.checked_add(frames))
            })
            .filter(|&total| total <= MAX_FRAMES)
            .ok_or_else(|| {
                VoxspliceError::invalid(
                    "delay",
                    format!("timeline at {} Hz would exceed {} frames", sample_rate, MAX_FRAMES),
                )
            })
    }

    /// Merge every item into one mono buffer at `sample_rate`.
    ///
    /// Each buffer contributes its frames (folded to mono per `mixdown`)
    /// followed by `floor(delay * sample_rate)` zero samples. Segments are
    /// joined with hard cuts in the order given. Buffers must already be at
    /// `sample_rate`; no resampling happens here.
    ///
    /// An empty timeline, or one whose total length is zero, yields a single
    /// zero frame.
    ///
    /// # Errors
    /// `InvalidParameter` if `sample_rate` is zero or the assembled length
    /// would exceed [`MAX_FRAMES`].
    pub fn assemble(&self, sample_rate: u32, mixdown: MixdownMode) -> Result<SampleBuffer> {
        if sample_rate == 0 {
            return Err(VoxspliceError::invalid(
                "sample_rate",
                "must be positive, got 0",
            ));
        }

        let total = self.total_frames(sample_rate)?;
        if total == 0 {
            return Ok(SampleBuffer::placeholder(1, sample_rate));
        }

        let mut output = Vec::with_capacity(total);
        for item in &self.items {
            let buffer = &item.buffer;
            match mixdown {
                MixdownMode::FirstChannel => {
                    if let Some(channel) = buffer.channel(0) {
                        output.extend_from_slice(channel);
                    }
                }
                MixdownMode::Average => {
                    output.extend((0..buffer.frame_count()).map(|f| buffer.frame_average(f)));
                }
            }
            let silence_end = output.len() + frames_for_seconds(item.delay, sample_rate);
            output.resize(silence_end, 0.0);
        }

        Ok(SampleBuffer::from_parts(vec![output], sample_rate))
    }
}

impl FromIterator<TimelineItem> for Timeline {
    fn from_iter<I: IntoIterator<Item = TimelineItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
