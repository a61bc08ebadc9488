//! Non-destructive trimming of a buffer to a time range.

use crate::audio::buffer::{SampleBuffer, frames_for_seconds};
use serde::{Deserialize, Serialize};

/// A `[start, end)` time range in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimRange {
    pub start: f64,
    pub end: f64,
}

impl TrimRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Apply this range to `buffer`, see [`trim`].
    pub fn apply(&self, buffer: &SampleBuffer) -> SampleBuffer {
        trim(buffer, self.start, self.end)
    }
}

/// Copy the frames between `start` and `end` seconds into a new buffer.
///
/// `start` is clamped to 0 and `end` to the buffer duration. Times map to
/// frames with `floor(time * sample_rate)` and the half-open range
/// `[start_frame, end_frame)` is copied for every channel.
///
/// Never fails: a range that is empty after clamping (or narrower than one
/// frame) yields a single zero frame per channel at the original rate.
pub fn trim(buffer: &SampleBuffer, start: f64, end: f64) -> SampleBuffer {
    let duration = buffer.duration();
    let frame_count = buffer.frame_count();
    let sample_rate = buffer.sample_rate();

    // f64::max/min return the other operand for NaN
    let start = start.max(0.0);
    let end = end.min(duration);

    if start >= end {
        return SampleBuffer::placeholder(buffer.channel_count(), sample_rate);
    }

    let start_frame = frames_for_seconds(start, sample_rate).min(frame_count);
    let end_frame = if end >= duration {
        frame_count
    } else {
        frames_for_seconds(end, sample_rate).min(frame_count)
    };

    if start_frame >= end_frame {
        return SampleBuffer::placeholder(buffer.channel_count(), sample_rate);
    }

    let channels = buffer
        .channels()
        .iter()
        .map(|channel| channel[start_frame..end_frame].to_vec())
        .collect();

    SampleBuffer::from_parts(channels, sample_rate)
}
