//! Fragment rendering and export.
//!
//! Runs each fragment through decode, rate/speed change and trim, then
//! hands the finished buffers to the [`Timeline`] for assembly. Rendering
//! is independent per fragment and fans out across a bounded set of
//! threads; assembly is sequential.

use crate::audio::buffer::SampleBuffer;
use crate::audio::pcm;
use crate::audio::resample::{convert_rate, resample};
use crate::audio::wav::write_wav;
use crate::config::EngineConfig;
use crate::defaults::WORKING_SAMPLE_RATE;
use crate::error::{Result, VoxspliceError};
use crate::fragment::{Fragment, FragmentSource};
use crate::timeline::{MixdownMode, Timeline};
use std::thread;

/// Result of exporting a whole timeline.
#[derive(Debug, Clone)]
pub struct Export {
    /// WAV bytes of the assembled track.
    pub wav: Vec<u8>,
    /// Frames in the assembled track.
    pub frames: usize,
    pub sample_rate: u32,
    /// Nothing was assembled; `wav` holds the one-frame placeholder.
    pub is_empty: bool,
}

impl Export {
    pub fn duration(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }
}

/// Stateless assembly engine.
#[derive(Debug, Clone)]
pub struct Engine {
    working_sample_rate: u32,
    mixdown: MixdownMode,
    parallel: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            working_sample_rate: WORKING_SAMPLE_RATE,
            mixdown: MixdownMode::FirstChannel,
            parallel: true,
        }
    }
}

impl Engine {
    /// # Errors
    /// `InvalidParameter` if the working rate is zero.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        if config.working_sample_rate == 0 {
            return Err(VoxspliceError::invalid(
                "working_sample_rate",
                "must be positive, got 0",
            ));
        }
        Ok(Self {
            working_sample_rate: config.working_sample_rate,
            mixdown: config.mixdown,
            parallel: config.parallel,
        })
    }

    pub fn working_sample_rate(&self) -> u32 {
        self.working_sample_rate
    }

    pub fn mixdown(&self) -> MixdownMode {
        self.mixdown
    }

    /// Produce the final buffer for one fragment at the working rate.
    ///
    /// Generated speech is decoded as mono PCM at 24 kHz, brought to the
    /// working rate and then played back at its speed factor. Uploads are
    /// brought to the working rate and then trimmed.
    pub fn render_fragment(&self, fragment: &Fragment) -> Result<SampleBuffer> {
        match fragment.source() {
            FragmentSource::Generated { pcm, speed } => {
                let decoded = pcm::decode(pcm, WORKING_SAMPLE_RATE, 1)?;
                let normalized = convert_rate(decoded, self.working_sample_rate)?;
                resample(normalized, *speed)
            }
            FragmentSource::Uploaded { buffer, trim } => {
                let normalized = convert_rate(buffer.clone(), self.working_sample_rate)?;
                Ok(match trim {
                    Some(range) => range.apply(&normalized),
                    None => normalized,
                })
            }
        }
    }

    /// Render every fragment, one result per fragment in input order.
    ///
    /// With `parallel` set the fragments are split into contiguous chunks,
    /// one scoped worker thread per chunk, with no more workers than
    /// [`thread::available_parallelism`] reports. A failing fragment does
    /// not affect the others.
    pub fn render_all(&self, fragments: &[Fragment]) -> Vec<Result<SampleBuffer>> {
        let workers = if self.parallel {
            thread::available_parallelism().map_or(1, |n| n.get())
        } else {
            1
        };
        self.render_chunked(fragments, workers)
    }

    fn render_chunked(&self, fragments: &[Fragment], workers: usize) -> Vec<Result<SampleBuffer>> {
        let workers = workers.clamp(1, fragments.len().max(1));
        if workers == 1 {
            return fragments.iter().map(|f| self.render_fragment(f)).collect();
        }

        let chunk_size = fragments.len().div_ceil(workers);
        thread::scope(|scope| {
            let handles: Vec<_> = fragments
                .chunks(chunk_size)
                .map(|chunk| {
                    let handle = scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|fragment| self.render_fragment(fragment))
                            .collect::<Vec<_>>()
                    });
                    (chunk.len(), handle)
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|(len, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        (0..len)
                            .map(|_| {
                                Err(VoxspliceError::Other(
                                    "fragment render thread panicked".to_string(),
                                ))
                            })
                            .collect()
                    })
                })
                .collect()
        })
    }

    /// Render one fragment and wrap it as WAV, for per-fragment preview.
    pub fn preview_fragment(&self, fragment: &Fragment) -> Result<Vec<u8>> {
        write_wav(&self.render_fragment(fragment)?)
    }

    /// Render all fragments into a timeline.
    ///
    /// # Errors
    /// The first fragment failure, wrapped with its index.
    pub fn build_timeline(&self, fragments: &[Fragment]) -> Result<Timeline> {
        let mut timeline = Timeline::new();
        for (index, (fragment, rendered)) in fragments
            .iter()
            .zip(self.render_all(fragments))
            .enumerate()
        {
            let buffer = rendered.map_err(|e| VoxspliceError::Fragment {
                index,
                source: Box::new(e),
            })?;
            timeline.push(buffer, fragment.delay())?;
        }
        Ok(timeline)
    }

    /// Render, assemble and encode the whole fragment list.
    pub fn export(&self, fragments: &[Fragment]) -> Result<Export> {
        let timeline = self.build_timeline(fragments)?;
        let is_empty = timeline.total_frames(self.working_sample_rate)? == 0;
        let merged = timeline.assemble(self.working_sample_rate, self.mixdown)?;

        Ok(Export {
            wav: write_wav(&merged)?,
            frames: merged.frame_count(),
            sample_rate: merged.sample_rate(),
            is_empty,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::trim::TrimRange;
    use crate::audio::wav::read_wav;

    fn pcm_of(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn sequential() -> Engine {
        Engine::new(&EngineConfig {
            parallel: false,
            ..EngineConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn generated_fragment_decodes_at_working_rate() {
        let fragment = Fragment::generated(vec![0u8; 48000], 0.0).unwrap();
        let buffer = Engine::default().render_fragment(&fragment).unwrap();

        assert_eq!(buffer.frame_count(), 24000);
        assert_eq!(buffer.sample_rate(), 24000);
    }

    #[test]
    fn generated_fragment_applies_speed() {
        let fragment = Fragment::generated_with_speed(vec![0u8; 48000], 1.2, 0.0).unwrap();
        let buffer = Engine::default().render_fragment(&fragment).unwrap();
        assert_eq!(buffer.frame_count(), 20000);
    }

    #[test]
    fn odd_pcm_fails() {
        let fragment = Fragment::generated(vec![0u8; 3], 0.0).unwrap();
        assert!(matches!(
            Engine::default().render_fragment(&fragment),
            Err(VoxspliceError::MalformedAudio { .. })
        ));
    }

    #[test]
    fn upload_is_converted_then_trimmed() {
        let buffer = SampleBuffer::new(vec![vec![0.5; 48000], vec![-0.5; 48000]], 48000).unwrap();
        let fragment = Fragment::uploaded(buffer, Some(TrimRange::new(0.25, 0.75)), 0.0).unwrap();

        let rendered = Engine::default().render_fragment(&fragment).unwrap();
        assert_eq!(rendered.sample_rate(), 24000);
        assert_eq!(rendered.channel_count(), 2);
        assert_eq!(rendered.frame_count(), 12000);
    }

    #[test]
    fn render_all_keeps_order_and_isolates_failures() {
        let fragments = vec![
            Fragment::generated(pcm_of(&[100; 10]), 0.0).unwrap(),
            Fragment::generated(vec![0u8; 5], 0.0).unwrap(),
            Fragment::generated(pcm_of(&[200; 30]), 0.0).unwrap(),
        ];

        let results = Engine::default().render_all(&fragments);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().frame_count(), 10);
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().frame_count(), 30);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let fragments: Vec<Fragment> = (1..6)
            .map(|n| {
                Fragment::generated_with_speed(pcm_of(&vec![n * 1000; 500]), 0.9, 0.01).unwrap()
            })
            .collect();

        let parallel: Vec<_> = Engine::default()
            .render_all(&fragments)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        let serial: Vec<_> = sequential()
            .render_all(&fragments)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(parallel, serial);
    }

    #[test]
    fn more_fragments_than_workers_keep_their_order() {
        let workers = thread::available_parallelism().map_or(1, |n| n.get());
        let fragments: Vec<Fragment> = (0..workers * 3 + 2)
            .map(|i| Fragment::generated(pcm_of(&vec![0; i + 1]), 0.0).unwrap())
            .collect();

        let results = Engine::default().render_all(&fragments);

        assert_eq!(results.len(), fragments.len());
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.as_ref().unwrap().frame_count(), i + 1);
        }
    }

    #[test]
    fn chunked_rendering_covers_uneven_splits() {
        let fragments: Vec<Fragment> = (0..10)
            .map(|i| Fragment::generated(pcm_of(&vec![0; i + 1]), 0.0).unwrap())
            .collect();
        let engine = Engine::default();

        for workers in [0, 1, 3, 4, 10, 64] {
            let lengths: Vec<usize> = engine
                .render_chunked(&fragments, workers)
                .into_iter()
                .map(|r| r.unwrap().frame_count())
                .collect();
            assert_eq!(lengths, (1..=10).collect::<Vec<_>>(), "workers {}", workers);
        }
    }

    #[test]
    fn export_assembles_two_fragments() {
        let fragments = vec![
            Fragment::generated(vec![0u8; 48000], 1.0).unwrap(),
            Fragment::generated(vec![0u8; 24000], 0.0).unwrap(),
        ];

        let export = Engine::default().export(&fragments).unwrap();

        assert_eq!(export.frames, 60000);
        assert!(!export.is_empty);
        assert!((export.duration() - 2.5).abs() < 1e-12);
        assert_eq!(export.wav.len(), 44 + 60000 * 2);
    }

    #[test]
    fn export_of_nothing_is_flagged_empty() {
        let export = Engine::default().export(&[]).unwrap();

        assert!(export.is_empty);
        assert_eq!(export.frames, 1);
        assert_eq!(read_wav(&export.wav).unwrap().frame_count(), 1);
    }

    #[test]
    fn export_reports_failing_fragment_index() {
        let fragments = vec![
            Fragment::generated(vec![0u8; 4], 0.0).unwrap(),
            Fragment::generated(vec![0u8; 7], 0.0).unwrap(),
        ];

        match sequential().export(&fragments) {
            Err(VoxspliceError::Fragment { index, source }) => {
                assert_eq!(index, 1);
                assert!(matches!(*source, VoxspliceError::MalformedAudio { .. }));
            }
            other => panic!("Expected Fragment error, got {:?}", other),
        }
    }

    #[test]
    fn preview_is_a_wav_of_the_rendered_fragment() {
        let fragment = Fragment::generated(pcm_of(&[16384; 100]), 0.0).unwrap();
        let wav = Engine::default().preview_fragment(&fragment).unwrap();
        let decoded = read_wav(&wav).unwrap();

        assert_eq!(decoded.frame_count(), 100);
        assert!((decoded.channel(0).unwrap()[0] - 0.5).abs() <= 1.0 / 32767.0);
    }

    #[test]
    fn zero_working_rate_is_rejected() {
        let config = EngineConfig {
            working_sample_rate: 0,
            ..EngineConfig::default()
        };
        assert!(Engine::new(&config).is_err());
    }
}
