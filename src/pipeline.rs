// THEORY:
// The `pipeline` module is the top-level API for the vibe engine. It wraps
// the full analysis stack (feature extraction, chord mapping, image
// statistics, optional story generation) behind a single facade so callers
// hand in a frame and get back one coherent report.
//
// Unlike a video pipeline there is no state to carry between calls: every
// analysis is a pure transform of one image, and the report it returns is an
// owned value the caller is free to publish, serialize or discard.

use crate::core_modules::feature_extractor::ExtractorConfig;
use crate::core_modules::frame::ImageFrame;
use crate::core_modules::image_stats::{self, ImageStats};
use crate::core_modules::story;
use crate::error::Result;
use rand::Rng;
use serde::Serialize;

// Re-export key data structures for the public API.
pub use crate::core_modules::chord::{ScaleDegree, Triad};
pub use crate::core_modules::feature_extractor::{DEFAULT_ROW_STRIDE, DEFAULT_SAMPLE_COUNT};
pub use crate::core_modules::image_stats::{BrightnessClass, ColorClass, EdgeDensityClass};
pub use crate::core_modules::sequence::{NoteSequence, NoteStep, PlaybackCursor};

/// Configuration for the VibePipeline, allowing for tunable behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineConfig {
    /// Number of sample columns, i.e. steps in the output sequence.
    pub sample_count: usize,
    /// Row stride of the per-column brightness average.
    pub row_stride: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            row_stride: DEFAULT_ROW_STRIDE,
        }
    }
}

impl PipelineConfig {
    fn extractor(&self) -> ExtractorConfig {
        ExtractorConfig {
            sample_count: self.sample_count,
            row_stride: self.row_stride,
        }
    }
}

/// The primary output of the pipeline for a single image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VibeReport {
    /// The 16-step (by default) chord sequence.
    pub sequence: NoteSequence,
    /// Dominant colors, brightness and edge statistics.
    pub stats: ImageStats,
    /// The mythic story, when requested.
    pub story: Option<String>,
}

/// The main, top-level struct for the vibe engine.
#[derive(Debug, Clone)]
pub struct VibePipeline {
    config: PipelineConfig,
}

impl VibePipeline {
    /// Build a pipeline, validating the configuration up front.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.extractor().validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Analyze one frame: note sequence plus image statistics.
    pub fn analyze(&self, frame: &ImageFrame<'_>) -> VibeReport {
        // The config was validated in `new`, so extraction cannot fail on a
        // valid frame.
        let sequence = NoteSequence::from_frame(frame, &self.config.extractor())
            .expect("validated config");
        VibeReport {
            sequence,
            stats: image_stats::analyze(frame),
            story: None,
        }
    }

    /// Analyze one frame and render its story with the caller's RNG.
    pub fn analyze_with_story<R: Rng + ?Sized>(
        &self,
        frame: &ImageFrame<'_>,
        rng: &mut R,
    ) -> VibeReport {
        let mut report = self.analyze(frame);
        report.story = Some(story::render_story(&report.stats, rng));
        report
    }

    /// Analyze a raw RGBA buffer, validating its geometry first.
    pub fn analyze_raw(&self, width: u32, height: u32, pixels: &[u8]) -> Result<VibeReport> {
        let frame = ImageFrame::new(width, height, pixels)?;
        Ok(self.analyze(&frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InvalidImageError, VibeError};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn checker_buffer(width: u32, height: u32) -> Vec<u8> {
        let mut buffer = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let value = if (x + y) % 2 == 0 { 40 } else { 220 };
                buffer.extend_from_slice(&[value, value, value, 255]);
            }
        }
        buffer
    }

    #[test]
    fn report_sequence_matches_config_length() {
        let pipeline = VibePipeline::new(PipelineConfig::default()).unwrap();
        let buffer = checker_buffer(32, 8);
        let report = pipeline.analyze_raw(32, 8, &buffer).unwrap();
        assert_eq!(report.sequence.len(), 16);
        assert!(report.story.is_none());
    }

    #[test]
    fn analyze_is_deterministic() {
        let pipeline = VibePipeline::new(PipelineConfig::default()).unwrap();
        let buffer = checker_buffer(20, 10);
        let first = pipeline.analyze_raw(20, 10, &buffer).unwrap();
        let second = pipeline.analyze_raw(20, 10, &buffer).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn story_variant_fills_the_story() {
        let pipeline = VibePipeline::new(PipelineConfig::default()).unwrap();
        let buffer = checker_buffer(8, 8);
        let frame = ImageFrame::new(8, 8, &buffer).unwrap();
        let report = pipeline.analyze_with_story(&frame, &mut StdRng::seed_from_u64(5));
        assert!(report.story.is_some());
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = PipelineConfig {
            sample_count: 0,
            row_stride: 6,
        };
        assert!(matches!(
            VibePipeline::new(config),
            Err(VibeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn invalid_buffer_is_rejected_before_analysis() {
        let pipeline = VibePipeline::new(PipelineConfig::default()).unwrap();
        let err = pipeline.analyze_raw(4, 0, &[]).unwrap_err();
        assert!(matches!(
            err,
            VibeError::InvalidImage(InvalidImageError::ZeroDimension { .. })
        ));
    }

    #[test]
    fn report_serializes_to_json() {
        let pipeline = VibePipeline::new(PipelineConfig::default()).unwrap();
        let buffer = checker_buffer(16, 4);
        let report = pipeline.analyze_raw(16, 4, &buffer).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"sequence\""));
        assert!(json.contains("\"mean_brightness\""));
    }
}
