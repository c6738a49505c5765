// THEORY:
// The `NoteSequence` is the engine's primary product: an owned, immutable
// value object holding exactly one playable step per sample column. It
// replaces the original ambient globals (a shared note list and a loop
// counter) with explicit ownership: whichever component loaded the image
// owns the sequence, and "updating" it means recomputing a whole new one.
//
// The `PlaybackCursor` carries the loop position that used to live in a
// global counter. It addresses the sequence by index modulo its length on
// whatever clock the caller ticks it from, and is reset when a new image
// replaces the sequence.

use crate::core_modules::chord::{ScaleDegree, Triad};
use crate::core_modules::feature_extractor::{self, ColumnFeature, ExtractorConfig};
use crate::core_modules::frame::ImageFrame;
use crate::core_modules::pixel::pixel::Brightness;
use crate::error::InvalidConfigError;
use serde::Serialize;

/// One playable step: a sampled column voiced as a triad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NoteStep {
    /// Sample index i in [0, sample_count).
    pub sample_index: usize,
    /// The scale degree the column's brightness mapped to.
    pub scale_degree: ScaleDegree,
    /// The major triad voicing of that degree, in Hz.
    pub triad: Triad,
    /// The column's brightness average, retained for export dynamics.
    pub brightness: Brightness,
}

impl NoteStep {
    fn from_feature(feature: &ColumnFeature) -> Self {
        Self {
            sample_index: feature.sample_index,
            scale_degree: feature.scale_degree,
            triad: Triad::from_scale_degree(feature.scale_degree),
            brightness: feature.brightness,
        }
    }
}

/// An ordered, immutable sequence of note steps derived from one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteSequence {
    steps: Vec<NoteStep>,
}

impl NoteSequence {
    /// Extract a fresh sequence from a frame. The result replaces any
    /// previous sequence wholesale; there is no partial-update path.
    pub fn from_frame(
        frame: &ImageFrame<'_>,
        config: &ExtractorConfig,
    ) -> Result<Self, InvalidConfigError> {
        let features = feature_extractor::extract_features(frame, config)?;
        Ok(Self {
            steps: features.iter().map(NoteStep::from_feature).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The steps in sample index order.
    pub fn steps(&self) -> &[NoteStep] {
        &self.steps
    }

    /// Read-only access by clock tick, index modulo length.
    pub fn step_at(&self, tick: usize) -> Option<&NoteStep> {
        if self.steps.is_empty() {
            return None;
        }
        Some(&self.steps[tick % self.steps.len()])
    }
}

/// Loop position over a `NoteSequence`, ticked by an external clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaybackCursor {
    position: usize,
}

impl PlaybackCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The step under the cursor, advancing to the next tick.
    pub fn advance<'a>(&mut self, sequence: &'a NoteSequence) -> Option<&'a NoteStep> {
        let step = sequence.step_at(self.position)?;
        self.position += 1;
        Some(step)
    }

    /// Rewind to the first step, as when a new image is loaded.
    pub fn reset(&mut self) {
        self.position = 0;
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_sequence() -> NoteSequence {
        // 16x2 left-to-right gradient: column x has brightness 17 * x.
        let width = 16u32;
        let mut buffer = vec![0u8; (width * 2 * 4) as usize];
        for y in 0..2 {
            for x in 0..width {
                let offset = ((y * width + x) * 4) as usize;
                let value = (x * 17) as u8;
                buffer[offset] = value;
                buffer[offset + 1] = value;
                buffer[offset + 2] = value;
                buffer[offset + 3] = 255;
            }
        }
        let frame = ImageFrame::new(width, 2, &buffer).unwrap();
        NoteSequence::from_frame(&frame, &ExtractorConfig::default()).unwrap()
    }

    #[test]
    fn sequence_has_one_step_per_sample() {
        let sequence = gradient_sequence();
        assert_eq!(sequence.len(), 16);
        for (i, step) in sequence.steps().iter().enumerate() {
            assert_eq!(step.sample_index, i);
        }
    }

    #[test]
    fn steps_carry_matching_triads() {
        let sequence = gradient_sequence();
        for step in sequence.steps() {
            assert_eq!(step.triad, Triad::from_scale_degree(step.scale_degree));
        }
    }

    #[test]
    fn gradient_degrees_are_nondecreasing() {
        let sequence = gradient_sequence();
        let degrees: Vec<_> = sequence.steps().iter().map(|s| s.scale_degree).collect();
        assert!(degrees.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn step_at_wraps_modulo_length() {
        let sequence = gradient_sequence();
        for tick in 0..sequence.len() {
            assert_eq!(sequence.step_at(tick), sequence.step_at(tick + sequence.len()));
        }
    }

    #[test]
    fn cursor_advances_and_wraps() {
        let sequence = gradient_sequence();
        let mut cursor = PlaybackCursor::new();
        let first = *cursor.advance(&sequence).unwrap();
        for _ in 1..sequence.len() {
            cursor.advance(&sequence).unwrap();
        }
        // One full loop later the cursor is back at step 0.
        let wrapped = *cursor.advance(&sequence).unwrap();
        assert_eq!(first, wrapped);
        assert_eq!(cursor.position(), sequence.len() + 1);
    }

    #[test]
    fn cursor_resets_to_start() {
        let sequence = gradient_sequence();
        let mut cursor = PlaybackCursor::new();
        cursor.advance(&sequence);
        cursor.advance(&sequence);
        cursor.reset();
        assert_eq!(cursor.position(), 0);
        assert_eq!(
            cursor.advance(&sequence).unwrap().sample_index,
            0
        );
    }
}
