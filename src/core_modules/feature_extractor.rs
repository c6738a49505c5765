// THEORY:
// The feature extractor is the first stage of the core pipeline and the
// bridge between raw pixels and music. It slices the frame into a fixed
// number of evenly spaced sample columns, averages each column's brightness
// over a strided subset of its rows, and quantizes that average into a MIDI
// scale degree.
//
// Key architectural principles:
// 1.  **Pure, deterministic transform**: No state, no randomness, no I/O.
//     The same frame and parameters always produce the same sequence, and
//     the output is regenerated wholesale; there is no incremental update.
// 2.  **True-count averaging**: The column average divides by the number of
//     rows actually sampled, not the nominal `height / stride`. When the
//     height is not a multiple of the stride the nominal divisor skews the
//     average toward dark (a 1x7 column samples rows 0 and 6 but would
//     divide by 7/6); the true count keeps every average in [0, 255].
// 3.  **Fixed output shape**: Exactly `sample_count` features, in sample
//     index order, each an integer scale degree in [48, 84].

use crate::core_modules::frame::ImageFrame;
use crate::core_modules::chord::ScaleDegree;
use crate::core_modules::pixel::pixel::Brightness;
use crate::error::{InvalidConfigError, Result};
use serde::Serialize;

/// Number of sample columns in the default 16-step sequence.
pub const DEFAULT_SAMPLE_COUNT: usize = 16;
/// Every 6th row of a column contributes to its brightness average.
pub const DEFAULT_ROW_STRIDE: usize = 6;

/// Low end of the scale-degree range (C3).
pub const SCALE_DEGREE_MIN: ScaleDegree = 48;
/// High end of the scale-degree range (C6), three octaves up.
pub const SCALE_DEGREE_MAX: ScaleDegree = 84;

/// Tunable parameters for the feature extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExtractorConfig {
    /// Number of evenly spaced sample columns. Must be at least 1.
    pub sample_count: usize,
    /// Row step within each sampled column. Must be at least 1.
    pub row_stride: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            row_stride: DEFAULT_ROW_STRIDE,
        }
    }
}

impl ExtractorConfig {
    pub fn validate(&self) -> std::result::Result<(), InvalidConfigError> {
        if self.sample_count == 0 {
            return Err(InvalidConfigError::ZeroSampleCount);
        }
        if self.row_stride == 0 {
            return Err(InvalidConfigError::ZeroRowStride);
        }
        Ok(())
    }
}

/// One sampled column, fully analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnFeature {
    /// Sample index i in [0, sample_count).
    pub sample_index: usize,
    /// The pixel column this sample read.
    pub column_x: u32,
    /// Mean brightness of the strided rows in that column, in [0, 255].
    pub brightness: Brightness,
    /// The brightness quantized into [48, 84].
    pub scale_degree: ScaleDegree,
}

/// Extract one `ColumnFeature` per sample column, in sample index order.
pub fn extract_features(
    frame: &ImageFrame<'_>,
    config: &ExtractorConfig,
) -> std::result::Result<Vec<ColumnFeature>, InvalidConfigError> {
    config.validate()?;

    let mut features = Vec::with_capacity(config.sample_count);
    for sample_index in 0..config.sample_count {
        let column_x = column_for_sample(sample_index, config.sample_count, frame.width());

        // Average brightness over rows y = 0, stride, 2*stride, ... < height,
        // dividing by the true number of rows sampled.
        let mut sum = 0.0;
        let mut sampled_rows = 0usize;
        let mut y = 0u32;
        while y < frame.height() {
            sum += frame.brightness_at(column_x, y);
            sampled_rows += 1;
            y += config.row_stride as u32;
        }
        let brightness = sum / sampled_rows as Brightness;

        features.push(ColumnFeature {
            sample_index,
            column_x,
            brightness,
            scale_degree: brightness_to_scale_degree(brightness),
        });
    }
    Ok(features)
}

/// Extract only the ordered scale degrees from a raw RGBA buffer.
///
/// Convenience entry point matching the classic contract: validates the
/// buffer geometry itself and fails with `InvalidImageError` before reading
/// a single pixel.
pub fn extract_scale_degrees(
    width: u32,
    height: u32,
    pixels: &[u8],
    config: &ExtractorConfig,
) -> Result<Vec<ScaleDegree>> {
    let frame = ImageFrame::new(width, height, pixels)?;
    let features = extract_features(&frame, config)?;
    Ok(features.iter().map(|f| f.scale_degree).collect())
}

/// The x coordinate of sample i: round(i / (N-1) * (width-1)), clamped to
/// the valid column range. A single sample reads the center column.
pub fn column_for_sample(sample_index: usize, sample_count: usize, width: u32) -> u32 {
    let last_column = (width - 1) as f64;
    let x = if sample_count == 1 {
        (last_column / 2.0).round()
    } else {
        (sample_index as f64 / (sample_count - 1) as f64 * last_column).round()
    };
    (x as u32).min(width - 1)
}

/// Linear remap of a brightness average [0, 255] into a scale degree
/// [48, 84], rounded half away from zero.
pub fn brightness_to_scale_degree(brightness: Brightness) -> ScaleDegree {
    let span = (SCALE_DEGREE_MAX - SCALE_DEGREE_MIN) as f64;
    (SCALE_DEGREE_MIN as f64 + brightness / 255.0 * span).round() as ScaleDegree
}
