//! Error types for the vibe engine.
//!
//! Every failure in this crate is a local validation failure detected before
//! any computation proceeds. There is no retry path: the inputs are
//! deterministic, so retrying without changing the input cannot succeed, and
//! a silently-wrong note sequence is worse than an explicit failure.

/// Result type alias for vibe engine operations.
pub type Result<T> = std::result::Result<T, VibeError>;

/// Top-level error type for all engine operations.
#[derive(Debug, thiserror::Error)]
pub enum VibeError {
    /// Malformed or empty pixel buffer, or zero image dimension.
    #[error(transparent)]
    InvalidImage(#[from] InvalidImageError),

    /// Non-finite pitch value handed to the chord mapper.
    #[error(transparent)]
    InvalidPitch(#[from] InvalidPitchError),

    /// Out-of-range pipeline or export configuration.
    #[error(transparent)]
    InvalidConfig(#[from] InvalidConfigError),

    /// Generic I/O error (MIDI file writing, image loading).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The parallel analyzer's worker pool is gone (channel closed).
    #[error("worker pool unavailable: {0}")]
    WorkerPool(&'static str),
}

/// The image buffer cannot be interpreted as a width x height RGBA raster.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidImageError {
    /// Width or height is zero; there is nothing to sample.
    #[error("image has a zero dimension: {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    /// Buffer length does not equal width * height * 4.
    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// A pitch value that is not a finite number (NaN or infinite).
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("pitch value is not a finite number: {0}")]
pub struct InvalidPitchError(pub f64);

/// A configuration value outside its documented range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidConfigError {
    #[error("sample count must be at least 1")]
    ZeroSampleCount,

    #[error("row stride must be at least 1")]
    ZeroRowStride,

    #[error("BPM must be between 20 and 200, got {0}")]
    BpmOutOfRange(u32),

    #[error("duration must be between 1 and 300 seconds, got {0}")]
    DurationOutOfRange(u32),

    #[error("at least one MIDI track kind must be requested")]
    EmptyTrackList,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_errors_render_their_geometry() {
        let err = InvalidImageError::BufferSizeMismatch {
            width: 2,
            height: 2,
            expected: 16,
            actual: 7,
        };
        let message = err.to_string();
        assert!(message.contains("7 bytes"));
        assert!(message.contains("2x2"));
    }

    #[test]
    fn top_level_error_wraps_each_kind() {
        let image: VibeError = InvalidImageError::ZeroDimension {
            width: 0,
            height: 4,
        }
        .into();
        assert!(matches!(image, VibeError::InvalidImage(_)));

        let pitch: VibeError = InvalidPitchError(f64::NAN).into();
        assert!(matches!(pitch, VibeError::InvalidPitch(_)));

        let config: VibeError = InvalidConfigError::ZeroSampleCount.into();
        assert!(matches!(config, VibeError::InvalidConfig(_)));
    }
}
