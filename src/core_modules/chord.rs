// THEORY:
// The chord mapper is the second stage of the core pipeline. It turns a
// scale degree (a MIDI note number) into a playable major triad of root,
// major third and perfect fifth, expressed as frequencies in Hz via standard
// 12-tone equal temperament: f = 440 * 2^((midi - 69) / 12).
//
// The mapper accepts any integer scale degree (the extractor always supplies
// [48, 84], but nothing here depends on that). The floating-point entry
// point rejects non-finite values with `InvalidPitchError`; that is the only
// failure mode.

use crate::error::InvalidPitchError;
use serde::Serialize;

/// A pitch value in the MIDI numbering convention (60 = middle C).
pub type ScaleDegree = i32;
/// A frequency in Hz.
pub type Frequency = f64;

/// Semitone offset of a major third above the root.
pub const MAJOR_THIRD: ScaleDegree = 4;
/// Semitone offset of a perfect fifth above the root.
pub const PERFECT_FIFTH: ScaleDegree = 7;

const A4_MIDI: f64 = 69.0;
const A4_FREQUENCY: Frequency = 440.0;
const SEMITONES_PER_OCTAVE: f64 = 12.0;

/// Convert a MIDI note number to its 12-TET frequency in Hz.
///
/// ```
/// let c4 = vibe_engine::core_modules::chord::midi_note_to_frequency(60);
/// assert!((c4 - 261.63).abs() < 0.01);
/// ```
pub fn midi_note_to_frequency(midi: ScaleDegree) -> Frequency {
    A4_FREQUENCY * 2f64.powf((midi as f64 - A4_MIDI) / SEMITONES_PER_OCTAVE)
}

/// Convert an arbitrary numeric pitch to Hz, rejecting NaN and infinities.
pub fn pitch_to_frequency(pitch: f64) -> Result<Frequency, InvalidPitchError> {
    if !pitch.is_finite() {
        return Err(InvalidPitchError(pitch));
    }
    Ok(A4_FREQUENCY * 2f64.powf((pitch - A4_MIDI) / SEMITONES_PER_OCTAVE))
}

/// A major triad voiced as three frequencies in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Triad {
    /// Frequency of the root pitch.
    pub root: Frequency,
    /// Frequency of the major third above the root.
    pub third: Frequency,
    /// Frequency of the perfect fifth above the root.
    pub fifth: Frequency,
}

impl Triad {
    /// Build the triad {degree, degree+4, degree+7} for an integer scale
    /// degree. Infallible: every integer is a valid (if extreme) pitch.
    pub fn from_scale_degree(degree: ScaleDegree) -> Self {
        Self {
            root: midi_note_to_frequency(degree),
            third: midi_note_to_frequency(degree + MAJOR_THIRD),
            fifth: midi_note_to_frequency(degree + PERFECT_FIFTH),
        }
    }

    /// Build the triad for an arbitrary numeric pitch.
    pub fn from_pitch(pitch: f64) -> Result<Self, InvalidPitchError> {
        Ok(Self {
            root: pitch_to_frequency(pitch)?,
            third: pitch_to_frequency(pitch + MAJOR_THIRD as f64)?,
            fifth: pitch_to_frequency(pitch + PERFECT_FIFTH as f64)?,
        })
    }

    /// The three frequencies in ascending order.
    pub fn frequencies(&self) -> [Frequency; 3] {
        [self.root, self.third, self.fifth]
    }
}
