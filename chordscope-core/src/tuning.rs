//! # Musical Tuning Module
//!
//! Maps frequencies onto the twelve equal-tempered pitch classes referenced
//! to A4 = 440 Hz, and pitch numbers back to note names.
//!
//! Pitch numbers run 1-12 starting at A (A = 1, A# = 2, ... G# = 12), which
//! is also the note numbering used by the chord dictionary.

use crate::error::{Error, Result};

/// Reference pitch for A, in Hz.
pub const A4_FREQ: f32 = 440.0;

/// Chromatic note names, indexed by `pitch_number - 1`.
pub const NOTE_NAMES: [&str; 12] = [
    "A", "A#", "B", "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#",
];

/// A frequency reduced to its pitch class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchReading {
    /// Pitch number, 1 (A) to 12 (G#).
    pub number: u8,
    /// Deviation from the equal-tempered pitch, positive when sharp.
    pub cents_sharp: f32,
}

impl PitchReading {
    /// Name of the pitch class, e.g. "C#".
    ///
    /// # Errors
    /// * `OutOfRange` if `number` is outside 1..=12
    pub fn name(&self) -> Result<&'static str> {
        pitch_name(self.number)
    }
}

/// Calculates the deviation from a target frequency in cents.
///
/// * 100 cents = 1 semitone
/// * 1200 cents = 1 octave
/// * Positive values indicate sharpness, negative values indicate flatness
pub fn calculate_cents_deviation(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}

/// Finds the pitch class of `freq`.
///
/// The frequency is folded into the octave [440, 880) and rounded to the
/// nearest semitone above A. Rounding up past G# is clamped to G#, so a
/// frequency just under A5 reports G# with a large positive cent offset.
///
/// # Errors
/// * `InvalidArgument` if `freq` is not a positive, finite number
pub fn pitch_number(freq: f32) -> Result<PitchReading> {
    if !(freq.is_finite() && freq > 0.0) {
        log::debug!("Invalid frequency: {}", freq);
        return Err(Error::invalid(format!("frequency must be positive, got {freq}")));
    }

    let semitone = 2.0_f64.powf(1.0 / 12.0);
    let mut freq = freq as f64;
    while freq < A4_FREQ as f64 {
        freq *= 2.0;
    }
    while freq >= 2.0 * A4_FREQ as f64 {
        freq /= 2.0;
    }

    let index = ((freq / A4_FREQ as f64).ln() / semitone.ln()).round().clamp(0.0, 11.0);
    let target = A4_FREQ as f64 * semitone.powf(index);
    let cents_sharp = calculate_cents_deviation(freq as f32, target as f32);

    Ok(PitchReading {
        number: index as u8 + 1,
        cents_sharp,
    })
}

/// Returns the note name of a pitch number.
///
/// # Errors
/// * `OutOfRange` if `pitch_num` is outside 1..=12
pub fn pitch_name(pitch_num: u8) -> Result<&'static str> {
    match pitch_num {
        1..=12 => Ok(NOTE_NAMES[(pitch_num - 1) as usize]),
        _ => Err(Error::OutOfRange(format!(
            "pitch number must be between 1 and 12, got {pitch_num}"
        ))),
    }
}
