//! Pitch and level conversions.
//!
//! All functions are allocation-free and `no_std` compatible.
//!
//! - [`midi_to_freq`] / [`freq_to_midi`] - Equal temperament, A4 (69) = 440 Hz
//! - [`cents_to_ratio`] / [`semitones_to_ratio`] - Interval to frequency ratio
//! - [`db_to_linear`] - Decibels to gain
//! - [`lerp`] - Linear interpolation

use libm::{log2f, powf};

/// Convert a (possibly fractional) MIDI note number to frequency in Hz.
///
/// # Example
/// ```rust
/// use patchlab_core::midi_to_freq;
///
/// assert!((midi_to_freq(69.0) - 440.0).abs() < 0.01);
/// assert!((midi_to_freq(60.0) - 261.63).abs() < 0.01);
/// ```
#[inline]
pub fn midi_to_freq(note: f32) -> f32 {
    440.0 * powf(2.0, (note - 69.0) / 12.0)
}

/// Convert frequency in Hz to a fractional MIDI note number.
#[inline]
pub fn freq_to_midi(freq: f32) -> f32 {
    69.0 + 12.0 * log2f(freq.max(1e-6) / 440.0)
}

/// Convert cents to a frequency ratio.
///
/// 100 cents = 1 semitone, 1200 cents = 1 octave.
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    powf(2.0, cents / 1200.0)
}

/// Convert semitones to a frequency ratio.
#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    powf(2.0, semitones / 12.0)
}

/// Convert decibels to linear gain.
///
/// ```rust
/// use patchlab_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    powf(10.0, db / 20.0)
}

/// Linear interpolation between `a` and `b` at `t` in [0, 1].
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
