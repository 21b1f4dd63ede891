//! Low Frequency Oscillator for control-rate modulation.
//!
//! The oscillator is a phase accumulator advanced from *absolute* time rather
//! than a sample counter: every call to [`Lfo::advance_to`] measures the
//! elapsed interval since the previous call, so a late tick catches up
//! instead of accumulating drift.

use core::f32::consts::PI;
use libm::{floor, sinf};

/// LFO waveform type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LfoWaveform {
    /// Smooth, natural modulation.
    #[default]
    Sine,
    /// Linear ramps up and down.
    Triangle,
    /// Binary high/low modulation.
    Square,
    /// Rising ramp with an abrupt reset.
    Sawtooth,
}

impl LfoWaveform {
    /// All waveforms, in declaration order.
    pub const ALL: [LfoWaveform; 4] = [
        LfoWaveform::Sine,
        LfoWaveform::Triangle,
        LfoWaveform::Square,
        LfoWaveform::Sawtooth,
    ];

    /// Map a phase in [0, 1) to a value in [-1, 1].
    ///
    /// Phases outside [0, 1) are wrapped first.
    #[inline]
    pub fn value_at(self, phase: f32) -> f32 {
        let phase = wrap_unit(f64::from(phase)) as f32;
        match self {
            LfoWaveform::Sine => sinf(phase * 2.0 * PI),
            LfoWaveform::Triangle => {
                // Starts at 0 rising, like the sine, so the two are interchangeable
                if phase < 0.25 {
                    4.0 * phase
                } else if phase < 0.75 {
                    2.0 - 4.0 * phase
                } else {
                    4.0 * phase - 4.0
                }
            }
            LfoWaveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            LfoWaveform::Sawtooth => 2.0 * phase - 1.0,
        }
    }
}

#[inline]
fn wrap_unit(phase: f64) -> f64 {
    let wrapped = phase - floor(phase);
    // floor() of values a hair below an integer can round the result up to 1.0
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

/// Phase accumulator for a control-rate LFO.
///
/// The accumulator only tracks phase; rate and waveform are supplied by the
/// caller each tick so that parameter snapshots can change between ticks
/// without the LFO owning any parameters.
///
/// # Example
///
/// ```rust
/// use patchlab_core::{Lfo, LfoWaveform};
///
/// let mut lfo = Lfo::new();
/// lfo.advance_to(0.125, 2.0); // a quarter cycle at 2 Hz
/// assert!((lfo.phase() - 0.25).abs() < 1e-6);
/// assert!((LfoWaveform::Sine.value_at(lfo.phase()) - 1.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct Lfo {
    /// Current phase position [0.0, 1.0)
    phase: f64,
    /// Absolute time (seconds) of the last advance
    last_time: f64,
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new()
    }
}

impl Lfo {
    /// Create an LFO at phase 0 whose clock origin is time 0.
    pub fn new() -> Self {
        Self::starting_at(0.0)
    }

    /// Create an LFO at phase 0 whose clock origin is `time` seconds.
    pub fn starting_at(time: f64) -> Self {
        Self {
            phase: 0.0,
            last_time: time,
        }
    }

    /// Advance the phase to absolute time `now` at `rate_hz` cycles per second.
    ///
    /// `phase += rate * dt (mod 1)`, where `dt` is measured from the previous
    /// call. A clock that runs backwards only re-anchors; phase never rewinds.
    #[inline]
    pub fn advance_to(&mut self, now: f64, rate_hz: f32) -> f32 {
        let dt = now - self.last_time;
        if dt > 0.0 {
            self.phase = wrap_unit(self.phase + f64::from(rate_hz.max(0.0)) * dt);
        }
        self.last_time = now;
        self.phase as f32
    }

    /// Phase reached after `elapsed` seconds at a constant rate from `start_phase`.
    ///
    /// Pure form of [`advance_to`](Self::advance_to) for visualization and tests.
    #[inline]
    pub fn phase_at(start_phase: f32, rate_hz: f32, elapsed: f64) -> f32 {
        wrap_unit(f64::from(start_phase) + f64::from(rate_hz.max(0.0)) * elapsed) as f32
    }

    /// Current phase (0.0 - 1.0).
    pub fn phase(&self) -> f32 {
        self.phase as f32
    }

    /// Absolute time of the last advance.
    pub fn last_time(&self) -> f64 {
        self.last_time
    }

    /// Reset phase to 0 and move the clock origin to `time`.
    pub fn reset(&mut self, time: f64) {
        self.phase = 0.0;
        self.last_time = time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lfo_one_cycle_per_second() {
        let mut lfo = Lfo::new();
        for i in 1..=100 {
            lfo.advance_to(f64::from(i) * 0.01, 1.0);
        }
        let phase_error = lfo.phase().min((lfo.phase() - 1.0).abs());
        assert!(phase_error < 1e-6, "phase after one second: {}", lfo.phase());
    }

    #[test]
    fn test_late_tick_catches_up() {
        let mut steady = Lfo::new();
        let mut jittery = Lfo::new();

        for i in 1..=40 {
            steady.advance_to(f64::from(i) * 0.005, 3.0);
        }
        // One late tick covering the same span
        jittery.advance_to(0.2, 3.0);

        assert!((steady.phase() - jittery.phase()).abs() < 1e-6);
    }

    #[test]
    fn test_backwards_clock_does_not_rewind() {
        let mut lfo = Lfo::new();
        lfo.advance_to(0.1, 1.0);
        let phase = lfo.phase();
        lfo.advance_to(0.05, 1.0);
        assert_eq!(lfo.phase(), phase);
    }

    #[test]
    fn test_waveform_output_range() {
        for waveform in LfoWaveform::ALL {
            for i in 0..1000 {
                let value = waveform.value_at(i as f32 / 1000.0);
                assert!(
                    (-1.0..=1.0).contains(&value),
                    "Waveform {:?} out of range: {}",
                    waveform,
                    value
                );
            }
        }
    }

    #[test]
    fn test_waveform_landmarks() {
        assert!(LfoWaveform::Sine.value_at(0.0).abs() < 1e-6);
        assert!((LfoWaveform::Sine.value_at(0.25) - 1.0).abs() < 1e-6);
        assert!((LfoWaveform::Triangle.value_at(0.25) - 1.0).abs() < 1e-6);
        assert!((LfoWaveform::Triangle.value_at(0.75) + 1.0).abs() < 1e-6);
        assert_eq!(LfoWaveform::Square.value_at(0.1), 1.0);
        assert_eq!(LfoWaveform::Square.value_at(0.6), -1.0);
        assert_eq!(LfoWaveform::Sawtooth.value_at(0.0), -1.0);
        assert!(LfoWaveform::Sawtooth.value_at(0.5).abs() < 1e-6);
    }

    #[test]
    fn test_phase_at_wraps() {
        assert!((Lfo::phase_at(0.75, 1.0, 0.5) - 0.25).abs() < 1e-6);
        assert!((Lfo::phase_at(0.0, 4.0, 1.0)).abs() < 1e-6);
    }
}
