//! Documented parameter ranges with clamp-to-nearest semantics.
//!
//! An interactive instrument must never halt on a bad knob value, so every
//! setter input is passed through a [`ParamRange`]: out-of-range values snap
//! to the nearest bound (infinities included) and NaN falls back to the default.
//!
//! ```rust
//! use patchlab_core::ParamRange;
//!
//! const SUSTAIN: ParamRange = ParamRange::new(0.0, 1.0, 0.7);
//!
//! assert_eq!(SUSTAIN.clamp(1.4), 1.0);
//! assert_eq!(SUSTAIN.clamp(f32::NAN), 0.7);
//! assert_eq!(SUSTAIN.clamp(f32::NEG_INFINITY), 0.0);
//! assert!(SUSTAIN.clamp_report(-0.2).adjusted);
//! ```

/// Inclusive numeric range with a default value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    /// Lowest accepted value.
    pub min: f32,
    /// Highest accepted value.
    pub max: f32,
    /// Value used when no value (or NaN) is supplied.
    pub default: f32,
}

/// Result of clamping a value, recording whether it was changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clamped<T> {
    /// The in-range value.
    pub value: T,
    /// `true` when the input had to be adjusted.
    pub adjusted: bool,
}

impl ParamRange {
    /// Unipolar unit range [0, 1].
    pub const UNIT: ParamRange = ParamRange::new(0.0, 1.0, 0.0);
    /// Bipolar unit range [-1, 1].
    pub const BIPOLAR: ParamRange = ParamRange::new(-1.0, 1.0, 0.0);

    /// Create a range. `min <= default <= max` is expected.
    pub const fn new(min: f32, max: f32, default: f32) -> Self {
        Self { min, max, default }
    }

    /// Clamp to the nearest bound; NaN yields the default.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        self.clamp_report(value).value
    }

    /// Clamp and report whether the input was adjusted.
    #[inline]
    pub fn clamp_report(&self, value: f32) -> Clamped<f32> {
        if value.is_nan() {
            return Clamped {
                value: self.default,
                adjusted: true,
            };
        }
        let clamped = value.clamp(self.min, self.max);
        Clamped {
            value: clamped,
            adjusted: clamped != value,
        }
    }

    /// Whether `value` lies within the range.
    #[inline]
    pub fn contains(&self, value: f32) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    /// Width of the range.
    #[inline]
    pub fn span(&self) -> f32 {
        self.max - self.min
    }
}
