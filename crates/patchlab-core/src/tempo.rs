//! Tempo and note divisions for tempo-synced LFOs and the arpeggiator.
//!
//! Divisions use the compact token form common in web audio tooling:
//! `"4n"` is a quarter note, `"8t"` an eighth-note triplet and `"4n."` a
//! dotted quarter.

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

/// Musical note divisions for tempo sync.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NoteDivision {
    /// Whole note (4 beats)
    Whole,
    /// Half note (2 beats)
    Half,
    /// Quarter note (1 beat)
    #[default]
    Quarter,
    /// Eighth note (1/2 beat)
    Eighth,
    /// Sixteenth note (1/4 beat)
    Sixteenth,
    /// Thirty-second note (1/8 beat)
    ThirtySecond,
    /// Dotted half note (3 beats)
    DottedHalf,
    /// Dotted quarter note (1.5 beats)
    DottedQuarter,
    /// Dotted eighth note (3/4 beat)
    DottedEighth,
    /// Triplet quarter note (2/3 beat)
    TripletQuarter,
    /// Triplet eighth note (1/3 beat)
    TripletEighth,
    /// Triplet sixteenth note (1/6 beat)
    TripletSixteenth,
}

/// Error returned when a division token is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown note division token")]
pub struct ParseDivisionError;

impl NoteDivision {
    /// Every division, in declaration order.
    pub const ALL: [NoteDivision; 12] = [
        NoteDivision::Whole,
        NoteDivision::Half,
        NoteDivision::Quarter,
        NoteDivision::Eighth,
        NoteDivision::Sixteenth,
        NoteDivision::ThirtySecond,
        NoteDivision::DottedHalf,
        NoteDivision::DottedQuarter,
        NoteDivision::DottedEighth,
        NoteDivision::TripletQuarter,
        NoteDivision::TripletEighth,
        NoteDivision::TripletSixteenth,
    ];

    /// Get the number of beats this division represents.
    pub fn beats(&self) -> f32 {
        match self {
            NoteDivision::Whole => 4.0,
            NoteDivision::Half => 2.0,
            NoteDivision::Quarter => 1.0,
            NoteDivision::Eighth => 0.5,
            NoteDivision::Sixteenth => 0.25,
            NoteDivision::ThirtySecond => 0.125,
            NoteDivision::DottedHalf => 3.0,
            NoteDivision::DottedQuarter => 1.5,
            NoteDivision::DottedEighth => 0.75,
            NoteDivision::TripletQuarter => 2.0 / 3.0,
            NoteDivision::TripletEighth => 1.0 / 3.0,
            NoteDivision::TripletSixteenth => 1.0 / 6.0,
        }
    }

    /// Duration of one division in seconds at the given BPM.
    ///
    /// ```rust
    /// use patchlab_core::NoteDivision;
    ///
    /// assert!((NoteDivision::Quarter.seconds(120.0) - 0.5).abs() < 1e-9);
    /// assert!((NoteDivision::Sixteenth.seconds(120.0) - 0.125).abs() < 1e-9);
    /// ```
    pub fn seconds(&self, bpm: f32) -> f64 {
        f64::from(self.beats()) * 60.0 / f64::from(bpm.max(1.0))
    }

    /// Frequency in Hz of one cycle per division at the given BPM.
    ///
    /// At 120 BPM a quarter note is 2 Hz.
    pub fn to_hz(&self, bpm: f32) -> f32 {
        (1.0 / self.seconds(bpm)) as f32
    }

    /// Token form, e.g. `"16n"`.
    pub fn token(&self) -> &'static str {
        match self {
            NoteDivision::Whole => "1n",
            NoteDivision::Half => "2n",
            NoteDivision::Quarter => "4n",
            NoteDivision::Eighth => "8n",
            NoteDivision::Sixteenth => "16n",
            NoteDivision::ThirtySecond => "32n",
            NoteDivision::DottedHalf => "2n.",
            NoteDivision::DottedQuarter => "4n.",
            NoteDivision::DottedEighth => "8n.",
            NoteDivision::TripletQuarter => "4t",
            NoteDivision::TripletEighth => "8t",
            NoteDivision::TripletSixteenth => "16t",
        }
    }
}

impl fmt::Display for NoteDivision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for NoteDivision {
    type Err = ParseDivisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoteDivision::ALL
            .iter()
            .copied()
            .find(|d| d.token() == s.trim())
            .ok_or(ParseDivisionError)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for NoteDivision {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for NoteDivision {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TokenVisitor;

        impl serde::de::Visitor<'_> for TokenVisitor {
            type Value = NoteDivision;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a note division token such as \"4n\" or \"8t\"")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse()
                    .map_err(|_| E::invalid_value(serde::de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_str(TokenVisitor)
    }
}

/// Host tempo in beats per minute, clamped to a playable range.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Tempo(f32);

impl Tempo {
    /// Slowest accepted tempo.
    pub const MIN_BPM: f32 = 20.0;
    /// Fastest accepted tempo.
    pub const MAX_BPM: f32 = 300.0;
    /// Default tempo.
    pub const DEFAULT_BPM: f32 = 120.0;

    /// Create a tempo, clamping out-of-range or non-finite input.
    pub fn new(bpm: f32) -> Self {
        if bpm.is_finite() {
            Self(bpm.clamp(Self::MIN_BPM, Self::MAX_BPM))
        } else {
            Self(Self::DEFAULT_BPM)
        }
    }

    /// Tempo in BPM.
    pub fn bpm(&self) -> f32 {
        self.0
    }

    /// Seconds per division at this tempo.
    pub fn division_seconds(&self, division: NoteDivision) -> f64 {
        division.seconds(self.0)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self(Self::DEFAULT_BPM)
    }
}
