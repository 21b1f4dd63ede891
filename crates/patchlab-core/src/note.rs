//! MIDI note numbers with scientific pitch names.
//!
//! `C4` is middle C (MIDI 60) and `C-1` is MIDI 0. Sharps (`#`) and flats
//! (`b`) are both accepted when parsing; display always uses sharps.

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

use crate::math::midi_to_freq;

const NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Errors produced when parsing a note name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseNoteError {
    /// Input was empty.
    #[error("empty note name")]
    Empty,
    /// The pitch letter was not A-G.
    #[error("invalid pitch letter '{0}'")]
    InvalidLetter(char),
    /// The octave number was missing or not an integer.
    #[error("missing or invalid octave")]
    InvalidOctave,
    /// The resulting note lies outside MIDI 0..=127.
    #[error("note is outside the MIDI range")]
    OutOfRange,
}

/// A MIDI note number (0..=127).
///
/// ```rust
/// use patchlab_core::Note;
///
/// let c4: Note = "C4".parse().unwrap();
/// assert_eq!(c4.number(), 60);
/// assert_eq!("Eb4".parse::<Note>().unwrap().to_string(), "D#4");
/// assert_eq!(c4.transpose_octaves(1).number(), 72);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Note(u8);

impl Note {
    /// Middle C.
    pub const MIDDLE_C: Note = Note(60);

    /// Create a note, clamping to the MIDI range.
    pub fn new(number: u8) -> Self {
        Self(number.min(127))
    }

    /// MIDI note number.
    pub fn number(&self) -> u8 {
        self.0
    }

    /// Equal-tempered frequency in Hz.
    pub fn frequency(&self) -> f32 {
        midi_to_freq(f32::from(self.0))
    }

    /// Shift by whole octaves, saturating at the MIDI range.
    pub fn transpose_octaves(&self, octaves: i8) -> Note {
        self.transpose(i16::from(octaves) * 12)
    }

    /// Shift by semitones, saturating at the MIDI range.
    pub fn transpose(&self, semitones: i16) -> Note {
        Note((i16::from(self.0) + semitones).clamp(0, 127) as u8)
    }

    /// Octave in scientific pitch notation.
    pub fn octave(&self) -> i8 {
        (self.0 / 12) as i8 - 1
    }
}

impl From<u8> for Note {
    fn from(number: u8) -> Self {
        Note::new(number)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", NAMES[usize::from(self.0 % 12)], self.octave())
    }
}

impl FromStr for Note {
    type Err = ParseNoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars.next().ok_or(ParseNoteError::Empty)?;
        let pitch_class: i16 = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            other => return Err(ParseNoteError::InvalidLetter(other)),
        };

        let rest = chars.as_str();
        let (accidental, octave_str) = match rest.as_bytes().first() {
            Some(b'#') => (1, &rest[1..]),
            Some(b'b') => (-1, &rest[1..]),
            _ => (0, rest),
        };

        let octave: i16 = octave_str
            .parse()
            .map_err(|_| ParseNoteError::InvalidOctave)?;
        let number = (octave + 1) * 12 + pitch_class + accidental;
        if (0..=127).contains(&number) {
            Ok(Note(number as u8))
        } else {
            Err(ParseNoteError::OutOfRange)
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Note {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Note {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NoteVisitor;

        impl serde::de::Visitor<'_> for NoteVisitor {
            type Value = Note;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a note name such as \"C4\" or a MIDI number")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse()
                    .map_err(|_| E::invalid_value(serde::de::Unexpected::Str(v), &self))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
                u8::try_from(v)
                    .ok()
                    .filter(|n| *n <= 127)
                    .map(Note)
                    .ok_or_else(|| E::invalid_value(serde::de::Unexpected::Unsigned(v), &self))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .map_err(|_| E::invalid_value(serde::de::Unexpected::Signed(v), &self))
                    .and_then(|v| self.visit_u64(v))
            }
        }

        deserializer.deserialize_any(NoteVisitor)
    }
}
