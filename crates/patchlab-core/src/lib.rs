//! Patchlab Core - control-rate primitives for the patchlab synthesis engine
//!
//! This crate provides the small, allocation-free building blocks that the
//! engine evaluates once per control tick. Nothing here renders audio; every
//! type computes control values from elapsed time and parameters.
//!
//! # Core Abstractions
//!
//! ## Modulation Oscillators
//!
//! - [`Lfo`] - Phase accumulator driven by absolute time
//! - [`LfoWaveform`] - Sine, triangle, square and sawtooth shapes mapped to [-1, 1]
//!
//! ## Musical Time
//!
//! - [`NoteDivision`] - Tempo-relative durations (`"4n"`, `"16n"`, `"8t"`, ...)
//! - [`Tempo`] - Clamped host tempo in BPM
//!
//! ## Pitch
//!
//! - [`Note`] - MIDI note number with scientific pitch names (`"C4"` = 60)
//! - [`midi_to_freq`], [`cents_to_ratio`], [`semitones_to_ratio`]
//!
//! ## Parameter Ranges
//!
//! - [`ParamRange`] - Documented bounds with clamp-to-nearest semantics
//!
//! # Example
//!
//! ```rust
//! use patchlab_core::{Lfo, LfoWaveform, NoteDivision, Tempo};
//!
//! let tempo = Tempo::new(120.0);
//! let rate = NoteDivision::Quarter.to_hz(tempo.bpm());
//!
//! let mut lfo = Lfo::new();
//! lfo.advance_to(0.25, rate);
//! let value = LfoWaveform::Sine.value_at(lfo.phase());
//! assert!((value - 0.0).abs() < 1e-4); // half a cycle at 2 Hz
//! ```
//!
//! # no_std Support
//!
//! Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! patchlab-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod lfo;
pub mod math;
pub mod note;
pub mod param;
pub mod tempo;

pub use lfo::{Lfo, LfoWaveform};
pub use math::{
    cents_to_ratio, db_to_linear, freq_to_midi, lerp, midi_to_freq, semitones_to_ratio,
};
pub use note::{Note, ParseNoteError};
pub use param::{Clamped, ParamRange};
pub use tempo::{NoteDivision, ParseDivisionError, Tempo};
