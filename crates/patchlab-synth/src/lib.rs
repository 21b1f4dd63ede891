//! Patchlab Synth - control-rate synthesis engine
//!
//! This crate turns note events and parameter changes into instantaneous,
//! per-voice synthesis parameters. It renders no audio: a backend reads the
//! [`EngineFrame`] produced each tick and drives its own oscillators and
//! filters.
//!
//! # Core Components
//!
//! ## Parameters
//!
//! - [`SynthParams`] - Shared groups ([`CommonParams`]) plus one paradigm payload
//! - [`ParamPatch`] - Partial update of one parameter group
//! - [`ParameterStore`] - Versioned snapshots published without locks
//!
//! ```rust
//! use patchlab_synth::{ParamPatch, ParameterStore, SynthParams};
//!
//! let store = ParameterStore::new(SynthParams::subtractive());
//! let snapshot = store.apply(ParamPatch::Volume(-12.0));
//! assert_eq!(snapshot.version, 1);
//! assert_eq!(snapshot.params.common.volume, -12.0);
//! ```
//!
//! ## Envelopes
//!
//! ADSR envelopes evaluated from absolute time:
//!
//! - [`EnvelopeParams`] / [`EnvelopeState`] / [`EnvelopeStage`]
//! - [`EnvelopeKind`] - Amplitude, filter, pitch, modulation and PWM envelopes
//!
//! ```rust
//! use patchlab_synth::{EnvelopeParams, EnvelopeStage, EnvelopeState};
//!
//! let params = EnvelopeParams::new(0.01, 0.1, 0.7, 0.3);
//! let mut env = EnvelopeState::IDLE;
//! env.trigger(&params, 0.0);
//! assert_eq!(env.stage_at(&params, 0.5), EnvelopeStage::Sustain);
//! ```
//!
//! ## Modulation
//!
//! - [`ModulationMatrix`] - Routes [`ModSource`]s to [`ModDestination`]s
//! - [`ModulationValues`] / [`ResolvedModulation`] - Source values in, per-destination sums out
//!
//! Routes that would make an LFO modulate itself (directly or through the
//! other LFO) are dropped and reported as [`EngineWarning::ConflictingRoute`].
//!
//! ## Notes
//!
//! - [`Arpeggiator`] - Up, down, up-down and random patterns on a tempo grid
//! - [`VoiceManager`] - Fixed voice pool with unison, glide and oldest-note stealing
//!
//! ## Paradigms
//!
//! - [`SynthesisModel`] - Implemented by [`SubtractiveParams`], [`FmParams`] and [`AdditiveParams`]
//! - [`VoiceSynthesis`] / [`ParadigmSynthesis`] - Per-voice output
//!
//! # Example: Engine
//!
//! ```rust
//! use patchlab_core::Note;
//! use patchlab_synth::{EnvelopeStage, SynthEngine, SynthParams};
//!
//! let mut engine = SynthEngine::new(SynthParams::fm());
//! engine.note_on(Note::new(69), 0.8, 0.0);
//!
//! let frame = engine.tick(0.2);
//! assert_eq!(frame.envelope_stage, EnvelopeStage::Sustain);
//! assert!((frame.voices[0].frequency - 440.0).abs() < 0.1);
//!
//! engine.note_off(Note::new(69), 0.2);
//! assert!(engine.tick(1.0).voices.is_empty());
//! ```

pub mod arpeggiator;
pub mod engine;
pub mod envelope;
pub mod mod_matrix;
pub mod paradigm;
pub mod params;
pub mod patch;
pub mod store;
pub mod voice;
pub mod warning;

pub use arpeggiator::{ArpEvent, Arpeggiator};
pub use engine::{EngineFrame, LfoReadout, MATRIX_CAPACITY, SynthEngine};
pub use envelope::{
    EnvelopeKind, EnvelopeParams, EnvelopeStage, EnvelopeState, ModEnvelopeParams,
};
pub use mod_matrix::{
    ModDestination, ModRoute, ModSource, ModulationMatrix, ModulationValues, ResolvedModulation,
    RouteConflict, RouteOrigin,
};
pub use paradigm::{
    AdditiveSynthesis, FmSynthesis, OscillatorLayer, ParadigmSynthesis, Partial,
    SubtractiveSynthesis, SynthesisModel, VoiceSynthesis,
};
pub use params::{
    AdditiveParams, ArpParams, ArpPattern, ChorusParams, CommonParams, DelayParams,
    DistortionParams, EffectsParams, Envelopes, FilterParams, FilterRolloff, FilterType,
    FmParams, GlideParams, HARMONIC_COUNT, LfoParams, MAX_POLYPHONY, MAX_UNISON,
    MOD_MATRIX_SLOTS, NoiseParams, NoiseType, OscWaveform, OscillatorParams, ParadigmKind,
    ParadigmParams, ReverbParams, SecondOscillatorParams, SubOscillatorParams, SubtractiveParams,
    SynthParams, UnisonParams, VelocityParams, route,
};
pub use patch::{ParamPatch, PatchConflict};
pub use store::{ParamSnapshot, ParameterStore};
pub use voice::{Glide, VOICE_POOL_SIZE, Voice, VoiceManager};
pub use warning::{EngineWarning, WarningSink, warning_channel};
