//! Synthesis paradigms.
//!
//! Subtractive, FM and additive synthesis share every piece of control
//! infrastructure (envelopes, LFOs, matrix, arpeggiator, voices) and differ
//! only in how one voice's resolved modulation becomes instantaneous synthesis
//! parameters. That final step is the [`SynthesisModel`] trait, implemented by
//! each paradigm's parameter payload.
//!
//! The engine evaluates the shared part once per voice ([`VoiceContext`]):
//! sounding frequency (glide, unison detune, pitch envelope, matrix pitch),
//! amplitude (amplitude envelope, velocity, matrix), pan and noise. The model
//! fills in the paradigm-specific [`ParadigmSynthesis`].

pub mod additive;
pub mod fm;
pub mod subtractive;

use patchlab_core::{Note, cents_to_ratio, midi_to_freq};

use crate::envelope::EnvelopeKind;
use crate::mod_matrix::{ModDestination, ResolvedModulation};
use crate::params::{CommonParams, OscWaveform, ParadigmKind, ParadigmParams};
use crate::voice::Voice;

pub use additive::{AdditiveSynthesis, Partial};
pub use fm::{FmSynthesis, fm_sample};
pub use subtractive::{OscillatorLayer, SubtractiveSynthesis};

/// Envelope outputs of one voice at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EnvelopeLevels([f32; EnvelopeKind::COUNT]);

impl EnvelopeLevels {
    /// Evaluate every envelope of `voice` at `now`.
    pub fn of(voice: &Voice, common: &CommonParams, now: f64) -> Self {
        Self(EnvelopeKind::ALL.map(|kind| voice.envelope_level(kind, &common.envelopes, now)))
    }

    /// Level of one envelope.
    #[inline]
    pub fn get(&self, kind: EnvelopeKind) -> f32 {
        self.0[kind.index()]
    }
}

/// Everything a model needs to compute one voice.
#[derive(Clone, Copy, Debug)]
pub struct VoiceContext<'a> {
    /// Shared parameters
    pub common: &'a CommonParams,
    /// The voice
    pub voice: &'a Voice,
    /// Envelope outputs at `now`
    pub envelopes: EnvelopeLevels,
    /// Resolved matrix sums for this voice
    pub modulation: &'a ResolvedModulation,
    /// Tick time in seconds
    pub now: f64,
}

impl VoiceContext<'_> {
    /// Pitch in semitones: glide position, pitch envelope and matrix offset
    /// (clamped to ±48 semitones).
    pub fn pitch(&self) -> f32 {
        let glided = self.voice.pitch_at(self.now);
        let enveloped = self
            .common
            .envelopes
            .pitch
            .apply(glided, self.envelopes.get(EnvelopeKind::Pitch));
        let offset = ModDestination::Pitch
            .range()
            .clamp(self.modulation.delta(ModDestination::Pitch));
        enveloped + offset
    }

    /// Sounding frequency in Hz, including unison detune.
    pub fn frequency(&self) -> f32 {
        midi_to_freq(self.pitch()) * cents_to_ratio(self.voice.detune_cents())
    }

    /// Amplitude: envelope × velocity scaling, then the matrix.
    pub fn amplitude(&self) -> f32 {
        let env = self.envelopes.get(EnvelopeKind::Amplitude);
        let scaled = env * self.common.velocity.amplitude_scale(self.voice.velocity());
        self.modulation.apply(ModDestination::Amplitude, scaled)
    }

    /// Pan: global pan plus unison offset, then the matrix.
    pub fn pan(&self) -> f32 {
        self.modulation
            .apply(ModDestination::Pan, self.common.pan + self.voice.pan())
    }

    /// Noise mix level, 0 when noise is disabled.
    pub fn noise_level(&self) -> f32 {
        if self.common.noise.enabled {
            self.modulation
                .apply(ModDestination::NoiseLevel, self.common.noise.level)
        } else {
            0.0
        }
    }
}

/// Paradigm-specific output for one voice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParadigmSynthesis {
    /// Oscillators into a filter
    Subtractive(SubtractiveSynthesis),
    /// Carrier phase-modulated by a modulator
    Fm(FmSynthesis),
    /// Bank of partials
    Additive(AdditiveSynthesis),
}

/// Instantaneous synthesis parameters of one physical voice, handed to the
/// rendering backend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceSynthesis {
    /// Logical note id (shared by a unison stack)
    pub group: u64,
    /// Target note
    pub note: Note,
    /// Position within the unison stack
    pub unison_index: u8,
    /// Sounding fundamental in Hz
    pub frequency: f32,
    /// Output gain (0.0 to 1.0) before volume
    pub amplitude: f32,
    /// Stereo position (-1.0 to 1.0)
    pub pan: f32,
    /// Noise mix (0.0 to 1.0)
    pub noise_level: f32,
    /// Paradigm-specific parameters
    pub paradigm: ParadigmSynthesis,
}

/// The paradigm abstraction boundary: turn one voice's resolved modulation
/// into instantaneous synthesis parameters.
pub trait SynthesisModel {
    /// Which paradigm this is.
    fn kind(&self) -> ParadigmKind;

    /// Destination driven by velocity's secondary amount.
    fn velocity_destination(&self) -> ModDestination;

    /// Compute the paradigm part of a voice.
    fn synthesize(&self, ctx: &VoiceContext<'_>) -> ParadigmSynthesis;

    /// Compute the full voice output.
    fn voice_synthesis(&self, ctx: &VoiceContext<'_>) -> VoiceSynthesis {
        VoiceSynthesis {
            group: ctx.voice.group(),
            note: ctx.voice.note(),
            unison_index: ctx.voice.unison_index(),
            frequency: ctx.frequency(),
            amplitude: ctx.amplitude(),
            pan: ctx.pan(),
            noise_level: ctx.noise_level(),
            paradigm: self.synthesize(ctx),
        }
    }
}

impl ParadigmParams {
    /// The payload as a synthesis model.
    pub fn model(&self) -> &dyn SynthesisModel {
        match self {
            ParadigmParams::Subtractive(p) => p,
            ParadigmParams::Fm(p) => p,
            ParadigmParams::Additive(p) => p,
        }
    }
}

impl OscWaveform {
    /// Naive waveform value at `phase` (cycles) in [-1, 1].
    ///
    /// `pulse_width` only affects [`OscWaveform::Pulse`].
    pub fn value_at(self, phase: f32, pulse_width: f32) -> f32 {
        let p = phase - libm::floorf(phase);
        match self {
            OscWaveform::Sine => libm::sinf(core::f32::consts::TAU * p),
            OscWaveform::Triangle => {
                if p < 0.25 {
                    4.0 * p
                } else if p < 0.75 {
                    2.0 - 4.0 * p
                } else {
                    4.0 * p - 4.0
                }
            }
            OscWaveform::Sawtooth => 2.0 * p - 1.0,
            OscWaveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            OscWaveform::Pulse => {
                if p < pulse_width {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}
