//! Subtractive paradigm: oscillators, sub-oscillator and noise into a filter.
//!
//! Filter cutoff follows
//!
//! ```text
//! cutoff = base × 2^(filter_env × amount + key_tracking × (pitch - 60) / 12)
//! ```
//!
//! and the matrix `FilterCutoff` delta is added on top, clamped to 20 Hz..20 kHz.

use patchlab_core::cents_to_ratio;

use crate::envelope::{EnvelopeKind, ModEnvelopeParams};
use crate::mod_matrix::ModDestination;
use crate::params::{
    FilterParams, FilterRolloff, FilterType, OscWaveform, ParadigmKind, SubtractiveParams,
};

use super::{ParadigmSynthesis, SynthesisModel, VoiceContext};

/// One oscillator as the backend should render it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OscillatorLayer {
    /// Waveform
    pub waveform: OscWaveform,
    /// Frequency in Hz
    pub frequency: f32,
    /// Mix level (0.0 to 1.0)
    pub level: f32,
}

/// Subtractive voice parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubtractiveSynthesis {
    /// Main oscillator
    pub oscillator: OscillatorLayer,
    /// Pulse width of the main oscillator after envelope and matrix
    pub pulse_width: f32,
    /// Second oscillator, when enabled
    pub oscillator2: Option<OscillatorLayer>,
    /// Sub-oscillator, when enabled
    pub sub_oscillator: Option<OscillatorLayer>,
    /// Filter response
    pub filter_type: FilterType,
    /// Filter slope
    pub rolloff: FilterRolloff,
    /// Cutoff in Hz
    pub cutoff: f32,
    /// Resonance (Q)
    pub resonance: f32,
}

/// Cutoff before matrix modulation.
pub fn filter_cutoff(
    filter: &FilterParams,
    envelope: &ModEnvelopeParams,
    env_level: f32,
    pitch: f32,
) -> f32 {
    let env_octaves = envelope.apply(0.0, env_level);
    let key_octaves = filter.key_tracking * (pitch - 60.0) / 12.0;
    filter.cutoff * libm::exp2f(env_octaves + key_octaves)
}

fn octave_ratio(octave: i8) -> f32 {
    libm::exp2f(f32::from(octave))
}

impl SynthesisModel for SubtractiveParams {
    fn kind(&self) -> ParadigmKind {
        ParadigmKind::Subtractive
    }

    fn velocity_destination(&self) -> ModDestination {
        ModDestination::FilterCutoff
    }

    fn synthesize(&self, ctx: &VoiceContext<'_>) -> ParadigmSynthesis {
        let modulation = ctx.modulation;
        let envelopes = &ctx.common.envelopes;
        let fundamental = ctx.frequency();
        let pitch = ctx.voice.pitch_at(ctx.now);

        let osc = &self.oscillator;
        let main_frequency =
            fundamental * octave_ratio(osc.octave) * cents_to_ratio(osc.detune);

        let pulse_width = modulation.apply(
            ModDestination::PulseWidth,
            envelopes
                .pwm
                .apply(osc.pulse_width, ctx.envelopes.get(EnvelopeKind::Pwm)),
        );

        let oscillator2 = self.oscillator2.enabled.then(|| OscillatorLayer {
            waveform: self.oscillator2.waveform,
            frequency: fundamental
                * octave_ratio(self.oscillator2.octave)
                * cents_to_ratio(self.oscillator2.detune),
            level: modulation.apply(ModDestination::Osc2Level, self.oscillator2.level),
        });

        let sub_oscillator = self.sub_oscillator.enabled.then(|| OscillatorLayer {
            waveform: self.sub_oscillator.waveform,
            frequency: main_frequency / libm::exp2f(f32::from(self.sub_oscillator.octaves_down)),
            level: self.sub_oscillator.level,
        });

        let cutoff = filter_cutoff(
            &self.filter,
            &envelopes.filter,
            ctx.envelopes.get(EnvelopeKind::Filter),
            pitch,
        );

        ParadigmSynthesis::Subtractive(SubtractiveSynthesis {
            oscillator: OscillatorLayer {
                waveform: osc.waveform,
                frequency: main_frequency,
                level: osc.level,
            },
            pulse_width,
            oscillator2,
            sub_oscillator,
            filter_type: self.filter.kind,
            rolloff: self.filter.rolloff,
            cutoff: modulation.apply(ModDestination::FilterCutoff, cutoff),
            resonance: modulation.apply(ModDestination::FilterResonance, self.filter.resonance),
        })
    }
}
