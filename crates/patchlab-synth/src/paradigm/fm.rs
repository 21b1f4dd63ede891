//! Two-operator FM paradigm.
//!
//! The carrier runs at the note frequency and the modulator at
//! `note × harmonicity`. The instantaneous modulation index is
//! `base + modulation_envelope × amount + matrix`, clamped to 0..100.

use core::f32::consts::TAU;

use crate::envelope::EnvelopeKind;
use crate::mod_matrix::ModDestination;
use crate::params::{FmParams, OscWaveform, ParadigmKind};

use super::{ParadigmSynthesis, SynthesisModel, VoiceContext};

/// FM voice parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FmSynthesis {
    /// Carrier frequency in Hz
    pub carrier_frequency: f32,
    /// Modulator frequency in Hz
    pub modulator_frequency: f32,
    /// Carrier waveform
    pub carrier_waveform: OscWaveform,
    /// Modulator waveform
    pub modulator_waveform: OscWaveform,
    /// Modulator-to-carrier ratio after modulation
    pub harmonicity: f32,
    /// Modulation index (peak phase deviation in radians)
    pub modulation_index: f32,
}

impl FmSynthesis {
    /// One output sample for the given operator phases (in cycles).
    #[inline]
    pub fn sample(&self, carrier_phase: f32, modulator_phase: f32) -> f32 {
        fm_sample(
            self.carrier_waveform,
            self.modulator_waveform,
            carrier_phase,
            modulator_phase,
            self.modulation_index,
        )
    }
}

/// `carrier(phase + index × modulator(mod_phase))`.
///
/// Phases are in cycles, `index` in radians of carrier phase deviation.
#[inline]
pub fn fm_sample(
    carrier: OscWaveform,
    modulator: OscWaveform,
    carrier_phase: f32,
    modulator_phase: f32,
    index: f32,
) -> f32 {
    let deviation = index * modulator.value_at(modulator_phase, 0.5) / TAU;
    carrier.value_at(carrier_phase + deviation, 0.5)
}

impl SynthesisModel for FmParams {
    fn kind(&self) -> ParadigmKind {
        ParadigmKind::Fm
    }

    fn velocity_destination(&self) -> ModDestination {
        ModDestination::ModulationIndex
    }

    fn synthesize(&self, ctx: &VoiceContext<'_>) -> ParadigmSynthesis {
        let carrier_frequency = ctx.frequency();
        let harmonicity = ctx
            .modulation
            .apply(ModDestination::Harmonicity, self.harmonicity);
        let enveloped = ctx.common.envelopes.modulation.apply(
            self.modulation_index,
            ctx.envelopes.get(EnvelopeKind::Modulation),
        );

        ParadigmSynthesis::Fm(FmSynthesis {
            carrier_frequency,
            modulator_frequency: carrier_frequency * harmonicity,
            carrier_waveform: self.carrier_waveform,
            modulator_waveform: self.modulator_waveform,
            harmonicity,
            modulation_index: ctx
                .modulation
                .apply(ModDestination::ModulationIndex, enveloped),
        })
    }
}
