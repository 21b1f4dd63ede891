//! Additive paradigm: a fixed bank of partials.
//!
//! Partial `n` (1-based) runs at `f × n^(1 + stretch)` with amplitude
//! `harmonics[n-1] × n^brightness`, capped at 1. Positive brightness tilts
//! energy toward upper partials and negative brightness toward the
//! fundamental. Brightness is the base value plus the modulation envelope and
//! matrix, clamped to -1..1. Every partial is gated by the voice amplitude.

use crate::envelope::EnvelopeKind;
use crate::mod_matrix::ModDestination;
use crate::params::{AdditiveParams, HARMONIC_COUNT, ParadigmKind};

use super::{ParadigmSynthesis, SynthesisModel, VoiceContext};

/// One partial.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Partial {
    /// Frequency in Hz
    pub frequency: f32,
    /// Relative amplitude (0.0 to 1.0), multiplied by the voice amplitude
    pub amplitude: f32,
}

/// Additive voice parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdditiveSynthesis {
    /// Partials in ascending order
    pub partials: [Partial; HARMONIC_COUNT],
    /// Effective brightness tilt
    pub brightness: f32,
}

/// Spectral tilt weight for 1-based partial `n`.
#[inline]
pub fn tilt(n: usize, brightness: f32) -> f32 {
    libm::powf(n as f32, brightness)
}

impl SynthesisModel for AdditiveParams {
    fn kind(&self) -> ParadigmKind {
        ParadigmKind::Additive
    }

    fn velocity_destination(&self) -> ModDestination {
        ModDestination::Brightness
    }

    fn synthesize(&self, ctx: &VoiceContext<'_>) -> ParadigmSynthesis {
        let fundamental = ctx.frequency();
        let enveloped = ctx.common.envelopes.modulation.apply(
            self.brightness,
            ctx.envelopes.get(EnvelopeKind::Modulation),
        );
        let brightness = ctx.modulation.apply(ModDestination::Brightness, enveloped);

        let partials = core::array::from_fn(|k| {
            let n = k + 1;
            Partial {
                frequency: fundamental * libm::powf(n as f32, 1.0 + self.stretch),
                amplitude: (self.harmonics[k] * tilt(n, brightness)).clamp(0.0, 1.0),
            }
        });

        ParadigmSynthesis::Additive(AdditiveSynthesis {
            partials,
            brightness,
        })
    }
}
