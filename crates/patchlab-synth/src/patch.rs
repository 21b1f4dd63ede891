//! Whole-group parameter patches.
//!
//! Front ends never mutate a [`SynthParams`] in place. A setter call becomes a
//! [`ParamPatch`] replacing one field group, and [`SynthParams::with_patch`]
//! returns a new, sanitized value. Patches for a paradigm the parameters do
//! not use are rejected with a [`PatchConflict`] and leave the input untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::envelope::{EnvelopeKind, EnvelopeParams, ModEnvelopeParams};
use crate::mod_matrix::ModRoute;
use crate::params::{
    AdditiveParams, ArpParams, EffectsParams, FilterParams, FmParams, GlideParams,
    HARMONIC_COUNT, LfoParams, MOD_MATRIX_SLOTS, NoiseParams, OscillatorParams, ParadigmKind,
    ParadigmParams, SecondOscillatorParams, SubOscillatorParams, SynthParams, UnisonParams,
    VelocityParams,
};
use crate::warning::EngineWarning;

/// Replacement of one parameter group.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "group", content = "value", rename_all = "snake_case")]
pub enum ParamPatch {
    /// Amplitude envelope shape
    AmpEnvelope(EnvelopeParams),
    /// Filter envelope
    FilterEnvelope(ModEnvelopeParams),
    /// Pitch envelope
    PitchEnvelope(ModEnvelopeParams),
    /// Modulation envelope
    ModEnvelope(ModEnvelopeParams),
    /// Pulse-width envelope
    PwmEnvelope(ModEnvelopeParams),
    /// LFO 1
    Lfo1(LfoParams),
    /// LFO 2
    Lfo2(LfoParams),
    /// Noise source
    Noise(NoiseParams),
    /// Glide
    Glide(GlideParams),
    /// Velocity sensitivity
    Velocity(VelocityParams),
    /// Unison
    Unison(UnisonParams),
    /// Arpeggiator
    Arpeggiator(ArpParams),
    /// One modulation matrix slot
    ModRoute {
        /// Slot index
        slot: usize,
        /// Replacement route
        route: ModRoute,
    },
    /// The whole modulation matrix
    ModMatrix([ModRoute; MOD_MATRIX_SLOTS]),
    /// Effects chain
    Effects(EffectsParams),
    /// Output volume in dB
    Volume(f32),
    /// Stereo pan
    Pan(f32),
    /// Subtractive main oscillator
    Oscillator(OscillatorParams),
    /// Subtractive second oscillator
    Oscillator2(SecondOscillatorParams),
    /// Subtractive sub-oscillator
    SubOscillator(SubOscillatorParams),
    /// Subtractive filter
    Filter(FilterParams),
    /// FM operator settings
    Fm(FmParams),
    /// Additive payload
    Additive(AdditiveParams),
    /// One additive partial
    Harmonic {
        /// Partial index (0 = fundamental)
        index: usize,
        /// Amplitude (0.0 to 1.0)
        amplitude: f32,
    },
}

impl ParamPatch {
    /// Paradigm this patch is restricted to, if any.
    pub fn paradigm(&self) -> Option<ParadigmKind> {
        match self {
            ParamPatch::Oscillator(_)
            | ParamPatch::Oscillator2(_)
            | ParamPatch::SubOscillator(_)
            | ParamPatch::Filter(_) => Some(ParadigmKind::Subtractive),
            ParamPatch::Fm(_) => Some(ParadigmKind::Fm),
            ParamPatch::Additive(_) | ParamPatch::Harmonic { .. } => Some(ParadigmKind::Additive),
            _ => None,
        }
    }

    /// Short group name for logs.
    pub fn group(&self) -> &'static str {
        match self {
            ParamPatch::AmpEnvelope(_) => "amp_envelope",
            ParamPatch::FilterEnvelope(_) => "filter_envelope",
            ParamPatch::PitchEnvelope(_) => "pitch_envelope",
            ParamPatch::ModEnvelope(_) => "mod_envelope",
            ParamPatch::PwmEnvelope(_) => "pwm_envelope",
            ParamPatch::Lfo1(_) => "lfo1",
            ParamPatch::Lfo2(_) => "lfo2",
            ParamPatch::Noise(_) => "noise",
            ParamPatch::Glide(_) => "glide",
            ParamPatch::Velocity(_) => "velocity",
            ParamPatch::Unison(_) => "unison",
            ParamPatch::Arpeggiator(_) => "arpeggiator",
            ParamPatch::ModRoute { .. } => "mod_route",
            ParamPatch::ModMatrix(_) => "mod_matrix",
            ParamPatch::Effects(_) => "effects",
            ParamPatch::Volume(_) => "volume",
            ParamPatch::Pan(_) => "pan",
            ParamPatch::Oscillator(_) => "oscillator",
            ParamPatch::Oscillator2(_) => "oscillator2",
            ParamPatch::SubOscillator(_) => "sub_oscillator",
            ParamPatch::Filter(_) => "filter",
            ParamPatch::Fm(_) => "fm",
            ParamPatch::Additive(_) => "additive",
            ParamPatch::Harmonic { .. } => "harmonic",
        }
    }
}

/// Why a patch could not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PatchConflict {
    /// The patch belongs to another paradigm.
    #[error("{group} patch needs {expected:?} parameters, engine runs {actual:?}")]
    ParadigmMismatch {
        /// Patched group
        group: &'static str,
        /// Paradigm the patch needs
        expected: ParadigmKind,
        /// Paradigm of the parameters
        actual: ParadigmKind,
    },
    /// The patch addressed a slot or partial that does not exist.
    #[error("{group} index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Patched group
        group: &'static str,
        /// Requested index
        index: usize,
        /// Number of entries
        len: usize,
    },
}

impl From<PatchConflict> for EngineWarning {
    fn from(conflict: PatchConflict) -> Self {
        match conflict {
            PatchConflict::ParadigmMismatch {
                expected, actual, ..
            } => EngineWarning::ParadigmMismatch { expected, actual },
            PatchConflict::IndexOutOfRange { group, index, len } => {
                EngineWarning::IndexOutOfRange { group, index, len }
            }
        }
    }
}

impl SynthParams {
    /// New parameters with one group replaced, every field clamped into range.
    ///
    /// # Example
    ///
    /// ```rust
    /// use patchlab_synth::{GlideParams, ParamPatch, SynthParams};
    ///
    /// let params = SynthParams::subtractive();
    /// let patched = params
    ///     .with_patch(ParamPatch::Glide(GlideParams { enabled: true, time: 9.0 }))
    ///     .unwrap();
    ///
    /// assert!(patched.common.glide.enabled);
    /// assert_eq!(patched.common.glide.time, 5.0);
    /// assert!(!params.common.glide.enabled);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`PatchConflict`] when the patch targets another paradigm or an
    /// index outside its group.
    pub fn with_patch(&self, patch: ParamPatch) -> Result<SynthParams, PatchConflict> {
        let mut next = *self;
        let group = patch.group();

        if let Some(expected) = patch.paradigm() {
            let actual = self.kind();
            if expected != actual {
                return Err(PatchConflict::ParadigmMismatch {
                    group,
                    expected,
                    actual,
                });
            }
        }

        let common = &mut next.common;
        match patch {
            ParamPatch::AmpEnvelope(p) => common.envelopes.amplitude = p,
            ParamPatch::FilterEnvelope(p) => common.envelopes.filter = p,
            ParamPatch::PitchEnvelope(p) => common.envelopes.pitch = p,
            ParamPatch::ModEnvelope(p) => common.envelopes.modulation = p,
            ParamPatch::PwmEnvelope(p) => common.envelopes.pwm = p,
            ParamPatch::Lfo1(p) => common.lfo1 = p,
            ParamPatch::Lfo2(p) => common.lfo2 = p,
            ParamPatch::Noise(p) => common.noise = p,
            ParamPatch::Glide(p) => common.glide = p,
            ParamPatch::Velocity(p) => common.velocity = p,
            ParamPatch::Unison(p) => common.unison = p,
            ParamPatch::Arpeggiator(p) => common.arpeggiator = p,
            ParamPatch::ModRoute { slot, route } => {
                let Some(target) = common.mod_matrix.get_mut(slot) else {
                    return Err(PatchConflict::IndexOutOfRange {
                        group,
                        index: slot,
                        len: MOD_MATRIX_SLOTS,
                    });
                };
                *target = route;
            }
            ParamPatch::ModMatrix(routes) => common.mod_matrix = routes,
            ParamPatch::Effects(p) => common.effects = p,
            ParamPatch::Volume(db) => common.volume = db,
            ParamPatch::Pan(pan) => common.pan = pan,
            ParamPatch::Oscillator(p) => {
                if let ParadigmParams::Subtractive(sub) = &mut next.paradigm {
                    sub.oscillator = p;
                }
            }
            ParamPatch::Oscillator2(p) => {
                if let ParadigmParams::Subtractive(sub) = &mut next.paradigm {
                    sub.oscillator2 = p;
                }
            }
            ParamPatch::SubOscillator(p) => {
                if let ParadigmParams::Subtractive(sub) = &mut next.paradigm {
                    sub.sub_oscillator = p;
                }
            }
            ParamPatch::Filter(p) => {
                if let ParadigmParams::Subtractive(sub) = &mut next.paradigm {
                    sub.filter = p;
                }
            }
            ParamPatch::Fm(p) => next.paradigm = ParadigmParams::Fm(p),
            ParamPatch::Additive(p) => next.paradigm = ParadigmParams::Additive(p),
            ParamPatch::Harmonic { index, amplitude } => {
                if let ParadigmParams::Additive(additive) = &mut next.paradigm {
                    let Some(partial) = additive.harmonics.get_mut(index) else {
                        return Err(PatchConflict::IndexOutOfRange {
                            group,
                            index,
                            len: HARMONIC_COUNT,
                        });
                    };
                    *partial = amplitude;
                }
            }
        }

        Ok(next.sanitized())
    }

    /// Envelope shape for a kind (amplitude or modulating).
    pub fn envelope_shape(&self, kind: EnvelopeKind) -> &EnvelopeParams {
        self.common.envelopes.shape(kind)
    }
}
