//! Strict parameter validation.
//!
//! The engine never rejects parameters: it clamps them. Preset authoring wants
//! the opposite, a report of every value that would be clamped, so a preset
//! file can be fixed at the source. [`validate_params`] walks every numeric
//! field of a [`SynthParams`] and checks it against the same ranges the
//! engine clamps to.
//!
//! # Example
//!
//! ```rust
//! use patchlab_config::validate_params;
//! use patchlab_synth::SynthParams;
//!
//! let mut params = SynthParams::fm();
//! validate_params(&params).expect("defaults are valid");
//!
//! params.common.pan = 3.0;
//! let err = validate_params(&params).unwrap_err();
//! assert_eq!(err.issues[0].field, "common.pan");
//! ```

use std::fmt;

use patchlab_core::ParamRange;
use patchlab_synth::envelope::{STAGE_TIME_RANGE, SUSTAIN_RANGE};
use patchlab_synth::params::{MAX_ARP_OCTAVES, MAX_UNISON, ranges};
use patchlab_synth::{
    AdditiveParams, EnvelopeKind, EnvelopeParams, FmParams, LfoParams, ParadigmParams,
    SubtractiveParams, SynthParams,
};
use thiserror::Error;

/// One value outside its documented range.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Dotted path of the field (`"common.lfo1.rate"`).
    pub field: String,
    /// The offending value.
    pub value: f32,
    /// Minimum allowed value.
    pub min: f32,
    /// Maximum allowed value.
    pub max: f32,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parameter '{}' value {} out of range [{}, {}]",
            self.field, self.value, self.min, self.max
        )
    }
}

/// Every out-of-range value found in a parameter set.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{}", .issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct ValidationError {
    /// Issues in field order.
    pub issues: Vec<ValidationIssue>,
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

#[derive(Default)]
struct Report {
    issues: Vec<ValidationIssue>,
}

impl Report {
    fn check(&mut self, field: impl fmt::Display, value: f32, range: ParamRange) {
        if !range.contains(value) {
            self.issues.push(ValidationIssue {
                field: field.to_string(),
                value,
                min: range.min,
                max: range.max,
            });
        }
    }

    fn check_int(&mut self, field: impl fmt::Display, value: f32, min: f32, max: f32) {
        self.check(field, value, ParamRange::new(min, max, min));
    }

    fn envelope(&mut self, prefix: &str, env: &EnvelopeParams) {
        self.check(format_args!("{prefix}.attack"), env.attack, STAGE_TIME_RANGE);
        self.check(format_args!("{prefix}.decay"), env.decay, STAGE_TIME_RANGE);
        self.check(format_args!("{prefix}.sustain"), env.sustain, SUSTAIN_RANGE);
        self.check(format_args!("{prefix}.release"), env.release, STAGE_TIME_RANGE);
    }

    fn lfo(&mut self, prefix: &str, lfo: &LfoParams) {
        self.check(format_args!("{prefix}.rate"), lfo.rate, ranges::LFO_RATE);
        self.check(format_args!("{prefix}.depth"), lfo.depth, ranges::LFO_DEPTH);
    }

    fn common(&mut self, params: &SynthParams) {
        let common = &params.common;
        let envelopes = &common.envelopes;
        self.envelope("common.envelopes.amplitude", &envelopes.amplitude);
        for (name, kind, env) in [
            ("filter", EnvelopeKind::Filter, &envelopes.filter),
            ("pitch", EnvelopeKind::Pitch, &envelopes.pitch),
            ("modulation", EnvelopeKind::Modulation, &envelopes.modulation),
            ("pwm", EnvelopeKind::Pwm, &envelopes.pwm),
        ] {
            let prefix = format!("common.envelopes.{name}");
            self.envelope(&format!("{prefix}.shape"), &env.shape);
            self.check(format_args!("{prefix}.amount"), env.amount, kind.amount_range());
        }

        self.lfo("common.lfo1", &common.lfo1);
        self.lfo("common.lfo2", &common.lfo2);
        self.check("common.noise.level", common.noise.level, ranges::NOISE_LEVEL);
        self.check("common.glide.time", common.glide.time, ranges::GLIDE_TIME);
        self.check(
            "common.velocity.amp_amount",
            common.velocity.amp_amount,
            ranges::VELOCITY_AMOUNT,
        );
        self.check(
            "common.velocity.secondary_amount",
            common.velocity.secondary_amount,
            ranges::VELOCITY_AMOUNT,
        );
        self.check_int(
            "common.unison.voices",
            f32::from(common.unison.voices),
            1.0,
            MAX_UNISON as f32,
        );
        self.check("common.unison.detune_cents", common.unison.detune_cents, ranges::UNISON_DETUNE);
        self.check("common.unison.spread", common.unison.spread, ranges::UNISON_SPREAD);
        self.check_int(
            "common.arpeggiator.octaves",
            f32::from(common.arpeggiator.octaves),
            1.0,
            f32::from(MAX_ARP_OCTAVES),
        );
        self.check("common.arpeggiator.gate", common.arpeggiator.gate, ranges::ARP_GATE);
        for (slot, route) in common.mod_matrix.iter().enumerate() {
            self.check(
                format_args!("common.mod_matrix[{slot}].amount"),
                route.amount,
                ParamRange::BIPOLAR,
            );
        }

        let effects = &common.effects;
        self.check("common.effects.distortion.amount", effects.distortion.amount, ranges::UNIT);
        self.check("common.effects.distortion.wet", effects.distortion.wet, ranges::WET);
        self.check("common.effects.chorus.rate", effects.chorus.rate, ranges::CHORUS_RATE);
        self.check("common.effects.chorus.depth", effects.chorus.depth, ranges::UNIT);
        self.check("common.effects.chorus.wet", effects.chorus.wet, ranges::WET);
        self.check("common.effects.delay.time", effects.delay.time, ranges::DELAY_TIME);
        self.check("common.effects.delay.feedback", effects.delay.feedback, ranges::DELAY_FEEDBACK);
        self.check("common.effects.delay.wet", effects.delay.wet, ranges::WET);
        self.check("common.effects.reverb.decay", effects.reverb.decay, ranges::REVERB_DECAY);
        self.check("common.effects.reverb.wet", effects.reverb.wet, ranges::WET);

        self.check("common.volume", common.volume, ranges::VOLUME_DB);
        self.check("common.pan", common.pan, ranges::PAN);
    }

    fn subtractive(&mut self, p: &SubtractiveParams) {
        let osc = &p.oscillator;
        self.check_int("paradigm.oscillator.octave", f32::from(osc.octave), -3.0, 3.0);
        self.check("paradigm.oscillator.detune", osc.detune, ranges::OSC_DETUNE);
        self.check("paradigm.oscillator.level", osc.level, ranges::OSC_LEVEL);
        self.check("paradigm.oscillator.pulse_width", osc.pulse_width, ranges::PULSE_WIDTH);

        let osc2 = &p.oscillator2;
        self.check_int("paradigm.oscillator2.octave", f32::from(osc2.octave), -3.0, 3.0);
        self.check("paradigm.oscillator2.detune", osc2.detune, ranges::OSC_DETUNE);
        self.check("paradigm.oscillator2.level", osc2.level, ranges::OSC_LEVEL);

        let sub = &p.sub_oscillator;
        self.check_int(
            "paradigm.sub_oscillator.octaves_down",
            f32::from(sub.octaves_down),
            1.0,
            2.0,
        );
        self.check("paradigm.sub_oscillator.level", sub.level, ranges::OSC_LEVEL);

        self.check("paradigm.filter.cutoff", p.filter.cutoff, ranges::FILTER_CUTOFF);
        self.check("paradigm.filter.resonance", p.filter.resonance, ranges::FILTER_RESONANCE);
        self.check("paradigm.filter.key_tracking", p.filter.key_tracking, ranges::KEY_TRACKING);
    }

    fn fm(&mut self, p: &FmParams) {
        self.check("paradigm.harmonicity", p.harmonicity, ranges::HARMONICITY);
        self.check("paradigm.modulation_index", p.modulation_index, ranges::MODULATION_INDEX);
    }

    fn additive(&mut self, p: &AdditiveParams) {
        for (k, amplitude) in p.harmonics.iter().enumerate() {
            self.check(
                format_args!("paradigm.harmonics[{k}]"),
                *amplitude,
                ranges::HARMONIC_AMPLITUDE,
            );
        }
        self.check("paradigm.brightness", p.brightness, ranges::BRIGHTNESS);
        self.check("paradigm.stretch", p.stretch, ranges::STRETCH);
    }
}

/// Check every numeric field of `params` against its documented range.
///
/// Non-finite values are always reported.
pub fn validate_params(params: &SynthParams) -> ValidationResult<()> {
    let mut report = Report::default();
    report.common(params);
    match &params.paradigm {
        ParadigmParams::Subtractive(p) => report.subtractive(p),
        ParadigmParams::Fm(p) => report.fm(p),
        ParadigmParams::Additive(p) => report.additive(p),
    }

    if report.issues.is_empty() {
        Ok(())
    } else {
        tracing::debug!(issues = report.issues.len(), "parameter validation failed");
        Err(ValidationError {
            issues: report.issues,
        })
    }
}
