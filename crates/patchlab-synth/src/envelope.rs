//! ADSR envelope state machine evaluated from elapsed time.
//!
//! An [`EnvelopeState`] stores only the stage it entered, when, and from
//! which level. The output at any later instant is a pure function of that
//! state, the current [`EnvelopeParams`] and the clock, so a late control tick
//! lands on the same value an on-time tick would have produced.
//!
//! ```text
//! idle ──trigger──▶ attack ──▶ decay ──▶ sustain ──release──▶ release ──▶ idle
//!                     ▲                                          │
//!                     └────────────── trigger ───────────────────┘
//! ```
//!
//! Re-triggering starts the new attack ramp from the current output, never
//! from zero. Zero-length stages are instantaneous jumps.

use patchlab_core::ParamRange;
use serde::{Deserialize, Serialize};

use crate::mod_matrix::ModSource;

/// Level below which a releasing envelope counts as finished.
pub const SILENCE_THRESHOLD: f32 = 1e-4;

/// Range for attack, decay and release times in seconds.
pub const STAGE_TIME_RANGE: ParamRange = ParamRange::new(0.0, 10.0, 0.1);
/// Range for the sustain level.
pub const SUSTAIN_RANGE: ParamRange = ParamRange::new(0.0, 1.0, 0.7);

/// ADSR envelope stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EnvelopeStage {
    /// Envelope is inactive; output is zero.
    #[default]
    Idle,
    /// Output ramps from its trigger level up to 1.0.
    Attack,
    /// Output falls from 1.0 toward the sustain level.
    Decay,
    /// Output holds at the sustain level while the gate is held.
    Sustain,
    /// Output ramps from its release level down to zero.
    Release,
}

/// Time parameters of an ADSR envelope.
///
/// ## Parameters
/// - `attack`: Attack time in seconds (0.0 to 10.0, default 0.01)
/// - `decay`: Decay time in seconds (0.0 to 10.0, default 0.1)
/// - `sustain`: Sustain level (0.0 to 1.0, default 0.7)
/// - `release`: Release time in seconds (0.0 to 10.0, default 0.3)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeParams {
    /// Attack time in seconds
    pub attack: f32,
    /// Decay time in seconds
    pub decay: f32,
    /// Sustain level
    pub sustain: f32,
    /// Release time in seconds
    pub release: f32,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
        }
    }
}

impl EnvelopeParams {
    /// Create envelope parameters.
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// Clamp every field to its documented range.
    pub fn sanitized(self) -> Self {
        Self {
            attack: STAGE_TIME_RANGE.clamp(self.attack),
            decay: STAGE_TIME_RANGE.clamp(self.decay),
            sustain: SUSTAIN_RANGE.clamp(self.sustain),
            release: STAGE_TIME_RANGE.clamp(self.release),
        }
    }
}

/// Which envelope of a voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    /// Amplitude (VCA) envelope, used directly.
    Amplitude,
    /// Filter cutoff envelope (octaves).
    Filter,
    /// Pitch envelope (semitones).
    Pitch,
    /// General modulation envelope (FM index, additive brightness).
    Modulation,
    /// Pulse-width envelope.
    Pwm,
}

impl EnvelopeKind {
    /// Number of envelope kinds per voice.
    pub const COUNT: usize = 5;

    /// Every kind, in slot order.
    pub const ALL: [EnvelopeKind; Self::COUNT] = [
        EnvelopeKind::Amplitude,
        EnvelopeKind::Filter,
        EnvelopeKind::Pitch,
        EnvelopeKind::Modulation,
        EnvelopeKind::Pwm,
    ];

    /// Slot index in a voice's envelope array.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Modulation source exposing this envelope's level.
    pub fn source(self) -> ModSource {
        match self {
            EnvelopeKind::Amplitude => ModSource::AmpEnvelope,
            EnvelopeKind::Filter => ModSource::FilterEnvelope,
            EnvelopeKind::Pitch => ModSource::PitchEnvelope,
            EnvelopeKind::Modulation => ModSource::ModEnvelope,
            EnvelopeKind::Pwm => ModSource::PwmEnvelope,
        }
    }

    /// Legal range of the signed `amount` for non-amplitude envelopes.
    pub fn amount_range(self) -> ParamRange {
        match self {
            EnvelopeKind::Amplitude => ParamRange::new(0.0, 1.0, 1.0),
            EnvelopeKind::Filter => ParamRange::new(-8.0, 8.0, 2.0),
            EnvelopeKind::Pitch => ParamRange::new(-48.0, 48.0, 0.0),
            EnvelopeKind::Modulation => ParamRange::new(-50.0, 50.0, 0.0),
            EnvelopeKind::Pwm => ParamRange::new(-0.45, 0.45, 0.0),
        }
    }
}

/// A non-amplitude envelope: shape plus a signed amount added to a base value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModEnvelopeParams {
    /// Disabled envelopes leave the base value untouched
    pub enabled: bool,
    /// ADSR shape
    pub shape: EnvelopeParams,
    /// Signed amount in the target's units
    pub amount: f32,
}

impl Default for ModEnvelopeParams {
    fn default() -> Self {
        Self {
            enabled: false,
            shape: EnvelopeParams::default(),
            amount: 0.0,
        }
    }
}

impl ModEnvelopeParams {
    /// Enabled envelope with the given shape and amount.
    pub fn new(shape: EnvelopeParams, amount: f32) -> Self {
        Self {
            enabled: true,
            shape,
            amount,
        }
    }

    /// Clamp shape and amount for the given envelope kind.
    pub fn sanitized(self, kind: EnvelopeKind) -> Self {
        Self {
            enabled: self.enabled,
            shape: self.shape.sanitized(),
            amount: kind.amount_range().clamp(self.amount),
        }
    }

    /// `base + level × amount`, or `base` when disabled.
    #[inline]
    pub fn apply(&self, base: f32, level: f32) -> f32 {
        if self.enabled {
            apply_amount(base, level, self.amount)
        } else {
            base
        }
    }
}

/// Scale an envelope level by a signed amount and add it to a base value.
#[inline]
pub fn apply_amount(base: f32, level: f32, amount: f32) -> f32 {
    base + level * amount
}

/// Per-voice, per-envelope state.
///
/// # Example
///
/// ```rust
/// use patchlab_synth::{EnvelopeParams, EnvelopeStage, EnvelopeState};
///
/// let params = EnvelopeParams::new(0.01, 0.1, 0.5, 0.2);
/// let mut env = EnvelopeState::default();
///
/// env.trigger(&params, 0.0);
/// assert_eq!(env.stage_at(&params, 0.005), EnvelopeStage::Attack);
/// assert!((env.level(&params, 0.2) - 0.5).abs() < 1e-6);
///
/// env.release(&params, 1.0);
/// assert!(env.level(&params, 1.25) < 1e-6);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopeState {
    stage: EnvelopeStage,
    stage_start_time: f64,
    stage_start_value: f32,
}

impl Default for EnvelopeState {
    fn default() -> Self {
        Self::IDLE
    }
}

impl EnvelopeState {
    /// An idle envelope.
    pub const IDLE: EnvelopeState = EnvelopeState {
        stage: EnvelopeStage::Idle,
        stage_start_time: 0.0,
        stage_start_value: 0.0,
    };

    /// Stored stage (may lag behind time; see [`stage_at`](Self::stage_at)).
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Time the stored stage started.
    pub fn stage_start_time(&self) -> f64 {
        self.stage_start_time
    }

    /// Output level when the stored stage started.
    pub fn stage_start_value(&self) -> f32 {
        self.stage_start_value
    }

    /// Gate on. The attack ramp starts from the current output level.
    pub fn trigger(&mut self, params: &EnvelopeParams, now: f64) {
        let current = self.level(params, now);
        self.stage = EnvelopeStage::Attack;
        self.stage_start_time = now;
        self.stage_start_value = current;
    }

    /// Gate off. Releasing from idle is a no-op.
    pub fn release(&mut self, params: &EnvelopeParams, now: f64) {
        let (stage, current) = self.evaluate(params, now);
        if matches!(stage, EnvelopeStage::Idle | EnvelopeStage::Release) {
            return;
        }
        self.stage = EnvelopeStage::Release;
        self.stage_start_time = now;
        self.stage_start_value = current;
    }

    /// Force the envelope to idle.
    pub fn reset(&mut self) {
        *self = Self::IDLE;
    }

    /// Output level at `now`.
    #[inline]
    pub fn level(&self, params: &EnvelopeParams, now: f64) -> f32 {
        self.evaluate(params, now).1
    }

    /// Stage the envelope is in at `now`.
    pub fn stage_at(&self, params: &EnvelopeParams, now: f64) -> EnvelopeStage {
        self.evaluate(params, now).0
    }

    /// Whether a release has run its course (or the envelope never started).
    pub fn is_finished(&self, params: &EnvelopeParams, now: f64) -> bool {
        self.stage_at(params, now) == EnvelopeStage::Idle
    }

    /// Advance the stored stage to match `now` without changing the output.
    pub fn settle(&mut self, params: &EnvelopeParams, now: f64) {
        loop {
            let elapsed = (now - self.stage_start_time).max(0.0);
            let (next, duration) = match self.stage {
                EnvelopeStage::Attack => (EnvelopeStage::Decay, params.attack),
                EnvelopeStage::Decay => (EnvelopeStage::Sustain, params.decay),
                EnvelopeStage::Release => {
                    if self.evaluate(params, now).0 == EnvelopeStage::Idle {
                        *self = Self::IDLE;
                    }
                    return;
                }
                EnvelopeStage::Idle | EnvelopeStage::Sustain => return,
            };
            if elapsed < f64::from(duration) {
                return;
            }
            self.stage = next;
            self.stage_start_time += f64::from(duration);
            self.stage_start_value = 1.0;
        }
    }

    fn evaluate(&self, params: &EnvelopeParams, now: f64) -> (EnvelopeStage, f32) {
        let elapsed = (now - self.stage_start_time).max(0.0) as f32;
        match self.stage {
            EnvelopeStage::Idle => (EnvelopeStage::Idle, 0.0),
            EnvelopeStage::Attack => {
                if params.attack > 0.0 && elapsed < params.attack {
                    let from = self.stage_start_value;
                    (
                        EnvelopeStage::Attack,
                        from + (1.0 - from) * elapsed / params.attack,
                    )
                } else {
                    Self::decay_level(params, elapsed - params.attack.max(0.0))
                }
            }
            EnvelopeStage::Decay => Self::decay_level(params, elapsed),
            EnvelopeStage::Sustain => (EnvelopeStage::Sustain, params.sustain),
            EnvelopeStage::Release => {
                if params.release > 0.0 && elapsed < params.release {
                    let level = self.stage_start_value * (1.0 - elapsed / params.release);
                    if level > SILENCE_THRESHOLD {
                        return (EnvelopeStage::Release, level);
                    }
                }
                (EnvelopeStage::Idle, 0.0)
            }
        }
    }

    fn decay_level(params: &EnvelopeParams, elapsed: f32) -> (EnvelopeStage, f32) {
        if params.decay > 0.0 && elapsed < params.decay {
            (
                EnvelopeStage::Decay,
                1.0 + (params.sustain - 1.0) * elapsed / params.decay,
            )
        } else {
            (EnvelopeStage::Sustain, params.sustain)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adsr() -> EnvelopeParams {
        EnvelopeParams::new(0.01, 0.1, 0.5, 0.2)
    }

    #[test]
    fn test_envelope_idle_state() {
        let env = EnvelopeState::default();
        assert_eq!(env.stage_at(&adsr(), 10.0), EnvelopeStage::Idle);
        assert_eq!(env.level(&adsr(), 10.0), 0.0);
    }

    #[test]
    fn test_envelope_attack_phase() {
        let mut env = EnvelopeState::default();
        env.trigger(&adsr(), 1.0);

        assert_eq!(env.stage_at(&adsr(), 1.0), EnvelopeStage::Attack);
        assert!((env.level(&adsr(), 1.005) - 0.5).abs() < 1e-4);
        assert_eq!(env.stage_at(&adsr(), 1.02), EnvelopeStage::Decay);
    }

    #[test]
    fn test_envelope_decay_to_sustain() {
        let mut env = EnvelopeState::default();
        env.trigger(&adsr(), 0.0);

        // Halfway through decay: 1.0 → 0.5
        assert!((env.level(&adsr(), 0.06) - 0.75).abs() < 1e-4);
        assert_eq!(env.stage_at(&adsr(), 0.2), EnvelopeStage::Sustain);
        assert!((env.level(&adsr(), 5.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_envelope_release() {
        let mut env = EnvelopeState::default();
        env.trigger(&adsr(), 0.0);
        env.release(&adsr(), 1.0);

        assert_eq!(env.stage_at(&adsr(), 1.0), EnvelopeStage::Release);
        assert!((env.level(&adsr(), 1.1) - 0.25).abs() < 1e-4);
        assert!(env.is_finished(&adsr(), 1.2));
        assert_eq!(env.level(&adsr(), 1.3), 0.0);
    }

    #[test]
    fn test_release_during_attack_starts_from_current_level() {
        let params = EnvelopeParams::new(1.0, 0.1, 0.5, 1.0);
        let mut env = EnvelopeState::default();
        env.trigger(&params, 0.0);
        env.release(&params, 0.4);

        assert!((env.stage_start_value() - 0.4).abs() < 1e-6);
        assert!((env.level(&params, 0.9) - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_retrigger_mid_release_has_no_discontinuity() {
        let params = EnvelopeParams::new(0.1, 0.1, 0.8, 0.5);
        let mut env = EnvelopeState::default();
        env.trigger(&params, 0.0);
        env.release(&params, 1.0);

        let before = env.level(&params, 1.25);
        env.trigger(&params, 1.25);
        let after = env.level(&params, 1.25);

        assert!(before > 0.3);
        assert!((before - after).abs() < 1e-6, "{before} vs {after}");
        assert_eq!(env.stage_at(&params, 1.25), EnvelopeStage::Attack);
    }

    #[test]
    fn test_zero_length_stages_jump() {
        let params = EnvelopeParams::new(0.0, 0.0, 0.6, 0.0);
        let mut env = EnvelopeState::default();
        env.trigger(&params, 0.0);

        let level = env.level(&params, 0.0);
        assert!(level.is_finite());
        assert!((level - 0.6).abs() < 1e-6);

        env.release(&params, 0.5);
        assert_eq!(env.level(&params, 0.5), 0.0);
        assert!(env.is_finished(&params, 0.5));
    }

    #[test]
    fn test_release_from_idle_is_noop() {
        let mut env = EnvelopeState::default();
        env.release(&adsr(), 3.0);
        assert_eq!(env, EnvelopeState::IDLE);
    }

    #[test]
    fn test_settle_preserves_level() {
        let mut env = EnvelopeState::default();
        env.trigger(&adsr(), 0.0);
        let level = env.level(&adsr(), 0.05);

        env.settle(&adsr(), 0.05);
        assert_eq!(env.stage(), EnvelopeStage::Decay);
        assert!((env.level(&adsr(), 0.05) - level).abs() < 1e-5);

        env.settle(&adsr(), 0.5);
        assert_eq!(env.stage(), EnvelopeStage::Sustain);

        env.release(&adsr(), 1.0);
        env.settle(&adsr(), 2.0);
        assert_eq!(env.stage(), EnvelopeStage::Idle);
    }

    #[test]
    fn test_output_range() {
        let params = EnvelopeParams::new(0.05, 0.2, 0.6, 0.5);
        let mut env = EnvelopeState::default();
        env.trigger(&params, 0.0);
        for i in 0..1000 {
            let level = env.level(&params, f64::from(i) * 0.001);
            assert!((0.0..=1.0).contains(&level), "Level out of range: {}", level);
        }
        env.release(&params, 1.0);
        for i in 0..1000 {
            let level = env.level(&params, 1.0 + f64::from(i) * 0.001);
            assert!((0.0..=1.0).contains(&level), "Level out of range during release: {}", level);
        }
    }

    #[test]
    fn test_mod_envelope_apply() {
        let mut filter = ModEnvelopeParams::new(adsr(), 2.0);
        assert_eq!(filter.apply(1.0, 0.5), 2.0);
        filter.enabled = false;
        assert_eq!(filter.apply(1.0, 0.5), 1.0);

        let clamped = ModEnvelopeParams::new(adsr(), 99.0).sanitized(EnvelopeKind::Filter);
        assert_eq!(clamped.amount, 8.0);
    }
}
