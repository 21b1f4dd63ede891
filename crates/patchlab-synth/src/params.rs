//! Synthesis parameter model.
//!
//! [`SynthParams`] is an immutable value object: a shared [`CommonParams`]
//! base (envelopes, LFOs, noise, glide, velocity, unison, arpeggiator,
//! modulation matrix, effects, volume, pan) composed with a
//! paradigm-specific [`ParadigmParams`] payload chosen once at construction.
//!
//! Every struct carries `#[serde(default)]`, so presets that omit fields
//! (a second LFO, pan, the modulation matrix) load with the documented
//! defaults. [`SynthParams::sanitized`] clamps every numeric field into its
//! documented range.

use patchlab_core::{LfoWaveform, NoteDivision};
use serde::{Deserialize, Serialize};

use crate::envelope::{EnvelopeKind, EnvelopeParams, ModEnvelopeParams};
use crate::mod_matrix::{ModDestination, ModRoute, ModSource};

/// Number of modulation-matrix slots in a parameter set.
pub const MOD_MATRIX_SLOTS: usize = 4;
/// Number of partials in the additive paradigm.
pub const HARMONIC_COUNT: usize = 16;
/// Maximum unison voices per logical note.
pub const MAX_UNISON: usize = 8;
/// Maximum simultaneously sounding logical notes.
pub const MAX_POLYPHONY: usize = 8;
/// Maximum arpeggiator octave span.
pub const MAX_ARP_OCTAVES: u8 = 4;

/// Documented parameter ranges.
pub mod ranges {
    use patchlab_core::ParamRange;

    /// LFO rate in Hz.
    pub const LFO_RATE: ParamRange = ParamRange::new(0.01, 50.0, 1.0);
    /// LFO depth.
    pub const LFO_DEPTH: ParamRange = ParamRange::new(0.0, 1.0, 0.0);
    /// Noise level.
    pub const NOISE_LEVEL: ParamRange = ParamRange::new(0.0, 1.0, 0.0);
    /// Glide time in seconds.
    pub const GLIDE_TIME: ParamRange = ParamRange::new(0.0, 5.0, 0.1);
    /// Velocity sensitivity amounts.
    pub const VELOCITY_AMOUNT: ParamRange = ParamRange::new(0.0, 1.0, 1.0);
    /// Unison detune spread in cents.
    pub const UNISON_DETUNE: ParamRange = ParamRange::new(0.0, 100.0, 0.0);
    /// Unison stereo spread.
    pub const UNISON_SPREAD: ParamRange = ParamRange::new(0.0, 1.0, 0.0);
    /// Arpeggiator gate as a fraction of the step interval.
    pub const ARP_GATE: ParamRange = ParamRange::new(0.05, 1.0, 0.5);
    /// Output volume in dB.
    pub const VOLUME_DB: ParamRange = ParamRange::new(-60.0, 6.0, -6.0);
    /// Stereo pan.
    pub const PAN: ParamRange = ParamRange::BIPOLAR;
    /// Oscillator detune in cents.
    pub const OSC_DETUNE: ParamRange = ParamRange::new(-100.0, 100.0, 0.0);
    /// Oscillator level.
    pub const OSC_LEVEL: ParamRange = ParamRange::new(0.0, 1.0, 1.0);
    /// Pulse width.
    pub const PULSE_WIDTH: ParamRange = ParamRange::new(0.05, 0.95, 0.5);
    /// Filter cutoff in Hz.
    pub const FILTER_CUTOFF: ParamRange = ParamRange::new(20.0, 20000.0, 2000.0);
    /// Filter resonance (Q); never negative.
    pub const FILTER_RESONANCE: ParamRange = ParamRange::new(0.0, 30.0, 1.0);
    /// Filter keyboard tracking.
    pub const KEY_TRACKING: ParamRange = ParamRange::new(0.0, 1.0, 0.0);
    /// FM harmonicity.
    pub const HARMONICITY: ParamRange = ParamRange::new(0.1, 20.0, 3.0);
    /// FM modulation index.
    pub const MODULATION_INDEX: ParamRange = ParamRange::new(0.0, 100.0, 10.0);
    /// Additive partial amplitude.
    pub const HARMONIC_AMPLITUDE: ParamRange = ParamRange::new(0.0, 1.0, 0.0);
    /// Additive brightness tilt.
    pub const BRIGHTNESS: ParamRange = ParamRange::BIPOLAR;
    /// Additive partial stretch.
    pub const STRETCH: ParamRange = ParamRange::new(0.0, 0.05, 0.0);
    /// Effect wet mix.
    pub const WET: ParamRange = ParamRange::new(0.0, 1.0, 0.3);
    /// Reverb decay in seconds.
    pub const REVERB_DECAY: ParamRange = ParamRange::new(0.1, 20.0, 2.0);
    /// Delay time in seconds.
    pub const DELAY_TIME: ParamRange = ParamRange::new(0.0, 2.0, 0.25);
    /// Delay feedback.
    pub const DELAY_FEEDBACK: ParamRange = ParamRange::new(0.0, 0.95, 0.3);
    /// Chorus rate in Hz.
    pub const CHORUS_RATE: ParamRange = ParamRange::new(0.1, 10.0, 1.5);
    /// Generic unit amount (distortion drive, chorus depth).
    pub const UNIT: ParamRange = ParamRange::UNIT;
}

fn clamp_u8(value: u8, min: u8, max: u8) -> u8 {
    value.clamp(min, max)
}

fn clamp_i8(value: i8, min: i8, max: i8) -> i8 {
    value.clamp(min, max)
}

/// Fixed-size arrays that accept shorter (or longer) lists.
///
/// Missing trailing entries take `T::default()`; extra entries are dropped.
mod padded {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T, const N: usize>(deserializer: D) -> Result<[T; N], D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default + Copy,
    {
        let entries = Vec::<T>::deserialize(deserializer)?;
        let mut out = [T::default(); N];
        for (slot, entry) in out.iter_mut().zip(entries) {
            *slot = entry;
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Shared groups
// ---------------------------------------------------------------------------

/// The five envelopes of a voice.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Envelopes {
    /// Amplitude envelope, always active
    pub amplitude: EnvelopeParams,
    /// Filter envelope (octaves of cutoff)
    pub filter: ModEnvelopeParams,
    /// Pitch envelope (semitones)
    pub pitch: ModEnvelopeParams,
    /// Modulation envelope (FM index / additive brightness)
    pub modulation: ModEnvelopeParams,
    /// Pulse-width envelope
    pub pwm: ModEnvelopeParams,
}

impl Default for Envelopes {
    fn default() -> Self {
        Self {
            amplitude: EnvelopeParams::default(),
            filter: ModEnvelopeParams {
                enabled: true,
                shape: EnvelopeParams::new(0.01, 0.3, 0.3, 0.5),
                amount: 2.0,
            },
            pitch: ModEnvelopeParams::default(),
            modulation: ModEnvelopeParams::default(),
            pwm: ModEnvelopeParams::default(),
        }
    }
}

impl Envelopes {
    /// Shape of the envelope for a kind.
    pub fn shape(&self, kind: EnvelopeKind) -> &EnvelopeParams {
        match kind {
            EnvelopeKind::Amplitude => &self.amplitude,
            EnvelopeKind::Filter => &self.filter.shape,
            EnvelopeKind::Pitch => &self.pitch.shape,
            EnvelopeKind::Modulation => &self.modulation.shape,
            EnvelopeKind::Pwm => &self.pwm.shape,
        }
    }

    /// Modulating envelope parameters for a non-amplitude kind.
    pub fn modulating(&self, kind: EnvelopeKind) -> Option<&ModEnvelopeParams> {
        match kind {
            EnvelopeKind::Amplitude => None,
            EnvelopeKind::Filter => Some(&self.filter),
            EnvelopeKind::Pitch => Some(&self.pitch),
            EnvelopeKind::Modulation => Some(&self.modulation),
            EnvelopeKind::Pwm => Some(&self.pwm),
        }
    }

    /// Clamp every envelope.
    pub fn sanitized(self) -> Self {
        Self {
            amplitude: self.amplitude.sanitized(),
            filter: self.filter.sanitized(EnvelopeKind::Filter),
            pitch: self.pitch.sanitized(EnvelopeKind::Pitch),
            modulation: self.modulation.sanitized(EnvelopeKind::Modulation),
            pwm: self.pwm.sanitized(EnvelopeKind::Pwm),
        }
    }
}

/// LFO configuration.
///
/// ## Parameters
/// - `rate`: Free-running rate in Hz (0.01 to 50.0, default 1.0)
/// - `depth`: Output scale (0.0 to 1.0, default 0.0)
/// - `sync`: When true, `sync_division` at the host tempo replaces `rate`
/// - `destination`: Optional fixed target, applied as an implicit route with amount 1.0
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LfoParams {
    /// Disabled LFOs output 0
    pub enabled: bool,
    /// Waveform shape
    pub waveform: LfoWaveform,
    /// Free-running rate in Hz
    pub rate: f32,
    /// Output scale
    pub depth: f32,
    /// Derive the rate from tempo
    pub sync: bool,
    /// Tempo division used when synced
    pub sync_division: NoteDivision,
    /// Optional direct target
    pub destination: Option<ModDestination>,
}

impl Default for LfoParams {
    fn default() -> Self {
        Self {
            enabled: false,
            waveform: LfoWaveform::Sine,
            rate: 1.0,
            depth: 0.0,
            sync: false,
            sync_division: NoteDivision::Quarter,
            destination: None,
        }
    }
}

impl LfoParams {
    /// Effective rate in Hz at the given tempo.
    pub fn effective_rate(&self, bpm: f32) -> f32 {
        if self.sync {
            self.sync_division.to_hz(bpm)
        } else {
            self.rate
        }
    }

    /// Clamp rate and depth.
    pub fn sanitized(mut self) -> Self {
        self.rate = ranges::LFO_RATE.clamp(self.rate);
        self.depth = ranges::LFO_DEPTH.clamp(self.depth);
        self
    }
}

/// Noise colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseType {
    /// Flat spectrum
    #[default]
    White,
    /// -3 dB/octave
    Pink,
    /// -6 dB/octave
    Brown,
}

/// Noise generator mixed before the filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    /// Disabled noise contributes nothing
    pub enabled: bool,
    /// Noise colour
    pub kind: NoiseType,
    /// Mix level (0.0 to 1.0)
    pub level: f32,
}

impl NoiseParams {
    /// Clamp the level.
    pub fn sanitized(mut self) -> Self {
        self.level = ranges::NOISE_LEVEL.clamp(self.level);
        self
    }
}

/// Glide / portamento.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlideParams {
    /// When enabled, voices run mono-legato and glide between notes
    pub enabled: bool,
    /// Glide time in seconds (0.0 to 5.0, default 0.1)
    pub time: f32,
}

impl Default for GlideParams {
    fn default() -> Self {
        Self {
            enabled: false,
            time: 0.1,
        }
    }
}

impl GlideParams {
    /// Clamp the glide time.
    pub fn sanitized(mut self) -> Self {
        self.time = ranges::GLIDE_TIME.clamp(self.time);
        self
    }
}

/// Velocity sensitivity.
///
/// `amp_amount` = 0 is velocity-insensitive, 1 scales amplitude fully.
/// `secondary_amount` drives the paradigm's secondary destination
/// (subtractive: filter cutoff, FM: modulation index, additive: brightness).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityParams {
    /// Velocity to amplitude (0.0 to 1.0, default 1.0)
    pub amp_amount: f32,
    /// Velocity to the paradigm's secondary destination (0.0 to 1.0, default 0.0)
    pub secondary_amount: f32,
}

impl Default for VelocityParams {
    fn default() -> Self {
        Self {
            amp_amount: 1.0,
            secondary_amount: 0.0,
        }
    }
}

impl VelocityParams {
    /// Amplitude multiplier for a velocity in [0, 1].
    #[inline]
    pub fn amplitude_scale(&self, velocity: f32) -> f32 {
        1.0 - self.amp_amount * (1.0 - velocity)
    }

    /// Normalized secondary modulation for a velocity in [0, 1].
    #[inline]
    pub fn secondary(&self, velocity: f32) -> f32 {
        velocity * self.secondary_amount
    }

    /// Clamp both amounts.
    pub fn sanitized(self) -> Self {
        Self {
            amp_amount: ranges::VELOCITY_AMOUNT.clamp(self.amp_amount),
            secondary_amount: ranges::VELOCITY_AMOUNT.clamp(self.secondary_amount),
        }
    }
}

/// Unison stacking.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnisonParams {
    /// Physical voices per note (1 to 8, default 1)
    pub voices: u8,
    /// Detune spread in cents (0.0 to 100.0)
    pub detune_cents: f32,
    /// Stereo spread (0.0 mono to 1.0 full)
    pub spread: f32,
}

impl Default for UnisonParams {
    fn default() -> Self {
        Self {
            voices: 1,
            detune_cents: 0.0,
            spread: 0.0,
        }
    }
}

impl UnisonParams {
    /// Clamp voice count, detune and spread.
    pub fn sanitized(self) -> Self {
        Self {
            voices: clamp_u8(self.voices, 1, MAX_UNISON as u8),
            detune_cents: ranges::UNISON_DETUNE.clamp(self.detune_cents),
            spread: ranges::UNISON_SPREAD.clamp(self.spread),
        }
    }
}

/// Arpeggiator step order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArpPattern {
    /// Ascending, repeating
    #[default]
    Up,
    /// Descending, repeating
    Down,
    /// Ascending then descending without repeating the turnaround notes
    UpDown,
    /// Uniformly random step
    Random,
}

/// Arpeggiator configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArpParams {
    /// Enable the arpeggiator
    pub enabled: bool,
    /// Step order
    pub pattern: ArpPattern,
    /// Step interval as a tempo division
    pub division: NoteDivision,
    /// Octave span (1 to 4)
    pub octaves: u8,
    /// Gate as a fraction of the step interval (0.05 to 1.0)
    pub gate: f32,
}

impl Default for ArpParams {
    fn default() -> Self {
        Self {
            enabled: false,
            pattern: ArpPattern::Up,
            division: NoteDivision::Sixteenth,
            octaves: 1,
            gate: 0.5,
        }
    }
}

impl ArpParams {
    /// Clamp octaves and gate.
    pub fn sanitized(mut self) -> Self {
        self.octaves = clamp_u8(self.octaves, 1, MAX_ARP_OCTAVES);
        self.gate = ranges::ARP_GATE.clamp(self.gate);
        self
    }
}

/// Reverb send, forwarded to the rendering backend.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbParams {
    /// Enable
    pub enabled: bool,
    /// Decay in seconds
    pub decay: f32,
    /// Wet mix
    pub wet: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            enabled: false,
            decay: 2.0,
            wet: 0.3,
        }
    }
}

/// Feedback delay, forwarded to the rendering backend.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayParams {
    /// Enable
    pub enabled: bool,
    /// Delay time in seconds
    pub time: f32,
    /// Feedback amount
    pub feedback: f32,
    /// Wet mix
    pub wet: f32,
}

impl Default for DelayParams {
    fn default() -> Self {
        Self {
            enabled: false,
            time: 0.25,
            feedback: 0.3,
            wet: 0.3,
        }
    }
}

/// Chorus, forwarded to the rendering backend.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChorusParams {
    /// Enable
    pub enabled: bool,
    /// Rate in Hz
    pub rate: f32,
    /// Depth
    pub depth: f32,
    /// Wet mix
    pub wet: f32,
}

impl Default for ChorusParams {
    fn default() -> Self {
        Self {
            enabled: false,
            rate: 1.5,
            depth: 0.5,
            wet: 0.3,
        }
    }
}

/// Distortion, forwarded to the rendering backend.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistortionParams {
    /// Enable
    pub enabled: bool,
    /// Drive amount
    pub amount: f32,
    /// Wet mix
    pub wet: f32,
}

impl Default for DistortionParams {
    fn default() -> Self {
        Self {
            enabled: false,
            amount: 0.4,
            wet: 0.5,
        }
    }
}

/// Effects chain settings. The engine only carries these to the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsParams {
    /// Distortion
    pub distortion: DistortionParams,
    /// Chorus
    pub chorus: ChorusParams,
    /// Delay
    pub delay: DelayParams,
    /// Reverb
    pub reverb: ReverbParams,
}

impl EffectsParams {
    /// Clamp every effect field.
    pub fn sanitized(self) -> Self {
        use ranges::{CHORUS_RATE, DELAY_FEEDBACK, DELAY_TIME, REVERB_DECAY, UNIT, WET};
        Self {
            distortion: DistortionParams {
                enabled: self.distortion.enabled,
                amount: UNIT.clamp(self.distortion.amount),
                wet: WET.clamp(self.distortion.wet),
            },
            chorus: ChorusParams {
                enabled: self.chorus.enabled,
                rate: CHORUS_RATE.clamp(self.chorus.rate),
                depth: UNIT.clamp(self.chorus.depth),
                wet: WET.clamp(self.chorus.wet),
            },
            delay: DelayParams {
                enabled: self.delay.enabled,
                time: DELAY_TIME.clamp(self.delay.time),
                feedback: DELAY_FEEDBACK.clamp(self.delay.feedback),
                wet: WET.clamp(self.delay.wet),
            },
            reverb: ReverbParams {
                enabled: self.reverb.enabled,
                decay: REVERB_DECAY.clamp(self.reverb.decay),
                wet: WET.clamp(self.reverb.wet),
            },
        }
    }
}

/// Parameters shared by every synthesis paradigm.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonParams {
    /// Voice envelopes
    pub envelopes: Envelopes,
    /// LFO 1
    pub lfo1: LfoParams,
    /// LFO 2
    pub lfo2: LfoParams,
    /// Noise source
    pub noise: NoiseParams,
    /// Glide
    pub glide: GlideParams,
    /// Velocity sensitivity
    pub velocity: VelocityParams,
    /// Unison
    pub unison: UnisonParams,
    /// Arpeggiator
    pub arpeggiator: ArpParams,
    /// Modulation matrix slots; a shorter list leaves the rest disabled
    #[serde(deserialize_with = "padded::deserialize")]
    pub mod_matrix: [ModRoute; MOD_MATRIX_SLOTS],
    /// Effects chain
    pub effects: EffectsParams,
    /// Output volume in dB (-60.0 to 6.0, default -6.0)
    pub volume: f32,
    /// Stereo pan (-1.0 to 1.0, default 0.0)
    pub pan: f32,
}

impl Default for CommonParams {
    fn default() -> Self {
        Self {
            envelopes: Envelopes::default(),
            lfo1: LfoParams::default(),
            lfo2: LfoParams::default(),
            noise: NoiseParams::default(),
            glide: GlideParams::default(),
            velocity: VelocityParams::default(),
            unison: UnisonParams::default(),
            arpeggiator: ArpParams::default(),
            mod_matrix: [ModRoute::default(); MOD_MATRIX_SLOTS],
            effects: EffectsParams::default(),
            volume: ranges::VOLUME_DB.default,
            pan: 0.0,
        }
    }
}

impl CommonParams {
    /// LFO parameters by slot (0 or 1).
    pub fn lfo(&self, index: usize) -> &LfoParams {
        if index == 0 { &self.lfo1 } else { &self.lfo2 }
    }

    /// Clamp every shared field.
    pub fn sanitized(self) -> Self {
        Self {
            envelopes: self.envelopes.sanitized(),
            lfo1: self.lfo1.sanitized(),
            lfo2: self.lfo2.sanitized(),
            noise: self.noise.sanitized(),
            glide: self.glide.sanitized(),
            velocity: self.velocity.sanitized(),
            unison: self.unison.sanitized(),
            arpeggiator: self.arpeggiator.sanitized(),
            mod_matrix: self.mod_matrix.map(ModRoute::sanitized),
            effects: self.effects.sanitized(),
            volume: ranges::VOLUME_DB.clamp(self.volume),
            pan: ranges::PAN.clamp(self.pan),
        }
    }
}

// ---------------------------------------------------------------------------
// Paradigm payloads
// ---------------------------------------------------------------------------

/// Audio oscillator waveform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OscWaveform {
    /// Pure fundamental
    Sine,
    /// Odd harmonics, soft
    Triangle,
    /// All harmonics, bright
    #[default]
    Sawtooth,
    /// Odd harmonics, hollow
    Square,
    /// Variable duty cycle (see `pulse_width`)
    Pulse,
}

/// Main oscillator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscillatorParams {
    /// Waveform
    pub waveform: OscWaveform,
    /// Octave offset (-3 to 3)
    pub octave: i8,
    /// Fine detune in cents (-100 to 100)
    pub detune: f32,
    /// Level (0.0 to 1.0)
    pub level: f32,
    /// Pulse width for `Pulse` (0.05 to 0.95)
    pub pulse_width: f32,
}

impl Default for OscillatorParams {
    fn default() -> Self {
        Self {
            waveform: OscWaveform::Sawtooth,
            octave: 0,
            detune: 0.0,
            level: 1.0,
            pulse_width: 0.5,
        }
    }
}

impl OscillatorParams {
    /// Clamp every field.
    pub fn sanitized(self) -> Self {
        Self {
            waveform: self.waveform,
            octave: clamp_i8(self.octave, -3, 3),
            detune: ranges::OSC_DETUNE.clamp(self.detune),
            level: ranges::OSC_LEVEL.clamp(self.level),
            pulse_width: ranges::PULSE_WIDTH.clamp(self.pulse_width),
        }
    }
}

/// Second oscillator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondOscillatorParams {
    /// Enable
    pub enabled: bool,
    /// Waveform
    pub waveform: OscWaveform,
    /// Octave offset (-3 to 3)
    pub octave: i8,
    /// Fine detune in cents
    pub detune: f32,
    /// Level (0.0 to 1.0)
    pub level: f32,
}

impl Default for SecondOscillatorParams {
    fn default() -> Self {
        Self {
            enabled: false,
            waveform: OscWaveform::Square,
            octave: 0,
            detune: 7.0,
            level: 0.5,
        }
    }
}

impl SecondOscillatorParams {
    /// Clamp every field.
    pub fn sanitized(self) -> Self {
        Self {
            enabled: self.enabled,
            waveform: self.waveform,
            octave: clamp_i8(self.octave, -3, 3),
            detune: ranges::OSC_DETUNE.clamp(self.detune),
            level: ranges::OSC_LEVEL.clamp(self.level),
        }
    }
}

/// Sub-oscillator, one or two octaves below the main oscillator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubOscillatorParams {
    /// Enable
    pub enabled: bool,
    /// Waveform
    pub waveform: OscWaveform,
    /// Octaves below the main oscillator (1 or 2)
    pub octaves_down: u8,
    /// Level (0.0 to 1.0)
    pub level: f32,
}

impl Default for SubOscillatorParams {
    fn default() -> Self {
        Self {
            enabled: false,
            waveform: OscWaveform::Square,
            octaves_down: 1,
            level: 0.5,
        }
    }
}

impl SubOscillatorParams {
    /// Clamp every field.
    pub fn sanitized(self) -> Self {
        Self {
            enabled: self.enabled,
            waveform: self.waveform,
            octaves_down: clamp_u8(self.octaves_down, 1, 2),
            level: ranges::OSC_LEVEL.clamp(self.level),
        }
    }
}

/// Filter response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Low-pass
    #[default]
    Lowpass,
    /// High-pass
    Highpass,
    /// Band-pass
    Bandpass,
    /// Notch
    Notch,
}

/// Filter slope in dB/octave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterRolloff {
    /// 12 dB/octave
    #[serde(rename = "-12")]
    Db12,
    /// 24 dB/octave
    #[default]
    #[serde(rename = "-24")]
    Db24,
    /// 48 dB/octave
    #[serde(rename = "-48")]
    Db48,
}

/// Filter stage of the subtractive paradigm.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    /// Response type
    pub kind: FilterType,
    /// Slope
    pub rolloff: FilterRolloff,
    /// Base cutoff in Hz (20 to 20000, default 2000)
    pub cutoff: f32,
    /// Resonance / Q (0.0 to 30.0, default 1.0)
    pub resonance: f32,
    /// Keyboard tracking (0.0 none to 1.0 full)
    pub key_tracking: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            kind: FilterType::Lowpass,
            rolloff: FilterRolloff::Db24,
            cutoff: 2000.0,
            resonance: 1.0,
            key_tracking: 0.0,
        }
    }
}

impl FilterParams {
    /// Clamp every field.
    pub fn sanitized(mut self) -> Self {
        self.cutoff = ranges::FILTER_CUTOFF.clamp(self.cutoff);
        self.resonance = ranges::FILTER_RESONANCE.clamp(self.resonance);
        self.key_tracking = ranges::KEY_TRACKING.clamp(self.key_tracking);
        self
    }
}

/// Subtractive paradigm payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtractiveParams {
    /// Main oscillator
    pub oscillator: OscillatorParams,
    /// Second oscillator
    pub oscillator2: SecondOscillatorParams,
    /// Sub-oscillator
    pub sub_oscillator: SubOscillatorParams,
    /// Filter
    pub filter: FilterParams,
}

impl SubtractiveParams {
    /// Clamp every field.
    pub fn sanitized(self) -> Self {
        Self {
            oscillator: self.oscillator.sanitized(),
            oscillator2: self.oscillator2.sanitized(),
            sub_oscillator: self.sub_oscillator.sanitized(),
            filter: self.filter.sanitized(),
        }
    }
}

/// FM paradigm payload (two-operator).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FmParams {
    /// Carrier waveform
    pub carrier_waveform: OscWaveform,
    /// Modulator waveform
    pub modulator_waveform: OscWaveform,
    /// Modulator-to-carrier frequency ratio (0.1 to 20.0, default 3.0)
    pub harmonicity: f32,
    /// Base modulation index (0.0 to 100.0, default 10.0)
    pub modulation_index: f32,
}

impl Default for FmParams {
    fn default() -> Self {
        Self {
            carrier_waveform: OscWaveform::Sine,
            modulator_waveform: OscWaveform::Sine,
            harmonicity: 3.0,
            modulation_index: 10.0,
        }
    }
}

impl FmParams {
    /// Clamp every field.
    pub fn sanitized(mut self) -> Self {
        self.harmonicity = ranges::HARMONICITY.clamp(self.harmonicity);
        self.modulation_index = ranges::MODULATION_INDEX.clamp(self.modulation_index);
        self
    }
}

/// Additive paradigm payload.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditiveParams {
    /// Partial amplitudes, partial `k` at `(k + 1) ×` the fundamental;
    /// unlisted partials are silent
    #[serde(deserialize_with = "padded::deserialize")]
    pub harmonics: [f32; HARMONIC_COUNT],
    /// Spectral tilt: positive favours upper partials (-1.0 to 1.0)
    pub brightness: f32,
    /// Inharmonic stretch of upper partials (0.0 to 0.05)
    pub stretch: f32,
}

impl Default for AdditiveParams {
    fn default() -> Self {
        Self {
            harmonics: core::array::from_fn(|k| 1.0 / (k + 1) as f32),
            brightness: 0.0,
            stretch: 0.0,
        }
    }
}

impl AdditiveParams {
    /// Clamp every field.
    pub fn sanitized(self) -> Self {
        Self {
            harmonics: self.harmonics.map(|a| ranges::HARMONIC_AMPLITUDE.clamp(a)),
            brightness: ranges::BRIGHTNESS.clamp(self.brightness),
            stretch: ranges::STRETCH.clamp(self.stretch),
        }
    }
}

/// Which synthesis paradigm a parameter set describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParadigmKind {
    /// Oscillators into a filter
    Subtractive,
    /// Two-operator frequency modulation
    Fm,
    /// Summed harmonic partials
    Additive,
}

/// Paradigm-specific payload, chosen once at construction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParadigmParams {
    /// Subtractive synthesis
    Subtractive(SubtractiveParams),
    /// FM synthesis
    Fm(FmParams),
    /// Additive synthesis
    Additive(AdditiveParams),
}

impl Default for ParadigmParams {
    fn default() -> Self {
        ParadigmParams::Subtractive(SubtractiveParams::default())
    }
}

impl ParadigmParams {
    /// The paradigm this payload belongs to.
    pub fn kind(&self) -> ParadigmKind {
        match self {
            ParadigmParams::Subtractive(_) => ParadigmKind::Subtractive,
            ParadigmParams::Fm(_) => ParadigmKind::Fm,
            ParadigmParams::Additive(_) => ParadigmKind::Additive,
        }
    }

    /// Clamp every field of the payload.
    pub fn sanitized(self) -> Self {
        match self {
            ParadigmParams::Subtractive(p) => ParadigmParams::Subtractive(p.sanitized()),
            ParadigmParams::Fm(p) => ParadigmParams::Fm(p.sanitized()),
            ParadigmParams::Additive(p) => ParadigmParams::Additive(p.sanitized()),
        }
    }
}

/// Complete synthesis parameter set.
///
/// # Example
///
/// ```rust
/// use patchlab_synth::{ParadigmKind, SynthParams};
///
/// let params = SynthParams::fm();
/// assert_eq!(params.kind(), ParadigmKind::Fm);
///
/// let mut wild = SynthParams::subtractive();
/// wild.common.envelopes.amplitude.sustain = 4.0;
/// assert_eq!(wild.sanitized().common.envelopes.amplitude.sustain, 1.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthParams {
    /// Shared base
    pub common: CommonParams,
    /// Paradigm payload
    pub paradigm: ParadigmParams,
}

impl SynthParams {
    /// Default subtractive parameters.
    pub fn subtractive() -> Self {
        Self::default()
    }

    /// Default FM parameters.
    pub fn fm() -> Self {
        let mut common = CommonParams::default();
        common.envelopes.filter.enabled = false;
        common.envelopes.modulation =
            ModEnvelopeParams::new(EnvelopeParams::new(0.01, 0.5, 0.2, 0.5), 5.0);
        common.velocity.secondary_amount = 0.5;
        Self {
            common,
            paradigm: ParadigmParams::Fm(FmParams::default()),
        }
    }

    /// Default additive parameters.
    pub fn additive() -> Self {
        let mut common = CommonParams::default();
        common.envelopes.filter.enabled = false;
        Self {
            common,
            paradigm: ParadigmParams::Additive(AdditiveParams::default()),
        }
    }

    /// The paradigm of this parameter set.
    pub fn kind(&self) -> ParadigmKind {
        self.paradigm.kind()
    }

    /// Copy with every numeric field clamped into its documented range.
    pub fn sanitized(self) -> Self {
        Self {
            common: self.common.sanitized(),
            paradigm: self.paradigm.sanitized(),
        }
    }

    /// Route a source to a destination through the first free (disabled) slot.
    ///
    /// Returns `None` when all slots are in use.
    pub fn with_route(mut self, route: ModRoute) -> Option<Self> {
        let slot = self.common.mod_matrix.iter().position(|r| !r.enabled)?;
        self.common.mod_matrix[slot] = route.sanitized();
        Some(self)
    }
}

/// Shorthand for an enabled [`ModRoute`].
pub fn route(source: ModSource, destination: ModDestination, amount: f32) -> ModRoute {
    ModRoute::new(source, destination, amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paradigms() {
        assert_eq!(SynthParams::subtractive().kind(), ParadigmKind::Subtractive);
        assert_eq!(SynthParams::fm().kind(), ParadigmKind::Fm);
        assert_eq!(SynthParams::additive().kind(), ParadigmKind::Additive);
    }

    #[test]
    fn test_defaults_are_already_sanitized() {
        for params in [SynthParams::subtractive(), SynthParams::fm(), SynthParams::additive()] {
            assert_eq!(params.sanitized(), params);
        }
    }

    #[test]
    fn test_sanitize_clamps_out_of_range_fields() {
        let mut params = SynthParams::subtractive();
        params.common.envelopes.amplitude.sustain = 2.0;
        params.common.envelopes.amplitude.attack = -1.0;
        params.common.unison.voices = 40;
        params.common.pan = f32::NAN;
        params.common.mod_matrix[0].amount = -7.0;
        if let ParadigmParams::Subtractive(ref mut sub) = params.paradigm {
            sub.filter.resonance = -3.0;
            sub.filter.cutoff = 1e9;
        }

        let clean = params.sanitized();
        assert_eq!(clean.common.envelopes.amplitude.sustain, 1.0);
        assert_eq!(clean.common.envelopes.amplitude.attack, 0.0);
        assert_eq!(clean.common.unison.voices, MAX_UNISON as u8);
        assert_eq!(clean.common.pan, 0.0);
        assert_eq!(clean.common.mod_matrix[0].amount, -1.0);
        let ParadigmParams::Subtractive(sub) = clean.paradigm else {
            panic!("paradigm changed");
        };
        assert_eq!(sub.filter.resonance, 0.0);
        assert_eq!(sub.filter.cutoff, 20000.0);
    }

    #[test]
    fn test_additive_harmonics_clamped() {
        let mut additive = AdditiveParams::default();
        additive.harmonics[3] = 1.5;
        additive.harmonics[4] = -0.5;
        let clean = additive.sanitized();
        assert_eq!(clean.harmonics[3], 1.0);
        assert_eq!(clean.harmonics[4], 0.0);
        assert_eq!(clean.harmonics.len(), HARMONIC_COUNT);
    }

    #[test]
    fn test_lfo_effective_rate() {
        let mut lfo = LfoParams {
            rate: 3.0,
            ..LfoParams::default()
        };
        assert_eq!(lfo.effective_rate(120.0), 3.0);
        lfo.sync = true;
        lfo.sync_division = NoteDivision::Quarter;
        assert!((lfo.effective_rate(120.0) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_velocity_scaling() {
        let insensitive = VelocityParams {
            amp_amount: 0.0,
            secondary_amount: 0.0,
        };
        assert_eq!(insensitive.amplitude_scale(0.2), 1.0);

        let full = VelocityParams::default();
        assert!((full.amplitude_scale(0.2) - 0.2).abs() < 1e-6);
        assert_eq!(full.amplitude_scale(1.0), 1.0);
    }

    #[test]
    fn test_with_route_uses_free_slot() {
        let params = SynthParams::subtractive()
            .with_route(route(ModSource::Lfo1, ModDestination::Pitch, 0.2))
            .unwrap();
        assert!(params.common.mod_matrix[0].enabled);
        assert!(!params.common.mod_matrix[1].enabled);

        let mut full = params;
        for slot in &mut full.common.mod_matrix {
            slot.enabled = true;
        }
        assert!(full.with_route(route(ModSource::Lfo2, ModDestination::Pan, 0.1)).is_none());
    }

    #[test]
    fn test_short_lists_are_padded() {
        let json = r#"{
            "common": { "mod_matrix": [
                { "source": "mod_wheel", "destination": "pitch", "amount": 0.5, "enabled": true }
            ] },
            "paradigm": { "kind": "additive", "harmonics": [1.0, 0.5] }
        }"#;
        let params: SynthParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.common.mod_matrix[0].source, ModSource::ModWheel);
        assert_eq!(params.common.mod_matrix[1], ModRoute::default());
        let ParadigmParams::Additive(additive) = params.paradigm else {
            panic!("expected additive");
        };
        assert_eq!(additive.harmonics[1], 0.5);
        assert!(additive.harmonics[2..].iter().all(|&a| a == 0.0));
    }
}
