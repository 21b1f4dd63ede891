//! The synthesis control engine.
//!
//! [`SynthEngine`] is an explicitly owned object driven by one logical clock.
//! Each [`tick`](SynthEngine::tick):
//!
//! 1. loads the current parameter snapshot once (rebuilding the modulation
//!    matrix and reconfiguring the arpeggiator only when the version changed)
//! 2. advances the arpeggiator and applies its note events
//! 3. frees voices whose release has finished
//! 4. advances both LFOs, sources-first, with matrix rate/depth modulation
//! 5. resolves the matrix per voice and asks the paradigm's
//!    [`SynthesisModel`] for each voice's instantaneous parameters
//!
//! Every stage is a function of absolute time, so a late tick catches up to
//! the state an on-time tick would have reached.

use std::sync::Arc;

use patchlab_core::{Lfo, Note, ParamRange, Tempo, db_to_linear};

use crate::arpeggiator::{ArpEvent, Arpeggiator};
use crate::envelope::{EnvelopeKind, EnvelopeStage};
use crate::mod_matrix::{
    ModDestination, ModRoute, ModSource, ModulationMatrix, ModulationValues, RouteOrigin,
};
use crate::paradigm::{EnvelopeLevels, VoiceContext, VoiceSynthesis};
use crate::params::{EffectsParams, MOD_MATRIX_SLOTS, SynthParams};
use crate::patch::ParamPatch;
use crate::store::{ParamSnapshot, ParameterStore};
use crate::voice::{VOICE_POOL_SIZE, Voice, VoiceManager};
use crate::warning::{EngineWarning, report};

/// Matrix capacity: every slot plus both LFOs' direct destinations.
pub const MATRIX_CAPACITY: usize = MOD_MATRIX_SLOTS + 2;

/// Seed used for the arpeggiator's random pattern unless overridden.
pub const DEFAULT_ARP_SEED: u64 = 0x5EED_A4B1;

/// LFO state for visualization.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LfoReadout {
    /// Phase (0.0 to 1.0)
    pub phase: f32,
    /// Output after depth (-depth to depth), 0 when disabled
    pub value: f32,
    /// Effective rate in Hz after sync and modulation
    pub rate: f32,
}

/// Everything the engine produces for one tick.
#[derive(Clone, Debug, Default)]
pub struct EngineFrame {
    /// Tick time in seconds
    pub time: f64,
    /// Parameter snapshot version used
    pub version: u64,
    /// LFO readouts
    pub lfos: [LfoReadout; 2],
    /// Amplitude envelope level of the newest voice (0 when silent)
    pub envelope_level: f32,
    /// Amplitude envelope stage of the newest voice
    pub envelope_stage: EnvelopeStage,
    /// Per-voice synthesis parameters
    pub voices: Vec<VoiceSynthesis>,
    /// Linear output gain from `volume`
    pub gain: f32,
    /// Effects settings, passed through to the backend
    pub effects: EffectsParams,
}

impl EngineFrame {
    /// Loudest voice amplitude in the frame.
    pub fn peak_amplitude(&self) -> f32 {
        self.voices
            .iter()
            .map(|v| v.amplitude)
            .fold(0.0, f32::max)
    }
}

/// Synthesis control engine.
///
/// # Example
///
/// ```rust
/// use patchlab_core::Note;
/// use patchlab_synth::{SynthEngine, SynthParams};
///
/// let mut engine = SynthEngine::new(SynthParams::subtractive());
/// engine.note_on(Note::new(60), 1.0, 0.0);
///
/// let frame = engine.tick(0.05);
/// assert_eq!(frame.voices.len(), 1);
/// assert!(frame.envelope_level > 0.0);
/// ```
#[derive(Debug)]
pub struct SynthEngine {
    store: ParameterStore,
    snapshot: Arc<ParamSnapshot>,
    matrix: ModulationMatrix<MATRIX_CAPACITY>,
    voices: VoiceManager,
    lfos: [Lfo; 2],
    arp: Option<Arpeggiator>,
    arp_seed: u64,
    arp_events: Vec<ArpEvent>,
    held: Vec<(Note, f32)>,
    tempo: Tempo,
    mod_wheel: f32,
    frame: EngineFrame,
}

impl SynthEngine {
    /// Create an engine with its own parameter store.
    pub fn new(params: SynthParams) -> Self {
        Self::with_store(ParameterStore::new(params))
    }

    /// Create an engine reading from a shared store.
    pub fn with_store(store: ParameterStore) -> Self {
        let snapshot = store.snapshot();
        let mut engine = Self {
            store,
            snapshot: Arc::clone(&snapshot),
            matrix: ModulationMatrix::new(),
            voices: VoiceManager::new(),
            lfos: [Lfo::new(), Lfo::new()],
            arp: None,
            arp_seed: DEFAULT_ARP_SEED,
            arp_events: Vec::with_capacity(8),
            held: Vec::with_capacity(128),
            tempo: Tempo::default(),
            mod_wheel: 0.0,
            frame: EngineFrame {
                voices: Vec::with_capacity(VOICE_POOL_SIZE),
                ..EngineFrame::default()
            },
        };
        engine.rebuild(&snapshot, 0.0);
        engine
    }

    /// Override the arpeggiator's random seed.
    pub fn with_arp_seed(mut self, seed: u64) -> Self {
        self.arp_seed = seed;
        self
    }

    /// The parameter store; clone it to hand to a control thread.
    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    /// Parameters the engine is currently running.
    pub fn params(&self) -> &SynthParams {
        &self.snapshot.params
    }

    /// The voice pool.
    pub fn voices(&self) -> &VoiceManager {
        &self.voices
    }

    /// The arpeggiator, when enabled.
    pub fn arpeggiator(&self) -> Option<&Arpeggiator> {
        self.arp.as_ref()
    }

    /// The active modulation matrix.
    pub fn matrix(&self) -> &ModulationMatrix<MATRIX_CAPACITY> {
        &self.matrix
    }

    /// Apply a parameter patch. Takes effect at the next tick or note event.
    pub fn apply(&mut self, patch: ParamPatch) -> Arc<ParamSnapshot> {
        self.store.apply(patch)
    }

    /// Replace every parameter (preset load).
    pub fn load_params(&mut self, params: SynthParams) -> Arc<ParamSnapshot> {
        self.store.replace_all(params)
    }

    /// Set the host tempo in BPM (clamped to 20..300).
    pub fn set_tempo(&mut self, bpm: f32) {
        self.tempo = Tempo::new(bpm);
    }

    /// Current tempo.
    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Set the mod wheel source (0.0 to 1.0).
    pub fn set_mod_wheel(&mut self, value: f32) {
        self.mod_wheel = ParamRange::UNIT.clamp(value);
    }

    /// Key pressed. Velocity is clamped to 0.0..=1.0, NaN to 0.0.
    pub fn note_on(&mut self, note: Note, velocity: f32, now: f64) {
        self.sync(now);
        let velocity = ParamRange::UNIT.clamp(velocity);
        self.held.retain(|(n, _)| *n != note);
        if self.held.len() < self.held.capacity() {
            self.held.push((note, velocity));
        }
        match &mut self.arp {
            Some(arp) => arp.note_on(note, velocity, now),
            None => {
                self.voices.note_on(note, velocity, now, &self.snapshot.params.common);
            }
        }
    }

    /// Key released.
    pub fn note_off(&mut self, note: Note, now: f64) {
        self.sync(now);
        self.held.retain(|(n, _)| *n != note);
        match &mut self.arp {
            Some(arp) => arp.note_off(note),
            None => self.voices.note_off(note, now, &self.snapshot.params.common),
        }
    }

    /// Release every held key.
    pub fn release_all(&mut self, now: f64) {
        self.sync(now);
        self.held.clear();
        if let Some(arp) = &mut self.arp {
            if let Some(ArpEvent::NoteOff { note, time }) = arp.stop(now) {
                self.voices
                    .note_off(note, time, &self.snapshot.params.common);
            }
            *arp = Arpeggiator::new(*arp.params(), self.arp_seed);
        }
        self.voices.release_all(now, &self.snapshot.params.common);
    }

    /// Silence everything immediately.
    pub fn all_notes_off(&mut self) {
        self.held.clear();
        if let Some(arp) = &mut self.arp {
            *arp = Arpeggiator::new(*arp.params(), self.arp_seed);
        }
        self.voices.all_notes_off();
    }

    /// Advance to `now` and compute this tick's frame.
    pub fn tick(&mut self, now: f64) -> &EngineFrame {
        self.sync(now);
        let snapshot = Arc::clone(&self.snapshot);
        let params = &snapshot.params;
        let common = &params.common;
        let bpm = self.tempo.bpm();

        if let Some(arp) = &mut self.arp {
            self.arp_events.clear();
            arp.tick(now, bpm, &mut self.arp_events);
            for event in &self.arp_events {
                match *event {
                    ArpEvent::NoteOn { note, velocity, time } => {
                        self.voices.note_on(note, velocity, time, common);
                    }
                    ArpEvent::NoteOff { note, time } => self.voices.note_off(note, time, common),
                }
            }
        }

        self.voices.reap(now, &common.envelopes);

        // Global sources: LFOs, mod wheel and the newest voice for LFO-targeted routes
        let mut global = ModulationValues::new();
        global.set(ModSource::ModWheel, self.mod_wheel);
        let lead = self.voices.newest_voice().copied();
        if let Some(voice) = &lead {
            fill_voice_sources(&mut global, voice, &EnvelopeLevels::of(voice, common, now));
        }

        let mut lfos = [LfoReadout::default(); 2];
        for index in self.matrix.lfo_order() {
            let lfo = common.lfo(index);
            let resolved = self.matrix.resolve(&global);
            let (rate_dest, depth_dest, source) = LFO_SLOTS[index];
            let rate = resolved.apply(rate_dest, lfo.effective_rate(bpm));
            let depth = resolved.apply(depth_dest, lfo.depth);
            let phase = self.lfos[index].advance_to(now, rate);
            let value = if lfo.enabled {
                lfo.waveform.value_at(phase) * depth
            } else {
                0.0
            };
            global.set(source, value);
            lfos[index] = LfoReadout { phase, value, rate };
        }

        let model = params.paradigm.model();
        let velocity_destination = model.velocity_destination();
        self.frame.voices.clear();
        for voice in self.voices.active_voices() {
            let envelopes = EnvelopeLevels::of(voice, common, now);
            let mut values = global;
            fill_voice_sources(&mut values, voice, &envelopes);

            let mut modulation = self.matrix.resolve(&values);
            modulation.add(velocity_destination, common.velocity.secondary(voice.velocity()));

            let ctx = VoiceContext {
                common,
                voice,
                envelopes,
                modulation: &modulation,
                now,
            };
            self.frame.voices.push(model.voice_synthesis(&ctx));
        }

        self.frame.time = now;
        self.frame.version = snapshot.version;
        self.frame.lfos = lfos;
        self.frame.gain = db_to_linear(common.volume);
        self.frame.effects = common.effects;
        match &lead {
            Some(voice) => {
                let shape = &common.envelopes.amplitude;
                let env = voice.envelope(EnvelopeKind::Amplitude);
                self.frame.envelope_level = env.level(shape, now);
                self.frame.envelope_stage = env.stage_at(shape, now);
            }
            None => {
                self.frame.envelope_level = 0.0;
                self.frame.envelope_stage = EnvelopeStage::Idle;
            }
        }
        &self.frame
    }

    /// The most recent frame.
    pub fn frame(&self) -> &EngineFrame {
        &self.frame
    }

    /// Pick up a newer snapshot, if one was published.
    fn sync(&mut self, now: f64) {
        let latest = self.store.snapshot();
        if latest.version == self.snapshot.version {
            return;
        }
        self.rebuild(&latest, now);
        self.snapshot = latest;
    }

    fn rebuild(&mut self, snapshot: &ParamSnapshot, now: f64) {
        let common = &snapshot.params.common;

        let mut routes: Vec<(RouteOrigin, ModRoute)> = common
            .mod_matrix
            .iter()
            .enumerate()
            .map(|(slot, route)| (RouteOrigin::Slot(slot), *route))
            .collect();
        for (index, lfo) in [&common.lfo1, &common.lfo2].into_iter().enumerate() {
            if let Some(destination) = lfo.destination {
                let source = LFO_SLOTS[index].2;
                routes.push((
                    RouteOrigin::LfoDirect(index),
                    ModRoute::new(source, destination, 1.0).with_enabled(lfo.enabled),
                ));
            }
        }

        let (matrix, conflicts) = ModulationMatrix::from_tagged(&routes);
        for conflict in conflicts {
            report(
                self.store.warnings(),
                EngineWarning::ConflictingRoute {
                    origin: conflict.origin,
                    route: conflict.route,
                },
            );
        }
        self.matrix = matrix;

        let arp_params = common.arpeggiator;
        match (&mut self.arp, arp_params.enabled) {
            (Some(arp), true) => arp.configure(&arp_params),
            (Some(arp), false) => {
                if let Some(ArpEvent::NoteOff { note, time }) = arp.stop(now) {
                    self.voices.note_off(note, time, common);
                }
                self.arp = None;
                tracing::debug!("arpeggiator disabled");
            }
            (None, true) => {
                // Keys already down become the arpeggio; their direct voices are released
                self.voices.release_all(now, common);
                let mut arp = Arpeggiator::new(arp_params, self.arp_seed);
                for (note, velocity) in &self.held {
                    arp.note_on(*note, *velocity, now);
                }
                self.arp = Some(arp);
                tracing::debug!(held = self.held.len(), "arpeggiator enabled");
            }
            (None, false) => {}
        }
    }
}

const LFO_SLOTS: [(ModDestination, ModDestination, ModSource); 2] = [
    (ModDestination::Lfo1Rate, ModDestination::Lfo1Depth, ModSource::Lfo1),
    (ModDestination::Lfo2Rate, ModDestination::Lfo2Depth, ModSource::Lfo2),
];

fn fill_voice_sources(values: &mut ModulationValues, voice: &Voice, envelopes: &EnvelopeLevels) {
    for kind in EnvelopeKind::ALL {
        values.set(kind.source(), envelopes.get(kind));
    }
    values.set(ModSource::Velocity, voice.velocity());
    values.set_key_track_from_note(voice.note().number());
}
