//! Voice lifecycle: unison stacking, glide, velocity and stealing.
//!
//! Voices live in a fixed pool of [`VOICE_POOL_SIZE`] slots sized for
//! [`MAX_POLYPHONY`] logical notes of [`MAX_UNISON`] physical voices each.
//! Triggering, releasing and reaping only flip slot state; nothing in this
//! module allocates after construction.
//!
//! A logical note is a *group* of `unison.voices` physical voices sharing a
//! group id. Stealing and release always act on whole groups.
//!
//! With glide enabled the manager runs mono-legato: one group sounds, the
//! newest note wins, and the pitch ramps linearly in semitones (exponentially
//! in Hz) from the sounding pitch to the new note over exactly `glide.time`
//! seconds. Releasing the newest key glides back to the most recent key still
//! held.

use patchlab_core::{Note, ParamRange, cents_to_ratio, midi_to_freq};

use crate::envelope::{EnvelopeKind, EnvelopeState};
use crate::params::{CommonParams, Envelopes, MAX_POLYPHONY, MAX_UNISON, UnisonParams};

/// Number of physical voice slots.
pub const VOICE_POOL_SIZE: usize = MAX_POLYPHONY * MAX_UNISON;

/// Pitch ramp between two notes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glide {
    /// Starting pitch in (fractional) MIDI semitones
    pub from: f32,
    /// Target pitch in MIDI semitones
    pub to: f32,
    /// Ramp start time in seconds
    pub start_time: f64,
    /// Ramp duration in seconds
    pub duration: f32,
}

impl Glide {
    /// Pitch in semitones at `now`.
    #[inline]
    pub fn pitch_at(&self, now: f64) -> f32 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let t = ((now - self.start_time) / f64::from(self.duration)).clamp(0.0, 1.0) as f32;
        self.from + (self.to - self.from) * t
    }

    /// Whether the ramp has reached its target at `now`.
    pub fn is_complete(&self, now: f64) -> bool {
        self.duration <= 0.0 || now - self.start_time >= f64::from(self.duration)
    }
}

/// A physical voice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Voice {
    active: bool,
    gate: bool,
    note: Note,
    frequency: f32,
    unison_index: u8,
    detune_cents: f32,
    pan: f32,
    velocity: f32,
    start_time: f64,
    group: u64,
    glide: Option<Glide>,
    envelopes: [EnvelopeState; EnvelopeKind::COUNT],
}

impl Default for Voice {
    fn default() -> Self {
        Self::IDLE
    }
}

impl Voice {
    const IDLE: Voice = Voice {
        active: false,
        gate: false,
        note: Note::MIDDLE_C,
        frequency: 0.0,
        unison_index: 0,
        detune_cents: 0.0,
        pan: 0.0,
        velocity: 0.0,
        start_time: 0.0,
        group: 0,
        glide: None,
        envelopes: [EnvelopeState::IDLE; EnvelopeKind::COUNT],
    };

    /// Whether the slot holds a sounding voice.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the key is still held (not yet released).
    pub fn is_gated(&self) -> bool {
        self.active && self.gate
    }

    /// Target note.
    pub fn note(&self) -> Note {
        self.note
    }

    /// Target frequency in Hz, including unison detune.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Position within the unison stack.
    pub fn unison_index(&self) -> u8 {
        self.unison_index
    }

    /// Unison detune in cents.
    pub fn detune_cents(&self) -> f32 {
        self.detune_cents
    }

    /// Unison pan offset (-1.0 to 1.0).
    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// Note-on velocity (0.0 to 1.0).
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Trigger time.
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Logical note id shared by the unison stack.
    pub fn group(&self) -> u64 {
        self.group
    }

    /// Active glide, if any.
    pub fn glide(&self) -> Option<&Glide> {
        self.glide.as_ref()
    }

    /// Envelope state for a kind.
    pub fn envelope(&self, kind: EnvelopeKind) -> &EnvelopeState {
        &self.envelopes[kind.index()]
    }

    /// Envelope output for a kind at `now`.
    #[inline]
    pub fn envelope_level(&self, kind: EnvelopeKind, envelopes: &Envelopes, now: f64) -> f32 {
        self.envelopes[kind.index()].level(envelopes.shape(kind), now)
    }

    /// Pitch in semitones at `now`, following any glide (without detune).
    #[inline]
    pub fn pitch_at(&self, now: f64) -> f32 {
        match &self.glide {
            Some(glide) => glide.pitch_at(now),
            None => f32::from(self.note.number()),
        }
    }

    /// Sounding frequency in Hz at `now`, including glide and unison detune.
    #[inline]
    pub fn frequency_at(&self, now: f64) -> f32 {
        midi_to_freq(self.pitch_at(now)) * cents_to_ratio(self.detune_cents)
    }

    fn trigger_envelopes(&mut self, envelopes: &Envelopes, now: f64) {
        for kind in EnvelopeKind::ALL {
            self.envelopes[kind.index()].trigger(envelopes.shape(kind), now);
        }
    }

    fn release_envelopes(&mut self, envelopes: &Envelopes, now: f64) {
        for kind in EnvelopeKind::ALL {
            self.envelopes[kind.index()].release(envelopes.shape(kind), now);
        }
    }

    fn retarget(&mut self, note: Note, glide: Option<Glide>) {
        self.note = note;
        self.frequency = note.frequency() * cents_to_ratio(self.detune_cents);
        self.glide = glide;
    }
}

/// Detune and pan offsets for unison voice `index` of `count`.
///
/// Offsets are spread evenly over `±detune_cents` and `±spread`; a single
/// voice is never detuned.
pub fn unison_offsets(index: usize, count: usize, unison: &UnisonParams) -> (f32, f32) {
    if count <= 1 {
        return (0.0, 0.0);
    }
    let t = 2.0 * index as f32 / (count - 1) as f32 - 1.0;
    (unison.detune_cents * t, unison.spread * t)
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct HeldKey {
    note: Note,
    velocity: f32,
}

/// Owner of every physical voice.
///
/// # Example
///
/// ```rust
/// use patchlab_core::Note;
/// use patchlab_synth::{CommonParams, VoiceManager};
///
/// let mut common = CommonParams::default();
/// common.unison.voices = 4;
/// common.unison.detune_cents = 20.0;
///
/// let mut voices = VoiceManager::new();
/// voices.note_on(Note::new(60), 1.0, 0.0, &common);
/// assert_eq!(voices.active_voice_count(), 4);
///
/// let detunes: Vec<f32> = voices.active_voices().map(|v| v.detune_cents()).collect();
/// assert_eq!(detunes.first(), Some(&-20.0));
/// assert_eq!(detunes.last(), Some(&20.0));
/// ```
#[derive(Clone, Debug)]
pub struct VoiceManager {
    voices: [Voice; VOICE_POOL_SIZE],
    next_group: u64,
    held: Vec<HeldKey>,
    mono_group: Option<u64>,
}

impl Default for VoiceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceManager {
    /// Create a manager with every slot idle.
    pub fn new() -> Self {
        Self {
            voices: [Voice::IDLE; VOICE_POOL_SIZE],
            next_group: 1,
            held: Vec::with_capacity(128),
            mono_group: None,
        }
    }

    /// Every slot, active or not.
    pub fn voices(&self) -> &[Voice; VOICE_POOL_SIZE] {
        &self.voices
    }

    /// Active voices, in slot order.
    pub fn active_voices(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter().filter(|v| v.active)
    }

    /// Number of active physical voices.
    pub fn active_voice_count(&self) -> usize {
        self.active_voices().count()
    }

    /// Number of active logical notes.
    pub fn active_group_count(&self) -> usize {
        self.active_voices().filter(|v| v.unison_index == 0).count()
    }

    /// Most recently triggered active voice.
    pub fn newest_voice(&self) -> Option<&Voice> {
        self.active_voices()
            .filter(|v| v.unison_index == 0)
            .max_by_key(|v| v.group)
    }

    /// Start a note. Returns the group id of the voices now playing it.
    pub fn note_on(&mut self, note: Note, velocity: f32, now: f64, common: &CommonParams) -> u64 {
        let velocity = ParamRange::UNIT.clamp(velocity);
        if common.glide.enabled {
            self.mono_note_on(note, velocity, now, common)
        } else {
            self.mono_group = None;
            self.held.clear();
            self.spawn_group(note, velocity, now, common)
        }
    }

    /// Release a note.
    pub fn note_off(&mut self, note: Note, now: f64, common: &CommonParams) {
        if let Some(group) = self.mono_group
            && common.glide.enabled
        {
            self.held.retain(|k| k.note != note);
            let sounding = self.group_note(group);
            if sounding != Some(note) {
                return;
            }
            match self.held.last().copied() {
                Some(previous) => self.glide_group(group, previous, now, common, false),
                None => self.release_group(group, now, &common.envelopes),
            }
            return;
        }

        let envelopes = &common.envelopes;
        for voice in &mut self.voices {
            if voice.is_gated() && voice.note == note {
                voice.gate = false;
                voice.release_envelopes(envelopes, now);
            }
        }
    }

    /// Release every held note.
    pub fn release_all(&mut self, now: f64, common: &CommonParams) {
        self.held.clear();
        for voice in &mut self.voices {
            if voice.is_gated() {
                voice.gate = false;
                voice.release_envelopes(&common.envelopes, now);
            }
        }
    }

    /// Silence every voice immediately.
    pub fn all_notes_off(&mut self) {
        self.voices = [Voice::IDLE; VOICE_POOL_SIZE];
        self.held.clear();
        self.mono_group = None;
    }

    /// Free voices whose amplitude envelope has finished.
    ///
    /// Returns the number of slots recycled.
    pub fn reap(&mut self, now: f64, envelopes: &Envelopes) -> usize {
        let mut freed = 0;
        for voice in &mut self.voices {
            if !voice.active {
                continue;
            }
            for kind in EnvelopeKind::ALL {
                voice.envelopes[kind.index()].settle(envelopes.shape(kind), now);
            }
            let amplitude = &voice.envelopes[EnvelopeKind::Amplitude.index()];
            if amplitude.is_finished(&envelopes.amplitude, now) {
                *voice = Voice::IDLE;
                freed += 1;
            }
        }
        if let Some(group) = self.mono_group
            && !self.voices.iter().any(|v| v.active && v.group == group)
        {
            self.mono_group = None;
        }
        freed
    }

    fn mono_note_on(&mut self, note: Note, velocity: f32, now: f64, common: &CommonParams) -> u64 {
        self.held.retain(|k| k.note != note);
        if self.held.len() == self.held.capacity() {
            self.held.remove(0);
        }
        self.held.push(HeldKey { note, velocity });

        let sounding = self
            .mono_group
            .filter(|g| self.voices.iter().any(|v| v.active && v.group == *g));
        match sounding {
            Some(group) => {
                let retrigger = !self.voices.iter().any(|v| v.group == group && v.is_gated());
                self.glide_group(group, HeldKey { note, velocity }, now, common, retrigger);
                group
            }
            None => {
                let group = self.spawn_group(note, velocity, now, common);
                self.mono_group = Some(group);
                group
            }
        }
    }

    fn glide_group(
        &mut self,
        group: u64,
        key: HeldKey,
        now: f64,
        common: &CommonParams,
        retrigger: bool,
    ) {
        for voice in &mut self.voices {
            if !(voice.active && voice.group == group) {
                continue;
            }
            let glide = Glide {
                from: voice.pitch_at(now),
                to: f32::from(key.note.number()),
                start_time: now,
                duration: common.glide.time,
            };
            voice.retarget(key.note, Some(glide));
            voice.velocity = key.velocity;
            if retrigger {
                voice.gate = true;
                voice.trigger_envelopes(&common.envelopes, now);
            }
        }
    }

    fn release_group(&mut self, group: u64, now: f64, envelopes: &Envelopes) {
        for voice in &mut self.voices {
            if voice.is_gated() && voice.group == group {
                voice.gate = false;
                voice.release_envelopes(envelopes, now);
            }
        }
    }

    fn group_note(&self, group: u64) -> Option<Note> {
        self.voices
            .iter()
            .find(|v| v.active && v.group == group)
            .map(|v| v.note)
    }

    fn spawn_group(&mut self, note: Note, velocity: f32, now: f64, common: &CommonParams) -> u64 {
        let count = usize::from(common.unison.voices).clamp(1, MAX_UNISON);

        while self.active_group_count() >= MAX_POLYPHONY || self.free_slots() < count {
            if !self.steal_oldest_group() {
                break;
            }
        }

        let group = self.next_group;
        self.next_group += 1;

        let mut index = 0;
        for slot in &mut self.voices {
            if index == count {
                break;
            }
            if slot.active {
                continue;
            }
            let (detune_cents, pan) = unison_offsets(index, count, &common.unison);
            *slot = Voice {
                active: true,
                gate: true,
                unison_index: index as u8,
                detune_cents,
                pan,
                velocity,
                start_time: now,
                group,
                ..Voice::IDLE
            };
            slot.retarget(note, None);
            slot.trigger_envelopes(&common.envelopes, now);
            index += 1;
        }
        group
    }

    fn free_slots(&self) -> usize {
        self.voices.iter().filter(|v| !v.active).count()
    }

    fn steal_oldest_group(&mut self) -> bool {
        // Released groups go first, then the oldest held one
        let victim = self
            .voices
            .iter()
            .filter(|v| v.active)
            .min_by_key(|v| (v.gate, v.group))
            .map(|v| (v.group, v.note));
        let Some((group, note)) = victim else {
            return false;
        };
        tracing::debug!(group, note = note.number(), "voice stolen");
        for voice in &mut self.voices {
            if voice.active && voice.group == group {
                *voice = Voice::IDLE;
            }
        }
        true
    }
}
