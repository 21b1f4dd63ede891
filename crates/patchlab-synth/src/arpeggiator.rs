//! Tempo-synced arpeggiator.
//!
//! Turns a set of held notes into timed [`ArpEvent`]s. Steps sit on an
//! absolute time grid (`anchor + k × interval`), so a late tick lands on the
//! step the clock is actually in instead of drifting or bursting through the
//! missed ones.
//!
//! Step order is derived from the held notes (sorted, de-duplicated), the
//! [`ArpPattern`] and the octave span:
//!
//! | Pattern  | Held `[C4, E4]`, 2 octaves |
//! |----------|----------------------------|
//! | Up       | C4 E4 C5 E5 …              |
//! | Down     | E5 C5 E4 C4 …              |
//! | UpDown   | C4 E4 C5 E5 C5 E4 …        |
//! | Random   | uniform pick per step      |

use patchlab_core::{Note, ParamRange};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::params::{ArpParams, ArpPattern};

/// Event produced by the arpeggiator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ArpEvent {
    /// Start a note.
    NoteOn {
        /// Note to play
        note: Note,
        /// Velocity of the held key that produced the step
        velocity: f32,
        /// Grid time of the step
        time: f64,
    },
    /// Stop a note.
    NoteOff {
        /// Note to stop
        note: Note,
        /// Time the gate closed
        time: f64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct HeldNote {
    note: Note,
    velocity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Sounding {
    note: Note,
    off_time: f64,
}

/// Arpeggiator state, created when the arpeggiator is enabled.
///
/// # Example
///
/// ```rust
/// use patchlab_core::Note;
/// use patchlab_synth::{ArpEvent, ArpParams, Arpeggiator};
///
/// let params = ArpParams { enabled: true, ..ArpParams::default() };
/// let mut arp = Arpeggiator::new(params, 7);
/// arp.note_on(Note::new(60), 1.0, 0.0);
/// arp.note_on(Note::new(64), 1.0, 0.0);
///
/// let mut events = Vec::new();
/// arp.tick(0.0, 120.0, &mut events);
/// assert!(matches!(events[0], ArpEvent::NoteOn { note, .. } if note.number() == 60));
/// ```
#[derive(Clone, Debug)]
pub struct Arpeggiator {
    params: ArpParams,
    held: Vec<HeldNote>,
    order: Vec<HeldNote>,
    step_index: usize,
    anchor: Option<f64>,
    next_step: u64,
    interval: f64,
    sounding: Option<Sounding>,
    rng: StdRng,
}

impl Arpeggiator {
    /// Create an arpeggiator. `seed` drives the random pattern.
    pub fn new(params: ArpParams, seed: u64) -> Self {
        Self {
            params: params.sanitized(),
            held: Vec::with_capacity(16),
            order: Vec::with_capacity(64),
            step_index: 0,
            anchor: None,
            next_step: 0,
            interval: 0.0,
            sounding: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Current settings.
    pub fn params(&self) -> &ArpParams {
        &self.params
    }

    /// Update pattern, octaves, division and gate.
    ///
    /// A changed pattern or octave span re-derives the step order and clamps
    /// the position into it.
    pub fn configure(&mut self, params: &ArpParams) {
        let params = params.sanitized();
        let reorder =
            params.pattern != self.params.pattern || params.octaves != self.params.octaves;
        self.params = params;
        if reorder {
            self.rebuild_order();
        }
    }

    /// Add a held note. Re-pressing a held note only updates its velocity.
    pub fn note_on(&mut self, note: Note, velocity: f32, now: f64) {
        let velocity = ParamRange::UNIT.clamp(velocity);
        match self.held.binary_search_by_key(&note, |h| h.note) {
            Ok(i) => self.held[i].velocity = velocity,
            Err(i) => self.held.insert(i, HeldNote { note, velocity }),
        }
        if self.anchor.is_none() {
            self.anchor = Some(now);
            self.next_step = 0;
            self.step_index = 0;
        }
        self.rebuild_order();
    }

    /// Remove a held note.
    pub fn note_off(&mut self, note: Note) {
        if let Ok(i) = self.held.binary_search_by_key(&note, |h| h.note) {
            self.held.remove(i);
        }
        if self.held.is_empty() {
            self.anchor = None;
            self.step_index = 0;
        }
        self.rebuild_order();
    }

    /// Held notes in ascending order.
    pub fn held_notes(&self) -> impl Iterator<Item = Note> + '_ {
        self.held.iter().map(|h| h.note)
    }

    /// Derived step order for the deterministic patterns.
    pub fn step_order(&self) -> impl Iterator<Item = Note> + '_ {
        self.order.iter().map(|h| h.note)
    }

    /// Index of the next step in [`step_order`](Self::step_order).
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// Time of the next step, if notes are held.
    pub fn next_step_time(&self) -> Option<f64> {
        self.anchor
            .map(|anchor| anchor + self.next_step as f64 * self.interval)
    }

    /// The note currently gated on.
    pub fn sounding(&self) -> Option<Note> {
        self.sounding.map(|s| s.note)
    }

    /// Advance to `now`, pushing any note events into `events`.
    pub fn tick(&mut self, now: f64, bpm: f32, events: &mut Vec<ArpEvent>) {
        self.set_interval(self.params.division.seconds(bpm));

        if let Some(sounding) = self.sounding
            && (self.held.is_empty() || sounding.off_time <= now)
        {
            events.push(ArpEvent::NoteOff {
                note: sounding.note,
                time: sounding.off_time.min(now),
            });
            self.sounding = None;
        }

        let Some(anchor) = self.anchor else {
            return;
        };
        if self.order.is_empty() || self.interval <= 0.0 {
            return;
        }
        let next_time = anchor + self.next_step as f64 * self.interval;
        if now < next_time {
            return;
        }

        // Late tick: jump to the step the clock is in
        let missed = ((now - next_time) / self.interval).floor() as u64;
        let step = self.next_step + missed;
        let time = anchor + step as f64 * self.interval;
        self.skip(missed);

        if let Some(previous) = self.sounding.take() {
            events.push(ArpEvent::NoteOff {
                note: previous.note,
                time,
            });
        }

        let played = self.take_step();
        events.push(ArpEvent::NoteOn {
            note: played.note,
            velocity: played.velocity,
            time,
        });
        self.sounding = Some(Sounding {
            note: played.note,
            off_time: time + f64::from(self.params.gate) * self.interval,
        });
        self.next_step = step + 1;
    }

    /// Release the sounding note immediately (arpeggiator disabled).
    pub fn stop(&mut self, now: f64) -> Option<ArpEvent> {
        self.anchor = None;
        self.sounding.take().map(|s| ArpEvent::NoteOff { note: s.note, time: now })
    }

    fn set_interval(&mut self, interval: f64) {
        if interval == self.interval {
            return;
        }
        // Keep the pending step where it is and continue the grid at the new interval
        if let Some(anchor) = self.anchor {
            self.anchor = Some(anchor + self.next_step as f64 * self.interval);
            self.next_step = 0;
        }
        self.interval = interval;
    }

    fn skip(&mut self, steps: u64) {
        if self.params.pattern == ArpPattern::Random || self.order.is_empty() {
            return;
        }
        let len = self.order.len() as u64;
        self.step_index = ((self.step_index as u64 + steps % len) % len) as usize;
    }

    fn take_step(&mut self) -> HeldNote {
        let len = self.order.len();
        if self.params.pattern == ArpPattern::Random {
            let i = self.rng.gen_range(0..len);
            self.step_index = i;
            return self.order[i];
        }
        let step = self.order[self.step_index.min(len - 1)];
        self.step_index = (self.step_index + 1) % len;
        step
    }

    fn rebuild_order(&mut self) {
        self.order.clear();
        for octave in 0..self.params.octaves {
            for held in &self.held {
                let shifted = u16::from(held.note.number()) + 12 * u16::from(octave);
                if shifted <= 127 {
                    self.order.push(HeldNote {
                        note: Note::new(shifted as u8),
                        velocity: held.velocity,
                    });
                }
            }
        }

        match self.params.pattern {
            ArpPattern::Up | ArpPattern::Random => {}
            ArpPattern::Down => self.order.reverse(),
            ArpPattern::UpDown => {
                let len = self.order.len();
                if len > 2 {
                    for i in (1..len - 1).rev() {
                        let step = self.order[i];
                        self.order.push(step);
                    }
                }
            }
        }

        self.step_index = self.step_index.min(self.order.len().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchlab_core::NoteDivision;

    fn arp(pattern: ArpPattern, octaves: u8) -> Arpeggiator {
        Arpeggiator::new(
            ArpParams {
                enabled: true,
                pattern,
                octaves,
                ..ArpParams::default()
            },
            1,
        )
    }

    fn numbers(arp: &Arpeggiator) -> Vec<u8> {
        arp.step_order().map(|n| n.number()).collect()
    }

    fn played(events: &[ArpEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                ArpEvent::NoteOn { note, .. } => Some(note.number()),
                ArpEvent::NoteOff { .. } => None,
            })
            .collect()
    }

    /// Tick every 10 ms for `seconds` at 120 BPM.
    fn run(arp: &mut Arpeggiator, from: f64, seconds: f64) -> Vec<ArpEvent> {
        let mut events = Vec::new();
        let ticks = (seconds / 0.01).round() as usize;
        for i in 0..=ticks {
            arp.tick(from + i as f64 * 0.01, 120.0, &mut events);
        }
        events
    }

    #[test]
    fn test_up_orders() {
        let mut one = arp(ArpPattern::Up, 1);
        one.note_on(Note::new(64), 1.0, 0.0);
        one.note_on(Note::new(60), 1.0, 0.0);
        assert_eq!(numbers(&one), vec![60, 64]);

        let mut two = arp(ArpPattern::Up, 2);
        two.note_on(Note::new(60), 1.0, 0.0);
        two.note_on(Note::new(64), 1.0, 0.0);
        assert_eq!(numbers(&two), vec![60, 64, 72, 76]);
    }

    #[test]
    fn test_down_and_up_down_orders() {
        let mut down = arp(ArpPattern::Down, 1);
        let mut up_down = arp(ArpPattern::UpDown, 1);
        for n in [60, 64, 67] {
            down.note_on(Note::new(n), 1.0, 0.0);
            up_down.note_on(Note::new(n), 1.0, 0.0);
        }
        assert_eq!(numbers(&down), vec![67, 64, 60]);
        assert_eq!(numbers(&up_down), vec![60, 64, 67, 64]);
    }

    #[test]
    fn test_held_notes_deduplicated() {
        let mut a = arp(ArpPattern::Up, 1);
        a.note_on(Note::new(60), 0.5, 0.0);
        a.note_on(Note::new(60), 0.9, 0.0);
        assert_eq!(a.held_notes().count(), 1);
    }

    #[test]
    fn test_non_finite_velocity_clamps() {
        let mut a = arp(ArpPattern::Up, 1);
        a.note_on(Note::new(60), f32::NAN, 0.0);
        a.note_on(Note::new(64), f32::INFINITY, 0.0);
        let velocities: Vec<f32> = run(&mut a, 0.0, 0.2)
            .iter()
            .filter_map(|e| match e {
                ArpEvent::NoteOn { velocity, .. } => Some(*velocity),
                ArpEvent::NoteOff { .. } => None,
            })
            .collect();
        assert_eq!(velocities, vec![0.0, 1.0]);
    }

    #[test]
    fn test_up_sequence_repeats() {
        let mut a = arp(ArpPattern::Up, 1);
        a.note_on(Note::new(60), 1.0, 0.0);
        a.note_on(Note::new(64), 1.0, 0.0);
        // 16ths at 120 BPM: steps at 0, 0.125, 0.25, 0.375
        let events = run(&mut a, 0.0, 0.4);
        assert_eq!(played(&events), vec![60, 64, 60, 64]);
    }

    #[test]
    fn test_gate_closes_before_next_step() {
        let mut a = arp(ArpPattern::Up, 1);
        a.note_on(Note::new(60), 1.0, 0.0);
        let events = run(&mut a, 0.0, 0.1);
        assert_eq!(events.len(), 2);
        match events[1] {
            ArpEvent::NoteOff { note, time } => {
                assert_eq!(note.number(), 60);
                assert!((time - 0.0625).abs() < 1e-9);
            }
            ArpEvent::NoteOn { .. } => panic!("expected note off"),
        }
    }

    #[test]
    fn test_late_tick_jumps_to_current_step() {
        let mut a = arp(ArpPattern::Up, 1);
        for n in [60, 62, 64, 65] {
            a.note_on(Note::new(n), 1.0, 0.0);
        }
        let mut events = Vec::new();
        a.tick(0.0, 120.0, &mut events);
        events.clear();

        // Steps 1 and 2 are missed; the tick lands in step 3 at 0.375
        a.tick(0.4, 120.0, &mut events);
        let ons: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ArpEvent::NoteOn { note, time, .. } => Some((note.number(), *time)),
                ArpEvent::NoteOff { .. } => None,
            })
            .collect();
        assert_eq!(ons.len(), 1);
        assert_eq!(ons[0].0, 65);
        assert!((ons[0].1 - 0.375).abs() < 1e-9);
        assert!((a.next_step_time().unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_removing_note_clamps_index() {
        let mut a = arp(ArpPattern::Up, 1);
        for n in [60, 64, 67] {
            a.note_on(Note::new(n), 1.0, 0.0);
        }
        let mut events = Vec::new();
        a.tick(0.0, 120.0, &mut events);
        a.tick(0.125, 120.0, &mut events);
        assert_eq!(a.step_index(), 2);

        a.note_off(Note::new(67));
        assert_eq!(a.step_index(), 1);
        a.note_on(Note::new(67), 1.0, 0.2);
        assert_eq!(a.step_index(), 1);
    }

    #[test]
    fn test_releasing_all_notes_stops_sound() {
        let mut a = arp(ArpPattern::Up, 1);
        a.note_on(Note::new(60), 1.0, 0.0);
        let mut events = Vec::new();
        a.tick(0.0, 120.0, &mut events);
        a.note_off(Note::new(60));
        events.clear();
        a.tick(0.01, 120.0, &mut events);
        assert_eq!(
            events,
            vec![ArpEvent::NoteOff {
                note: Note::new(60),
                time: 0.01
            }]
        );
        assert!(a.next_step_time().is_none());
    }

    #[test]
    fn test_stop_releases_sounding_note() {
        let mut a = arp(ArpPattern::Up, 1);
        a.note_on(Note::new(60), 1.0, 0.0);
        let mut events = Vec::new();
        a.tick(0.0, 120.0, &mut events);
        assert!(matches!(a.stop(0.02), Some(ArpEvent::NoteOff { .. })));
        assert!(a.sounding().is_none());
    }

    #[test]
    fn test_random_is_seeded_and_in_range() {
        let mut a = arp(ArpPattern::Random, 2);
        let mut b = arp(ArpPattern::Random, 2);
        for n in [60, 64, 67] {
            a.note_on(Note::new(n), 1.0, 0.0);
            b.note_on(Note::new(n), 1.0, 0.0);
        }
        let ea = played(&run(&mut a, 0.0, 2.0));
        let eb = played(&run(&mut b, 0.0, 2.0));
        assert_eq!(ea, eb);
        assert!(ea.iter().all(|n| [60, 64, 67, 72, 76, 79].contains(n)));
    }

    #[test]
    fn test_division_follows_tempo() {
        let mut a = Arpeggiator::new(
            ArpParams {
                enabled: true,
                division: NoteDivision::Quarter,
                ..ArpParams::default()
            },
            1,
        );
        a.note_on(Note::new(60), 1.0, 0.0);
        let events = run(&mut a, 0.0, 1.2);
        // Quarter notes at 120 BPM: 0.0, 0.5, 1.0
        assert_eq!(played(&events).len(), 3);
    }
}
