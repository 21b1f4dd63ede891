//! Integration tests for patchlab-synth.
//!
//! Tests drive the engine end to end through note events, parameter patches
//! and ticks, covering envelopes, glide, unison, the arpeggiator, the
//! modulation matrix and all three paradigms.

use patchlab_core::{LfoWaveform, Note, NoteDivision};
use patchlab_synth::{
    ArpParams, ArpPattern, EngineWarning, EnvelopeParams, EnvelopeStage, GlideParams, LfoParams,
    ModDestination, ModSource, ParadigmKind, ParadigmSynthesis, ParamPatch, ParameterStore,
    PatchConflict, RouteOrigin, SynthEngine, SynthParams, UnisonParams, route, warning_channel,
};

const C4: Note = Note::MIDDLE_C;

fn e4() -> Note {
    Note::new(64)
}

/// Route engine logs to the test harness; `RUST_LOG=debug` shows clamps and warnings.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// 1. End-to-end note lifecycle
// ---------------------------------------------------------------------------

#[test]
fn default_subtractive_note_reaches_decay_then_silence() {
    let mut engine = SynthEngine::new(SynthParams::subtractive());
    engine.note_on(C4, 1.0, 0.0);

    let frame = engine.tick(0.05);
    assert_eq!(frame.voices.len(), 1);
    assert_eq!(frame.envelope_stage, EnvelopeStage::Decay);
    assert!(frame.voices[0].amplitude > 0.7, "past attack: {}", frame.voices[0].amplitude);

    engine.note_off(C4, 0.2);
    let release = engine.params().common.envelopes.amplitude.release;
    let frame = engine.tick(0.2 + f64::from(release) + 1e-3);
    assert_eq!(frame.envelope_level, 0.0);
    assert!(frame.voices.is_empty());
}

#[test]
fn zero_length_stages_jump() {
    let mut params = SynthParams::subtractive();
    params.common.envelopes.amplitude = EnvelopeParams::new(0.0, 0.0, 0.5, 0.0);
    let mut engine = SynthEngine::new(params);

    engine.note_on(C4, 1.0, 0.0);
    let frame = engine.tick(0.0);
    assert_eq!(frame.envelope_stage, EnvelopeStage::Sustain);
    assert!((frame.envelope_level - 0.5).abs() < 1e-6);

    engine.note_off(C4, 0.1);
    assert!(engine.tick(0.1).voices.is_empty());
}

#[test]
fn velocity_scales_amplitude() {
    let mut loud = SynthEngine::new(SynthParams::subtractive());
    let mut soft = SynthEngine::new(SynthParams::subtractive());
    loud.note_on(C4, 1.0, 0.0);
    soft.note_on(C4, 0.5, 0.0);

    let loud = loud.tick(0.5).voices[0].amplitude;
    let soft = soft.tick(0.5).voices[0].amplitude;
    assert!((soft - loud * 0.5).abs() < 1e-5);
}

#[test]
fn velocity_insensitive_when_amount_is_zero() {
    let mut params = SynthParams::subtractive();
    params.common.velocity.amp_amount = 0.0;
    let mut engine = SynthEngine::new(params);
    engine.note_on(C4, 0.1, 0.0);
    let frame = engine.tick(0.5);
    assert!((frame.voices[0].amplitude - 0.7).abs() < 1e-5);
}

#[test]
fn non_finite_velocity_clamps() {
    let cases = [(f32::NAN, 0.0), (f32::INFINITY, 1.0), (f32::NEG_INFINITY, 0.0)];
    let mut reference = SynthEngine::new(SynthParams::subtractive());
    reference.note_on(C4, 1.0, 0.0);
    let full = reference.tick(0.5).voices[0].amplitude;

    for (input, expected) in cases {
        let mut engine = SynthEngine::new(SynthParams::subtractive());
        engine.note_on(C4, input, 0.0);
        let amplitude = engine.tick(0.5).voices[0].amplitude;
        let velocity = engine.voices().newest_voice().map(|v| v.velocity());
        assert_eq!(velocity, Some(expected), "velocity {input}");
        assert!((amplitude - full * expected).abs() < 1e-5, "velocity {input}: {amplitude}");
    }
}

// ---------------------------------------------------------------------------
// 2. Glide and unison
// ---------------------------------------------------------------------------

#[test]
fn glide_ramps_monotonically_over_glide_time() {
    let mut params = SynthParams::subtractive();
    params.common.glide = GlideParams {
        enabled: true,
        time: 0.2,
    };
    let mut engine = SynthEngine::new(params);
    engine.note_on(C4, 1.0, 0.0);
    engine.note_on(e4(), 1.0, 0.0);

    let mut previous = 0.0;
    for step in 0..=20 {
        let t = f64::from(step) * 0.01;
        let frequency = engine.tick(t).voices[0].frequency;
        assert!(frequency >= previous, "not monotonic at {t}");
        previous = frequency;
    }
    assert!((previous - e4().frequency()).abs() < 1e-2);
    assert_eq!(engine.voices().active_group_count(), 1);
}

#[test]
fn glide_returns_to_held_note() {
    let mut params = SynthParams::subtractive();
    params.common.glide = GlideParams {
        enabled: true,
        time: 0.1,
    };
    let mut engine = SynthEngine::new(params);
    engine.note_on(C4, 1.0, 0.0);
    engine.note_on(e4(), 1.0, 0.5);
    engine.note_off(e4(), 1.0);

    let frame = engine.tick(1.2);
    assert_eq!(frame.voices.len(), 1);
    assert!((frame.voices[0].frequency - C4.frequency()).abs() < 1e-2);
    assert_eq!(frame.envelope_stage, EnvelopeStage::Sustain);
}

#[test]
fn unison_stack_is_symmetric() {
    let mut engine = SynthEngine::new(SynthParams::subtractive());
    engine.apply(ParamPatch::Unison(UnisonParams {
        voices: 4,
        detune_cents: 20.0,
        spread: 1.0,
    }));
    engine.note_on(C4, 1.0, 0.0);

    let frame = engine.tick(0.1).clone();
    assert_eq!(frame.voices.len(), 4);
    let detunes: Vec<f32> = engine
        .voices()
        .active_voices()
        .map(|v| v.detune_cents())
        .collect();
    let sum: f32 = detunes.iter().sum();
    assert!(sum.abs() < 1e-4);
    assert!(detunes.iter().all(|d| d.abs() <= 20.0 + 1e-4));
    assert!(frame.voices.iter().all(|v| v.group == frame.voices[0].group));
}

#[test]
fn single_voice_is_never_detuned() {
    let mut engine = SynthEngine::new(SynthParams::subtractive());
    engine.apply(ParamPatch::Unison(UnisonParams {
        voices: 1,
        detune_cents: 50.0,
        spread: 1.0,
    }));
    engine.note_on(C4, 1.0, 0.0);
    let frame = engine.tick(0.1);
    assert!((frame.voices[0].frequency - C4.frequency()).abs() < 1e-3);
}

#[test]
fn polyphony_steals_oldest_note() {
    let mut engine = SynthEngine::new(SynthParams::subtractive());
    for i in 0..9u8 {
        engine.note_on(Note::new(48 + i), 1.0, f64::from(i) * 0.01);
    }
    let frame = engine.tick(0.1);
    assert_eq!(frame.voices.len(), 8);
    assert!(frame.voices.iter().all(|v| v.note != Note::new(48)));
}

// ---------------------------------------------------------------------------
// 3. Arpeggiator through the engine
// ---------------------------------------------------------------------------

fn arp_engine(pattern: ArpPattern, octaves: u8) -> SynthEngine {
    let mut engine = SynthEngine::new(SynthParams::subtractive());
    engine.apply(ParamPatch::Arpeggiator(ArpParams {
        enabled: true,
        pattern,
        division: NoteDivision::Sixteenth,
        octaves,
        gate: 0.5,
    }));
    engine
}

fn newest_notes(engine: &mut SynthEngine, steps: u32) -> Vec<u8> {
    (0..steps)
        .map(|k| {
            // Sample just after each 125 ms step boundary
            let t = f64::from(k) * 0.125 + 0.01;
            engine.tick(t);
            engine.voices().newest_voice().map(|v| v.note().number()).unwrap_or(0)
        })
        .collect()
}

#[test]
fn arp_up_two_octaves() {
    let mut engine = arp_engine(ArpPattern::Up, 2);
    engine.note_on(C4, 1.0, 0.0);
    engine.note_on(e4(), 1.0, 0.0);
    assert_eq!(newest_notes(&mut engine, 5), vec![60, 64, 72, 76, 60]);
}

#[test]
fn arp_up_down_does_not_repeat_turnaround() {
    let mut engine = arp_engine(ArpPattern::UpDown, 1);
    for n in [60, 64, 67] {
        engine.note_on(Note::new(n), 1.0, 0.0);
    }
    assert_eq!(newest_notes(&mut engine, 6), vec![60, 64, 67, 64, 60, 64]);
}

#[test]
fn arp_gate_releases_before_next_step() {
    let mut engine = arp_engine(ArpPattern::Up, 1);
    engine.note_on(C4, 1.0, 0.0);
    engine.tick(0.0);
    assert!(engine.voices().newest_voice().is_some_and(|v| v.is_gated()));
    // Gate 0.5 of a 125 ms step
    engine.tick(0.07);
    assert!(engine.voices().active_voices().all(|v| !v.is_gated()));
}

#[test]
fn disabling_arp_returns_to_direct_notes() {
    let mut engine = arp_engine(ArpPattern::Up, 1);
    engine.note_on(C4, 1.0, 0.0);
    engine.tick(0.0);

    engine.apply(ParamPatch::Arpeggiator(ArpParams::default()));
    engine.tick(0.01);
    assert!(engine.arpeggiator().is_none());
    assert!(engine.voices().active_voices().all(|v| !v.is_gated()));

    engine.note_on(e4(), 1.0, 0.02);
    let frame = engine.tick(0.03);
    assert!(frame.voices.iter().any(|v| v.note == e4()));
}

// ---------------------------------------------------------------------------
// 4. Modulation
// ---------------------------------------------------------------------------

#[test]
fn mod_wheel_routes_to_cutoff() {
    let mut params = SynthParams::subtractive()
        .with_route(route(ModSource::ModWheel, ModDestination::FilterCutoff, 0.5))
        .unwrap();
    params.common.envelopes.filter.enabled = false;
    let mut engine = SynthEngine::new(params);
    engine.note_on(C4, 1.0, 0.0);

    let base = cutoff(engine.tick(0.1));
    engine.set_mod_wheel(1.0);
    let opened = cutoff(engine.tick(0.2));
    assert!((opened - base - 2500.0).abs() < 1e-1);
}

fn cutoff(frame: &patchlab_synth::EngineFrame) -> f32 {
    match frame.voices[0].paradigm {
        ParadigmSynthesis::Subtractive(s) => s.cutoff,
        other => panic!("unexpected paradigm {other:?}"),
    }
}

#[test]
fn lfo_synced_quarter_note_period() {
    let mut params = SynthParams::subtractive();
    params.common.lfo1 = LfoParams {
        enabled: true,
        waveform: LfoWaveform::Sine,
        depth: 1.0,
        sync: true,
        sync_division: NoteDivision::Quarter,
        ..LfoParams::default()
    };
    let mut engine = SynthEngine::new(params);
    engine.set_tempo(120.0);

    let quarter = engine.tick(0.125).lfos[0].value;
    let cycle = engine.tick(0.5).lfos[0].phase;
    assert!((quarter - 1.0).abs() < 1e-4);
    assert!(cycle.abs() < 1e-4 || (cycle - 1.0).abs() < 1e-4);
}

#[test]
fn lfo_modulates_the_other_lfo_rate() {
    let mut params = SynthParams::subtractive()
        .with_route(route(ModSource::Lfo2, ModDestination::Lfo1Rate, 0.5))
        .unwrap();
    params.common.lfo1.enabled = true;
    params.common.lfo1.rate = 1.0;
    params.common.lfo2 = LfoParams {
        enabled: true,
        waveform: LfoWaveform::Square,
        rate: 0.1,
        depth: 1.0,
        ..LfoParams::default()
    };
    let mut engine = SynthEngine::new(params);
    assert_eq!(engine.matrix().lfo_order(), [1, 0]);

    let frame = engine.tick(0.1);
    // LFO 2 is +1, adding 0.5 × 10 Hz
    assert!((frame.lfos[0].rate - 6.0).abs() < 1e-4);
}

#[test]
fn cyclic_routes_are_dropped_with_warning() {
    init_tracing();
    let (sink, rx) = warning_channel(8);
    let params = SynthParams::subtractive()
        .with_route(route(ModSource::Lfo1, ModDestination::Lfo2Rate, 0.3))
        .and_then(|p| p.with_route(route(ModSource::Lfo2, ModDestination::Lfo1Depth, 0.3)))
        .and_then(|p| p.with_route(route(ModSource::Velocity, ModDestination::Pan, 0.3)))
        .unwrap();
    let engine = SynthEngine::with_store(ParameterStore::new(params).with_warnings(sink));

    assert_eq!(engine.matrix().route_count(), 1);
    let origins: Vec<RouteOrigin> = rx
        .try_iter()
        .filter_map(|w| match w {
            EngineWarning::ConflictingRoute { origin, .. } => Some(origin),
            _ => None,
        })
        .collect();
    assert_eq!(origins, vec![RouteOrigin::Slot(0), RouteOrigin::Slot(1)]);
}

// ---------------------------------------------------------------------------
// 5. Paradigms and patches
// ---------------------------------------------------------------------------

#[test]
fn fm_operators_follow_note() {
    let mut engine = SynthEngine::new(SynthParams::fm());
    engine.note_on(Note::new(69), 1.0, 0.0);
    let frame = engine.tick(0.01);
    let ParadigmSynthesis::Fm(fm) = frame.voices[0].paradigm else {
        panic!("expected FM");
    };
    assert!((fm.carrier_frequency - 440.0).abs() < 0.05);
    assert!((fm.modulator_frequency - 1320.0).abs() < 0.2);
    assert!(fm.modulation_index > 10.0);
}

#[test]
fn additive_partials_are_harmonic() {
    let mut engine = SynthEngine::new(SynthParams::additive());
    engine.note_on(Note::new(57), 1.0, 0.0);
    let frame = engine.tick(0.5);
    let ParadigmSynthesis::Additive(additive) = frame.voices[0].paradigm else {
        panic!("expected additive");
    };
    assert!((additive.partials[2].frequency - 660.0).abs() < 0.1);
}

#[test]
fn paradigm_mismatch_keeps_snapshot_and_warns() {
    init_tracing();
    let (sink, rx) = warning_channel(8);
    let store = ParameterStore::new(SynthParams::fm()).with_warnings(sink);
    let mut engine = SynthEngine::with_store(store);

    let before = engine.store().version();
    let snapshot = engine.apply(ParamPatch::Filter(Default::default()));
    assert_eq!(snapshot.version, before);
    assert_eq!(
        rx.try_recv().ok(),
        Some(EngineWarning::from(PatchConflict::ParadigmMismatch {
            group: "filter",
            expected: ParadigmKind::Subtractive,
            actual: ParadigmKind::Fm,
        }))
    );
}

#[test]
fn load_params_switches_paradigm_at_next_tick() {
    let mut engine = SynthEngine::new(SynthParams::subtractive());
    engine.note_on(C4, 1.0, 0.0);
    engine.load_params(SynthParams::additive());

    let frame = engine.tick(0.1);
    assert!(matches!(frame.voices[0].paradigm, ParadigmSynthesis::Additive(_)));
}

#[test]
fn control_thread_publishes_to_engine() {
    let mut engine = SynthEngine::new(SynthParams::subtractive());
    let store = engine.store().clone();

    let handle = std::thread::spawn(move || {
        for i in 0..10u8 {
            store.apply(ParamPatch::Volume(-f32::from(i)));
        }
    });
    handle.join().unwrap();

    let frame = engine.tick(0.0);
    assert_eq!(frame.version, 10);
    assert!((frame.gain - patchlab_core::db_to_linear(-9.0)).abs() < 1e-6);
}
