//! Property-based tests for patchlab-synth.
//!
//! Covers envelope settling, retrigger continuity, matrix order independence,
//! unison symmetry, glide monotonicity and parameter serialization.

use patchlab_core::Note;
use patchlab_synth::{
    CommonParams, EnvelopeParams, EnvelopeState, GlideParams, ModDestination, ModRoute,
    ModSource, ModulationMatrix, ModulationValues, SynthParams, UnisonParams, VoiceManager,
    voice::unison_offsets,
};
use proptest::prelude::*;

fn adsr_strategy() -> impl Strategy<Value = EnvelopeParams> {
    (0.0f32..2.0, 0.0f32..2.0, 0.0f32..=1.0, 0.0f32..2.0)
        .prop_map(|(a, d, s, r)| EnvelopeParams::new(a, d, s, r))
}

fn source_strategy() -> impl Strategy<Value = ModSource> {
    prop::sample::select(ModSource::ALL.to_vec())
}

fn non_lfo_destination_strategy() -> impl Strategy<Value = ModDestination> {
    prop::sample::select(
        ModDestination::ALL
            .into_iter()
            .filter(|d| d.influences().is_none())
            .collect::<Vec<_>>(),
    )
}

fn route_strategy() -> impl Strategy<Value = ModRoute> {
    (
        source_strategy(),
        non_lfo_destination_strategy(),
        -1.0f32..=1.0,
        any::<bool>(),
    )
        .prop_map(|(s, d, amount, enabled)| ModRoute::new(s, d, amount).with_enabled(enabled))
}

fn paradigm_strategy() -> impl Strategy<Value = SynthParams> {
    prop_oneof![
        Just(SynthParams::subtractive()),
        Just(SynthParams::fm()),
        Just(SynthParams::additive()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Holding for attack + decay reaches sustain; releasing for `release` reaches 0.
    #[test]
    fn adsr_settles_to_sustain_then_zero(params in adsr_strategy(), hold in 0.0f64..1.0) {
        let mut env = EnvelopeState::IDLE;
        env.trigger(&params, 0.0);

        let held = f64::from(params.attack + params.decay) + hold + 1e-6;
        prop_assert!((env.level(&params, held) - params.sustain).abs() < 1e-4);

        env.release(&params, held);
        let released = held + f64::from(params.release) + 1e-6;
        prop_assert_eq!(env.level(&params, released), 0.0);
        prop_assert!(env.is_finished(&params, released));
    }

    /// Retriggering mid-release continues from the current output.
    #[test]
    fn retrigger_is_continuous(params in adsr_strategy(), into_release in 0.0f64..1.0) {
        let mut env = EnvelopeState::IDLE;
        env.trigger(&params, 0.0);
        let off = f64::from(params.attack + params.decay) + 0.5;
        env.release(&params, off);

        let at = off + into_release * f64::from(params.release);
        let before = env.level(&params, at);
        env.trigger(&params, at);
        let after = env.level(&params, at);
        prop_assert!((before - after).abs() < 1e-5 || params.attack == 0.0);
    }

    /// Route order never changes the resolved sums.
    #[test]
    fn matrix_is_order_independent(
        routes in prop::collection::vec(route_strategy(), 0..=4),
        values in prop::array::uniform10(-1.0f32..=1.0),
    ) {
        let mut sources = ModulationValues::new();
        for (source, value) in ModSource::ALL.into_iter().zip(values) {
            sources.set(source, value);
        }

        let mut reversed = routes.clone();
        reversed.reverse();
        let (forward, _) = ModulationMatrix::<4>::from_routes(&routes);
        let (backward, _) = ModulationMatrix::<4>::from_routes(&reversed);

        let a = forward.resolve(&sources);
        let b = backward.resolve(&sources);
        for destination in ModDestination::ALL {
            prop_assert_eq!(a.sum(destination).to_bits(), b.sum(destination).to_bits());
        }
    }

    /// Enabled routes sum as source × amount; disabled routes add nothing.
    #[test]
    fn matrix_sums_enabled_routes(
        routes in prop::collection::vec(route_strategy(), 0..=4),
        value in -1.0f32..=1.0,
    ) {
        let mut sources = ModulationValues::new();
        for source in ModSource::ALL {
            sources.set(source, value);
        }
        let (matrix, conflicts) = ModulationMatrix::<4>::from_routes(&routes);
        prop_assert!(conflicts.is_empty());

        for destination in ModDestination::ALL {
            let expected: f32 = routes
                .iter()
                .filter(|r| r.enabled && r.destination == destination)
                .map(|r| value * r.amount)
                .sum();
            prop_assert!((matrix.get_modulation(destination, &sources) - expected).abs() < 1e-4);
        }
    }

    /// Unison offsets are symmetric about zero and bounded by the detune.
    #[test]
    fn unison_is_symmetric(count in 1usize..=8, detune in 0.0f32..100.0, spread in 0.0f32..=1.0) {
        let unison = UnisonParams { voices: count as u8, detune_cents: detune, spread };
        let offsets: Vec<(f32, f32)> =
            (0..count).map(|i| unison_offsets(i, count, &unison)).collect();
        for i in 0..count {
            let (d, p) = offsets[i];
            let (mirror_d, mirror_p) = offsets[count - 1 - i];
            prop_assert!((d + mirror_d).abs() < 1e-3);
            prop_assert!((p + mirror_p).abs() < 1e-5);
            prop_assert!(d.abs() <= detune + 1e-3);
        }
        if count % 2 == 1 {
            prop_assert_eq!(offsets[count / 2].0, 0.0);
        }
    }

    /// Glide never overshoots and lands on the target after exactly `glide.time`.
    #[test]
    fn glide_is_monotonic(from in 24u8..96, to in 24u8..96, time in 0.01f32..2.0) {
        let mut common = CommonParams::default();
        common.glide = GlideParams { enabled: true, time };
        let mut voices = VoiceManager::new();
        voices.note_on(Note::new(from), 1.0, 0.0, &common);
        voices.note_on(Note::new(to), 1.0, 0.0, &common);

        let voice = *voices.newest_voice().unwrap();
        let rising = to >= from;
        let mut previous = voice.pitch_at(0.0);
        for step in 1..=50 {
            let pitch = voice.pitch_at(f64::from(time) * f64::from(step) / 50.0);
            let monotonic = if rising { pitch >= previous - 1e-4 } else { pitch <= previous + 1e-4 };
            prop_assert!(monotonic);
            previous = pitch;
        }
        prop_assert!((voice.pitch_at(f64::from(time)) - f32::from(to)).abs() < 1e-3);
    }

    /// Every paradigm survives a JSON and a TOML round trip.
    #[test]
    fn params_round_trip(
        params in paradigm_strategy(),
        volume in -60.0f32..6.0,
        pan in -1.0f32..=1.0,
    ) {
        let mut params = params;
        params.common.volume = volume;
        params.common.pan = pan;

        let json = serde_json::to_string(&params).unwrap();
        prop_assert_eq!(serde_json::from_str::<SynthParams>(&json).unwrap(), params);

        let toml_text = toml::to_string(&params).unwrap();
        prop_assert_eq!(toml::from_str::<SynthParams>(&toml_text).unwrap(), params);
    }
}

#[test]
fn missing_fields_fill_defaults() {
    // Presets in the wild omit pan, the second LFO and the matrix
    let json = r#"{
        "common": { "volume": -12.0, "lfo1": { "enabled": true, "rate": 3.0 } },
        "paradigm": { "kind": "fm", "harmonicity": 2.0 }
    }"#;
    let params: SynthParams = serde_json::from_str(json).unwrap();
    let defaults = CommonParams::default();

    assert_eq!(params.common.volume, -12.0);
    assert_eq!(params.common.pan, defaults.pan);
    assert_eq!(params.common.lfo2, defaults.lfo2);
    assert_eq!(params.common.mod_matrix, defaults.mod_matrix);
    assert!(params.common.lfo1.enabled);
    assert_eq!(params.common.lfo1.depth, defaults.lfo1.depth);
    match params.paradigm {
        patchlab_synth::ParadigmParams::Fm(fm) => {
            assert_eq!(fm.harmonicity, 2.0);
            assert_eq!(fm.modulation_index, 10.0);
        }
        other => panic!("expected FM, got {other:?}"),
    }
}

#[test]
fn empty_document_is_default_subtractive() {
    let params: SynthParams = toml::from_str("").unwrap();
    assert_eq!(params, SynthParams::subtractive());
}
