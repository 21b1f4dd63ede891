//! Factory presets bundled with patchlab.
//!
//! One starting point per paradigm plus an arpeggiated patch. They are
//! embedded as TOML so they double as format examples.

use crate::Preset;

/// Array of factory preset names for external access.
pub static FACTORY_PRESET_NAMES: &[&str] = &["init", "fm_bell", "additive_organ", "arp_bass"];

static FACTORY_PRESETS_TOML: &[(&str, &str)] = &[
    ("init", INIT_PRESET),
    ("fm_bell", FM_BELL_PRESET),
    ("additive_organ", ADDITIVE_ORGAN_PRESET),
    ("arp_bass", ARP_BASS_PRESET),
];

/// Default subtractive patch.
const INIT_PRESET: &str = r#"
name = "Init"
description = "Single sawtooth through a low-pass filter"

[params.paradigm]
kind = "subtractive"
"#;

const FM_BELL_PRESET: &str = r#"
name = "FM Bell"
description = "Inharmonic bell; the modulation index decays with the note"

[params.common]
volume = -9.0

[params.common.envelopes.amplitude]
attack = 0.001
decay = 2.5
sustain = 0.0
release = 2.5

[params.common.envelopes.filter]
enabled = false

[params.common.envelopes.modulation]
enabled = true
amount = 12.0

[params.common.envelopes.modulation.shape]
attack = 0.001
decay = 1.5
sustain = 0.0
release = 1.5

[params.common.velocity]
amp_amount = 0.8
secondary_amount = 0.6

[params.paradigm]
kind = "fm"
carrier_waveform = "sine"
modulator_waveform = "sine"
harmonicity = 3.5
modulation_index = 4.0
"#;

const ADDITIVE_ORGAN_PRESET: &str = r#"
name = "Additive Organ"
description = "Drawbar-style organ with gentle vibrato"

[params.common.envelopes.amplitude]
attack = 0.005
decay = 0.05
sustain = 1.0
release = 0.08

[params.common.envelopes.filter]
enabled = false

[params.common.lfo1]
enabled = true
waveform = "triangle"
rate = 6.0
depth = 0.02
destination = "pitch"

[params.common.velocity]
amp_amount = 0.0

[params.paradigm]
kind = "additive"
harmonics = [1.0, 0.8, 0.6, 0.5, 0.0, 0.4, 0.0, 0.3]
brightness = 0.1
"#;

const ARP_BASS_PRESET: &str = r#"
name = "Arp Bass"
description = "Sixteenth-note bass arpeggio over two octaves"

[params.common.envelopes.amplitude]
attack = 0.002
decay = 0.15
sustain = 0.4
release = 0.1

[params.common.envelopes.filter]
enabled = true
amount = 3.0

[params.common.envelopes.filter.shape]
attack = 0.001
decay = 0.12
sustain = 0.0
release = 0.1

[params.common.arpeggiator]
enabled = true
pattern = "up"
division = "16n"
octaves = 2
gate = 0.4

[[params.common.mod_matrix]]
source = "velocity"
destination = "filter_cutoff"
amount = 0.2
enabled = true

[params.paradigm]
kind = "subtractive"

[params.paradigm.oscillator]
waveform = "sawtooth"
octave = -1

[params.paradigm.sub_oscillator]
enabled = true
waveform = "square"
octaves_down = 1
level = 0.6

[params.paradigm.filter]
cutoff = 600.0
resonance = 6.0
"#;

/// Get all factory presets.
///
/// # Example
///
/// ```rust
/// use patchlab_config::factory_presets;
///
/// for preset in factory_presets() {
///     println!("{}: {:?}", preset.name, preset.params.kind());
/// }
/// ```
pub fn factory_presets() -> Vec<Preset> {
    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(_, toml)| Preset::from_toml(toml).ok())
        .collect()
}

/// Get a factory preset by identifier or display name (case-insensitive).
///
/// ```rust
/// use patchlab_config::get_factory_preset;
///
/// let bell = get_factory_preset("FM Bell").unwrap();
/// assert_eq!(bell.name, "FM Bell");
/// ```
pub fn get_factory_preset(name: &str) -> Option<Preset> {
    let name_lower = name.to_lowercase();

    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(id, toml)| Some((id, Preset::from_toml(toml).ok()?)))
        .find(|(id, preset)| {
            id.to_lowercase() == name_lower || preset.name.to_lowercase() == name_lower
        })
        .map(|(_, preset)| preset)
}

/// Identifiers of all factory presets.
pub fn factory_preset_names() -> Vec<&'static str> {
    FACTORY_PRESETS_TOML.iter().map(|(name, _)| *name).collect()
}

/// Whether `name` names a factory preset (identifier or display name).
pub fn is_factory_preset(name: &str) -> bool {
    get_factory_preset(name).is_some()
}
