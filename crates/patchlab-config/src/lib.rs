//! Preset management for the patchlab synthesis engine.
//!
//! A preset is a name, an optional description and a complete
//! [`SynthParams`](patchlab_synth::SynthParams). Loading one replaces every
//! engine parameter at once.
//!
//! # Features
//!
//! - **Preset Files**: TOML (primary) and JSON, chosen by extension
//! - **Defaults**: fields missing from a file take documented defaults
//! - **Validation**: strict range report for preset authoring
//! - **Libraries**: list and find presets in a directory
//! - **Factory Presets**: one per paradigm plus an arpeggiated bass
//!
//! # Example
//!
//! ```rust,no_run
//! use patchlab_config::{Preset, get_factory_preset};
//! use patchlab_synth::{ParameterStore, SynthParams};
//!
//! let store = ParameterStore::new(SynthParams::default());
//!
//! // Load from disk and publish
//! let preset = Preset::load("presets/lead.toml").unwrap();
//! preset.validate().unwrap();
//! preset.load_into(&store);
//!
//! // Save a factory preset as a starting point
//! let bell = get_factory_preset("fm_bell").unwrap();
//! bell.save("presets/my_bell.toml").unwrap();
//! ```

mod error;
mod preset;

/// Preset directories.
pub mod library;

/// Strict parameter validation.
pub mod validation;

/// Factory presets bundled with the library.
pub mod factory_presets;

pub use error::{ConfigError, FileOp};
pub use factory_presets::{
    FACTORY_PRESET_NAMES, factory_preset_names, factory_presets, get_factory_preset,
    is_factory_preset,
};
pub use library::{find_preset, list_presets, load_preset, preset_name_from_path};
pub use preset::{Preset, PresetFormat};
pub use validation::{ValidationError, ValidationIssue, ValidationResult, validate_params};
