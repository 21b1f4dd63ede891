//! Preset directories.
//!
//! A preset library is any directory of `.toml` and `.json` preset files.
//! The caller chooses the directory; nothing here looks up platform paths.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::preset::{Preset, PresetFormat};

/// Preset files in `dir`, sorted by path.
///
/// Returns an empty vector if the directory doesn't exist or can't be read.
pub fn list_presets(dir: impl AsRef<Path>) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir.as_ref()) else {
        return Vec::new();
    };

    let mut presets: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && PresetFormat::from_path(path).is_some())
        .collect();
    presets.sort();
    presets
}

/// Locate a preset by file stem, trying `.toml` before `.json`.
///
/// A `name` that already carries a supported extension is used as is.
pub fn find_preset(dir: impl AsRef<Path>, name: &str) -> Result<PathBuf, ConfigError> {
    let dir = dir.as_ref();
    let direct = dir.join(name);
    if PresetFormat::from_path(&direct).is_some() && direct.is_file() {
        return Ok(direct);
    }

    [PresetFormat::Toml, PresetFormat::Json]
        .into_iter()
        .map(|format| dir.join(format!("{name}.{}", format.extension())))
        .find(|path| path.is_file())
        .ok_or_else(|| ConfigError::PresetNotFound(name.to_string()))
}

/// Find and load a preset by name.
pub fn load_preset(dir: impl AsRef<Path>, name: &str) -> Result<Preset, ConfigError> {
    Preset::load(find_preset(dir, name)?)
}

/// Preset name (file stem) for a path.
pub fn preset_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}
