// src/settings/loader.rs

use std::fs;
use std::path::Path;

use tracing::info;

use crate::errors::Result;
use crate::settings::model::{RawSettings, Settings};

/// Load a settings file from a given path and return the raw `RawSettings`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for
/// the checked form.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettings> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let settings: RawSettings = toml::from_str(&contents)?;

    Ok(settings)
}

/// Load a settings file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Settings> {
    let raw = load_from_path(&path)?;
    let settings = Settings::try_from(raw)?;
    Ok(settings)
}

/// Like [`load_and_validate`], but a missing file yields the defaults.
///
/// A file that exists but fails to parse or validate is still an error.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        info!(path = %path.display(), "settings file not found; using defaults");
        return Settings::try_from(RawSettings::default());
    }
    load_and_validate(path)
}
