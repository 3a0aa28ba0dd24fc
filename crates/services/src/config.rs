use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use hero_domain::ModuleSettings;

pub const APP_DIR: &str = "rotation-hero";
const SETTINGS_FILE: &str = "settings.json";

pub fn settings_path() -> Option<PathBuf> {
    let base = dirs::config_dir()?;
    let dir = base.join(APP_DIR);
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir.join(SETTINGS_FILE))
}

pub fn save_settings(settings: &ModuleSettings) -> Result<()> {
    if let Some(path) = settings_path() {
        save_settings_to(&path, settings)?;
    }
    Ok(())
}

/// Defaults when there is no config dir or no settings file yet.
pub fn load_settings() -> Result<ModuleSettings> {
    match settings_path() {
        Some(path) => load_settings_from(&path),
        None => Ok(ModuleSettings::default()),
    }
}

pub fn save_settings_to(path: &Path, settings: &ModuleSettings) -> Result<()> {
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json).with_context(|| format!("write settings {:?}", path))?;
    info!(path = %path.display(), "module settings saved");
    Ok(())
}

pub fn load_settings_from(path: &Path) -> Result<ModuleSettings> {
    if !path.exists() {
        debug!(path = %path.display(), "no settings file, using defaults");
        return Ok(ModuleSettings::default());
    }
    let data =
        std::fs::read_to_string(path).with_context(|| format!("read settings {:?}", path))?;
    let settings = serde_json::from_str(&data)
        .with_context(|| format!("parse settings {:?}", path))?;
    Ok(settings)
}
