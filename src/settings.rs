use std::path::{Path, PathBuf};

use eframe::egui;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub file_path: String,
    pub node_width: f32,
    pub node_height: f32,
    pub log_level: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            file_path: "diagram.json".to_string(),
            node_width: 100.0,
            node_height: 50.0,
            log_level: "warn".to_string(),
        }
    }
}

impl EditorSettings {
    pub fn node_size(&self) -> egui::Vec2 {
        egui::vec2(self.node_width.max(1.0), self.node_height.max(1.0))
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

/// `$HOME/.config/sanuml.toml` if it exists, else `settings.toml` in the
/// working directory if that exists.
pub fn config_path() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home).join(".config").join("sanuml.toml");
        if path.exists() {
            return Some(path);
        }
    }
    let local = PathBuf::from("settings.toml");
    local.exists().then_some(local)
}

/// Where settings are written back: the existing config file, else
/// `settings.toml` in the working directory.
pub fn settings_path() -> PathBuf {
    config_path().unwrap_or_else(|| PathBuf::from("settings.toml"))
}

/// Parses settings, trying the format implied by the extension first and
/// the other one second. `None` when the file is missing or unreadable.
pub fn load_settings(path: impl AsRef<Path>) -> Option<EditorSettings> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path).ok()?;
    let parsed = if is_toml(path) {
        toml::from_str::<EditorSettings>(&s)
            .ok()
            .or_else(|| serde_json::from_str::<EditorSettings>(&s).ok())
    } else {
        serde_json::from_str::<EditorSettings>(&s)
            .ok()
            .or_else(|| toml::from_str::<EditorSettings>(&s).ok())
    };
    if parsed.is_none() {
        log::warn!(path:% = path.display(); "Ignoring unreadable settings file");
    }
    parsed
}

/// Settings from the first location that yields any, else defaults.
pub fn load_or_default() -> EditorSettings {
    config_path()
        .and_then(load_settings)
        .or_else(|| load_settings("settings.json"))
        .unwrap_or_default()
}

pub fn save_settings(path: impl AsRef<Path>, settings: &EditorSettings) -> Result<()> {
    let path = path.as_ref();
    let text = if is_toml(path) {
        toml::to_string_pretty(settings)?
    } else {
        serde_json::to_string_pretty(settings)?
    };
    std::fs::write(path, text)?;
    Ok(())
}
