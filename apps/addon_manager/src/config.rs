use std::{
    env, fs,
    path::{Path, PathBuf},
};

use addon_backend::DEFAULT_API_ENDPOINT;
use anyhow::Context;
use command_bridge::DEFAULT_QUEUE_CAPACITY;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "addon_manager.toml";

const STEAMDECK_ADDON_DIR: &str = ".local/share/Steam/steamapps/compatdata/306130/pfx/drive_c/users/steamuser/My Documents/Elder Scrolls Online/live/AddOns";
const WINDOWS_ADDON_DIR: &str = "Documents/Elder Scrolls Online/live/AddOns";
#[cfg(not(target_os = "windows"))]
const WINE_ADDON_DIR: &str = "drive_c/users/user/My Documents/Elder Scrolls Online/live/AddOns";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub addon_dir: PathBuf,
    pub api_endpoint: String,
    pub command_queue_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            addon_dir: detect_addon_dir(),
            api_endpoint: DEFAULT_API_ENDPOINT.into(),
            command_queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    addon_dir: Option<PathBuf>,
    api_endpoint: Option<String>,
    command_queue_capacity: Option<usize>,
}

pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    load_settings_with(config_path, |name| env::var(name).ok())
}

/// Defaults, then the TOML file, then environment overrides. An explicit
/// `config_path` must exist; the default file is optional.
pub fn load_settings_with(
    config_path: Option<&Path>,
    env_var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let file_cfg = match config_path {
        Some(path) => Some(read_file_settings(path)?),
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.exists() {
                Some(read_file_settings(path)?)
            } else {
                None
            }
        }
    };

    if let Some(file_cfg) = file_cfg {
        if let Some(v) = file_cfg.addon_dir {
            settings.addon_dir = v;
        }
        if let Some(v) = file_cfg.api_endpoint {
            settings.api_endpoint = v;
        }
        match file_cfg.command_queue_capacity {
            Some(v) if v > 0 => settings.command_queue_capacity = v,
            Some(_) => tracing::warn!("ignoring command_queue_capacity = 0 in config file"),
            None => {}
        }
    }

    let read = |name: &str| env_var(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = read("ADDON_MANAGER_ADDON_DIR") {
        settings.addon_dir = PathBuf::from(v);
    }
    if let Some(v) = read("APP__ADDON_DIR") {
        settings.addon_dir = PathBuf::from(v);
    }

    if let Some(v) = read("ADDON_MANAGER_API_ENDPOINT") {
        settings.api_endpoint = v;
    }
    if let Some(v) = read("APP__API_ENDPOINT") {
        settings.api_endpoint = v;
    }

    if let Some(v) = read("APP__COMMAND_QUEUE_CAPACITY") {
        match v.trim().parse::<usize>() {
            Ok(parsed) if parsed > 0 => settings.command_queue_capacity = parsed,
            _ => tracing::warn!(value = %v, "ignoring invalid APP__COMMAND_QUEUE_CAPACITY"),
        }
    }

    Ok(settings)
}

fn read_file_settings(path: &Path) -> anyhow::Result<FileSettings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file '{}'", path.display()))
}

pub fn detect_addon_dir() -> PathBuf {
    detect_addon_dir_in(dirs::home_dir())
}

fn detect_addon_dir_in(home: Option<PathBuf>) -> PathBuf {
    let Some(home) = home else {
        return PathBuf::from("AddOns");
    };

    for candidate in [STEAMDECK_ADDON_DIR, WINDOWS_ADDON_DIR] {
        let path = home.join(candidate);
        if path.exists() {
            return path;
        }
    }
    default_addon_dir(&home)
}

#[cfg(target_os = "windows")]
fn default_addon_dir(home: &Path) -> PathBuf {
    home.join(WINDOWS_ADDON_DIR)
}

#[cfg(not(target_os = "windows"))]
fn default_addon_dir(home: &Path) -> PathBuf {
    home.join(WINE_ADDON_DIR)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
