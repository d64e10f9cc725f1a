use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, warn};

use {beeline_common::diagnostics, secrecy::ExposeSecret};

use crate::{
    Error, Result,
    env_subst::substitute_env,
    error::Context,
    schema::BeelineConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "beeline.toml",
    "beeline.yaml",
    "beeline.yml",
    "beeline.json",
];

static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Use `dir` instead of `~/.config/beeline/` for discovery and saving.
pub fn set_config_dir(dir: PathBuf) {
    if let Ok(mut guard) = CONFIG_DIR_OVERRIDE.lock() {
        *guard = Some(dir);
    }
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<BeelineConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./beeline.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/beeline/beeline.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `BeelineConfig::default()` when no file is found or the file
/// fails to parse. Settings come back normalized, and the process-wide debug
/// logging flag is updated from them.
pub fn discover_and_load() -> BeelineConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                BeelineConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            BeelineConfig::default()
        },
    };
    config.settings = config.settings.normalized();
    diagnostics::set_debug_logs(config.settings.enable_debug_logs);
    config
}

/// Find the first config file in standard locations.
pub(crate) fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/beeline/`), or the
/// override set with [`set_config_dir`].
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = CONFIG_DIR_OVERRIDE
        .lock()
        .ok()
        .and_then(|guard| guard.clone())
    {
        return Some(dir);
    }
    directories::ProjectDirs::from("", "", "beeline").map(|d| d.config_dir().to_path_buf())
}

/// Returns the path of an existing config file, or the default TOML path.
pub fn find_or_default_config_path() -> PathBuf {
    if let Some(path) = find_config_file() {
        return path;
    }
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("beeline.toml")
}

/// Serialize `config` to TOML and write it to `path`.
///
/// Creates parent directories if needed.
pub fn save_config(config: &BeelineConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(config)?;
    std::fs::write(path, toml_str)?;
    debug!(
        path = %path.display(),
        has_api_key = config
            .credentials
            .api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().is_empty()),
        "saved config"
    );
    Ok(())
}

fn parse_config(raw: &str, path: &Path) -> Result<BeelineConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(Error::UnsupportedFormat(other.to_string())),
    }
}
