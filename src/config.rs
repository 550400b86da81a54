use crate::context::ContextMapping;
use crate::errors::{Result, ScaffoldError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_ENV_VAR: &str = "COOKIECUTTER_CONFIG";
const USER_CONFIG_FILE: &str = ".cookiecutterrc";
const REPLAY_DIR: &str = ".cookiecutter_replay";

/// User-level settings read from a YAML file.
#[derive(Debug, Clone, PartialEq)]
pub struct UserConfig {
    /// Overwrites applied to every template's context before extra context.
    pub default_context: ContextMapping,
    pub replay_dir: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    default_context: Option<ContextMapping>,
    replay_dir: Option<String>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            default_context: ContextMapping::new(),
            replay_dir: home_dir().join(REPLAY_DIR),
        }
    }
}

impl UserConfig {
    /// Parse a YAML config document. Keys left out fall back to defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        // An empty document deserializes to unit, not a map.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawConfig = serde_yaml::from_str(text).map_err(|e| ScaffoldError::Config(e.to_string()))?;
        let mut cfg = Self::default();
        if let Some(ctx) = raw.default_context {
            cfg.default_context = ctx;
        }
        if let Some(dir) = raw.replay_dir {
            cfg.replay_dir = expand_home(&dir);
        }
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| ScaffoldError::Config(format!("cannot read {}: {e}", path.display())))?;
        debug!(path = %path.display(), "loaded user config");
        Self::from_yaml(&text)
    }
}

/// Resolve the user config: built-in defaults when asked for, then an
/// explicit file, then `$COOKIECUTTER_CONFIG`, then `~/.cookiecutterrc`.
pub fn get_user_config(config_file: Option<&Path>, default_config: bool) -> Result<UserConfig> {
    if default_config {
        return Ok(UserConfig::default());
    }
    if let Some(path) = config_file {
        return UserConfig::from_file(path);
    }
    if let Some(env_path) = std::env::var_os(CONFIG_ENV_VAR) {
        return UserConfig::from_file(Path::new(&env_path));
    }
    let rc = home_dir().join(USER_CONFIG_FILE);
    if rc.is_file() {
        return UserConfig::from_file(&rc);
    }
    Ok(UserConfig::default())
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Expand `~` and `~/...`; `~user/...` is left alone.
fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix('~') {
        Some("") => home_dir(),
        Some(rest) if rest.starts_with(['/', '\\']) => home_dir().join(rest.trim_start_matches(['/', '\\'])),
        _ => PathBuf::from(path),
    }
}
