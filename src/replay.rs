use crate::context::{ContextMapping, CONVENTIONAL_KEY};
use crate::errors::{Result, ScaffoldError};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn replay_file(replay_dir: &Path, template_name: &str) -> PathBuf {
    let file = if template_name.ends_with(".json") {
        template_name.to_string()
    } else {
        format!("{template_name}.json")
    };
    replay_dir.join(file)
}

/// Persist a resolved context so a later run can skip prompting.
pub fn dump(replay_dir: &Path, template_name: &str, context: &ContextMapping) -> Result<PathBuf> {
    if !context.contains_key(CONVENTIONAL_KEY) {
        return Err(ScaffoldError::InvalidContext(format!("replay context needs a `{CONVENTIONAL_KEY}` key")));
    }
    fs::create_dir_all(replay_dir).map_err(|e| ScaffoldError::io(replay_dir, e))?;

    let path = replay_file(replay_dir, template_name);
    let body = serde_json::to_string_pretty(context)
        .map_err(|source| ScaffoldError::InvalidJson { path: path.clone(), source })?;
    fs::write(&path, body).map_err(|e| ScaffoldError::io(&path, e))?;
    debug!(path = %path.display(), "wrote replay file");
    Ok(path)
}

pub fn load(replay_dir: &Path, template_name: &str) -> Result<ContextMapping> {
    let path = replay_file(replay_dir, template_name);
    let raw = fs::read_to_string(&path).map_err(|e| ScaffoldError::io(&path, e))?;
    let value: Value =
        serde_json::from_str(&raw).map_err(|source| ScaffoldError::InvalidJson { path: path.clone(), source })?;
    match value {
        Value::Object(ctx) if ctx.contains_key(CONVENTIONAL_KEY) => Ok(ctx),
        _ => Err(ScaffoldError::InvalidContext(format!(
            "{} has no `{CONVENTIONAL_KEY}` object",
            path.display()
        ))),
    }
}
