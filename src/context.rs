//! Loading the template context file.
//!
//! The generic pipeline reads `cookiecutter.json` and keys its content by the
//! file stem. [`RenamingLoader`] points the same load at a differently named
//! file and moves its content back under the key the pipeline reads.

use crate::errors::{Result, ScaffoldError};
use crate::overwrites::apply_overwrites;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key-value structure handed to the renderer.
pub type ContextMapping = Map<String, Value>;

/// File name the generic pipeline looks for in a template root.
pub const STANDARD_CONTEXT_FILE: &str = "cookiecutter.json";
/// Top-level key every downstream consumer reads.
pub const CONVENTIONAL_KEY: &str = "cookiecutter";
pub const DISCO_PIE_CONTEXT_FILE: &str = "cc-disco-pie.json";
pub const DISCO_PIE_KEY: &str = "cc-disco-pie";

/// Arguments of a single context load.
#[derive(Debug, Clone, Default)]
pub struct LoadRequest {
    pub context_file: PathBuf,
    pub default_context: Option<ContextMapping>,
    pub extra_context: Option<ContextMapping>,
}

impl LoadRequest {
    pub fn new(context_file: impl Into<PathBuf>) -> Self {
        Self { context_file: context_file.into(), ..Self::default() }
    }

    pub fn with_default_context(mut self, ctx: ContextMapping) -> Self {
        self.default_context = Some(ctx);
        self
    }

    pub fn with_extra_context(mut self, ctx: ContextMapping) -> Self {
        self.extra_context = Some(ctx);
        self
    }
}

/// Strategy for turning a [`LoadRequest`] into a context mapping.
pub trait ContextLoader: Send + Sync {
    fn load(&self, request: &LoadRequest) -> Result<ContextMapping>;
}

/// The generic loader: reads the requested file as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardLoader;

impl ContextLoader for StandardLoader {
    fn load(&self, request: &LoadRequest) -> Result<ContextMapping> {
        generate_context(
            &request.context_file,
            request.default_context.as_ref(),
            request.extra_context.as_ref(),
        )
    }
}

/// Loads a sibling file instead of the requested one and renames its
/// top-level key so callers keep seeing `cookiecutter`.
pub struct RenamingLoader<L = StandardLoader> {
    inner: L,
    file_name: String,
    source_key: String,
    target_key: String,
}

impl RenamingLoader<StandardLoader> {
    /// `cc-disco-pie.json` / `cc-disco-pie` on top of the generic loader.
    pub fn disco_pie() -> Self {
        Self::new(StandardLoader, DISCO_PIE_CONTEXT_FILE, DISCO_PIE_KEY, CONVENTIONAL_KEY)
    }
}

impl<L: ContextLoader> RenamingLoader<L> {
    pub fn new(
        inner: L,
        file_name: impl Into<String>,
        source_key: impl Into<String>,
        target_key: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            file_name: file_name.into(),
            source_key: source_key.into(),
            target_key: target_key.into(),
        }
    }

    /// Same directory, different file name.
    pub fn substitute_path(&self, context_file: &Path) -> PathBuf {
        context_file.with_file_name(&self.file_name)
    }
}

impl<L: ContextLoader> ContextLoader for RenamingLoader<L> {
    fn load(&self, request: &LoadRequest) -> Result<ContextMapping> {
        let mut redirected = request.clone();
        redirected.context_file = self.substitute_path(&request.context_file);
        debug!(
            requested = %request.context_file.display(),
            loading = %redirected.context_file.display(),
            "redirecting context file"
        );

        let mut ctx = self.inner.load(&redirected)?;
        let value = ctx.remove(&self.source_key).ok_or_else(|| ScaffoldError::MissingContextKey {
            key: self.source_key.clone(),
            path: redirected.context_file.clone(),
        })?;
        ctx.insert(self.target_key.clone(), value);
        Ok(ctx)
    }
}

/// Read `context_file` and key its object by the file stem, then layer
/// `default_context` and `extra_context` on top (in that order).
pub fn generate_context(
    context_file: &Path,
    default_context: Option<&ContextMapping>,
    extra_context: Option<&ContextMapping>,
) -> Result<ContextMapping> {
    let raw = fs::read_to_string(context_file).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ScaffoldError::ContextNotFound { path: context_file.to_path_buf() },
        _ => ScaffoldError::io(context_file, e),
    })?;

    let parsed: Value = serde_json::from_str(&raw).map_err(|source| ScaffoldError::InvalidJson {
        path: context_file.to_path_buf(),
        source,
    })?;
    let Value::Object(mut obj) = parsed else {
        return Err(ScaffoldError::InvalidContext(format!(
            "{} must contain a JSON object",
            context_file.display()
        )));
    };

    let stem = context_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| ScaffoldError::InvalidContext(format!("{} has no file name", context_file.display())))?;

    if let Some(defaults) = default_context {
        apply_overwrites(&mut obj, defaults)?;
    }
    if let Some(extra) = extra_context {
        apply_overwrites(&mut obj, extra)?;
    }

    debug!(key = %stem, variables = obj.len(), "context loaded");
    let mut ctx = ContextMapping::new();
    ctx.insert(stem, Value::Object(obj));
    Ok(ctx)
}
