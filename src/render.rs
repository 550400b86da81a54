use crate::errors::{Result, ScaffoldError};
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

/// Jinja renderer configured the way templates expect: undefined variables are
/// errors, trailing newlines survive, and Python string methods such as
/// `.lower()` and `.replace()` work on values.
pub struct Renderer {
    env: Environment<'static>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.set_unknown_method_callback(minijinja_contrib::pycompat::unknown_method_callback);
        Self { env }
    }

    /// Render `source` against `ctx`. `name` identifies the source in errors.
    pub fn render<S: Serialize>(&self, name: &str, source: &str, ctx: S) -> Result<String> {
        // Plain text needs no engine round-trip.
        if !is_templated(source) {
            return Ok(source.to_string());
        }
        self.env
            .render_named_str(name, source, ctx)
            .map_err(|source| ScaffoldError::Template { name: name.to_string(), source })
    }
}

fn is_templated(source: &str) -> bool {
    source.contains("{{") || source.contains("{%") || source.contains("{#")
}
