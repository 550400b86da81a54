use std::path::PathBuf;
use thiserror::Error; // Import the `Error` derive macro from the `thiserror` crate

// Everything that can go wrong while loading a context or generating a project
#[derive(Debug, Error)]
pub enum ScaffoldError {
    // The context file (after any name substitution) is not on disk
    #[error("context file not found: {}", path.display())]
    ContextNotFound { path: PathBuf },

    // The loaded mapping has no value under the key the loader expects
    #[error("key `{key}` missing from context loaded from {}", path.display())]
    MissingContextKey { key: String, path: PathBuf },

    #[error("invalid JSON in {}: {source}", path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // Structurally valid JSON that is not a usable context
    #[error("invalid context: {0}")]
    InvalidContext(String),

    #[error("`{value}` is not a valid choice for `{variable}`")]
    InvalidOverwrite { variable: String, value: String },

    #[error("no project template directory found in {}", path.display())]
    NonTemplatedInputDir { path: PathBuf },

    #[error("output directory {} already exists", path.display())]
    OutputDirExists { path: PathBuf },

    // Rendering failed; `name` is the template text's origin (a path or a variable)
    #[error("unable to render `{name}`: {source}")]
    Template {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("usage error: {0}")]
    Usage(String),
}

impl ScaffoldError {
    /// Attach the offending path to an I/O error.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScaffoldError::Io { path: path.into(), source }
    }
}

// Type alias for results that use `ScaffoldError` as the error type
pub type Result<T> = std::result::Result<T, ScaffoldError>;
