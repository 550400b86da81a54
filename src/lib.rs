pub mod errors;
pub mod context;
pub mod config;
pub mod generate;
pub mod prompt;
pub mod render;
pub mod replay;
mod overwrites;
mod comparison;

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::info;

use config::UserConfig;
use context::{ContextLoader, ContextMapping, LoadRequest, CONVENTIONAL_KEY, STANDARD_CONTEXT_FILE};
use errors::{Result, ScaffoldError};
use render::Renderer;

pub use context::{generate_context, RenamingLoader, StandardLoader};

/// Per-run options, mirroring the command line.
#[derive(Debug, Clone)]
pub struct ScaffoldOptions {
    pub no_input: bool,
    pub replay: bool,
    pub overwrite_if_exists: bool,
    pub output_dir: PathBuf,
    pub extra_context: ContextMapping,
}

impl Default for ScaffoldOptions {
    fn default() -> Self {
        Self {
            no_input: false,
            replay: false,
            overwrite_if_exists: false,
            output_dir: PathBuf::from("."),
            extra_context: ContextMapping::new(),
        }
    }
}

/// The scaffolding pipeline. The context loader is injected, so the same
/// pipeline serves `cookiecutter.json` templates and `cc-disco-pie.json` ones.
pub struct Scaffold {
    loader: Box<dyn ContextLoader>,
    renderer: Renderer,
    config: UserConfig,
}

impl Scaffold {
    pub fn new(loader: Box<dyn ContextLoader>, config: UserConfig) -> Self {
        Self { loader, renderer: Renderer::new(), config }
    }

    /// Pipeline wired with the `cc-disco-pie.json` override.
    pub fn disco_pie(config: UserConfig) -> Self {
        Self::new(Box::new(RenamingLoader::disco_pie()), config)
    }

    /// Load the template's context through the injected loader.
    pub fn load_context(&self, template: &Path, extra_context: &ContextMapping) -> Result<ContextMapping> {
        let mut request = LoadRequest::new(template.join(STANDARD_CONTEXT_FILE))
            .with_default_context(self.config.default_context.clone());
        if !extra_context.is_empty() {
            request = request.with_extra_context(extra_context.clone());
        }
        self.loader.load(&request)
    }

    /// Generate a project from `template`, prompting on `input`/`output`.
    /// Returns the path of the generated project.
    pub fn run<R: BufRead, W: Write>(
        &self,
        template: &Path,
        opts: &ScaffoldOptions,
        input: &mut R,
        output: &mut W,
    ) -> Result<PathBuf> {
        if opts.replay && (opts.no_input || !opts.extra_context.is_empty()) {
            return Err(ScaffoldError::Usage(
                "--replay cannot be combined with --no-input or extra context".into(),
            ));
        }
        let template_name = template_name(template)?;

        let mut context = if opts.replay {
            info!(template = %template_name, "replaying stored context");
            replay::load(&self.config.replay_dir, &template_name)?
        } else {
            let loaded = self.load_context(template, &opts.extra_context)?;
            let resolved = prompt::prompt_for_config(&loaded, &self.renderer, opts.no_input, input, output)?;
            let mut ctx = ContextMapping::new();
            ctx.insert(CONVENTIONAL_KEY.to_string(), Value::Object(resolved));
            ctx
        };

        if let Some(Value::Object(vars)) = context.get_mut(CONVENTIONAL_KEY) {
            vars.insert("_template".into(), Value::String(template.display().to_string()));
            let output_dir = std::path::absolute(&opts.output_dir).unwrap_or_else(|_| opts.output_dir.clone());
            vars.insert("_output_dir".into(), Value::String(output_dir.display().to_string()));
        }

        replay::dump(&self.config.replay_dir, &template_name, &context)?;

        let project = generate::generate_files(
            &self.renderer,
            template,
            &context,
            &opts.output_dir,
            opts.overwrite_if_exists,
        )?;
        info!(project = %project.display(), "project generated");
        Ok(project)
    }
}

/// Base name of the template directory, used to key replay files. Relative
/// paths like `.` or `..` resolve against the working directory first.
pub fn template_name(template: &Path) -> Result<String> {
    let resolved = std::fs::canonicalize(template).map_err(|e| ScaffoldError::io(template, e))?;
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ScaffoldError::Usage(format!("{} is not a template directory", template.display())))
}

/// Convenience: generate without prompting, using the `cc-disco-pie.json` override.
pub fn cc_disco_pie(template: &Path, config: UserConfig, opts: &ScaffoldOptions) -> Result<PathBuf> {
    let opts = ScaffoldOptions { no_input: !opts.replay, ..opts.clone() };
    Scaffold::disco_pie(config).run(template, &opts, &mut std::io::empty(), &mut std::io::sink())
}
