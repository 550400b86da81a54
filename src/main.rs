use cc_disco_pie::config::get_user_config;
use cc_disco_pie::context::ContextMapping;
use cc_disco_pie::{Scaffold, ScaffoldOptions};
use clap::Parser;
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Create a project from a template that declares its variables in cc-disco-pie.json.
#[derive(Parser, Debug)]
#[command(name = "cc-disco-pie", author, version, about)]
struct Args {
    /// Template directory (contains cc-disco-pie.json)
    template: PathBuf,
    /// Extra context as KEY=VALUE pairs, overriding template defaults
    #[arg(value_parser = parse_key_val)]
    extra_context: Vec<(String, String)>,
    /// Do not prompt; use defaults and extra context only
    #[arg(long)]
    no_input: bool,
    /// Where to generate the project
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
    /// Write into an existing project directory
    #[arg(short = 'f', long)]
    overwrite_if_exists: bool,
    /// Reuse the answers stored by the previous run of this template
    #[arg(long)]
    replay: bool,
    /// User config file (YAML)
    #[arg(long)]
    config_file: Option<PathBuf>,
    /// Ignore any user config and use built-in defaults
    #[arg(long)]
    default_config: bool,
    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{s}`")),
    }
}

fn main() {
    // Parse CLI arguments.
    let args = Args::parse();

    // Logging goes to stderr so prompts on stdout stay clean.
    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let config = match get_user_config(args.config_file.as_deref(), args.default_config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let extra_context: ContextMapping = args
        .extra_context
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    let opts = ScaffoldOptions {
        no_input: args.no_input,
        replay: args.replay,
        overwrite_if_exists: args.overwrite_if_exists,
        output_dir: args.output_dir,
        extra_context,
    };

    // Generate.
    let stdin = std::io::stdin();
    let result = Scaffold::disco_pie(config).run(&args.template, &opts, &mut stdin.lock(), &mut std::io::stdout());
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
