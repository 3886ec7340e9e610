//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docflow_core::{EngineResult, ProgressReporter, build_engine};
use docflow_shared::{AppConfig, INPUT_PATH_KEY, init_config, load_config, resolve_config_path};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docflow: run documents through composable pipelines.
#[derive(Parser)]
#[command(
    name = "docflow",
    version,
    about = "Run documents through configured pipelines of composable modules.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ./docflow.toml, then ~/.docflow/docflow.toml).
    #[arg(short, long, global = true, env = "DOCFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run every configured pipeline.
    Run {
        /// Input root directory (overrides the `InputPath` metadata).
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print every output document as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Validate the config and build the pipelines without running them.
    Check,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a starter config file.
    Init {
        /// Write to the current directory instead of ~/.docflow/.
        #[arg(long)]
        local: bool,
    },
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docflow=info",
        1 => "docflow=debug",
        _ => "docflow=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Run { input, json } => cmd_run(config_path, input.as_deref(), json),
        Command::Check => cmd_check(config_path),
        Command::Config { action } => match action {
            ConfigAction::Init { local } => cmd_config_init(local),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn load(config_path: Option<&Path>, input: Option<&Path>) -> Result<AppConfig> {
    let mut config = load_config(config_path)?;
    if config.pipelines.is_empty() {
        return Err(eyre!(
            "no pipelines configured. Create one with `docflow config init --local`."
        ));
    }
    if let Some(dir) = input {
        config.metadata.insert(
            INPUT_PATH_KEY.to_string(),
            Value::String(dir.to_string_lossy().into_owned()),
        );
    }
    Ok(config)
}

fn cmd_run(config_path: Option<&Path>, input: Option<&Path>, json: bool) -> Result<()> {
    let config = load(config_path, input)?;
    let engine = build_engine(&config)?;

    info!(pipelines = engine.pipelines().len(), "running pipelines");

    let reporter = CliProgress::new();
    let result = engine.execute(&reporter)?;

    if json {
        let dump: serde_json::Map<String, Value> = result
            .outputs
            .iter()
            .map(|o| Ok((o.name.clone(), serde_json::to_value(&o.documents)?)))
            .collect::<Result<_>>()?;
        println!("{}", serde_json::to_string_pretty(&dump)?);
        return Ok(());
    }

    println!();
    for output in &result.outputs {
        println!("  {:<20} {} documents", output.name, output.documents.len());
    }
    println!("  Total: {} documents", result.document_count());
    println!("  Time:  {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_check(config_path: Option<&Path>) -> Result<()> {
    let config = load(config_path, None)?;
    let engine = build_engine(&config)?;

    for pipeline in engine.pipelines() {
        let modules: Vec<&str> = pipeline.modules().iter().map(|m| m.name()).collect();
        println!("  {}: {}", pipeline.name(), modules.join(" -> "));
    }
    println!("  Config OK");
    Ok(())
}

fn cmd_config_init(local: bool) -> Result<()> {
    let cwd;
    let dir = if local {
        cwd = std::env::current_dir()?;
        Some(cwd.as_path())
    } else {
        None
    };
    let path = init_config(dir)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    match resolve_config_path(config_path)? {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no config file found, showing defaults"),
    }
    let config = load_config(config_path)?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn pipeline_started(&self, name: &str, index: usize, total: usize) {
        self.spinner
            .set_message(format!("Running [{index}/{total}] {name}"));
    }

    fn pipeline_finished(&self, name: &str, documents: usize) {
        self.spinner
            .set_message(format!("{name}: {documents} documents"));
    }

    fn done(&self, _result: &EngineResult) {
        self.spinner.finish_and_clear();
    }
}
