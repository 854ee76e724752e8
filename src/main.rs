use anyhow::Context as _;
use anyhow::Result;
use clap::Parser;
use rusty_plan::notify::notifier_from_settings;
use rusty_plan::notify::Notifier;
use rusty_plan::notify::Severity;
use rusty_plan::settings::Settings;
use rusty_plan::spreadsheet::WorkbookGridSource;
use rusty_plan::table::schema::BuiltinSchema;
use rusty_plan::table::schema::SchemaFile;
use rusty_plan::table::schema::SchemaSource;
use rusty_plan::table::Schema;
use rusty_plan::Context;
use rusty_plan::ErrorKind;
use rusty_plan::RunOutcome;
use rusty_plan::RustyPlanError;
use std::fs::OpenOptions;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Interprets one sales plan workbook into `<OUTPUT_DIR>/<FILE name>.json`.
#[derive(Parser, Debug)]
#[command(name = "rusty_plan", version, about)]
struct Cli {
    /// Workbook to interpret
    file: PathBuf,

    /// Directory the JSON output is written into
    output_dir: PathBuf,

    /// Schema file (.yaml, .yml or .json); the built-in sales plan schema otherwise
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Score a row must exceed to count as a header row
    #[arg(long)]
    threshold: Option<u8>,
}

fn main() {
    let cli = Cli::parse();

    // Logging and the notifier come up on defaults when settings fail to load
    let loaded = Settings::load();
    let defaults = Settings::default();
    let active = loaded.as_ref().unwrap_or(&defaults);
    let logging = init_tracing(active);
    let notifier = notifier_from_settings(active);

    let code = match startup(&cli, loaded, logging) {
        Ok((settings, schema)) => {
            let mut context = Context {
                schema,
                grid_source: Box::new(WorkbookGridSource::new(settings.error_as_null)),
                notifier,
                header_threshold: cli.threshold.unwrap_or(settings.header_threshold),
            };
            let outcome = rusty_plan::run(&cli.file, &cli.output_dir, &mut context);
            if let RunOutcome::Failure(failure) = &outcome {
                eprintln!("{}", failure.signal);
            }
            outcome.exit_code()
        }
        Err(e) => startup_failed(notifier.as_ref(), &cli.file, &e),
    };
    std::process::exit(code);
}

/// Settings, logging and schema; anything failing here ends the run as unknown.
fn startup(cli: &Cli, loaded: Result<Settings, RustyPlanError>, logging: Result<()>) -> Result<(Settings, Schema)> {
    let settings = loaded.context("Failed to load settings")?;
    logging?;
    let schema = match &cli.schema {
        Some(path) => SchemaFile::new(path).load(),
        None => BuiltinSchema.load(),
    }
    .context("Failed to load schema")?;
    Ok((settings, schema))
}

/// Logs and notifies a startup failure, then prints the unknown signal.
fn startup_failed(notifier: &dyn Notifier, document: &Path, e: &anyhow::Error) -> i32 {
    let base_name = document
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| document.display().to_string());
    error!(document = %base_name, "Startup failed: {e:#}");
    notifier.notify(Severity::Error, &format!("Error processing file {} (unknown): {e:#}", base_name));
    eprintln!("unknown");
    ErrorKind::Unknown.exit_code()
}

/// Logs to stderr, or appends to `<log_dir>/rusty_plan.log` when a log directory is set.
/// Falls back to stderr when the log file cannot be opened.
fn init_tracing(settings: &Settings) -> Result<()> {
    let log_file = match &settings.log_dir {
        Some(log_dir) => Some(open_log_file(log_dir)),
        None => None,
    };
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter());
    match log_file {
        Some(Ok(file)) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
            .map_err(|e| anyhow::anyhow!(e)),
        Some(Err(e)) => {
            let _ = builder.with_writer(std::io::stderr).try_init();
            Err(e)
        }
        None => builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e)),
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn open_log_file(log_dir: &Path) -> Result<std::fs::File> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("rusty_plan.log"))
        .with_context(|| format!("Failed to open log file in {}", log_dir.display()))
}
