//! CLI entry point for the inventory migration engine.
//!
//! This binary migrates the legacy museum inventory database into the
//! target inventory system, one importer phase at a time.
//!
//! # Usage
//!
//! ```bash
//! inv-migrate [OPTIONS] <COMMAND>
//!
//! # Check both connections
//! inv-migrate validate
//!
//! # Full import, writes suppressed
//! inv-migrate import --dry-run
//!
//! # Resume from the objects phase and stop after the monuments phase
//! inv-migrate import --start-at objects --stop-at monuments
//!
//! # Collect fixture samples (implies --dry-run)
//! inv-migrate import --collect-samples --sample-size 50
//! ```
//!
//! Exit code is 0 for a clean run, 1 when a phase recorded errors or a
//! connection check failed, 2 for configuration errors.

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::fs::{self, File};
use std::io::Write;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::WrapErr;
use im_core::codes::language_code;
use im_core::{Config, ConfigError, LogConfig, TargetMode};
use im_engine::{
    ImportContext, ImportSettings, Orchestrator, RunSummary, SampleCollector, Selection,
};
use im_legacy::{LegacySource, MySqlLegacySource};
use im_target::{DryRunWriter, PgWriter, RestWriter, TargetWriter};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const EXIT_ERRORS: u8 = 1;
const EXIT_CONFIG: u8 = 2;

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Migrates the legacy museum inventory into the target inventory system.
///
/// Connection settings come from an optional JSON configuration file,
/// overridden by environment variables (a `.env` file is honoured) and
/// then by flags.
#[derive(Parser)]
#[command(name = "inv-migrate", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file.
    #[arg(short, long, global = true, env = "INV_MIGRATE_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// MySQL URL of the legacy database.
    #[arg(long, global = true, env = "LEGACY_DATABASE_URL", hide_env_values = true)]
    legacy_url: Option<String>,

    /// Target writer strategy.
    #[arg(long, global = true, env = "TARGET_MODE", value_enum, ignore_case = true)]
    target_mode: Option<TargetModeArg>,

    /// Base URL of the target REST API.
    #[arg(long, global = true, env = "TARGET_API_URL")]
    api_url: Option<String>,

    /// Bearer token for the target REST API.
    #[arg(long, global = true, env = "TARGET_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Postgres URL of the target database.
    #[arg(long, global = true, env = "TARGET_DATABASE_URL", hide_env_values = true)]
    target_db_url: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    /// Log file for the import run.
    ///
    /// Defaults to `storage/logs/import-<timestamp>.log`.
    #[arg(long, global = true)]
    log_file: Option<Utf8PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Check that the legacy source and the target are reachable.
    Validate,

    /// Run the importers.
    Import(ImportArgs),
}

/// Flags of the `import` command.
#[derive(Args)]
struct ImportArgs {
    /// Read everything, write nothing.
    #[arg(long)]
    dry_run: bool,

    /// First importer to run.
    #[arg(long, value_name = "KEY")]
    start_at: Option<String>,

    /// Last importer to run.
    #[arg(long, value_name = "KEY")]
    stop_at: Option<String>,

    /// Run a single importer.
    #[arg(long, value_name = "KEY")]
    only: Option<String>,

    /// Print the importers in order and exit.
    #[arg(long)]
    list_importers: bool,

    /// Record representative legacy rows into the sample store. Implies
    /// `--dry-run`.
    #[arg(long)]
    collect_samples: bool,

    /// Samples kept per category.
    #[arg(long, value_name = "N")]
    sample_size: Option<usize>,

    /// Sample store path.
    #[arg(long, value_name = "PATH")]
    sample_db: Option<Utf8PathBuf>,

    /// Also write the run summary as JSON.
    #[arg(long, value_name = "PATH")]
    summary_json: Option<Utf8PathBuf>,
}

/// Target writer strategy.
#[derive(Clone, Copy, ValueEnum)]
enum TargetModeArg {
    /// Target REST API.
    Api,
    /// Target database.
    Database,
}

impl From<TargetModeArg> for TargetMode {
    fn from(mode: TargetModeArg) -> Self {
        match mode {
            TargetModeArg::Api => Self::Api,
            TargetModeArg::Database => Self::Database,
        }
    }
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber.
///
/// Respects `RUST_LOG`; otherwise `debug` with `--verbose` and `info` by
/// default. When `log_file` is given, a second layer writes the same
/// events to it without ANSI colors.
fn init_tracing(verbose: bool, no_color: bool, log_file: Option<&Utf8Path>) -> color_eyre::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},sqlx=warn,hyper=warn,reqwest=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
                fs::create_dir_all(parent)
                    .wrap_err_with(|| format!("failed to create log directory {parent}"))?;
            }
            let file = File::create(path).wrap_err_with(|| format!("failed to create log file {path}"))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(use_ansi))
        .with(file_layer)
        .with(filter)
        .init();
    Ok(())
}

/// Builds a [`Config`] from the optional file, then environment and flags.
///
/// Does not validate; callers decide when connection settings are needed.
fn build_config(cli: &Cli, import: Option<&ImportArgs>) -> Result<Config, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(url) = &cli.legacy_url {
        config.legacy.database_url = Some(url.clone());
    }
    if let Some(mode) = cli.target_mode {
        config.target.mode = mode.into();
    }
    if let Some(url) = &cli.api_url {
        config.target.api_url = Some(url.clone());
    }
    if let Some(token) = &cli.api_token {
        config.target.api_token = Some(token.clone());
    }
    if let Some(url) = &cli.target_db_url {
        config.target.database_url = Some(url.clone());
    }
    if let Some(path) = &cli.log_file {
        config.log.file = Some(path.clone());
    }

    if let Some(args) = import {
        if let Some(size) = args.sample_size {
            config.import.sample_size = size;
        }
        if let Some(path) = &args.sample_db {
            config.import.sample_db = path.clone();
        }
    }
    Ok(config)
}

/// Path of this run's log file.
fn log_path(log: &LogConfig) -> Utf8PathBuf {
    log.file.clone().unwrap_or_else(|| {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        log.directory.join(format!("import-{stamp}.log"))
    })
}

/// Creates the writer for the configured target mode.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the database is
/// unreachable.
async fn create_writer(config: &Config) -> color_eyre::Result<Box<dyn TargetWriter>> {
    let target = &config.target;
    let writer: Box<dyn TargetWriter> = match target.mode {
        TargetMode::Api => Box::new(
            RestWriter::new(
                target.api_url.as_deref().unwrap_or_default(),
                target.api_token.clone(),
                Duration::from_secs(target.timeout_secs),
                target.page_size,
            )
            .wrap_err("failed to create the REST target writer")?,
        ),
        TargetMode::Database => Box::new(
            PgWriter::connect(target.database_url.as_deref().unwrap_or_default())
                .await
                .wrap_err("failed to connect to the target database")?,
        ),
    };
    Ok(writer)
}

/// Reports a configuration error and returns the matching exit code.
fn config_error(err: &dyn std::fmt::Display) -> ExitCode {
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = writeln!(handle, "error: {err}");
    ExitCode::from(EXIT_CONFIG)
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Pings the legacy source and the target writer.
///
/// # Errors
///
/// Returns an error only if writing to stdout fails.
async fn run_validate(cli: &Cli) -> color_eyre::Result<ExitCode> {
    let config = match build_config(cli, None).and_then(|config| config.validate().map(|()| config)) {
        Ok(config) => config,
        Err(err) => return Ok(config_error(&err)),
    };
    init_tracing(cli.verbose, cli.no_color, None)?;

    let legacy = match MySqlLegacySource::connect(
        config.legacy.database_url.as_deref().unwrap_or_default(),
        &config.legacy.schema,
    )
    .await
    {
        Ok(source) => source.ping().await.map_err(|err| err.to_string()),
        Err(err) => Err(err.to_string()),
    };
    let target = match create_writer(&config).await {
        Ok(writer) => writer.ping().await.map_err(|err| err.to_string()),
        Err(err) => Err(format!("{err:#}")),
    };

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let mut healthy = true;
    for (label, check) in [("legacy source", &legacy), ("target", &target)] {
        match check {
            Ok(()) => writeln!(handle, "{label:<14} ok")?,
            Err(detail) => {
                healthy = false;
                writeln!(handle, "{label:<14} FAILED: {detail}")?;
            }
        }
    }

    Ok(if healthy {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_ERRORS)
    })
}

/// Runs the selected importers.
///
/// # Errors
///
/// Returns an error if a connection cannot be opened or output cannot be
/// written. Importer failures are reported in the summary instead.
async fn run_import(cli: &Cli, args: &ImportArgs) -> color_eyre::Result<ExitCode> {
    let mut orchestrator = Orchestrator::with_default_importers();
    if args.list_importers {
        print_importers(&orchestrator);
        return Ok(ExitCode::SUCCESS);
    }

    let config = match build_config(cli, Some(args)).and_then(|config| config.validate().map(|()| config)) {
        Ok(config) => config,
        Err(err) => return Ok(config_error(&err)),
    };
    let selection = Selection {
        only: args.only.clone(),
        start_at: args.start_at.clone(),
        stop_at: args.stop_at.clone(),
    };
    if let Err(err) = orchestrator.select(&selection) {
        return Ok(config_error(&err));
    }

    let log_file = log_path(&config.log);
    init_tracing(cli.verbose, cli.no_color, Some(&log_file))?;
    let dry_run = args.dry_run || args.collect_samples;
    info!(log_file = %log_file, dry_run, mode = ?config.target.mode, "import starting");

    let source = MySqlLegacySource::connect(
        config.legacy.database_url.as_deref().unwrap_or_default(),
        &config.legacy.schema,
    )
    .await
    .wrap_err("failed to connect to the legacy database")?;
    let mut writer = create_writer(&config).await?;
    if dry_run {
        writer = Box::new(DryRunWriter::new(writer));
    }

    let settings = ImportSettings {
        schema: config.legacy.schema.clone(),
        default_language: language_code(&config.import.default_language)
            .map_or_else(|| config.import.default_language.clone(), ToOwned::to_owned),
        dry_run,
    };
    let mut ctx = ImportContext::new(Box::new(source), writer, settings);
    if args.collect_samples {
        let samples =
            SampleCollector::create(&config.import.sample_db, config.import.sample_size).await?;
        ctx = ctx.with_samples(samples);
    }

    let summary = match orchestrator.run(&mut ctx, &selection).await {
        Ok(summary) => summary,
        Err(err) if err.is_config() => return Ok(config_error(&err)),
        Err(err) => return Err(err.into()),
    };

    if let Some(samples) = ctx.take_samples() {
        let total = samples.total();
        let path = samples.path().to_owned();
        samples.close().await;
        info!(samples = total, path = %path, "sample store written");
    }

    print_summary(&summary, &log_file);
    if let Some(path) = &args.summary_json {
        write_summary_json(&summary, path)?;
    }

    Ok(if summary.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_ERRORS)
    })
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Prints every importer with its description and dependencies.
fn print_importers(orchestrator: &Orchestrator) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    for importer in orchestrator.importers() {
        let dependencies: Vec<_> = importer
            .dependencies()
            .iter()
            .map(|kind| kind.as_str())
            .collect();
        let dependencies = if dependencies.is_empty() {
            "-".to_owned()
        } else {
            dependencies.join(", ")
        };
        let _ = writeln!(
            handle,
            "{:<24} {:<56} depends on: {dependencies}",
            importer.key(),
            importer.description()
        );
    }
}

/// Prints the summary table and run notes.
fn print_summary(summary: &RunSummary, log_file: &Utf8Path) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let _ = writeln!(handle);
    let _ = write!(handle, "{}", summary.render_table());
    let _ = writeln!(handle);
    if summary.dry_run {
        let _ = writeln!(
            handle,
            "Dry run: {} writes suppressed.",
            summary.suppressed_writes
        );
    }
    if let Some(importer) = summary.aborted_at {
        let _ = writeln!(handle, "Run aborted after '{importer}' recorded errors.");
    }
    let _ = writeln!(handle, "Log file: {log_file}");
}

/// Writes the summary as JSON.
fn write_summary_json(summary: &RunSummary, path: &Utf8Path) -> color_eyre::Result<()> {
    let json = summary
        .to_json()
        .wrap_err("failed to serialize the run summary")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json).wrap_err_with(|| format!("failed to write {path}"))?;
    info!(path = %path, "summary written");
    Ok(())
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Load .env before clap reads environment variables
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            let _ = writeln!(std::io::stderr().lock(), "warning: failed to read .env file: {err}");
        }
    }

    // 3. Parse CLI arguments
    let cli = Cli::parse();

    // 4. Route to appropriate command
    match &cli.command {
        Commands::Validate => run_validate(&cli).await,
        Commands::Import(args) => run_import(&cli, args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "legacy": { "database_url": "mysql://file" }, "import": { "sample_size": 5 } }"#,
        )
        .unwrap();

        let cli = parse(&[
            "inv-migrate",
            "--config",
            path.to_str().unwrap(),
            "--target-mode",
            "database",
            "--target-db-url",
            "postgres://flag",
            "import",
            "--sample-size",
            "7",
        ]);
        let Commands::Import(args) = &cli.command else {
            panic!("expected import");
        };
        let config = build_config(&cli, Some(args)).unwrap();

        assert_eq!(config.legacy.database_url.as_deref(), Some("mysql://file"));
        assert_eq!(config.target.mode, TargetMode::Database);
        assert_eq!(config.target.database_url.as_deref(), Some("postgres://flag"));
        assert_eq!(config.import.sample_size, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_config_file() {
        let cli = parse(&["inv-migrate", "--config", "/nonexistent/inv.json", "validate"]);
        assert!(matches!(
            build_config(&cli, None),
            Err(ConfigError::MissingFile(_))
        ));
    }

    #[test]
    fn test_log_path() {
        let mut log = LogConfig::default();
        let path = log_path(&log);
        assert!(path.as_str().starts_with("storage/logs/import-"));
        assert_eq!(path.extension(), Some("log"));

        log.file = Some(Utf8PathBuf::from("run.log"));
        assert_eq!(log_path(&log).as_str(), "run.log");
    }
}
