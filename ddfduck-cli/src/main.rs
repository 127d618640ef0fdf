//! ddfduck CLI: converts a DDF-CSV dataset into a DuckDB database file.

mod commands;

use clap::Parser;
use ddfduck_core::{ConvertConfig, ConvertError, Converter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Convert a DDF-CSV dataset (default: Gapminder Systema Globalis) to DuckDB
#[derive(Parser, Debug)]
#[command(name = "ddfduck", version, about, long_about = None)]
struct Cli {
    /// Path to the DDF dataset repository
    #[arg(long)]
    repo_path: Option<PathBuf>,

    /// Output DuckDB database path
    #[arg(long)]
    output_db: Option<PathBuf>,

    /// Git URL to clone when the repository is missing
    #[arg(long)]
    repo_url: Option<String>,

    /// Use the local repository as-is, without cloning or pulling
    #[arg(long)]
    no_fetch: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also write JSON logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print a summary of an existing database
    Verify {
        /// Database to inspect (defaults to the configured output path)
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
}

impl Cli {
    /// Apply command-line flags on top of the loaded configuration.
    fn apply_overrides(&self, config: &mut ConvertConfig) {
        if let Some(path) = &self.repo_path {
            config.source.repo_path = path.clone();
        }
        if let Some(url) = &self.repo_url {
            config.source.repo_url = url.clone();
        }
        if self.no_fetch {
            config.source.fetch = false;
        }
        if let Some(path) = &self.output_db {
            config.database.output_path = path.clone();
        }
        if let Some(path) = &self.log_file {
            config.logging.file = Some(path.clone());
        }
    }

    fn filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Install the stderr layer and, when configured, a JSON file layer.
///
/// The returned guard flushes the file writer and must outlive the run.
fn init_tracing(
    filter: &str,
    log_file: Option<&Path>,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let (json_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)?;
            let name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid log file path: {}", path.display()))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();
    Ok(guard)
}

fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let workspace = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut config = ddfduck_core::load_config(Some(&workspace), cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    cli.apply_overrides(&mut config);

    let _guard = init_tracing(cli.filter(), config.logging.file.as_deref())?;

    match cli.command {
        Some(Commands::Verify { db_path }) => {
            let path = db_path.unwrap_or_else(|| config.database.output_path.clone());
            commands::verify(&path)
        }
        Some(Commands::Config { action }) => commands::handle_config(action, &config),
        None => convert(config),
    }
}

/// Run the conversion on a blocking worker while the runtime watches for
/// Ctrl-C. The interrupt is honoured between tables.
fn convert(config: ConvertConfig) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let interrupt = Arc::new(AtomicBool::new(false));
    let converter = Converter::new(config).with_interrupt(Arc::clone(&interrupt));

    let result = runtime.block_on(async move {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping after the current table");
                interrupt.store(true, Ordering::SeqCst);
            }
        });
        tokio::task::spawn_blocking(move || converter.run()).await
    })?;

    match result {
        Ok(report) => {
            let failed = report.failed().count();
            if failed > 0 {
                tracing::warn!(
                    "{} table(s) could not be created; see the errors above",
                    failed
                );
            }
            Ok(())
        }
        Err(ConvertError::Interrupted) => Err(anyhow::anyhow!("Conversion interrupted by user")),
        Err(e) => {
            tracing::error!("Conversion failed: {}", e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_overrides_apply_on_top_of_config() {
        let cli = Cli::parse_from([
            "ddfduck",
            "--repo-path",
            "/data/sg",
            "--output-db",
            "/tmp/out.duckdb",
            "--no-fetch",
        ]);
        let mut config = ConvertConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.source.repo_path, PathBuf::from("/data/sg"));
        assert_eq!(config.database.output_path, PathBuf::from("/tmp/out.duckdb"));
        assert!(!config.source.fetch);
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_verbosity_filter() {
        assert_eq!(Cli::parse_from(["ddfduck"]).filter(), "info");
        assert_eq!(Cli::parse_from(["ddfduck", "-v"]).filter(), "debug");
        assert_eq!(Cli::parse_from(["ddfduck", "-vv"]).filter(), "trace");
        assert_eq!(Cli::parse_from(["ddfduck", "-q"]).filter(), "error");
    }

    #[test]
    fn test_verify_subcommand_parses() {
        let cli = Cli::parse_from(["ddfduck", "verify", "--db-path", "x.duckdb"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Verify { db_path: Some(ref p) }) if p == Path::new("x.duckdb")
        ));
    }
}
