//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use frontcheck_core::{ProgressReporter, Report, load_catalog_for, run_validation};
use frontcheck_shared::{
    AppConfig, Domain, FrontcheckError, ValidateConfig, config_dir, init_config, load_config,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

/// Exit code for configuration, catalog, and load failures.
pub(crate) const EXIT_FAILURE: u8 = 2;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// frontcheck: integrity checks for laser-cleaning frontmatter data.
#[derive(Parser)]
#[command(
    name = "frontcheck",
    version,
    about = "Validate the materials, contaminants, compounds and settings data stores.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of the default lookup.
    #[arg(long, global = true)]
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
    /// Validate every domain file and print a report.
    Validate {
        /// Only report findings for this domain (all files are still loaded).
        #[arg(long)]
        domain: Option<Domain>,

        /// Also require every machine parameter and its operating window.
        #[arg(long)]
        check_settings_data: bool,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,

        /// Data root the domain file paths are resolved against.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Catalog file to load instead of the built-in one (repeatable, merged in order).
        #[arg(long = "catalog")]
        catalog: Vec<PathBuf>,
    },

    /// Schema catalog inspection.
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Catalog subcommands.
#[derive(Subcommand)]
pub(crate) enum CatalogAction {
    /// Print the resolved catalog as JSON.
    Show {
        /// Catalog file to load instead of the built-in one (repeatable).
        #[arg(long = "catalog")]
        catalog: Vec<PathBuf>,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a default frontcheck.toml into the current directory.
    Init {
        /// Write to ~/.frontcheck instead.
        #[arg(long)]
        global: bool,
    },
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries the report.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "frontcheck=warn",
        1 => "frontcheck=info",
        2 => "frontcheck=debug",
        _ => "frontcheck=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
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
pub(crate) async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Validate {
            domain,
            check_settings_data,
            json,
            data_dir,
            catalog,
        } => {
            let app = load_config(config_path)?;
            let config = validate_config(
                &app,
                domain,
                check_settings_data,
                data_dir.as_deref(),
                catalog,
            );
            cmd_validate(&config, json).await
        }
        Command::Catalog {
            action: CatalogAction::Show { catalog },
        } => cmd_catalog_show(config_path, catalog),
        Command::Config { action } => match action {
            ConfigAction::Init { global } => cmd_config_init(global),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Merge CLI flags over the loaded config file.
fn validate_config(
    app: &AppConfig,
    domain: Option<Domain>,
    check_settings_data: bool,
    data_dir: Option<&Path>,
    catalog: Vec<PathBuf>,
) -> ValidateConfig {
    let mut config = ValidateConfig::from(app);
    if let Some(dir) = data_dir {
        config = config.with_data_root(&app.data, dir);
    }
    if !catalog.is_empty() {
        config.catalog_paths = catalog;
    }
    config.only_domain = domain;
    config.check_settings_data |= check_settings_data;
    config
}

/// Exit code for a command that failed before a report could be produced.
///
/// Catalog, config and data-file failures all exit with [`EXIT_FAILURE`].
/// The failure kind is logged at debug level.
pub(crate) fn failure_exit_code(err: &color_eyre::Report) -> u8 {
    match err.downcast_ref::<FrontcheckError>() {
        Some(FrontcheckError::Config { .. }) => debug!("configuration or catalog failed to load"),
        Some(FrontcheckError::Load { path, .. } | FrontcheckError::Io { path, .. }) => {
            debug!(path = %path.display(), "data file failed to load");
        }
        Some(FrontcheckError::Task(_)) => debug!("validation task failed"),
        None => debug!("command failed"),
    }
    EXIT_FAILURE
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_validate(config: &ValidateConfig, json: bool) -> Result<ExitCode> {
    info!(
        domain = ?config.only_domain,
        catalogs = config.catalog_paths.len(),
        "validating data stores"
    );

    let reporter = CliProgress::new(json);
    let report = run_validation(config, &reporter)
        .await
        .inspect_err(|_| reporter.clear())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    } else {
        print!("{}", report.to_text());
    }

    Ok(ExitCode::from(u8::from(report.has_errors())))
}

fn cmd_catalog_show(config_path: Option<&Path>, catalog: Vec<PathBuf>) -> Result<ExitCode> {
    let app = load_config(config_path)?;
    let config = validate_config(&app, None, false, None, catalog);
    let catalog = load_catalog_for(&config)?;
    println!("{}", serde_json::to_string_pretty(&catalog)?);
    Ok(ExitCode::SUCCESS)
}

fn cmd_config_init(global: bool) -> Result<ExitCode> {
    let dir = if global {
        config_dir()?
    } else {
        std::env::current_dir().wrap_err("cannot determine working directory")?
    };
    let path = init_config(&dir)?;
    println!("Config initialized at: {}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<ExitCode> {
    let config: AppConfig = load_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Spinner on stderr while the pipeline runs. Hidden for `--json`.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new(hidden: bool) -> Self {
        if hidden {
            return Self {
                spinner: ProgressBar::hidden(),
            };
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn clear(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn domain_loaded(&self, domain: Domain, records: usize) {
        self.spinner
            .set_message(format!("Loaded {} ({records} records)", domain.title()));
    }

    fn done(&self, _report: &Report) {
        self.clear();
    }
}
