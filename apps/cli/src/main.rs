//! frontcheck CLI: validates the laser-cleaning YAML data stores.
//!
//! Exit codes: 0 when no ERROR violation is found, 1 when at least one is,
//! 2 when configuration, the catalog, or a data file cannot be loaded.

mod commands;

use std::process::ExitCode;

use clap::Parser;

use commands::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = color_eyre::install() {
        eprintln!("Error: {err:?}");
        return ExitCode::from(commands::EXIT_FAILURE);
    }

    let cli = Cli::parse();
    commands::init_tracing(&cli);

    match commands::run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(commands::failure_exit_code(&err))
        }
    }
}
