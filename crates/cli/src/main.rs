//! Keyward CLI - site license client

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;

use keyward_cli::{commands, logging, App, Cli, Commands, Outcome};
use keyward_core::config::DEFAULT_CONFIG_FILE;
use keyward_core::KeywardConfig;

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(Outcome::Success) => ExitCode::SUCCESS,
        Ok(Outcome::Failed) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("  {} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<Outcome> {
    let config_path = cli
        .config
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let config = KeywardConfig::from_file(config_path)?;
    let app = App::from_config(config)?;

    match &cli.command {
        Commands::Activate { key } => commands::license::activate(&app, key),
        Commands::Deactivate => commands::license::deactivate(&app),
        Commands::Status => commands::license::status(&app),
        Commands::Check => commands::license::check(&app),
        Commands::SetKey { key } => commands::license::set_key(&app, key),
        Commands::Reset => commands::license::reset(&app),
        Commands::Update { current } => commands::update::run(&app, current.as_deref()),
    }
}
