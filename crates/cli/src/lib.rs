//! Keyward CLI library — exposed for integration tests

pub mod app;
pub mod commands;
pub mod logging;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use app::App;

#[derive(Parser)]
#[command(name = "keyward")]
#[command(about = "Activate, deactivate and check updates for a site license", long_about = None)]
#[command(version = keyward_core::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ./keyward.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Activate a license key for this site
    Activate {
        /// License key to activate
        key: String,
    },

    /// Deactivate the stored license key for this site
    Deactivate,

    /// Show the stored license (no network)
    Status,

    /// Ask the licensing server for the stored key's current status
    Check,

    /// Replace the stored key without activating it
    SetKey {
        /// New license key
        key: String,
    },

    /// Forget the stored license entirely
    Reset,

    /// Check whether a newer version is available
    Update {
        /// Installed version (default: product.version from config)
        #[arg(long)]
        current: Option<String>,
    },
}

/// Whether a command achieved what the operator asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
}
