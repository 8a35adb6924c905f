//! CLI commands

pub mod license;
pub mod update;
