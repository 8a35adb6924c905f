//! `keyward update` — report whether a newer version is available

use anyhow::{bail, Result};
use colored::Colorize;

use crate::{App, Outcome};

pub fn run(app: &App, current: Option<&str>) -> Result<Outcome> {
    let current = match current.or(app.config.product.version.as_deref()) {
        Some(v) => v.trim().to_string(),
        None => bail!("no installed version given; pass --current or set product.version"),
    };

    // Never fails: a down server only means we fall back to what we knew.
    let Some(info) = app.updates.check_for_update(&current) else {
        eprintln!("  {}", "No update information available yet.".dimmed());
        return Ok(Outcome::Success);
    };

    if info.update_available(&current) {
        let latest = info.latest_version.as_deref().unwrap_or_default();
        eprintln!(
            "  {} Version {} is available (installed: {}).",
            "\u{26a1}".yellow(),
            latest.bold(),
            current
        );
        if let Some(url) = &info.download_url {
            eprintln!("  {}: {}", "Download".bold(), url);
        }
        if let Some(changelog) = &info.changelog {
            eprintln!();
            eprintln!("{}", changelog.dimmed());
        }
    } else {
        eprintln!("  {} {} is up to date.", "\u{2713}".green(), current.bold());
    }
    eprintln!(
        "  {}",
        format!("Last checked {}", info.checked_at.format("%Y-%m-%d %H:%M UTC")).dimmed()
    );
    Ok(Outcome::Success)
}
