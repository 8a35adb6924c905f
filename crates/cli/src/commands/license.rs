//! License commands — activate, deactivate, check and manage the stored key

use anyhow::Result;
use colored::Colorize;

use keyward_core::license::messages::format_date;
use keyward_core::license::{Severity, UserMessage};
use keyward_core::{Action, License, LicenseError, LicenseStatus};

use crate::{App, Outcome};

/// Runs `keyward activate <KEY>`.
pub fn activate(app: &App, key: &str) -> Result<Outcome> {
    eprint!("  Activating... ");
    let result = app.client.activate(key, &app.token(Action::Activate));
    Ok(report(result, |license| {
        UserMessage::success(match license.expires_at {
            Some(at) => format!("License activated. Expires {}.", format_date(at)),
            None => "License activated.".to_string(),
        })
    }))
}

/// Runs `keyward deactivate`.
pub fn deactivate(app: &App) -> Result<Outcome> {
    eprint!("  Deactivating... ");
    let result = app.client.deactivate(&app.token(Action::Deactivate));
    Ok(report(result, |_| {
        UserMessage::success("License deactivated. The key is kept for reactivation.")
    }))
}

/// Runs `keyward check`.
pub fn check(app: &App) -> Result<Outcome> {
    eprint!("  Checking... ");
    let result = app.client.check(&app.token(Action::Check));
    Ok(report(result, status_message))
}

/// Runs `keyward status`.
pub fn status(app: &App) -> Result<Outcome> {
    let license = app.client.current()?;
    print_license_info(&license);
    Ok(Outcome::Success)
}

/// Runs `keyward set-key <KEY>`.
pub fn set_key(app: &App, key: &str) -> Result<Outcome> {
    let settings = app.client.settings();
    let license = License::change_key(
        app.store.as_ref(),
        &settings.product_id,
        &settings.site_url,
        key,
    )?;
    eprintln!(
        "  {} Key {} saved. Run '{}' to bind it to this site.",
        "\u{2713}".green(),
        license.masked_key().bold(),
        "keyward activate".bold()
    );
    Ok(Outcome::Success)
}

/// Runs `keyward reset`.
pub fn reset(app: &App) -> Result<Outcome> {
    License::clear(app.store.as_ref())?;
    eprintln!("  {} License removed.", "\u{2713}".green());
    Ok(Outcome::Success)
}

fn report(
    result: Result<License, LicenseError>,
    on_success: impl FnOnce(&License) -> UserMessage,
) -> Outcome {
    match result {
        Ok(license) => {
            eprintln!("{}", "done".green());
            print_message(&on_success(&license));
            eprintln!();
            print_license_info(&license);
            Outcome::Success
        }
        Err(e) => {
            let label = if e.is_retryable() {
                "offline".yellow()
            } else {
                "failed".red()
            };
            eprintln!("{}", label);
            print_message(&e.user_message());
            Outcome::Failed
        }
    }
}

fn status_message(license: &License) -> UserMessage {
    match license.status {
        LicenseStatus::Valid => UserMessage::success("License is active."),
        LicenseStatus::Unconfigured => UserMessage::info("No license is active on this site."),
        other => UserMessage::error(format!("License status: {}.", other)),
    }
}

fn print_message(message: &UserMessage) {
    let text = match message.severity {
        Severity::Success => message.text.green(),
        Severity::Info => message.text.normal(),
        Severity::Error => message.text.red(),
    };
    eprintln!("  {}", text);
}

fn print_license_info(license: &License) {
    let key = if license.has_key() {
        license.masked_key()
    } else {
        "(none)".to_string()
    };
    eprintln!("  {}: {}", "Key".bold(), key);
    eprintln!("  {}: {}", "Status".bold(), status_label(license.status));
    if let Some(at) = license.expires_at {
        eprintln!("  {}: {}", "Expires".bold(), format_date(at));
    }
    eprintln!("  {}: {}", "Site".bold(), license.site_url.dimmed());
    eprintln!();
}

fn status_label(status: LicenseStatus) -> colored::ColoredString {
    match status {
        LicenseStatus::Valid => status.as_str().green(),
        LicenseStatus::Unconfigured => status.as_str().dimmed(),
        _ => status.as_str().red(),
    }
}
