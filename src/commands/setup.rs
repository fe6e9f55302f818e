use anyhow::Result;
use tracing::info;

use crate::cli::{RecvOpts, SendOpts, SetupOpts};
use crate::commands;

/// Run the setup command: install plus every configure step, in order.
///
/// # Errors
///
/// Returns the first failing step's error.
pub fn run(opts: &SetupOpts) -> Result<()> {
    info!(domain = %opts.domain, "running full setup");

    commands::install::run()?;

    commands::receiving::run(&RecvOpts {
        domain: opts.domain.clone(),
        mailserver: opts.mailserver.clone(),
        proxy_file: None,
        proxy_email: Some(opts.proxy_email.clone()),
    })?;

    commands::sending::run(&SendOpts {
        domain: opts.domain.clone(),
        mailserver: opts.mailserver.clone(),
        smtp_username: opts.smtp_username.clone(),
        smtp_password: opts.smtp_password.clone(),
        country: opts.country.clone(),
        state: opts.state.clone(),
        city: opts.city.clone(),
    })?;

    commands::dkim::run()?;
    commands::srs::run()?;
    Ok(())
}
