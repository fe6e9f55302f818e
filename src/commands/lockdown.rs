use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::cli::LockdownOpts;
use crate::concur::formats;
use crate::fsutil;
use crate::system::{net, postfix};

const HELO_REGEXP: &str = "/etc/postfix/helo.regexp";

/// Escape a literal for use inside a Postfix regexp table pattern.
fn regexp_escape(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for c in literal.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

/// Run the lockdown command.
///
/// Writes the HELO rejection table and tightens the `main.cf` restriction
/// lists against spam relays.
///
/// # Errors
///
/// Returns an error if a config edit or reload fails.
pub fn run(opts: &LockdownOpts) -> Result<()> {
    info!("locking down Postfix");

    let external_ip = net::external_ip();

    let mut helo = formats::space_file(HELO_REGEXP);
    helo.set(
        &format!("/^{}$/", regexp_escape(&opts.mailserver)),
        "550 Don't use my own hostname",
    )?;
    if let Some(ip) = &external_ip {
        helo.set(
            &format!("/^{}$/", regexp_escape(ip)),
            "550 Don't use my own IP address",
        )?;
        helo.set(
            &format!("/^\\[{}\\]$/", regexp_escape(ip)),
            "550 Don't use my own IP address",
        )?;
    }
    helo.set("/^[0-9.]+$/", "550 Your software is not RFC 2821 compliant")?;
    helo.set(
        "/^[0-9]+(\\.[0-9]+){3}$/",
        "550 Your software is not RFC 2821 compliant",
    )?;
    helo.save()?;

    // Lockdown keeps its own snapshot so its long restriction lists are
    // rebuilt from the pre-lockdown config on every run.
    let main_bak = fsutil::backup(Path::new(formats::POSTFIX_MAIN.dest_path), "bak.lockdown")?;
    let mut main = formats::POSTFIX_MAIN.open_from(&main_bak)?;
    let helo_restrictions = [
        "permit_mynetworks",
        "permit_sasl_authenticated",
        "reject_non_fqdn_hostname",
        "reject_invalid_hostname",
        "regexp:/etc/postfix/helo.regexp",
        "permit",
    ]
    .join(",\n    ");
    let recipient_restrictions = [
        "permit_mynetworks",
        "permit_sasl_authenticated",
        "reject_invalid_hostname",
        "reject_non_fqdn_hostname",
        "reject_non_fqdn_sender",
        "reject_non_fqdn_recipient",
        "reject_unknown_sender_domain",
        "reject_unknown_recipient_domain",
        "reject_unauth_destination",
        "reject_unknown_reverse_client_hostname",
        "reject_rbl_client zen.spamhaus.org",
        "reject_rbl_client bl.spamcop.net",
        "reject_rbl_client b.barracudacentral.org",
        "permit",
    ]
    .join(",\n    ");
    main.update([
        ("disable_vrfy_command", "yes"),
        ("smtpd_delay_reject", "yes"),
        ("smtpd_helo_required", "yes"),
        ("strict_rfc821_envelopes", "yes"),
        ("smtpd_helo_restrictions", helo_restrictions.as_str()),
        ("smtpd_recipient_restrictions", recipient_restrictions.as_str()),
        ("smtpd_error_sleep_time", "1s"),
        ("smtpd_soft_error_limit", "10"),
        ("smtpd_hard_error_limit", "20"),
    ])?;
    main.save()?;

    postfix::reload()
}
