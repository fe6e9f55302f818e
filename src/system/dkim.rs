//! `OpenDKIM`: per-domain signing keys and table files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use tracing::{debug, info};

use crate::exec;
use crate::fsutil;

/// `OpenDKIM` state directory.
pub const OPENDKIM_DIR: &str = "/etc/opendkim";

/// Directory of per-domain signing keys.
pub const KEYS_DIR: &str = "/etc/opendkim/keys";

/// Selector-to-key mapping.
pub const KEY_TABLE: &str = "/etc/opendkim/KeyTable";

/// Domain-to-selector mapping.
pub const SIGNING_TABLE: &str = "/etc/opendkim/SigningTable";

/// Hosts whose mail is signed rather than verified.
pub const TRUSTED_HOSTS: &str = "/etc/opendkim/TrustedHosts";

/// The DNS TXT record an operator must publish for a signed domain.
#[derive(Debug, PartialEq, Eq)]
pub struct DnsRecord {
    /// Record name (`default._domainkey.<domain>`).
    pub name: String,
    /// Record value (`v=... k=... p=...`).
    pub value: String,
}

fn private_key(domain: &str) -> PathBuf {
    Path::new(KEYS_DIR).join(format!("{domain}.private"))
}

fn txt_file(domain: &str) -> PathBuf {
    Path::new(KEYS_DIR).join(format!("{domain}.txt"))
}

/// Whether any line of the table mentions the domain.
fn table_mentions(path: &Path, domain: &str) -> Result<bool> {
    Ok(fsutil::read_lines(path)?.iter().any(|l| l.contains(domain)))
}

/// Provision DKIM signing for one domain.
///
/// Generates a 2048-bit key when the domain has none (or when `gen_key`
/// forces it), locks the private key down to the opendkim user, and appends
/// the domain to the three table files. Every step skips work already done,
/// so re-runs converge.
///
/// # Errors
///
/// When key generation or a file step fails.
pub fn add_domain(domain: &str, gen_key: bool) -> Result<()> {
    info!(domain, "configuring DKIM");

    fs::create_dir_all(KEYS_DIR).with_context(|| format!("Failed to create {KEYS_DIR}"))?;

    let private = private_key(domain);
    let txt = txt_file(domain);
    if !txt.exists() || gen_key {
        exec::run(
            "opendkim-genkey",
            &[
                "--bits=2048",
                &format!("--domain={domain}"),
                &format!("--directory={KEYS_DIR}"),
            ],
        )?;

        // genkey always emits under the "default" selector
        let generated_private = Path::new(KEYS_DIR).join("default.private");
        let generated_txt = Path::new(KEYS_DIR).join("default.txt");
        fs::rename(&generated_private, &private).with_context(|| {
            format!("Failed to move {} into place", generated_private.display())
        })?;
        fsutil::chmod(&private, 0o600)?;
        fsutil::chown(&private, "opendkim:opendkim")?;
        fs::rename(&generated_txt, &txt)
            .with_context(|| format!("Failed to move {} into place", generated_txt.display()))?;
    } else {
        debug!(domain, "key already present");
    }

    let key_table = Path::new(KEY_TABLE);
    if !table_mentions(key_table, domain)? {
        fsutil::append_line(
            key_table,
            &format!(
                "default._domainkey.{domain} {domain}:default:{}",
                private.display()
            ),
        )?;
    }

    let signing_table = Path::new(SIGNING_TABLE);
    if !table_mentions(signing_table, domain)? {
        fsutil::append_line(signing_table, &format!("{domain} default._domainkey.{domain}"))?;
    }

    let trusted_hosts = Path::new(TRUSTED_HOSTS);
    if !table_mentions(trusted_hosts, domain)? {
        fsutil::append_line(trusted_hosts, &format!("*.{domain}"))?;
    }

    Ok(())
}

/// Extract the DNS TXT record from a domain's generated key file.
///
/// # Errors
///
/// When the file is missing or does not look like `opendkim-genkey` output.
pub fn dns_record(domain: &str) -> Result<DnsRecord> {
    let txt = txt_file(domain);
    let contents = fsutil::read(&txt)?;
    parse_dns_record(&contents)
        .with_context(|| format!("Unrecognized key file {}", txt.display()))
}

fn parse_dns_record(contents: &str) -> Option<DnsRecord> {
    let name = contents.split_whitespace().next()?.to_owned();
    let v = find_token(contents, "v=")?;
    let k = find_token(contents, "k=")?;
    let p = find_p_token(contents)?;
    Some(DnsRecord {
        name,
        value: format!("{v} {k} {p}"),
    })
}

/// First run of non-whitespace starting at `prefix`, quotes and trailing
/// semicolon stripped.
fn find_token(contents: &str, prefix: &str) -> Option<String> {
    let start = contents.find(prefix)?;
    let rest = &contents[start..];
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '"')
        .unwrap_or(rest.len());
    Some(rest[..end].trim_end_matches(';').to_owned())
}

/// The public key runs to the closing quote and may span quoted chunks.
fn find_p_token(contents: &str) -> Option<String> {
    let start = contents.find("p=")?;
    let rest = &contents[start..];
    let end = rest.find('"').unwrap_or(rest.len());
    let token = rest[..end].trim();
    if token.len() > 2 { Some(token.to_owned()) } else { None }
}

/// Restart `OpenDKIM` (plain start when it is not yet running).
///
/// # Errors
///
/// When the init script fails.
pub fn reload() -> Result<()> {
    let status = exec::run_unchecked("/etc/init.d/opendkim", &["status"])?;
    if status.success {
        exec::run("/etc/init.d/opendkim", &["restart"])?;
    } else {
        exec::run("/etc/init.d/opendkim", &["start"])?;
    }
    Ok(())
}
