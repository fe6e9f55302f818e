//! Cyrus SASL credentials and the TLS material Postfix serves with.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use tracing::info;

use crate::exec;
use crate::fsutil;

/// The SASL credential database.
pub const SASLDB: &str = "/etc/sasldb2";

/// Where the self-signed certificates live.
pub const CERTS_DIR: &str = "/etc/postfix/certs";

/// Create or replace an SMTP credential in the sasldb, then lock the
/// database down for the postfix user. The password goes over stdin so it
/// never appears in a process listing.
///
/// # Errors
///
/// When `saslpasswd2` or the permission steps fail.
pub fn set_password(username: &str, password: &str, realm: &str) -> Result<()> {
    info!(username, realm, "setting SMTP credentials");
    exec::run_with_stdin(
        "saslpasswd2",
        &["-c", "-u", realm, username, "-p"],
        password,
    )?;

    let sasldb = Path::new(SASLDB);
    fsutil::chmod(sasldb, 0o400)?;
    fsutil::chown(sasldb, "postfix")?;
    Ok(())
}

/// Subject fields for the self-signed certificate.
#[derive(Debug)]
pub struct CertSubject<'a> {
    /// Two-letter country code.
    pub country: &'a str,
    /// State or province.
    pub state: &'a str,
    /// City.
    pub city: &'a str,
    /// Organization and common name, both the mailserver hostname.
    pub mailserver: &'a str,
}

/// Generate a ten-year self-signed certificate for the domain and assemble
/// the combined `.pem` Postfix points at. Returns the `.pem` path.
///
/// # Errors
///
/// When `openssl` fails or the pem cannot be written.
pub fn generate_cert(domain: &str, subject: &CertSubject<'_>) -> Result<PathBuf> {
    info!(domain, "generating self-signed certificate");
    std::fs::create_dir_all(CERTS_DIR)
        .with_context(|| format!("Failed to create {CERTS_DIR}"))?;

    let key = Path::new(CERTS_DIR).join(format!("{domain}.key"));
    let crt = Path::new(CERTS_DIR).join(format!("{domain}.crt"));
    let pem = Path::new(CERTS_DIR).join(format!("{domain}.pem"));

    let subj = format!(
        "/C={}/ST={}/L={}/O={}/CN={}",
        subject.country, subject.state, subject.city, subject.mailserver, subject.mailserver
    );
    let key_str = key.to_string_lossy();
    let crt_str = crt.to_string_lossy();
    exec::run(
        "openssl",
        &[
            "req", "-new", "-newkey", "rsa:4096", "-days", "3650", "-nodes", "-x509", "-subj",
            &subj, "-keyout", &key_str, "-out", &crt_str,
        ],
    )?;

    let mut combined = fsutil::read(&crt)?;
    combined.push_str(&fsutil::read(&key)?);
    fsutil::write(&pem, &combined)?;
    Ok(pem)
}
