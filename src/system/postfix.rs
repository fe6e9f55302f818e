//! Postfix: virtual domain maps and service control.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use tracing::{debug, info};

use crate::concur::formats;
use crate::error::ExitKind;
use crate::exec;
use crate::fsutil;

/// Postfix configuration directory.
pub const CONFIG_DIR: &str = "/etc/postfix";

/// Virtual alias state directory.
pub const VIRTUAL_DIR: &str = "/etc/postfix/virtual";

/// Per-domain address map directory.
pub const ADDRESSES_DIR: &str = "/etc/postfix/virtual/addresses";

/// Registry of every provisioned domain, one per line.
pub const DOMAINS_FILE: &str = "/etc/postfix/virtual/domains";

/// All domains currently provisioned, sorted. Missing registry means none.
///
/// # Errors
///
/// When the registry exists but cannot be read.
pub fn domains() -> Result<Vec<String>> {
    let mut domains: Vec<String> = fsutil::read_lines(Path::new(DOMAINS_FILE))?
        .into_iter()
        .map(|line| line.trim().to_owned())
        .filter(|line| !line.is_empty())
        .collect();
    domains.sort();
    domains.dedup();
    Ok(domains)
}

/// Path of a domain's address map file.
#[must_use]
pub fn address_map(domain: &str) -> PathBuf {
    Path::new(ADDRESSES_DIR).join(domain)
}

/// Register a domain's virtual aliases with Postfix.
///
/// The address map comes from `proxy_file` when given (copied verbatim),
/// otherwise a catchall map routing `@domain` to `proxy_email` is generated.
/// The live `main.cf` is edited additively so earlier domains survive, and
/// the map is compiled with `postmap`. Re-running for an existing domain
/// rewrites its map and leaves everything else untouched.
///
/// # Errors
///
/// When neither `proxy_file` nor `proxy_email` is given, or any file or
/// command step fails.
pub fn add_domain(domain: &str, proxy_file: Option<&Path>, proxy_email: Option<&str>) -> Result<()> {
    if proxy_file.is_none() && proxy_email.is_none() {
        bail!("either a proxy file or a proxy email is required for {domain}");
    }

    fs::create_dir_all(ADDRESSES_DIR)
        .with_context(|| format!("Failed to create {ADDRESSES_DIR}"))?;

    let map_path = address_map(domain);
    if let Some(proxy_file) = proxy_file {
        info!(domain, file = %proxy_file.display(), "adding domain with address file");
        fs::copy(proxy_file, &map_path).with_context(|| {
            format!(
                "Failed to copy {} to {}",
                proxy_file.display(),
                map_path.display()
            )
        })?;
    } else if let Some(proxy_email) = proxy_email {
        info!(domain, proxy_email, "adding catchall domain");
        let mut map = formats::space_file(&map_path);
        map.set(&format!("@{domain}"), proxy_email)?;
        map.save()?;
    }

    let domains_path = Path::new(DOMAINS_FILE);
    if !fsutil::contains_line(domains_path, domain)? {
        fsutil::append_line(domains_path, domain)?;
    }

    // Additive edit, so the live file is the prototype.
    let alias_maps = domains()?
        .iter()
        .map(|d| format!("hash:{}", address_map(d).display()))
        .collect::<Vec<_>>()
        .join(",\n  ");
    let mut main = formats::POSTFIX_MAIN.open()?;
    main.update([
        ("virtual_alias_domains", DOMAINS_FILE),
        ("virtual_alias_maps", alias_maps.as_str()),
    ])?;
    main.save()?;

    let map_str = map_path
        .to_str()
        .with_context(|| format!("Non-UTF-8 path {}", map_path.display()))?;
    exec::run("postmap", &[map_str])?;
    Ok(())
}

/// Reload Postfix, starting it first when it is not running.
///
/// # Errors
///
/// When Postfix cannot be started or reloaded.
pub fn reload() -> Result<()> {
    match exec::run("postfix", &["status"]) {
        Ok(_) => {}
        Err(err) if err.kind() == ExitKind::General => {
            debug!("postfix not running, starting it");
            exec::run("postfix", &["start"])?;
        }
        Err(err) => return Err(err.into()),
    }
    exec::run("postfix", &["reload"])?;
    Ok(())
}
