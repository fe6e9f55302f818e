use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::exec;
use crate::fsutil;

/// Sentinel so `apt-get update` runs only on the first install.
const UPDATE_STAMP: &str = "/var/tmp/relayctl-apt-update";

/// Run the install command.
///
/// # Errors
///
/// Returns an error if a package step fails.
pub fn run() -> Result<()> {
    info!("installing Postfix");

    let stamp = Path::new(UPDATE_STAMP);
    if !stamp.exists() {
        exec::run("apt-get", &["update"])?;
        fsutil::write(stamp, "")?;
    }

    exec::install_packages(&["postfix"])?;
    Ok(())
}
