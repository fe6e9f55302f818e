//! postsrsd: sender rewriting for forwarded mail.

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use tracing::info;

use crate::exec;

const SOURCE_URL: &str = "https://github.com/roehling/postsrsd/archive/master.zip";

/// Packages the build needs.
pub const BUILD_PACKAGES: &[&str] = &["unzip", "cmake", "build-essential"];

/// Download, build, and install postsrsd under `/tmp`. The zip is only
/// fetched when missing, so re-runs rebuild from the cached archive.
///
/// # Errors
///
/// When a download or build step fails.
pub fn install() -> Result<()> {
    info!("building postsrsd");
    exec::install_packages(BUILD_PACKAGES)?;

    let tmp = Path::new("/tmp");
    let archive = tmp.join("postsrsd.zip");
    if !archive.exists() {
        exec::run_in(tmp, "wget", &["-O", "postsrsd.zip", SOURCE_URL])?;
    }
    exec::run_in(tmp, "unzip", &["-o", "postsrsd.zip"])?;

    let build_dir = tmp.join("postsrsd-master/build");
    fs::create_dir_all(&build_dir)
        .with_context(|| format!("Failed to create {}", build_dir.display()))?;
    exec::run_in(&build_dir, "cmake", &["-DCMAKE_INSTALL_PREFIX=/usr", "../"])?;
    exec::run_in(&build_dir, "make", &[])?;
    exec::run_in(&build_dir, "make", &["install"])?;
    Ok(())
}

/// Whether the postsrsd service reports itself running.
///
/// # Errors
///
/// When the service manager cannot be invoked.
pub fn is_running() -> Result<bool> {
    let status = exec::run_unchecked("service", &["postsrsd", "status"])?;
    Ok(status.success && !status.combined().to_lowercase().contains("stop"))
}

/// Start postsrsd, tolerating an already-running service.
///
/// # Errors
///
/// When the start fails for any other reason.
pub fn start() -> Result<()> {
    if let Err(err) = exec::run("service", &["postsrsd", "start"]) {
        let already = err
            .to_string()
            .to_lowercase()
            .contains("already running");
        if !already {
            return Err(err.into());
        }
    }
    Ok(())
}

/// Restart postsrsd (plain start when it is not yet running).
///
/// # Errors
///
/// When the service manager fails.
pub fn restart() -> Result<()> {
    if is_running()? {
        exec::run("service", &["postsrsd", "restart"])?;
    } else {
        start()?;
    }
    Ok(())
}

/// Stop postsrsd.
///
/// # Errors
///
/// When the stop fails.
pub fn stop() -> Result<()> {
    exec::run("service", &["postsrsd", "stop"])?;
    Ok(())
}
