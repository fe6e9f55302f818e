use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::cli::RecvOpts;
use crate::concur::formats;
use crate::fsutil;
use crate::system::postfix;

/// Run the configure-recv command.
///
/// Points Postfix at the domain, registers the initial virtual domain, and
/// snapshots `master.cf` so later commands have a pristine prototype.
///
/// # Errors
///
/// Returns an error if a config edit, file step, or reload fails.
pub fn run(opts: &RecvOpts) -> Result<()> {
    info!("configuring Postfix to receive mail");

    let mut main = formats::POSTFIX_MAIN.open()?;
    main.update([
        ("myhostname", opts.mailserver.as_str()),
        ("mydomain", opts.domain.as_str()),
        ("myorigin", opts.domain.as_str()),
    ])?;
    main.save()?;

    postfix::add_domain(
        &opts.domain,
        opts.proxy_file.as_deref(),
        opts.proxy_email.as_deref(),
    )?;

    fsutil::backup(Path::new(formats::POSTFIX_MASTER.dest_path), "bak")?;

    postfix::reload()
}
