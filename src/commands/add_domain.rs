use anyhow::{bail, Result};

use crate::cli::AddDomainOpts;
use crate::system::postfix;

/// Run the add-domain command.
///
/// # Errors
///
/// Returns an error when neither a proxy file nor a proxy email is given,
/// or when the domain registration fails.
pub fn run(opts: &AddDomainOpts) -> Result<()> {
    if opts.proxy_file.is_none() && opts.proxy_email.is_none() {
        bail!("either --proxy-file or --proxy-email needs to be set");
    }

    postfix::add_domain(
        &opts.domain,
        opts.proxy_file.as_deref(),
        opts.proxy_email.as_deref(),
    )?;

    postfix::reload()
}
