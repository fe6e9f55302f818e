use anyhow::Result;
use tracing::info;

use crate::concur::formats;
use crate::system::{postfix, srs};

/// Run the configure-srs command.
///
/// Builds postsrsd and routes envelope rewriting through its TCP lookup
/// sockets.
///
/// # Errors
///
/// Returns an error if the build or a config step fails.
pub fn run() -> Result<()> {
    info!("configuring Postfix to use SRS");

    srs::install()?;

    let mut main = formats::POSTFIX_MAIN.open()?;
    main.update([
        ("sender_canonical_maps", "tcp:localhost:10001"),
        ("sender_canonical_classes", "envelope_sender"),
        ("recipient_canonical_maps", "tcp:localhost:10002"),
        ("recipient_canonical_classes", "envelope_recipient,header_recipient"),
    ])?;
    main.save()?;

    srs::restart()?;
    postfix::reload()
}
