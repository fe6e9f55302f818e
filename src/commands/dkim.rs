use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::concur::formats;
use crate::exec;
use crate::fsutil;
use crate::system::{dkim, net, postfix};

/// Run the configure-dkim command.
///
/// Installs `OpenDKIM`, wires it to Postfix over the milter socket, and
/// provisions signing keys for every registered domain. The DNS records the
/// operator must publish are printed at the end.
///
/// # Errors
///
/// Returns an error if a package, key, or config step fails.
pub fn run() -> Result<()> {
    info!("configuring Postfix to use DKIM");

    exec::install_packages(&["opendkim", "opendkim-tools"])?;

    std::fs::create_dir_all(dkim::KEYS_DIR)?;

    let mut hosts = vec![
        "127.0.0.1".to_owned(),
        "::1".to_owned(),
        "localhost".to_owned(),
        "192.168.0.1/24".to_owned(),
    ];
    if let Some(ip) = net::external_ip() {
        hosts.push(ip);
    }
    let mut trusted = hosts.join("\n");
    trusted.push('\n');
    fsutil::write(Path::new(dkim::TRUSTED_HOSTS), &trusted)?;

    // Edit opendkim.conf from the first-run snapshot so re-runs converge.
    let config_bak = fsutil::backup(Path::new(formats::OPENDKIM.dest_path), "bak")?;
    let mut config = formats::OPENDKIM.open_from(&config_bak)?;
    config.update([
        ("Canonicalization", "relaxed/simple"),
        ("Mode", "sv"),
        ("SubDomains", "yes"),
        ("Syslog", "yes"),
        ("LogWhy", "yes"),
        ("UMask", "022"),
        ("UserID", "opendkim:opendkim"),
        ("KeyTable", dkim::KEY_TABLE),
        ("SigningTable", dkim::SIGNING_TABLE),
        ("ExternalIgnoreList", dkim::TRUSTED_HOSTS),
        ("InternalHosts", dkim::TRUSTED_HOSTS),
        ("Socket", "inet:8891@localhost"),
    ])?;
    config.save()?;

    let mut main = formats::POSTFIX_MAIN.open()?;
    main.update([
        ("milter_default_action", "accept"),
        ("milter_protocol", "6"),
        ("smtpd_milters", "inet:localhost:8891"),
        ("non_smtpd_milters", "inet:localhost:8891"),
    ])?;
    main.save()?;

    for domain in postfix::domains()? {
        dkim::add_domain(&domain, false)?;
        let record = dkim::dns_record(&domain)?;
        info!(domain, "publish DNS TXT record");
        println!("DNS TXT record for {domain}");
        println!("  name:  {}", record.name);
        println!("  value: {}", record.value);
    }

    postfix::reload()?;
    dkim::reload()
}
