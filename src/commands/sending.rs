use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::cli::SendOpts;
use crate::concur::entry::ServiceField;
use crate::concur::formats;
use crate::exec;
use crate::fsutil;
use crate::system::{postfix, sasl};

/// Run the configure-send command.
///
/// Provisions SASL authentication, a self-signed certificate, and the
/// `master.cf` submission service with its override stanza.
///
/// # Errors
///
/// Returns an error if a package, credential, cert, or config step fails.
pub fn run(opts: &SendOpts) -> Result<()> {
    info!("configuring Postfix to send mail");

    exec::install_packages(&["sasl2-bin", "libsasl2-modules"])?;
    sasl::set_password(&opts.smtp_username, &opts.smtp_password, &opts.mailserver)?;

    std::fs::create_dir_all("/etc/postfix/sasl")?;
    let mut smtpd = formats::SASL_SMTPD.empty();
    smtpd.update([
        ("pwcheck_method", "auxprop"),
        ("auxprop_plugin", "sasldb"),
        ("mech_list", "PLAIN LOGIN CRAM-MD5 DIGEST-MD5 NTLM"),
        ("log_level", "7"),
    ])?;
    smtpd.save()?;

    exec::upgrade_packages(&["openssl"])?;
    let subject = sasl::CertSubject {
        country: &opts.country,
        state: &opts.state,
        city: &opts.city,
        mailserver: &opts.mailserver,
    };
    let pem = sasl::generate_cert(&opts.domain, &subject)?;
    let pem_str = pem.to_string_lossy().into_owned();

    // Edit master.cf from the first-run snapshot so re-runs converge.
    let master_bak = fsutil::backup(Path::new(formats::POSTFIX_MASTER.dest_path), "bak")?;
    let mut master = formats::POSTFIX_MASTER.open_from(&master_bak)?;

    for section in master.sections_mut("smtp") {
        if section.fields().command == "smtpd" {
            section.set_field(ServiceField::Chroot, "n");
        }
    }

    if let Some(submission) = master.section_mut("submission") {
        submission.set_field(ServiceField::Chroot, "n");
        submission.update([
            ("syslog_name", "postfix/submission"),
            ("smtpd_tls_security_level", "may"),
            ("smtpd_tls_cert_file", pem_str.as_str()),
            ("smtpd_sasl_auth_enable", "yes"),
            ("smtpd_reject_unlisted_recipient", "no"),
            ("smtpd_relay_restrictions", "permit_sasl_authenticated,reject"),
            ("milter_macro_daemon_name", "ORIGINATING"),
        ]);
    }
    master.save()?;

    postfix::reload()
}
