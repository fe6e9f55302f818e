#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Integration tests for the config engine against realistic Postfix and
//! OpenDKIM file bodies: byte-preserving round-trips, the receive/send
//! provisioning edits, and convergence when the same edits run twice.

use relayctl::concur::entry::ServiceField;
use relayctl::concur::{Dialect, Document};

const MAIN_CF: &str = "\
# See /usr/share/postfix/main.cf.dist for a commented, more complete version

smtpd_banner = $myhostname ESMTP $mail_name (Ubuntu)
biff = no

# appending .domain is the MUA's job.
append_dot_mydomain = no

readme_directory = no

myhostname = localhost
alias_maps = hash:/etc/aliases
alias_database = hash:/etc/aliases
mydestination = localhost
mailbox_size_limit = 0
recipient_delimiter = +
inet_interfaces = all
";

const MASTER_CF: &str = "\
#
# Postfix master process configuration file.  For details on the format
# of the file, see the master(5) manual page.
#
smtp      inet  n       -       -       -       -       smtpd
pickup    unix  n       -       -       60      1       pickup
cleanup   unix  n       -       -       -       0       cleanup
#submission inet n       -       -       -       -       smtpd
#  -o syslog_name=postfix/submission
#  -o smtpd_tls_security_level=encrypt
#  -o smtpd_sasl_auth_enable=yes
qmgr      unix  n       -       n       300     1       qmgr
";

const OPENDKIM_CONF: &str = "\
# This is a basic configuration that can easily be adapted to suit a standard
# installation.

# Log to syslog
Syslog\t\t\tyes

Socket\t\t\tlocal:/var/run/opendkim/opendkim.sock
UMask\t\t\t002
";

#[test]
fn untouched_documents_round_trip_byte_identical() {
    for (dialect, body) in [
        (Dialect::POSTFIX_MAIN, MAIN_CF),
        (Dialect::SERVICE, MASTER_CF),
        (Dialect::PADDED, OPENDKIM_CONF),
    ] {
        let doc = Document::parse_str(dialect, body);
        assert_eq!(doc.render(), body, "parse-then-render must not rewrite anything");
    }
}

#[test]
fn receive_settings_edit_in_place_and_append() {
    let mut main = Document::parse_str(Dialect::POSTFIX_MAIN, MAIN_CF);
    main.update([
        ("myhostname", "mail.example.com"),
        ("mydomain", "example.com"),
        ("myorigin", "example.com"),
    ])
    .expect("update");

    let out = main.render();
    assert!(
        out.contains("\nmyhostname = mail.example.com\n"),
        "existing key must be rewritten in place:\n{out}"
    );
    assert!(
        !out.contains("myhostname = localhost"),
        "the old myhostname value must be gone"
    );
    assert!(
        out.ends_with("mydomain = example.com\nmyorigin = example.com\n"),
        "absent keys are appended at the end:\n{out}"
    );
    // untouched neighbours keep their bytes
    assert!(out.contains("\nsmtpd_banner = $myhostname ESMTP $mail_name (Ubuntu)\n"));
}

#[test]
fn repeated_edits_converge() {
    let edit = |body: &str| {
        let mut main = Document::parse_str(Dialect::POSTFIX_MAIN, body);
        main.update([
            ("myhostname", "mail.example.com"),
            ("mydomain", "example.com"),
            ("myorigin", "example.com"),
        ])
        .expect("update");
        main.render()
    };

    let once = edit(MAIN_CF);
    let twice = edit(&once);
    assert_eq!(once, twice, "re-running the same edit must be a no-op");
}

#[test]
fn submission_service_is_enabled_with_overrides() {
    let mut master = Document::parse_str(Dialect::SERVICE, MASTER_CF);

    for section in master.sections_mut("smtp") {
        if section.fields().command == "smtpd" {
            section.set_field(ServiceField::Chroot, "n");
        }
    }
    let submission = master
        .section_mut("submission")
        .expect("stock master.cf carries a commented submission service");
    submission.set_field(ServiceField::Chroot, "n");
    submission.update([
        ("syslog_name", "postfix/submission"),
        ("smtpd_tls_security_level", "may"),
        ("smtpd_tls_cert_file", "/etc/postfix/certs/example.com.pem"),
        ("smtpd_sasl_auth_enable", "yes"),
        ("smtpd_relay_restrictions", "permit_sasl_authenticated,reject"),
    ]);

    let expected = "\
#
# Postfix master process configuration file.  For details on the format
# of the file, see the master(5) manual page.
#
smtp      inet  n       -       n       -       -       smtpd
pickup    unix  n       -       -       60      1       pickup
cleanup   unix  n       -       -       -       0       cleanup
submission inet  n       -       n       -       -       smtpd
  -o syslog_name=postfix/submission
  -o smtpd_tls_security_level=may
  -o smtpd_sasl_auth_enable=yes
  -o smtpd_tls_cert_file=/etc/postfix/certs/example.com.pem
  -o smtpd_relay_restrictions=permit_sasl_authenticated,reject
qmgr      unix  n       -       n       300     1       qmgr
";
    assert_eq!(master.render(), expected);
}

#[test]
fn submission_edits_survive_a_reparse() {
    let mut master = Document::parse_str(Dialect::SERVICE, MASTER_CF);
    if let Some(submission) = master.section_mut("submission") {
        submission.set_field(ServiceField::Chroot, "n");
        submission.set("syslog_name", "postfix/submission");
    }
    let first = master.render();

    let mut again = Document::parse_str(Dialect::SERVICE, &first);
    if let Some(submission) = again.section_mut("submission") {
        submission.set_field(ServiceField::Chroot, "n");
        submission.set("syslog_name", "postfix/submission");
    }
    assert_eq!(again.render(), first, "re-applying to the live file must converge");
}

#[test]
fn opendkim_settings_replace_the_socket_line() {
    let mut conf = Document::parse_str(Dialect::PADDED, OPENDKIM_CONF);
    conf.update([
        ("Socket", "inet:8891@localhost"),
        ("KeyTable", "/etc/opendkim/KeyTable"),
    ])
    .expect("update");

    let out = conf.render();
    assert!(
        out.contains(&format!("{:<24}{}\n", "Socket", "inet:8891@localhost")),
        "Socket must re-render padded to column 24:\n{out}"
    );
    assert!(
        !out.contains("local:/var/run/opendkim/opendkim.sock"),
        "the old socket value must be gone"
    );
    assert!(out.contains("Syslog\t\t\tyes\n"), "untouched padded lines keep their tabs");
    assert!(out.ends_with(&format!("{:<24}{}\n", "KeyTable", "/etc/opendkim/KeyTable")));
}

#[test]
fn sasl_smtpd_config_is_built_from_scratch() {
    let mut smtpd = Document::new(Dialect::COLON);
    smtpd
        .update([
            ("pwcheck_method", "auxprop"),
            ("auxprop_plugin", "sasldb"),
            ("mech_list", "PLAIN LOGIN CRAM-MD5 DIGEST-MD5 NTLM"),
            ("log_level", "7"),
        ])
        .expect("update");

    insta::assert_snapshot!(smtpd.render().trim_end(), @r"
    pwcheck_method: auxprop
    auxprop_plugin: sasldb
    mech_list: PLAIN LOGIN CRAM-MD5 DIGEST-MD5 NTLM
    log_level: 7
    ");
}

#[test]
fn catchall_map_round_trips_through_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dest = dir.path().join("example.com");

    let mut map = relayctl::concur::formats::space_file(&dest);
    map.set("@example.com", "inbox@real.com").expect("set");
    map.save().expect("save");

    let body = std::fs::read_to_string(&dest).expect("read back");
    let reparsed = Document::parse_str(Dialect::PADDED, &body);
    assert_eq!(reparsed.get_val("@example.com"), Some("inbox@real.com"));
}

#[test]
fn alias_maps_continuation_grows_one_line_per_domain() {
    let body = "virtual_alias_domains = /etc/postfix/virtual/domains\n\
                virtual_alias_maps = hash:/etc/postfix/virtual/addresses/example.com\n";
    let mut main = Document::parse_str(Dialect::POSTFIX_MAIN, body);

    let maps = "hash:/etc/postfix/virtual/addresses/example.com,\n  \
                hash:/etc/postfix/virtual/addresses/example.org";
    main.set("virtual_alias_maps", maps).expect("set");

    let out = main.render();
    assert_eq!(
        out,
        "virtual_alias_domains = /etc/postfix/virtual/domains\n\
         virtual_alias_maps = hash:/etc/postfix/virtual/addresses/example.com,\n  \
         hash:/etc/postfix/virtual/addresses/example.org\n"
    );

    // the continued value reads back as one option
    let reparsed = Document::parse_str(Dialect::POSTFIX_MAIN, &out);
    assert_eq!(reparsed.get_val("virtual_alias_maps"), Some(maps));
}
