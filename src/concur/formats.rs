//! Per-file format bindings: one dialect plus the conventional destination
//! path, for each config file this tool touches. Paths are the Debian/Ubuntu
//! locations.

use std::path::{Path, PathBuf};

use crate::error::ConcurError;

use super::dialect::Dialect;
use super::document::Document;

/// A concrete file format: dialect plus default destination.
#[derive(Debug, Clone, Copy)]
pub struct Format {
    /// The line syntax of this file.
    pub dialect: Dialect,
    /// Where the file conventionally lives.
    pub dest_path: &'static str,
}

impl Format {
    const fn new(dialect: Dialect, dest_path: &'static str) -> Self {
        Self { dialect, dest_path }
    }

    /// Parse the live destination file as the prototype (additive edits).
    ///
    /// # Errors
    ///
    /// The underlying I/O error when the live file cannot be read.
    pub fn open(&self) -> Result<Document, ConcurError> {
        Ok(Document::load(self.dialect, Path::new(self.dest_path))?.with_dest(self.dest_path))
    }

    /// Parse an explicit prototype (typically a `.bak` snapshot), keeping
    /// the conventional destination for `save`.
    ///
    /// # Errors
    ///
    /// The underlying I/O error when the prototype cannot be read.
    pub fn open_from(&self, prototype: &Path) -> Result<Document, ConcurError> {
        Ok(Document::load(self.dialect, prototype)?.with_dest(self.dest_path))
    }

    /// An empty document targeting the conventional destination.
    #[must_use]
    pub fn empty(&self) -> Document {
        Document::new(self.dialect).with_dest(self.dest_path)
    }

    /// Parse an in-memory body, keeping the conventional destination.
    #[must_use]
    pub fn parse(&self, body: &str) -> Document {
        Document::parse_str(self.dialect, body).with_dest(self.dest_path)
    }
}

/// Postfix `main.cf`: equals dialect with multi-line continuation.
pub const POSTFIX_MAIN: Format = Format::new(Dialect::POSTFIX_MAIN, "/etc/postfix/main.cf");

/// Postfix `master.cf`: tabular service sections.
pub const POSTFIX_MASTER: Format = Format::new(Dialect::SERVICE, "/etc/postfix/master.cf");

/// Cyrus SASL smtpd configuration: colon dialect.
pub const SASL_SMTPD: Format = Format::new(Dialect::COLON, "/etc/postfix/sasl/smtpd.conf");

/// `OpenDKIM` configuration: whitespace-padded dialect.
pub const OPENDKIM: Format = Format::new(Dialect::PADDED, "/etc/opendkim.conf");

/// `SpamAssassin` service defaults: tight `key=val` dialect.
pub const SPAMASSASSIN_DEFAULTS: Format =
    Format::new(Dialect::TIGHT_EQUALS, "/etc/default/spamassassin");

/// `SpamAssassin` rule tuning: whitespace-padded dialect.
pub const SPAMASSASSIN_LOCAL: Format = Format::new(Dialect::PADDED, "/etc/spamassassin/local.cf");

/// An ad-hoc padded-space document for a generated map file (catchall
/// address maps, `helo.regexp`).
#[must_use]
pub fn space_file(dest: impl Into<PathBuf>) -> Document {
    Document::new(Dialect::PADDED).with_dest(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn open_from_missing_prototype_is_an_io_error() {
        let err = POSTFIX_MAIN
            .open_from(Path::new("/nonexistent/main.cf"))
            .expect_err("missing prototype must fail");
        assert!(matches!(err, ConcurError::Read { .. }), "unexpected error: {err}");
    }

    #[test]
    fn open_from_uses_prototype_but_keeps_default_dest() {
        let mut proto = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(proto, "myhostname = mail.example.com").expect("write");
        let doc = POSTFIX_MAIN.open_from(proto.path()).expect("parse");
        assert_eq!(doc.get_val("myhostname"), Some("mail.example.com"));
        assert_eq!(
            doc.dest_path().and_then(Path::to_str),
            Some("/etc/postfix/main.cf")
        );
        assert_eq!(doc.prototype_path(), Some(proto.path()));
    }

    #[test]
    fn save_overwrites_prototype_in_place() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("main.cf");
        std::fs::write(&path, "a = 1\nb = 2\n").expect("seed");

        let mut doc = Document::load(Dialect::POSTFIX_MAIN, &path)
            .expect("parse")
            .with_dest(&path);
        doc.set("a", "9").expect("set");
        doc.save().expect("save");

        assert_eq!(
            std::fs::read_to_string(&path).expect("read back"),
            "a = 9\nb = 2\n",
            "overwrite-in-place must keep untouched lines byte-identical"
        );
    }
}
