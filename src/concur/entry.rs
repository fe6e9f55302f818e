//! Parsed units of a config file: opaque lines, options, and service sections.
//!
//! Every entry remembers the raw text it was parsed from. An entry renders
//! that raw text back byte-for-byte until something mutates it, at which
//! point the dialect formatter takes over.

use std::collections::HashMap;

use super::dialect::Dialect;

/// One parsed unit of a config file.
#[derive(Debug, Clone)]
pub enum Entry {
    /// Anything that is neither an option nor a section: comments, blanks,
    /// prose. Always rendered verbatim.
    Line(Line),
    /// A `name <divider> value` line.
    Option(OptionEntry),
    /// A `master.cf` service block: header plus nested override lines.
    Section(Section),
}

impl Entry {
    /// Render the entry, or `None` for a lazily created option that was
    /// never assigned (those exist for lookup but not in output).
    #[must_use]
    pub fn render(&self, dialect: &Dialect) -> Option<String> {
        match self {
            Self::Line(line) => Some(line.raw.clone()),
            Self::Option(opt) => opt.render(dialect),
            Self::Section(section) => Some(section.render(dialect)),
        }
    }

    /// The lookup name of this entry, if it has one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Line(_) => None,
            Self::Option(opt) => Some(&opt.name),
            Self::Section(section) => Some(&section.name),
        }
    }
}

/// An opaque, verbatim line.
#[derive(Debug, Clone)]
pub struct Line {
    /// The original text, without its terminator.
    pub raw: String,
}

impl Line {
    /// Wrap raw text as an opaque line.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

/// A `name <divider> value` entry.
///
/// `modified == false` means [`render`](Self::render) reproduces the exact
/// original substring; the structured fields are still readable.
#[derive(Debug, Clone)]
pub struct OptionEntry {
    /// Option name (never empty for a parsed or constructed option).
    pub name: String,
    val: String,
    comment: Option<String>,
    modified: bool,
    raw: String,
}

impl OptionEntry {
    /// A new option that never existed in the source; renders through the
    /// dialect formatter.
    #[must_use]
    pub fn new(name: impl Into<String>, val: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            val: val.into(),
            comment: None,
            modified: true,
            raw: String::new(),
        }
    }

    /// An option recovered from source text; renders `raw` until mutated.
    #[must_use]
    pub(crate) fn parsed(
        name: impl Into<String>,
        val: impl Into<String>,
        comment: Option<String>,
        raw: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            val: val.into(),
            comment,
            modified: false,
            raw: raw.into(),
        }
    }

    /// A placeholder created by a lookup on a missing key. Registered in the
    /// document index but invisible in output until a value is assigned.
    #[must_use]
    pub(crate) fn vivified(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            val: String::new(),
            comment: None,
            modified: false,
            raw: String::new(),
        }
    }

    /// Current value. For a continued `main.cf` option this spans physical
    /// lines, embedded `\n` included.
    #[must_use]
    pub fn val(&self) -> &str {
        &self.val
    }

    /// Inline comment, if one followed the value in the source.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Whether the entry will re-render through the dialect formatter.
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    /// Assign a value and mark the entry modified.
    pub fn set_val(&mut self, val: impl Into<String>) {
        self.val = val.into();
        self.modified = true;
    }

    /// Replace the inline comment and mark the entry modified.
    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = Some(comment.into());
        self.modified = true;
    }

    /// Extend both value and raw text with a continuation line.
    pub(crate) fn absorb_continuation(&mut self, line: &str) {
        self.val.push('\n');
        self.val.push_str(line);
        self.raw.push('\n');
        self.raw.push_str(line);
    }

    fn render(&self, dialect: &Dialect) -> Option<String> {
        if !self.modified {
            if self.raw.is_empty() {
                // Vivified but never assigned.
                return None;
            }
            return Some(self.raw.clone());
        }
        let mut s = dialect.render_option(&self.name, &self.val);
        if let Some(comment) = &self.comment {
            let marker = dialect.commenters.first().copied().unwrap_or('#');
            s.push(' ');
            s.push(marker);
            s.push(' ');
            s.push_str(comment);
        }
        Some(s)
    }
}

/// The seven fixed columns of a `master.cf` service header, after the name.
#[derive(Debug, Clone, Default)]
pub struct ServiceFields {
    /// Transport type (`inet`, `unix`, `fifo`, `pass`).
    pub service_type: String,
    /// Private column (`y`/`n`/`-`).
    pub private: String,
    /// Unprivileged column.
    pub unpriv: String,
    /// Chroot column.
    pub chroot: String,
    /// Wakeup interval.
    pub wakeup: String,
    /// Process limit.
    pub maxproc: String,
    /// Command and its arguments.
    pub command: String,
}

/// Selector for one of the seven fixed service fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceField {
    /// Transport type column.
    Type,
    /// Private column.
    Private,
    /// Unprivileged column.
    Unpriv,
    /// Chroot column.
    Chroot,
    /// Wakeup column.
    Wakeup,
    /// Process-limit column.
    Maxproc,
    /// Command column.
    Command,
}

/// A named `master.cf` service block: one header line plus zero or more
/// nested override options and opaque lines, with its own name index.
#[derive(Debug, Clone)]
pub struct Section {
    /// Service name (comment marker stripped if the block was commented out).
    pub name: String,
    fields: ServiceFields,
    children: Vec<Entry>,
    child_index: HashMap<String, Vec<usize>>,
    modified: bool,
    raw_header: String,
}

impl Section {
    /// A section recovered from source text.
    #[must_use]
    pub(crate) fn parsed(
        name: impl Into<String>,
        fields: ServiceFields,
        raw_header: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            fields,
            children: Vec::new(),
            child_index: HashMap::new(),
            modified: false,
            raw_header: raw_header.into(),
        }
    }

    /// Read access to the fixed fields.
    #[must_use]
    pub const fn fields(&self) -> &ServiceFields {
        &self.fields
    }

    /// Whether the header will re-render with the fixed column layout.
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    /// Set one fixed field and mark the header modified.
    pub fn set_field(&mut self, field: ServiceField, val: impl Into<String>) {
        let slot = match field {
            ServiceField::Type => &mut self.fields.service_type,
            ServiceField::Private => &mut self.fields.private,
            ServiceField::Unpriv => &mut self.fields.unpriv,
            ServiceField::Chroot => &mut self.fields.chroot,
            ServiceField::Wakeup => &mut self.fields.wakeup,
            ServiceField::Maxproc => &mut self.fields.maxproc,
            ServiceField::Command => &mut self.fields.command,
        };
        *slot = val.into();
        self.modified = true;
    }

    /// Nested entries, in file order.
    #[must_use]
    pub fn children(&self) -> &[Entry] {
        &self.children
    }

    /// Whether a nested option with this name exists.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.child_index.contains_key(name)
    }

    /// All nested options registered under `name`, in file order.
    #[must_use]
    pub fn get(&self, name: &str) -> Vec<&OptionEntry> {
        let Some(positions) = self.child_index.get(name) else {
            return Vec::new();
        };
        positions
            .iter()
            .filter_map(|&p| match self.children.get(p) {
                Some(Entry::Option(opt)) => Some(opt),
                _ => None,
            })
            .collect()
    }

    /// Value of the first nested option named `name`.
    #[must_use]
    pub fn get_val(&self, name: &str) -> Option<&str> {
        self.get(name).first().map(|opt| opt.val())
    }

    /// Set a nested override option, broadcasting over duplicates and
    /// appending a new `-o` line when the name is absent.
    pub fn set(&mut self, name: &str, val: &str) {
        if let Some(positions) = self.child_index.get(name) {
            for &p in positions.clone().iter() {
                if let Some(Entry::Option(opt)) = self.children.get_mut(p) {
                    opt.set_val(val);
                }
            }
            return;
        }
        self.push_option(OptionEntry::new(name, val));
    }

    /// Apply `set` for each pair, in order.
    pub fn update<'a, I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (name, val) in pairs {
            self.set(name, val);
        }
    }

    /// Append a nested option and register it in the child index.
    pub(crate) fn push_option(&mut self, opt: OptionEntry) {
        let pos = self.children.len();
        self.child_index.entry(opt.name.clone()).or_default().push(pos);
        self.children.push(Entry::Option(opt));
    }

    /// Append a nested opaque line.
    pub(crate) fn push_line(&mut self, raw: impl Into<String>) {
        self.children.push(Entry::Line(Line::new(raw)));
    }

    fn render_header(&self) -> String {
        if !self.modified {
            return self.raw_header.clone();
        }
        let f = &self.fields;
        // name ljust max(10, len+1), then the fixed master.cf columns
        let name_width = 10usize.max(self.name.len() + 1);
        format!(
            "{:<nw$}{:<6}{:<8}{:<8}{:<8}{:<8}{:<8}{}",
            self.name,
            f.service_type,
            f.private,
            f.unpriv,
            f.chroot,
            f.wakeup,
            f.maxproc,
            f.command,
            nw = name_width,
        )
    }

    fn render(&self, dialect: &Dialect) -> String {
        let mut out = self.render_header();
        for child in &self.children {
            if let Some(text) = child.render(dialect) {
                out.push('\n');
                out.push_str(&text);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmodified_option_renders_raw() {
        let opt = OptionEntry::parsed("foo", "bar", None, "foo   =  bar  ");
        assert_eq!(
            opt.render(&Dialect::EQUALS).as_deref(),
            Some("foo   =  bar  "),
            "untouched entries must reproduce their original bytes"
        );
    }

    #[test]
    fn modified_option_renders_through_dialect() {
        let mut opt = OptionEntry::parsed("foo", "bar", None, "foo   =  bar");
        opt.set_val("baz");
        assert_eq!(opt.render(&Dialect::EQUALS).as_deref(), Some("foo = baz"));
    }

    #[test]
    fn modified_option_keeps_inline_comment() {
        let mut opt = OptionEntry::parsed("foo", "bar", Some("why".to_owned()), "foo = bar # why");
        opt.set_val("baz");
        assert_eq!(opt.render(&Dialect::EQUALS).as_deref(), Some("foo = baz # why"));
    }

    #[test]
    fn vivified_option_renders_nothing_until_assigned() {
        let mut opt = OptionEntry::vivified("bar");
        assert_eq!(opt.render(&Dialect::EQUALS), None);
        opt.set_val("2");
        assert_eq!(opt.render(&Dialect::EQUALS).as_deref(), Some("bar = 2"));
    }

    #[test]
    fn section_header_fixed_columns() {
        let mut section = Section::parsed(
            "smtp",
            ServiceFields {
                service_type: "inet".into(),
                private: "n".into(),
                unpriv: "-".into(),
                chroot: "-".into(),
                wakeup: "-".into(),
                maxproc: "-".into(),
                command: "smtpd".into(),
            },
            "smtp      inet  n       -       -       -       -       smtpd",
        );
        section.set_field(ServiceField::Chroot, "n");
        assert_eq!(
            section.render(&Dialect::SERVICE),
            "smtp      inet  n       -       n       -       -       smtpd"
        );
    }

    #[test]
    fn section_header_long_name_gets_single_space() {
        let mut section = Section::parsed(
            "averylongservicename",
            ServiceFields {
                service_type: "unix".into(),
                private: "-".into(),
                unpriv: "-".into(),
                chroot: "n".into(),
                wakeup: "-".into(),
                maxproc: "-".into(),
                command: "pipe".into(),
            },
            "irrelevant",
        );
        section.set_field(ServiceField::Chroot, "y");
        let line = section.render(&Dialect::SERVICE);
        assert!(
            line.starts_with("averylongservicename unix"),
            "long names pad to len+1: {line}"
        );
    }

    #[test]
    fn section_set_appends_override_when_missing() {
        let mut section = Section::parsed("submission", ServiceFields::default(), "hdr");
        section.set("syslog_name", "postfix/submission");
        assert_eq!(section.get_val("syslog_name"), Some("postfix/submission"));
        let rendered = section.render(&Dialect::SERVICE);
        assert!(rendered.ends_with("\n  -o syslog_name=postfix/submission"));
    }

    #[test]
    fn section_set_broadcasts_over_duplicate_children() {
        let mut section = Section::parsed("relay", ServiceFields::default(), "hdr");
        section.push_option(OptionEntry::parsed("k", "1", None, "  -o k=1"));
        section.push_line("# note");
        section.push_option(OptionEntry::parsed("k", "2", None, "  -o k=2"));
        section.set("k", "3");
        let values: Vec<&str> = section.get("k").iter().map(|o| o.val()).collect();
        assert_eq!(values, ["3", "3"], "every duplicate child is updated");
    }
}
