//! Dialect descriptors: one immutable value per line syntax.
//!
//! A [`Dialect`] says how a key is divided from its value, which characters
//! start a comment, whether indented continuation lines extend the previous
//! value (Postfix `main.cf`), whether the file is made of tabular service
//! sections (`master.cf`), and how a `(name, value)` pair is rendered back
//! to text once modified.

/// How a key is separated from its value on a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divider {
    /// `key = val` (also `key=val`).
    Equals,
    /// `key: val`.
    Colon,
    /// `key<run of whitespace>val`.
    Whitespace,
}

impl Divider {
    /// The token used when re-rendering a modified option.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::Colon => ":",
            Self::Whitespace => " ",
        }
    }

    /// Split `text` into `(name, value)` at the first occurrence of the
    /// divider, trimming whitespace around the split point. Returns `None`
    /// when the divider is absent or the name side is empty.
    pub(crate) fn split<'a>(self, text: &'a str) -> Option<(&'a str, &'a str)> {
        let (name, val) = match self {
            Self::Equals => text.split_once('=')?,
            Self::Colon => text.split_once(':')?,
            Self::Whitespace => {
                let at = text.find(char::is_whitespace)?;
                (&text[..at], &text[at..])
            }
        };
        let name = name.trim();
        let val = val.trim_start();
        if name.is_empty() {
            return None;
        }
        Some((name, val))
    }
}

/// How a modified `(name, value)` pair is rendered back to one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// `name = val` / `name : val` — divider surrounded by single spaces.
    Spaced,
    /// `name: val` — divider flush against the name.
    TrailingSpace,
    /// `name=val` — no spacing at all.
    Tight,
    /// `name<pad>val` — name left-justified to at least the given column.
    Padded(usize),
    /// `  -o name=val` — master.cf override line.
    Override,
}

/// Immutable description of one textual config syntax.
///
/// Shared by value (`Copy`) across every [`Document`](super::Document) of a
/// format; there is no per-instance mutable state.
#[derive(Debug, Clone, Copy)]
pub struct Dialect {
    /// Key/value divider.
    pub divider: Divider,
    /// Characters that start a comment.
    pub commenters: &'static [char],
    /// Whether indented lines continue the previous option's value.
    pub continuation: bool,
    /// Whether the file is composed of tabular service sections.
    pub sections: bool,
    /// Renderer for modified options.
    pub format: ValueFormat,
}

impl Dialect {
    /// Generic `key = val` files.
    pub const EQUALS: Self = Self {
        divider: Divider::Equals,
        commenters: &['#'],
        continuation: false,
        sections: false,
        format: ValueFormat::Spaced,
    };

    /// Postfix `main.cf`: `key = val` with multi-line continuation.
    pub const POSTFIX_MAIN: Self = Self {
        continuation: true,
        ..Self::EQUALS
    };

    /// `key: val` files (Cyrus SASL `smtpd.conf`).
    pub const COLON: Self = Self {
        divider: Divider::Colon,
        commenters: &['#'],
        continuation: false,
        sections: false,
        format: ValueFormat::TrailingSpace,
    };

    /// Whitespace-padded files (`OpenDKIM` `.conf`, `SpamAssassin` `local.cf`,
    /// generated map files). Values re-render left-justified to column 24.
    pub const PADDED: Self = Self {
        divider: Divider::Whitespace,
        commenters: &['#'],
        continuation: false,
        sections: false,
        format: ValueFormat::Padded(24),
    };

    /// `key=val` with no spacing (`/etc/default/spamassassin`).
    pub const TIGHT_EQUALS: Self = Self {
        format: ValueFormat::Tight,
        ..Self::EQUALS
    };

    /// Postfix `master.cf`: tabular service sections with `-o key=val`
    /// override lines.
    pub const SERVICE: Self = Self {
        divider: Divider::Equals,
        commenters: &['#'],
        continuation: false,
        sections: true,
        format: ValueFormat::Override,
    };

    /// Render a modified `(name, value)` pair as one line of text.
    #[must_use]
    pub fn render_option(&self, name: &str, val: &str) -> String {
        let divider = self.divider.token();
        match self.format {
            ValueFormat::Spaced => format!("{name} {divider} {val}"),
            ValueFormat::TrailingSpace => format!("{name}{divider} {val}"),
            ValueFormat::Tight => format!("{name}{divider}{val}"),
            ValueFormat::Padded(col) => {
                let width = col.max(name.len() + 1);
                format!("{name:<width$}{val}")
            }
            ValueFormat::Override => format!("  -o {name}{divider}{val}"),
        }
    }

    /// Whether `c` starts a comment in this dialect.
    #[must_use]
    pub fn is_commenter(&self, c: char) -> bool {
        self.commenters.contains(&c)
    }
}
