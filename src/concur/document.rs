//! The in-memory, ordered, indexed representation of one config file.
//!
//! A [`Document`] owns a sequence of entries plus two name→positions lookup
//! tables (top-level options and sections). Positions are kept in ascending
//! order; every insertion shifts the tables before registering the new
//! entry, which is the invariant the whole edit API rests on.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ConcurError;

use super::cursor::Cursor;
use super::dialect::Dialect;
use super::entry::{Entry, Line, OptionEntry, Section};
use super::parse;

/// One change applied by [`Document::update`].
#[derive(Debug, Clone)]
pub enum Change {
    /// Set (or create) an option.
    Set {
        /// Option name.
        name: String,
        /// New value.
        val: String,
    },
    /// Append a literal line verbatim (free-text blocks, override stanzas).
    Raw(String),
}

impl Change {
    /// A set-value change.
    #[must_use]
    pub fn set(name: impl Into<String>, val: impl Into<String>) -> Self {
        Self::Set {
            name: name.into(),
            val: val.into(),
        }
    }

    /// A verbatim-line change.
    #[must_use]
    pub fn raw(line: impl Into<String>) -> Self {
        Self::Raw(line.into())
    }
}

impl<N: Into<String>, V: Into<String>> From<(N, V)> for Change {
    fn from((name, val): (N, V)) -> Self {
        Self::set(name, val)
    }
}

/// An ordered, indexed, editable config file.
#[derive(Debug, Clone)]
pub struct Document {
    dialect: Dialect,
    entries: Vec<Entry>,
    options: HashMap<String, Vec<usize>>,
    sections: HashMap<String, Vec<usize>>,
    dest_path: Option<PathBuf>,
    prototype_path: Option<PathBuf>,
}

impl Document {
    /// An empty document with no backing text (building a file from scratch).
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            entries: Vec::new(),
            options: HashMap::new(),
            sections: HashMap::new(),
            dest_path: None,
            prototype_path: None,
        }
    }

    /// Parse a document from an in-memory body.
    #[must_use]
    pub fn parse_str(dialect: Dialect, body: &str) -> Self {
        let mut doc = Self::new(dialect);
        let mut cursor = Cursor::new(body);
        for entry in parse::classify_all(&dialect, &mut cursor) {
            doc.push(entry);
        }
        doc
    }

    /// Parse a document from a prototype file. Reading is side-effect-free.
    ///
    /// # Errors
    ///
    /// [`ConcurError::Read`] when the prototype is missing or unreadable.
    pub fn load(dialect: Dialect, prototype: &Path) -> Result<Self, ConcurError> {
        let cursor = Cursor::from_path(prototype).map_err(|source| ConcurError::Read {
            path: prototype.to_path_buf(),
            source,
        })?;
        let mut cursor = cursor;
        let mut doc = Self::new(dialect);
        for entry in parse::classify_all(&dialect, &mut cursor) {
            doc.push(entry);
        }
        doc.prototype_path = Some(prototype.to_path_buf());
        Ok(doc)
    }

    /// Set the destination path used by [`save`](Self::save).
    #[must_use]
    pub fn with_dest(mut self, dest: impl Into<PathBuf>) -> Self {
        self.dest_path = Some(dest.into());
        self
    }

    /// Destination path, if configured.
    #[must_use]
    pub fn dest_path(&self) -> Option<&Path> {
        self.dest_path.as_deref()
    }

    /// Prototype path this document was parsed from, if any.
    #[must_use]
    pub fn prototype_path(&self) -> Option<&Path> {
        self.prototype_path.as_deref()
    }

    /// The dialect this document speaks.
    #[must_use]
    pub const fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Entries in file order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Whether `name` is registered as a top-level option or section.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.options.contains_key(name) || self.sections.contains_key(name)
    }

    /// All entries registered under `name`, in file order. Read-only: a
    /// missing name yields an empty vec, nothing is created.
    #[must_use]
    pub fn get(&self, name: &str) -> Vec<&Entry> {
        let positions = self
            .sections
            .get(name)
            .or_else(|| self.options.get(name));
        let Some(positions) = positions else {
            return Vec::new();
        };
        positions.iter().filter_map(|&p| self.entries.get(p)).collect()
    }

    /// Value of the first option named `name`, if present.
    #[must_use]
    pub fn get_val(&self, name: &str) -> Option<&str> {
        self.options.get(name).and_then(|positions| {
            positions.iter().find_map(|&p| match self.entries.get(p) {
                Some(Entry::Option(opt)) => Some(opt.val()),
                _ => None,
            })
        })
    }

    /// The first option named `name`, creating an empty unmodified one at
    /// the end of the document when absent.
    ///
    /// The lazily created entry is registered for lookup but skipped by the
    /// serializer until a value is assigned, so reading a missing key leaves
    /// the saved output unchanged.
    ///
    /// # Panics
    ///
    /// Never in practice: every position registered in the option table
    /// points at an option entry.
    pub fn resolve_or_create(&mut self, name: &str) -> &mut OptionEntry {
        if !self.options.contains_key(name) {
            let pos = self.entries.len();
            self.entries.push(Entry::Option(OptionEntry::vivified(name)));
            self.options.entry(name.to_owned()).or_default().push(pos);
        }
        // Registered positions always point at options; take the first.
        let pos = self
            .options
            .get(name)
            .and_then(|positions| positions.first().copied())
            .unwrap_or_default();
        match self.entries.get_mut(pos) {
            Some(Entry::Option(opt)) => opt,
            _ => unreachable!("option index desynchronized for {name}"),
        }
    }

    /// Set an option value, broadcasting over every entry registered under
    /// `name` and creating the option at the end when absent.
    ///
    /// # Errors
    ///
    /// [`ConcurError::InvalidAssignment`] when `name` resolves to a section;
    /// sections may only be edited through their own accessors, never
    /// overwritten by a scalar. The document is left unchanged.
    pub fn set(&mut self, name: &str, val: &str) -> Result<(), ConcurError> {
        if self.sections.contains_key(name) {
            return Err(ConcurError::InvalidAssignment {
                name: name.to_owned(),
            });
        }
        if let Some(positions) = self.options.get(name) {
            for p in positions.clone() {
                if let Some(Entry::Option(opt)) = self.entries.get_mut(p) {
                    opt.set_val(val);
                }
            }
            return Ok(());
        }
        self.resolve_or_create(name).set_val(val);
        Ok(())
    }

    /// Apply a sequence of changes in order: value sets via
    /// [`set`](Self::set), raw lines appended verbatim at the end.
    ///
    /// # Errors
    ///
    /// Propagates [`ConcurError::InvalidAssignment`] from the first failing
    /// set; earlier changes stay applied.
    pub fn update<I>(&mut self, changes: I) -> Result<(), ConcurError>
    where
        I: IntoIterator,
        I::Item: Into<Change>,
    {
        for change in changes {
            match change.into() {
                Change::Set { name, val } => self.set(&name, &val)?,
                Change::Raw(line) => self.entries.push(Entry::Line(Line::new(line))),
            }
        }
        Ok(())
    }

    /// Insert an entry at `position`, shifting every registered position at
    /// or past it by one *before* registering the new entry — the shift must
    /// come first or the fresh registration would be corrupted by it.
    pub fn insert(&mut self, position: usize, entry: Entry) {
        let position = position.min(self.entries.len());
        self.shift_indexes_from(position);
        let registered_name = entry.name().map(str::to_owned);
        let is_section = matches!(entry, Entry::Section(_));
        self.entries.insert(position, entry);
        if let Some(name) = registered_name {
            let table = if is_section {
                &mut self.sections
            } else {
                &mut self.options
            };
            let positions = table.entry(name).or_default();
            let at = positions.partition_point(|&p| p < position);
            positions.insert(at, position);
        }
    }

    /// Update keys in place where they exist; insert absent keys immediately
    /// before the earliest line registered under `anchor`. Without an anchor
    /// this degrades to a plain ordered update (appended at the end).
    ///
    /// # Errors
    ///
    /// Propagates [`ConcurError::InvalidAssignment`] when a pair targets a
    /// section name.
    pub fn update_before<'a, I>(&mut self, anchor: &str, pairs: I) -> Result<(), ConcurError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (name, val) in pairs {
            if self.sections.contains_key(name) {
                return Err(ConcurError::InvalidAssignment {
                    name: name.to_owned(),
                });
            }
            // The anchor's earliest position moves as entries go in, so
            // resolve it fresh for every pair.
            match self.min_position(anchor) {
                Some(at) if !self.has(name) => {
                    self.insert(at, Entry::Option(OptionEntry::new(name, val)));
                }
                _ => self.set(name, val)?,
            }
        }
        Ok(())
    }

    /// First section named `name`, if any.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name).and_then(|positions| {
            positions.iter().find_map(|&p| match self.entries.get(p) {
                Some(Entry::Section(section)) => Some(section),
                _ => None,
            })
        })
    }

    /// First section named `name`, mutably.
    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.entries.iter_mut().find_map(|entry| match entry {
            Entry::Section(section) if section.name == name => Some(section),
            _ => None,
        })
    }

    /// Every section named `name`, in file order (legitimately repeated
    /// service names, e.g. two `smtp` transports).
    #[must_use]
    pub fn sections(&self, name: &str) -> Vec<&Section> {
        self.get(name)
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Section(section) => Some(section),
                _ => None,
            })
            .collect()
    }

    /// Mutable iterator over every section named `name`, in file order.
    pub fn sections_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Section> {
        self.entries.iter_mut().filter_map(move |entry| match entry {
            Entry::Section(section) if section.name == name => Some(section),
            _ => None,
        })
    }

    /// Serialize the document: unmodified entries emit their original bytes,
    /// modified ones render through the dialect. One `\n` after every line.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            if let Some(text) = entry.render(&self.dialect) {
                out.push_str(&text);
                out.push('\n');
            }
        }
        out
    }

    /// Write the document to its destination path. Safe to target the same
    /// path the document was parsed from (overwrite-in-place).
    ///
    /// # Errors
    ///
    /// [`ConcurError::NoDestination`] when no destination is configured,
    /// otherwise the underlying I/O error.
    pub fn save(&self) -> Result<(), ConcurError> {
        let Some(dest) = self.dest_path.as_deref() else {
            return Err(ConcurError::NoDestination);
        };
        self.save_to(dest)
    }

    /// Write the document to an explicit path.
    ///
    /// # Errors
    ///
    /// The underlying I/O error, untranslated.
    pub fn save_to(&self, dest: &Path) -> Result<(), ConcurError> {
        std::fs::write(dest, self.render()).map_err(|source| ConcurError::Write {
            path: dest.to_path_buf(),
            source,
        })
    }

    /// Append a parsed entry, registering it in the lookup tables.
    fn push(&mut self, entry: Entry) {
        let pos = self.entries.len();
        match &entry {
            Entry::Option(opt) => {
                self.options.entry(opt.name.clone()).or_default().push(pos);
            }
            Entry::Section(section) => {
                self.sections
                    .entry(section.name.clone())
                    .or_default()
                    .push(pos);
            }
            Entry::Line(_) => {}
        }
        self.entries.push(entry);
    }

    fn shift_indexes_from(&mut self, position: usize) {
        for positions in self.options.values_mut().chain(self.sections.values_mut()) {
            for p in positions.iter_mut() {
                if *p >= position {
                    *p += 1;
                }
            }
        }
    }

    fn min_position(&self, name: &str) -> Option<usize> {
        let opt = self
            .options
            .get(name)
            .and_then(|positions| positions.first().copied());
        let sec = self
            .sections
            .get(name)
            .and_then(|positions| positions.first().copied());
        match (opt, sec) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}
