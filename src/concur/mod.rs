//! The structured-text configuration engine.
//!
//! Parses line-oriented system config files (Postfix `main.cf` and
//! `master.cf`, SASL `smtpd.conf`, `OpenDKIM` `.conf`, `SpamAssassin` files)
//! into an ordered, indexed [`Document`], supports targeted idempotent
//! mutation of individual keys and service sections, and re-emits text that
//! is byte-identical to the original wherever untouched.
//!
//! Layering, leaves first: [`Dialect`] (one immutable value per line
//! syntax), [`Cursor`] (pre-loaded rewindable line view), [`Entry`] (the
//! `Line`/`Option`/`Section` union), [`Document`] (entries plus name
//! indexes and the edit API), and [`formats`] (per-file bindings).

pub mod cursor;
pub mod dialect;
pub mod document;
pub mod entry;
pub mod formats;
mod parse;

pub use cursor::Cursor;
pub use dialect::{Dialect, Divider, ValueFormat};
pub use document::{Change, Document};
pub use entry::{Entry, Line, OptionEntry, Section, ServiceField, ServiceFields};
