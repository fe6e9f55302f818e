//! Domain-specific error types.
//!
//! Internal modules return typed errors ([`ConcurError`], [`RunError`])
//! while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from the configuration engine.
///
/// The engine never errors on unclassifiable text (that becomes an opaque
/// line by design); the only user-facing construction error is a scalar
/// write targeting a section name.
#[derive(Error, Debug)]
pub enum ConcurError {
    /// A scalar `set` targeted a name that resolves to a service section.
    /// Sections may only be edited through their own accessors.
    #[error("cannot assign a scalar value to section '{name}'")]
    InvalidAssignment {
        /// The section name that was targeted.
        name: String,
    },

    /// A prototype file could not be read.
    #[error("reading {path}: {source}")]
    Read {
        /// Path of the prototype.
        path: PathBuf,
        /// Underlying I/O error, untranslated.
        source: io::Error,
    },

    /// A destination file could not be written.
    #[error("writing {path}: {source}")]
    Write {
        /// Path of the destination.
        path: PathBuf,
        /// Underlying I/O error, untranslated.
        source: io::Error,
    },

    /// `save()` was called on a document with no destination configured.
    #[error("document has no destination path")]
    NoDestination,
}

/// Classification of a failed shell command by exit-code convention.
///
/// The orchestration layer branches on this to decide retry versus fatal
/// abort (e.g. `start` instead of `restart` on a not-yet-running service).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    /// Exit code 1: general failure.
    General,
    /// Exit code 2: shell misuse.
    Misuse,
    /// Exit code 126: found but not executable.
    PermissionDenied,
    /// Exit code 127: binary not found.
    MissingBinary,
    /// Exit code 128: bad argument to exit.
    BadArgument,
    /// Exit code 130: terminated by Ctrl-C.
    Terminated,
    /// Anything else (including signals with no code).
    Other,
}

impl ExitKind {
    /// Classify a raw exit code.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::General,
            2 => Self::Misuse,
            126 => Self::PermissionDenied,
            127 => Self::MissingBinary,
            128 => Self::BadArgument,
            130 => Self::Terminated,
            _ => Self::Other,
        }
    }
}

/// Errors from running external commands.
#[derive(Error, Debug)]
pub enum RunError {
    /// The process could not be spawned at all.
    #[error("failed to execute `{command}`: {source}")]
    Spawn {
        /// The command line that failed to start.
        command: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The process ran and exited non-zero.
    #[error("`{command}` exited with code {code}: {output}")]
    Failed {
        /// The command line that failed.
        command: String,
        /// Exit code (or -1 when killed by a signal).
        code: i32,
        /// Combined trimmed output.
        output: String,
    },
}

impl RunError {
    /// Exit-code classification for branching callers.
    #[must_use]
    pub const fn kind(&self) -> ExitKind {
        match self {
            Self::Spawn { .. } => ExitKind::MissingBinary,
            Self::Failed { code, .. } => ExitKind::from_code(*code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_assignment_display() {
        let e = ConcurError::InvalidAssignment {
            name: "smtp".to_owned(),
        };
        assert_eq!(e.to_string(), "cannot assign a scalar value to section 'smtp'");
    }

    #[test]
    fn read_error_has_source() {
        use std::error::Error as _;
        let e = ConcurError::Read {
            path: PathBuf::from("/etc/postfix/main.cf"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(e.source().is_some(), "underlying I/O error must be preserved");
        assert!(e.to_string().contains("/etc/postfix/main.cf"));
    }

    #[test]
    fn exit_kind_table() {
        assert_eq!(ExitKind::from_code(1), ExitKind::General);
        assert_eq!(ExitKind::from_code(2), ExitKind::Misuse);
        assert_eq!(ExitKind::from_code(126), ExitKind::PermissionDenied);
        assert_eq!(ExitKind::from_code(127), ExitKind::MissingBinary);
        assert_eq!(ExitKind::from_code(128), ExitKind::BadArgument);
        assert_eq!(ExitKind::from_code(130), ExitKind::Terminated);
        assert_eq!(ExitKind::from_code(42), ExitKind::Other);
    }

    #[test]
    fn run_error_kind_classifies_failed() {
        let e = RunError::Failed {
            command: "postfix status".to_owned(),
            code: 1,
            output: "the Postfix mail system is not running".to_owned(),
        };
        assert_eq!(e.kind(), ExitKind::General);
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConcurError>();
        assert_send_sync::<RunError>();
    }

    #[test]
    fn errors_convert_to_anyhow() {
        let _read: anyhow::Error = ConcurError::NoDestination.into();
        let _run: anyhow::Error = RunError::Failed {
            command: "x".to_owned(),
            code: 2,
            output: String::new(),
        }
        .into();
    }
}
