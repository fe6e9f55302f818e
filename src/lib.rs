//! Mail relay provisioning engine.
//!
//! Turns a stock Debian host into a Postfix relay: virtual domains with
//! catchall forwarding, authenticated submission over SASL and TLS, DKIM
//! signing, SRS rewriting for forwarded mail, and anti-spam lockdown.
//!
//! The public API is organised into three layers:
//!
//! - **[`concur`]** — parse, edit, and re-emit system config files with
//!   byte-preserving round-trips
//! - **[`system`]** — per-service primitives (Postfix, `OpenDKIM`, SASL, SRS)
//! - **[`commands`]** — top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod concur;
pub mod error;
pub mod exec;
pub mod fsutil;
pub mod logging;
pub mod system;
