//! Service-specific provisioning layers.
//!
//! Each module owns the paths and shell invocations for one service;
//! the command handlers in [`crate::commands`] sequence them.

pub mod dkim;
pub mod net;
pub mod postfix;
pub mod sasl;
pub mod srs;
