//! Subcommand orchestration. One module per subcommand, each exposing
//! `run(...) -> Result<()>`.

pub mod add_domain;
pub mod dkim;
pub mod install;
pub mod lockdown;
pub mod receiving;
pub mod sending;
pub mod setup;
pub mod srs;
