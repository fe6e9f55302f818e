use anyhow::{bail, Result};
use clap::{CommandFactory as _, Parser as _};

use relayctl::cli::{Cli, Command};
use relayctl::{commands, logging};

/// Whether a subcommand rewrites system state (everything but completion).
const fn is_mutating(command: &Command) -> bool {
    !matches!(command, Command::Completion(_))
}

fn main() -> Result<()> {
    let args = Cli::parse();
    logging::init(args.verbose);

    if is_mutating(&args.command) && std::env::var("USER").as_deref() != Ok("root") {
        bail!("user is not root, re-run command with sudo");
    }

    match args.command {
        Command::Setup(opts) => commands::setup::run(&opts),
        Command::Install => commands::install::run(),
        Command::ConfigureRecv(opts) => commands::receiving::run(&opts),
        Command::ConfigureSend(opts) => commands::sending::run(&opts),
        Command::ConfigureDkim => commands::dkim::run(),
        Command::ConfigureSrs => commands::srs::run(),
        Command::Lockdown(opts) => commands::lockdown::run(&opts),
        Command::AddDomain(opts) => commands::add_domain::run(&opts),
        Command::Completion(opts) => {
            let mut cmd = Cli::command();
            clap_complete::generate(opts.shell, &mut cmd, "relayctl", &mut std::io::stdout());
            Ok(())
        }
    }
}
