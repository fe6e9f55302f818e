use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Top-level CLI entry point for the mail relay provisioner.
#[derive(Parser, Debug)]
#[command(
    name = "relayctl",
    about = "Provision and manage a Postfix mail relay",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run install and every configure step in order
    Setup(SetupOpts),
    /// Install Postfix packages
    Install,
    /// Configure Postfix to receive mail for a domain
    #[command(name = "configure-recv")]
    ConfigureRecv(RecvOpts),
    /// Configure Postfix to send authenticated mail
    #[command(name = "configure-send")]
    ConfigureSend(SendOpts),
    /// Configure DKIM signing for all provisioned domains
    #[command(name = "configure-dkim")]
    ConfigureDkim,
    /// Configure sender rewriting for forwarded mail
    #[command(name = "configure-srs")]
    ConfigureSrs,
    /// Apply anti-spam restrictions to the relay
    Lockdown(LockdownOpts),
    /// Add a virtual domain to an already-configured relay
    #[command(name = "add-domain")]
    AddDomain(AddDomainOpts),
    /// Generate shell completions
    Completion(CompletionOpts),
}

/// Options for the `setup` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct SetupOpts {
    /// The email domain (eg, example.com)
    #[arg(long)]
    pub domain: String,

    /// The domain mailserver (eg, mail.example.com)
    #[arg(long)]
    pub mailserver: String,

    /// The final destination email address for the catchall
    #[arg(long)]
    pub proxy_email: String,

    /// smtp username for sending emails
    #[arg(long, default_value = "smtp")]
    pub smtp_username: String,

    /// smtp password for sending emails
    #[arg(long)]
    pub smtp_password: String,

    /// country for the ssl certificate
    #[arg(long, default_value = "US")]
    pub country: String,

    /// state for the ssl certificate
    #[arg(long)]
    pub state: String,

    /// city for the ssl certificate
    #[arg(long)]
    pub city: String,
}

/// Options for the `configure-recv` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RecvOpts {
    /// The email domain (eg, example.com)
    #[arg(long)]
    pub domain: String,

    /// The domain mailserver (eg, mail.example.com)
    #[arg(long)]
    pub mailserver: String,

    /// A file of virtual address mappings for the domain
    #[arg(long)]
    pub proxy_file: Option<std::path::PathBuf>,

    /// The final destination email address for the catchall
    #[arg(long)]
    pub proxy_email: Option<String>,
}

/// Options for the `configure-send` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct SendOpts {
    /// The email domain (eg, example.com)
    #[arg(long)]
    pub domain: String,

    /// The domain mailserver (eg, mail.example.com)
    #[arg(long)]
    pub mailserver: String,

    /// smtp username for sending emails
    #[arg(long, default_value = "smtp")]
    pub smtp_username: String,

    /// smtp password for sending emails
    #[arg(long)]
    pub smtp_password: String,

    /// country for the ssl certificate
    #[arg(long, default_value = "US")]
    pub country: String,

    /// state for the ssl certificate
    #[arg(long)]
    pub state: String,

    /// city for the ssl certificate
    #[arg(long)]
    pub city: String,
}

/// Options for the `lockdown` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct LockdownOpts {
    /// The domain mailserver (eg, mail.example.com)
    #[arg(long)]
    pub mailserver: String,
}

/// Options for the `add-domain` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct AddDomainOpts {
    /// The email domain (eg, example.com)
    #[arg(long)]
    pub domain: String,

    /// A file of virtual address mappings for the domain
    #[arg(long)]
    pub proxy_file: Option<std::path::PathBuf>,

    /// The final destination email address for the catchall
    #[arg(long)]
    pub proxy_email: Option<String>,
}

/// Options for the `completion` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CompletionOpts {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
