//! CLI command definitions and execution
//!
//! Each command lives in its own module with an `Args` struct and an
//! `execute` function returning an [`ExitCode`].

use clap::{Parser, Subcommand};
use zs_core::{parse_path, Error, ProcessEnvironment, Profile, ProfileManager, StorePath};
use zs_swift::{open_store, SwiftStore};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod cat;
mod completions;
mod du;
mod ls;
mod profile;
mod public;
mod put;
mod rm;
mod stat;
mod token;

/// zs - hierarchical key/value store on OpenStack Swift
///
/// Keys are addressed as PROFILE/KEY, where PROFILE names a configured
/// container and root prefix.
#[derive(Parser, Debug)]
#[command(name = "zs")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage store profiles
    #[command(subcommand)]
    Profile(profile::ProfileCommands),

    /// List children (or all keys with -r) below a key
    Ls(ls::LsArgs),

    /// Write the value of a key to stdout
    Cat(cat::CatArgs),

    /// Store a file or stdin under a key
    Put(put::PutArgs),

    /// Remove a key (or a whole subtree with -r)
    Rm(rm::RmArgs),

    /// Show the total size below a key
    Du(du::DuArgs),

    /// Show container or key metadata
    Stat(stat::StatArgs),

    /// Acquire a token from a v1.0 auth endpoint
    Token(token::TokenArgs),

    /// Show or toggle public read access of a profile's container
    Public(public::PublicArgs),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Profile(cmd) => profile::execute(cmd, output_config).await,
        Commands::Ls(args) => ls::execute(args, output_config).await,
        Commands::Cat(args) => cat::execute(args, output_config).await,
        Commands::Put(args) => put::execute(args, output_config).await,
        Commands::Rm(args) => rm::execute(args, output_config).await,
        Commands::Du(args) => du::execute(args, output_config).await,
        Commands::Stat(args) => stat::execute(args, output_config).await,
        Commands::Token(args) => token::execute(args, output_config).await,
        Commands::Public(args) => public::execute(args, output_config).await,
        Commands::Completions(args) => completions::execute(args),
    }
}

/// Report an error and pick the matching exit code
pub(crate) fn fail(formatter: &Formatter, context: &str, error: &Error) -> ExitCode {
    formatter.error(&format!("{context}: {error}"));
    ExitCode::from_error(error)
}

/// Parse a PROFILE[/KEY] argument
pub(crate) fn parse_store_path(raw: &str, formatter: &Formatter) -> Result<StorePath, ExitCode> {
    parse_path(raw).map_err(|e| fail(formatter, "Invalid path", &e))
}

/// Look up a configured profile
pub(crate) fn load_profile(name: &str, formatter: &Formatter) -> Result<Profile, ExitCode> {
    let manager = ProfileManager::new().map_err(|e| fail(formatter, "Failed to load profiles", &e))?;

    manager.get(name).map_err(|e| match e {
        Error::ProfileNotFound(_) => {
            formatter.error(&format!("Profile '{name}' not found"));
            ExitCode::NotFound
        }
        e => fail(formatter, "Failed to load profile", &e),
    })
}

/// Connect to the store a profile names
///
/// Credentials missing from the profile are taken from the environment.
pub(crate) async fn open_profile(name: &str, formatter: &Formatter) -> Result<SwiftStore, ExitCode> {
    let profile = load_profile(name, formatter)?;
    tracing::debug!(profile = %profile.name, container = %profile.store.container, "Opening store");

    open_store(
        profile.store.clone(),
        &profile.auth,
        &ProcessEnvironment,
        profile.timeout_config(),
    )
    .await
    .map_err(|e| fail(formatter, &format!("Failed to open profile '{name}'"), &e))
}
