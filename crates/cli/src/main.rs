//! zs - hierarchical key/value store on OpenStack Swift
//!
//! A command-line interface for browsing and editing a key tree stored in a
//! Swift container.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use swiftstore_cli::commands::{self, Cli};
use swiftstore_cli::exit_code::ExitCode;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // --debug overrides RUST_LOG
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let exit_code = tokio::select! {
        code = commands::execute(cli) => code,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted");
            ExitCode::Interrupted
        }
    };
    if !exit_code.is_success() {
        tracing::debug!(code = exit_code.as_i32(), "Exiting with failure");
    }

    std::process::exit(exit_code.as_i32());
}
