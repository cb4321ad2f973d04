//! rm command - Remove a key or a subtree
//!
//! Without `-r` exactly one key is removed and a missing key is an error.
//! With `-r` the key and everything below it are removed; a missing subtree
//! is not an error.

use clap::Args;
use serde::Serialize;
use zs_core::KeyValueStore;

use super::{fail, open_profile, parse_store_path};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Remove keys
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Key path (PROFILE/KEY, or PROFILE with -r to clear the store)
    pub path: String,

    /// Remove the key and everything below it
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    path: String,
    removed: usize,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match parse_store_path(&args.path, &formatter) {
        Ok(path) => path,
        Err(code) => return code,
    };

    if path.is_root() && !args.recursive {
        formatter.error(&format!(
            "'{}' names the whole store; use -r to remove every key",
            args.path
        ));
        return ExitCode::UsageError;
    }

    let mut store = match open_profile(&path.profile, &formatter).await {
        Ok(store) => store,
        Err(code) => return code,
    };

    let removed = if args.recursive {
        match store.remove_subtree(path.key()).await {
            Ok(removed) => removed,
            Err(e) => return fail(&formatter, "Failed to remove subtree", &e),
        }
    } else {
        match store.delete(&path.key).await {
            Ok(()) => 1,
            Err(e) if e.is_not_found() => {
                formatter.error(&format!("Key not found: {path}"));
                return ExitCode::NotFound;
            }
            Err(e) => return fail(&formatter, "Failed to remove key", &e),
        }
    };

    if formatter.is_json() {
        formatter.json(&RmOutput {
            path: path.to_string(),
            removed,
        });
    } else if removed == 0 {
        formatter.warning(&format!("Nothing to remove under {path}"));
    } else {
        formatter.success(&format!("Removed {removed} object(s) under {path}"));
    }
    ExitCode::Success
}
