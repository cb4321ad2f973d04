//! cat command - Write the value of a key to stdout
//!
//! Values are raw bytes and are written unmodified.

use std::io::{self, Write};

use clap::Args;
use zs_core::KeyValueStore;

use super::{fail, open_profile, parse_store_path};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Display the value of a key
#[derive(Args, Debug)]
pub struct CatArgs {
    /// Key path (PROFILE/KEY)
    pub path: String,
}

/// Execute the cat command
pub async fn execute(args: CatArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match parse_store_path(&args.path, &formatter) {
        Ok(path) => path,
        Err(code) => return code,
    };

    let Some(key) = path.key() else {
        formatter.error(&format!("'{}' names a profile, not a key", args.path));
        return ExitCode::UsageError;
    };

    let store = match open_profile(&path.profile, &formatter).await {
        Ok(store) => store,
        Err(code) => return code,
    };

    match store.get(key).await {
        Ok(data) => {
            // Bypass the formatter to preserve binary data
            let mut stdout = io::stdout().lock();
            if let Err(e) = stdout.write_all(&data).and_then(|()| stdout.flush()) {
                formatter.error(&format!("Failed to write to stdout: {e}"));
                return ExitCode::GeneralError;
            }
            ExitCode::Success
        }
        Err(e) if e.is_not_found() => {
            formatter.error(&format!("Key not found: {path}"));
            ExitCode::NotFound
        }
        Err(e) => fail(&formatter, "Failed to read key", &e),
    }
}
