//! put command - Store a file or stdin under a key
//!
//! Reads the whole input into memory and writes it as one object.

use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use zs_core::KeyValueStore;

use super::{fail, open_profile, parse_store_path};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Store a value under a key
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Destination key (PROFILE/KEY)
    pub path: String,

    /// File to upload (reads stdin when omitted)
    pub file: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct PutOutput {
    status: &'static str,
    target: String,
    size_bytes: u64,
    size_human: String,
}

fn read_input(file: Option<&PathBuf>) -> std::io::Result<Vec<u8>> {
    match file {
        Some(file) => std::fs::read(file),
        None => {
            let mut buffer = Vec::new();
            std::io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Execute the put command
pub async fn execute(args: PutArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match parse_store_path(&args.path, &formatter) {
        Ok(path) => path,
        Err(code) => return code,
    };

    let Some(key) = path.key().map(str::to_string) else {
        formatter.error("A key is required for the put command.");
        return ExitCode::UsageError;
    };

    let data = match read_input(args.file.as_ref()) {
        Ok(data) => data,
        Err(e) => {
            let source = args
                .file
                .as_ref()
                .map(|f| f.display().to_string())
                .unwrap_or_else(|| "stdin".to_string());
            formatter.error(&format!("Failed to read {source}: {e}"));
            return ExitCode::GeneralError;
        }
    };

    let mut store = match open_profile(&path.profile, &formatter).await {
        Ok(store) => store,
        Err(code) => return code,
    };

    let size = data.len() as u64;
    if let Err(e) = store.set(&key, &data).await {
        return fail(&formatter, "Failed to write key", &e);
    }

    let size_human = humansize::format_size(size, humansize::BINARY);
    if formatter.is_json() {
        formatter.json(&PutOutput {
            status: "success",
            target: path.to_string(),
            size_bytes: size,
            size_human,
        });
    } else {
        formatter.success(&format!("Stored {path} ({size_human})"));
    }
    ExitCode::Success
}
