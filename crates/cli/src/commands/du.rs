//! du command - Total size below a key

use clap::Args;
use serde::Serialize;

use super::{fail, open_profile, parse_store_path};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Show the byte size of a key or subtree
#[derive(Args, Debug)]
pub struct DuArgs {
    /// Store path (PROFILE[/KEY])
    pub path: String,
}

#[derive(Debug, Serialize)]
struct DuOutput {
    path: String,
    size_bytes: u64,
    size_human: String,
}

/// Execute the du command
pub async fn execute(args: DuArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match parse_store_path(&args.path, &formatter) {
        Ok(path) => path,
        Err(code) => return code,
    };

    let store = match open_profile(&path.profile, &formatter).await {
        Ok(store) => store,
        Err(code) => return code,
    };

    let size = match store.aggregate_size(path.key()).await {
        Ok(size) => size,
        Err(e) => return fail(&formatter, "Failed to compute size", &e),
    };

    let output = DuOutput {
        path: path.to_string(),
        size_bytes: size,
        size_human: humansize::format_size(size, humansize::BINARY),
    };

    if formatter.is_json() {
        formatter.json(&output);
    } else {
        formatter.println(&format!("{}\t{}", output.size_human, output.path));
    }
    ExitCode::Success
}
