//! public command - Show or toggle public read access
//!
//! Public containers grant `.r:*` and `.rlistings` in their read ACL.

use clap::Args;
use serde::Serialize;
use zs_swift::acl;

use super::{fail, open_profile};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Show or toggle public access
#[derive(Args, Debug)]
pub struct PublicArgs {
    /// Profile name
    pub profile: String,

    /// Flip the container between public and private
    #[arg(long)]
    pub toggle: bool,
}

#[derive(Debug, Serialize)]
struct PublicOutput {
    container: String,
    public: bool,
}

fn describe(public: bool) -> &'static str {
    if public { "public" } else { "private" }
}

/// Execute the public command
pub async fn execute(args: PublicArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let store = match open_profile(&args.profile, &formatter).await {
        Ok(store) => store,
        Err(code) => return code,
    };

    let result = if args.toggle {
        acl::toggle_public(&store).await
    } else {
        acl::is_public(&store).await
    };

    let public = match result {
        Ok(public) => public,
        Err(e) => return fail(&formatter, "Failed to read container ACL", &e),
    };

    if formatter.is_json() {
        formatter.json(&PublicOutput {
            container: store.container().to_string(),
            public,
        });
    } else if args.toggle {
        formatter.success(&format!(
            "Container '{}' is now {}",
            store.container(),
            describe(public)
        ));
    } else {
        formatter.println(describe(public));
    }
    ExitCode::Success
}
