//! token command - Acquire a token from a v1.0 auth endpoint
//!
//! Prints shell `export` lines for the pre-authenticated variables so the
//! result can be applied with `eval "$(zs token)"`.

use clap::Args;
use zs_core::auth::{ENV_AUTH_TOKEN, ENV_AUTH_URL, ENV_KEY, ENV_STORAGE_URL, ENV_USER};
use zs_core::Error;
use zs_swift::{acquire_token, AuthToken};

use super::fail;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Acquire a token
#[derive(Args, Debug)]
pub struct TokenArgs {
    /// v1.0 auth endpoint
    #[arg(long, env = ENV_AUTH_URL)]
    pub auth_url: Option<String>,

    /// Auth user in the form account:user
    #[arg(long, env = ENV_USER)]
    pub user: Option<String>,

    /// Auth key
    #[arg(long, env = ENV_KEY, hide_env_values = true)]
    pub key: Option<String>,
}

/// Shell lines exporting a token
fn export_lines(token: &AuthToken) -> String {
    format!(
        "export {ENV_STORAGE_URL}={}\nexport {ENV_AUTH_TOKEN}={}",
        token.storage_url, token.token
    )
}

/// Execute the token command
pub async fn execute(args: TokenArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let (Some(auth_url), Some(user), Some(key)) = (args.auth_url, args.user, args.key) else {
        let e = Error::AuthMissingParameter(format!(
            "set --auth-url, --user and --key (or {ENV_AUTH_URL}, {ENV_USER}, {ENV_KEY})"
        ));
        return fail(&formatter, "Cannot acquire token", &e);
    };

    let token = match acquire_token(&auth_url, &user, &key).await {
        Ok(token) => token,
        Err(e) => return fail(&formatter, "Failed to acquire token", &e),
    };

    if formatter.is_json() {
        formatter.json(&token);
        return ExitCode::Success;
    }

    formatter.println(&export_lines(&token));
    if let Some(secs) = token.expires_in {
        let remaining = jiff::SignedDuration::from_secs(secs as i64);
        // stderr keeps stdout eval-able
        if !formatter.is_quiet() {
            eprintln!("{}", formatter.dim(&format!("Token expires in {remaining:#}")));
        }
    }
    ExitCode::Success
}
