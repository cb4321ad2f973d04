//! Profile management commands
//!
//! Profiles are named references to a container and root prefix on a Swift
//! endpoint, optionally with credentials and timeouts.

use clap::Subcommand;
use serde::Serialize;
use zs_core::path::is_valid_profile_name;
use zs_core::{AuthOptions, Error, Profile, ProfileManager, TimeoutConfig};

use super::fail;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Profile subcommands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Add or update a profile
    Set(SetArgs),

    /// List all configured profiles
    List(ListArgs),

    /// Remove a profile
    Remove(RemoveArgs),
}

/// Arguments for the `profile set` command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Profile name (letters, digits, '-' and '_')
    pub name: String,

    /// Container holding the store
    pub container: String,

    /// Root prefix inside the container
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Keep a local index of known keys
    #[arg(long, default_value = "false")]
    pub membership_cache: bool,

    /// Storage URL of a pre-authenticated session
    #[arg(long)]
    pub storage_url: Option<String>,

    /// Token of a pre-authenticated session
    #[arg(long)]
    pub auth_token: Option<String>,

    /// v1.0 auth endpoint
    #[arg(long)]
    pub auth_url: Option<String>,

    /// Auth user in the form account:user
    #[arg(long)]
    pub user: Option<String>,

    /// Auth key
    #[arg(long)]
    pub key: Option<String>,

    /// Connection timeout in milliseconds
    #[arg(long)]
    pub connect_timeout_ms: Option<u64>,

    /// Read timeout in milliseconds
    #[arg(long)]
    pub read_timeout_ms: Option<u64>,
}

/// Arguments for the `profile list` command
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show auth mode, index and timeout settings
    #[arg(short, long)]
    pub long: bool,
}

/// Arguments for the `profile remove` command
#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Name of the profile to remove
    pub name: String,
}

/// JSON output for profile list
#[derive(Serialize)]
struct ProfileListOutput {
    profiles: Vec<ProfileInfo>,
}

/// Profile information for output (without secrets)
#[derive(Debug, Serialize)]
struct ProfileInfo {
    name: String,
    container: String,
    prefix: String,
    membership_cache: bool,
    auth: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_url: Option<String>,
    timeout: TimeoutConfig,
}

impl From<&Profile> for ProfileInfo {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            container: profile.store.container.clone(),
            prefix: profile.store.prefix.clone(),
            membership_cache: profile.store.membership_cache,
            auth: auth_mode(&profile.auth),
            storage_url: profile.auth.storage_url.clone(),
            auth_url: profile.auth.auth_url.clone(),
            timeout: profile.timeout_config(),
        }
    }
}

/// JSON output for profile set/remove operations
#[derive(Serialize)]
struct ProfileOperationOutput {
    success: bool,
    profile: String,
    message: String,
}

/// Which credential combination a profile carries on its own
fn auth_mode(auth: &AuthOptions) -> &'static str {
    if auth.storage_url.is_some() && auth.auth_token.is_some() {
        "token"
    } else if auth.auth_url.is_some() && auth.user.is_some() && auth.key.is_some() {
        "password"
    } else {
        "environment"
    }
}

/// Execute a profile subcommand
pub async fn execute(cmd: ProfileCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let manager = match ProfileManager::new() {
        Ok(manager) => manager,
        Err(e) => return fail(&formatter, "Failed to load profiles", &e),
    };

    match cmd {
        ProfileCommands::Set(args) => execute_set(args, &manager, &formatter),
        ProfileCommands::List(args) => execute_list(args, &manager, &formatter),
        ProfileCommands::Remove(args) => execute_remove(args, &manager, &formatter),
    }
}

/// Build a profile from `profile set` arguments
fn build_profile(args: SetArgs) -> Result<Profile, String> {
    if !is_valid_profile_name(&args.name) {
        return Err(format!(
            "Invalid profile name '{}': use letters, digits, '-' and '_'",
            args.name
        ));
    }

    if args.container.is_empty() {
        return Err("Container name cannot be empty".to_string());
    }

    if let Some(user) = &args.user {
        zs_swift::auth::validate_user(user).map_err(|e| e.to_string())?;
    }

    let prefix = zs_core::key::normalize(&args.prefix).map_err(|e| e.to_string())?;

    let timeout = match (args.connect_timeout_ms, args.read_timeout_ms) {
        (None, None) => None,
        (connect, read) => {
            let defaults = TimeoutConfig::default();
            Some(TimeoutConfig {
                connect_ms: connect.unwrap_or(defaults.connect_ms),
                read_ms: read.unwrap_or(defaults.read_ms),
            })
        }
    };

    let mut profile = Profile::new(args.name, args.container);
    profile.store = profile
        .store
        .with_prefix(prefix)
        .with_membership_cache(args.membership_cache);
    profile.auth = AuthOptions {
        storage_url: args.storage_url,
        auth_token: args.auth_token,
        auth_url: args.auth_url,
        user: args.user,
        key: args.key,
    };
    profile.timeout = timeout;

    Ok(profile)
}

fn execute_set(args: SetArgs, manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    let profile = match build_profile(args) {
        Ok(profile) => profile,
        Err(msg) => {
            formatter.error(&msg);
            return ExitCode::UsageError;
        }
    };
    let name = profile.name.clone();

    match manager.set(profile) {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&ProfileOperationOutput {
                    success: true,
                    profile: name.clone(),
                    message: format!("Profile '{name}' configured successfully"),
                });
            } else {
                formatter.success(&format!("Profile '{name}' configured successfully."));
            }
            ExitCode::Success
        }
        Err(e) => fail(formatter, "Failed to save profile", &e),
    }
}

fn execute_list(args: ListArgs, manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    let profiles = match manager.list() {
        Ok(profiles) => profiles,
        Err(e) => return fail(formatter, "Failed to list profiles", &e),
    };
    let infos: Vec<ProfileInfo> = profiles.iter().map(ProfileInfo::from).collect();

    if formatter.is_json() {
        formatter.json(&ProfileListOutput { profiles: infos });
    } else if infos.is_empty() {
        formatter.println("No profiles configured.");
    } else if args.long {
        let mut table = formatter.table(&[
            "name",
            "container",
            "prefix",
            "auth",
            "index",
            "timeouts (ms)",
        ]);
        for info in &infos {
            table.add_row(vec![
                info.name.clone(),
                info.container.clone(),
                info.prefix.clone(),
                info.auth.to_string(),
                if info.membership_cache { "on" } else { "off" }.to_string(),
                format!("{}/{}", info.timeout.connect_ms, info.timeout.read_ms),
            ]);
        }
        formatter.print_table(&table);
    } else {
        let mut table = formatter.table(&["name", "container", "prefix"]);
        for info in &infos {
            table.add_row(vec![&info.name, &info.container, &info.prefix]);
        }
        formatter.print_table(&table);
    }

    ExitCode::Success
}

fn execute_remove(args: RemoveArgs, manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    match manager.remove(&args.name) {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&ProfileOperationOutput {
                    success: true,
                    profile: args.name.clone(),
                    message: format!("Profile '{}' removed successfully", args.name),
                });
            } else {
                formatter.success(&format!("Profile '{}' removed successfully.", args.name));
            }
            ExitCode::Success
        }
        Err(Error::ProfileNotFound(_)) => {
            formatter.error(&format!("Profile '{}' not found", args.name));
            ExitCode::NotFound
        }
        Err(e) => fail(formatter, "Failed to remove profile", &e),
    }
}
