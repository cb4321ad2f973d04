//! Credential resolution
//!
//! Authentication parameters come from explicit options first and the
//! process environment second. Two combinations are accepted: a
//! pre-authenticated storage URL and token, or an auth URL with a user and
//! key that are later exchanged for a token.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Storage URL of a pre-authenticated session
pub const ENV_STORAGE_URL: &str = "OS_STORAGE_URL";

/// Token of a pre-authenticated session
pub const ENV_AUTH_TOKEN: &str = "OS_AUTH_TOKEN";

/// Auth (v1.0) endpoint
pub const ENV_AUTH_URL: &str = "ST_AUTH";

/// Auth user in the form `account:user`
pub const ENV_USER: &str = "ST_USER";

/// Auth key
pub const ENV_KEY: &str = "ST_KEY";

/// Source of environment variables
///
/// Injected into [`AuthOptions::resolve`] so resolution can be tested without
/// touching the real process environment.
pub trait Environment {
    /// Look up a variable
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Authentication parameters, any of which may be missing
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthOptions {
    /// Storage URL of a pre-authenticated session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_url: Option<String>,

    /// Pre-authenticated token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Auth endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,

    /// Auth user (`account:user`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Auth key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// A complete credential combination
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Storage URL and token of an existing session
    PreAuthenticated { storage_url: String, token: String },

    /// Auth endpoint and secrets to exchange for a token
    Password {
        auth_url: String,
        user: String,
        key: String,
    },
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl AuthOptions {
    /// Read every parameter from the environment
    pub fn from_env(env: &impl Environment) -> Self {
        Self {
            storage_url: non_empty(env.var(ENV_STORAGE_URL)),
            auth_token: non_empty(env.var(ENV_AUTH_TOKEN)),
            auth_url: non_empty(env.var(ENV_AUTH_URL)),
            user: non_empty(env.var(ENV_USER)),
            key: non_empty(env.var(ENV_KEY)),
        }
    }

    /// Fill parameters missing here from `fallback`
    pub fn or(self, fallback: AuthOptions) -> Self {
        Self {
            storage_url: non_empty(self.storage_url).or(fallback.storage_url),
            auth_token: non_empty(self.auth_token).or(fallback.auth_token),
            auth_url: non_empty(self.auth_url).or(fallback.auth_url),
            user: non_empty(self.user).or(fallback.user),
            key: non_empty(self.key).or(fallback.key),
        }
    }

    /// Resolve explicit parameters, falling back to the environment
    ///
    /// A complete explicit combination is used as is. Otherwise missing
    /// values are filled from the environment, and the combination the
    /// explicit values started is completed before the other one.
    pub fn resolve(&self, env: &impl Environment) -> Result<Credentials> {
        if let Ok(credentials) = self.clone().into_credentials() {
            return Ok(credentials);
        }

        let starts_password = self.has_password_part() && !self.has_preauth_part();
        let merged = self.clone().or(Self::from_env(env));
        if starts_password {
            if let Some(credentials) = merged.password() {
                return Ok(credentials);
            }
        }
        merged.into_credentials()
    }

    fn has_preauth_part(&self) -> bool {
        [&self.storage_url, &self.auth_token]
            .into_iter()
            .any(|v| v.as_deref().is_some_and(|v| !v.is_empty()))
    }

    fn has_password_part(&self) -> bool {
        [&self.auth_url, &self.user, &self.key]
            .into_iter()
            .any(|v| v.as_deref().is_some_and(|v| !v.is_empty()))
    }

    /// The auth URL, user and key combination, when complete
    fn password(&self) -> Option<Credentials> {
        Some(Credentials::Password {
            auth_url: non_empty(self.auth_url.clone())?,
            user: non_empty(self.user.clone())?,
            key: non_empty(self.key.clone())?,
        })
    }

    /// Pick a complete combination from these parameters alone
    ///
    /// A pre-authenticated session wins when both combinations are present.
    pub fn into_credentials(self) -> Result<Credentials> {
        let Self {
            storage_url,
            auth_token,
            auth_url,
            user,
            key,
        } = self;

        match (
            non_empty(storage_url),
            non_empty(auth_token),
            non_empty(auth_url),
            non_empty(user),
            non_empty(key),
        ) {
            (Some(storage_url), Some(token), _, _, _) => {
                Ok(Credentials::PreAuthenticated { storage_url, token })
            }
            (_, _, Some(auth_url), Some(user), Some(key)) => {
                Ok(Credentials::Password {
                    auth_url,
                    user,
                    key,
                })
            }
            _ => Err(Error::AuthMissingParameter(format!(
                "provide a storage URL and token ({ENV_STORAGE_URL}, {ENV_AUTH_TOKEN}) \
                 or an auth URL, user and key ({ENV_AUTH_URL}, {ENV_USER}, {ENV_KEY})"
            ))),
        }
    }
}

impl From<Credentials> for AuthOptions {
    fn from(credentials: Credentials) -> Self {
        match credentials {
            Credentials::PreAuthenticated { storage_url, token } => Self {
                storage_url: Some(storage_url),
                auth_token: Some(token),
                ..Default::default()
            },
            Credentials::Password {
                auth_url,
                user,
                key,
            } => Self {
                auth_url: Some(auth_url),
                user: Some(user),
                key: Some(key),
                ..Default::default()
            },
        }
    }
}

impl std::fmt::Debug for AuthOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthOptions")
            .field("storage_url", &self.storage_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "***"))
            .field("auth_url", &self.auth_url)
            .field("user", &self.user)
            .field("key", &self.key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::PreAuthenticated { storage_url, .. } => f
                .debug_struct("PreAuthenticated")
                .field("storage_url", storage_url)
                .field("token", &"***")
                .finish(),
            Credentials::Password { auth_url, user, .. } => f
                .debug_struct("Password")
                .field("auth_url", auth_url)
                .field("user", user)
                .field("key", &"***")
                .finish(),
        }
    }
}
