//! Swift v1.0 authentication
//!
//! Exchanges an `account:user` and key for a storage URL and session token.

use reqwest::{Client, Method};
use serde::Serialize;

use zs_core::{Error, Result, TimeoutConfig};

use crate::client::{self, AUTH_TOKEN_HEADER};

const AUTH_USER_HEADER: &str = "X-Auth-User";
const AUTH_KEY_HEADER: &str = "X-Auth-Key";
const STORAGE_URL_HEADER: &str = "X-Storage-Url";
const TOKEN_EXPIRES_HEADER: &str = "X-Auth-Token-Expires";

/// Result of a successful authentication
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct AuthToken {
    /// Account storage URL
    pub storage_url: String,

    /// Session token
    pub token: String,

    /// Seconds until the token expires, when the service reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("storage_url", &self.storage_url)
            .field("token", &"***")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Check that `user` has the form `account:user`
pub fn validate_user(user: &str) -> Result<()> {
    match user.split_once(':') {
        Some((account, name)) if !account.is_empty() && !name.is_empty() => Ok(()),
        _ => Err(Error::Config(format!(
            "Auth user must have the form 'account:user', got '{user}'"
        ))),
    }
}

/// Acquire a token from a v1.0 auth endpoint
pub async fn acquire_token(auth_url: &str, user: &str, key: &str) -> Result<AuthToken> {
    let http = client::http_client(&TimeoutConfig::default())?;
    request_token(&http, auth_url, user, key).await
}

pub(crate) async fn request_token(
    http: &Client,
    auth_url: &str,
    user: &str,
    key: &str,
) -> Result<AuthToken> {
    validate_user(user)?;
    if key.is_empty() {
        return Err(Error::AuthMissingParameter("auth key is empty".into()));
    }

    tracing::debug!(auth_url, user, "Requesting token");
    let request = http
        .request(Method::GET, auth_url)
        .header(AUTH_USER_HEADER, user)
        .header(AUTH_KEY_HEADER, key);
    let response = client::send(request, auth_url).await?;
    let headers = response.headers();

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let storage_url = header(STORAGE_URL_HEADER)
        .ok_or_else(|| Error::Auth(format!("Auth response lacks {STORAGE_URL_HEADER}")))?;
    let token = header(AUTH_TOKEN_HEADER)
        .ok_or_else(|| Error::Auth(format!("Auth response lacks {AUTH_TOKEN_HEADER}")))?;
    let expires_in = header(TOKEN_EXPIRES_HEADER).and_then(|v| v.parse().ok());

    tracing::info!(storage_url = %storage_url, expires_in = ?expires_in, "Acquired token");
    Ok(AuthToken {
        storage_url,
        token,
        expires_in,
    })
}
