//! zs-swift: OpenStack Swift backend for zs-core
//!
//! This crate provides the implementation of the ObjectBackend trait
//! over the Swift v1 HTTP API using reqwest. It is the only crate that
//! talks HTTP.

pub mod acl;
pub mod auth;
pub mod client;
pub mod state;

pub use auth::{acquire_token, AuthToken};
pub use client::SwiftClient;
pub use state::StoreState;

use zs_core::{AuthOptions, Environment, HierarchicalStore, Result, StoreOptions, TimeoutConfig};

/// Hierarchical store backed by a Swift container
pub type SwiftStore = HierarchicalStore<SwiftClient>;

/// Resolve credentials, connect and open a store
///
/// Explicit `auth` values win over the environment.
pub async fn open_store(
    options: StoreOptions,
    auth: &AuthOptions,
    env: &impl Environment,
    timeout: TimeoutConfig,
) -> Result<SwiftStore> {
    let credentials = auth.resolve(env)?;
    let client = SwiftClient::connect(credentials, timeout).await?;
    SwiftStore::open(client, options).await
}
