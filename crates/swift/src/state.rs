//! Persistable store state
//!
//! A [`StoreState`] carries what is needed to reopen a store: its options,
//! the credentials it was connected with and the client timeouts. The live
//! connection is never part of it; resuming authenticates again.

use serde::{Deserialize, Serialize};

use zs_core::{AuthOptions, Result, StoreOptions, TimeoutConfig};

use crate::client::SwiftClient;
use crate::SwiftStore;

/// Snapshot of a store handle without its connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreState {
    /// Container, root prefix and index settings
    pub options: StoreOptions,

    /// Credentials used to reconnect
    pub auth: AuthOptions,

    /// Client timeouts
    #[serde(default)]
    pub timeout: TimeoutConfig,
}

impl StoreState {
    /// Capture the state of an open store
    pub fn capture(store: &SwiftStore) -> Self {
        let client = store.backend();
        Self {
            options: store.options(),
            auth: client.credentials().clone().into(),
            timeout: client.timeout().clone(),
        }
    }

    /// Reconnect and reopen the store
    pub async fn resume(self) -> Result<SwiftStore> {
        let credentials = self.auth.into_credentials()?;
        let client = SwiftClient::connect(credentials, self.timeout).await?;
        SwiftStore::open(client, self.options).await
    }
}
