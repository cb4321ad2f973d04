//! zs-core: hierarchical key/value storage over flat object namespaces
//!
//! This crate provides:
//! - Key normalization and the hierarchical store
//! - The ObjectBackend trait that storage services implement
//! - An in-memory backend
//! - Credential resolution, configuration and profile management
//!
//! It does not depend on any HTTP client; the Swift backend lives in zs-swift.

pub mod auth;
pub mod config;
pub mod error;
pub mod index;
pub mod key;
pub mod memory;
pub mod path;
pub mod profile;
pub mod store;
pub mod traits;

pub use auth::{AuthOptions, Credentials, Environment, ProcessEnvironment};
pub use config::{Config, ConfigManager};
pub use error::{Error, Result};
pub use index::KeyIndex;
pub use memory::MemoryBackend;
pub use path::{parse_path, StorePath};
pub use profile::{Profile, ProfileManager, TimeoutConfig};
pub use store::{HierarchicalStore, StoreOptions};
pub use traits::{
    AsBuffer, ContainerInfo, KeyValueStore, ListEntry, ListOptions, ListPage, ObjectBackend,
    ObjectInfo, DEFAULT_LISTING_LIMIT,
};
