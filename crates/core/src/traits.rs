//! Backend and store trait definitions
//!
//! [`ObjectBackend`] is the seam between the hierarchical store and a concrete
//! object-storage service. It mirrors the handful of account, container and
//! object primitives a Swift-style service exposes, so the store logic can be
//! exercised against an in-memory backend or a mock.

use std::borrow::Cow;

use async_trait::async_trait;
use futures::stream::BoxStream;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Metadata for a stored object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Physical object name
    pub name: String,

    /// Size in bytes
    pub size_bytes: u64,

    /// Human-readable size
    pub size_human: String,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// Content hash reported by the backend (MD5 for Swift)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    /// Content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl ObjectInfo {
    /// Create a new ObjectInfo with a name and size
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes: size,
            size_human: humansize::format_size(size, humansize::BINARY),
            last_modified: None,
            hash: None,
            content_type: None,
        }
    }
}

/// One entry of a container listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListEntry {
    /// A concrete object
    Object(ObjectInfo),

    /// A common prefix ("pseudo-folder") produced by delimiter listings
    Subdir {
        /// The prefix, including the trailing delimiter
        prefix: String,
    },
}

impl ListEntry {
    /// Name of the entry (object name or subdir prefix)
    pub fn name(&self) -> &str {
        match self {
            ListEntry::Object(info) => &info.name,
            ListEntry::Subdir { prefix } => prefix,
        }
    }

    /// Unwrap a concrete object entry
    pub fn into_object(self) -> Option<ObjectInfo> {
        match self {
            ListEntry::Object(info) => Some(info),
            ListEntry::Subdir { .. } => None,
        }
    }
}

/// Page size used when a listing does not set a limit, matching Swift's server default
pub const DEFAULT_LISTING_LIMIT: usize = 10_000;

/// Options for container listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Only return names starting with this prefix
    pub prefix: Option<String>,

    /// Roll names containing this character after the prefix into subdir entries
    pub delimiter: Option<char>,

    /// Only return names sorting strictly after this marker
    pub marker: Option<String>,

    /// Maximum number of entries per page
    pub limit: Option<usize>,
}

/// One page of a container listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Entries in name order
    pub entries: Vec<ListEntry>,

    /// Marker for the next page, `None` once the listing is exhausted
    pub next_marker: Option<String>,
}

/// Container metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    /// Container name
    pub name: String,

    /// Number of objects
    pub object_count: u64,

    /// Total bytes stored
    pub bytes_used: u64,

    /// Read ACL, when the backend reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_acl: Option<String>,
}

impl ContainerInfo {
    /// Create a new ContainerInfo with only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Object-storage primitives used by the hierarchical store
///
/// Implementations must report missing objects as [`crate::Error::NotFound`];
/// every other failure is passed through to the caller unchanged.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// List containers of the account
    async fn get_account(&self) -> Result<Vec<ContainerInfo>>;

    /// Create a container (no-op if it already exists)
    async fn put_container(&self, container: &str) -> Result<()>;

    /// List one page of a container
    async fn get_container(&self, container: &str, options: ListOptions) -> Result<ListPage>;

    /// Get container metadata
    async fn head_container(&self, container: &str) -> Result<ContainerInfo>;

    /// Get object content as bytes
    async fn get_object(&self, container: &str, name: &str) -> Result<Vec<u8>>;

    /// Create or overwrite an object
    async fn put_object(&self, container: &str, name: &str, data: Vec<u8>) -> Result<()>;

    /// Delete an object
    async fn delete_object(&self, container: &str, name: &str) -> Result<()>;

    /// Get object metadata
    async fn head_object(&self, container: &str, name: &str) -> Result<ObjectInfo>;
}

/// Values that can be written to a store as raw bytes
///
/// Byte containers and strings are written verbatim. Numeric scalars and
/// slices are written in their native in-memory representation.
pub trait AsBuffer {
    /// Borrow or build the byte representation
    fn as_buffer(&self) -> Cow<'_, [u8]>;
}

impl AsBuffer for [u8] {
    fn as_buffer(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }
}

impl<const N: usize> AsBuffer for [u8; N] {
    fn as_buffer(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_slice())
    }
}

impl AsBuffer for Vec<u8> {
    fn as_buffer(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_slice())
    }
}

impl AsBuffer for str {
    fn as_buffer(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl AsBuffer for String {
    fn as_buffer(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl AsBuffer for u8 {
    fn as_buffer(&self) -> Cow<'_, [u8]> {
        Cow::Owned(vec![*self])
    }
}

macro_rules! numeric_buffer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl AsBuffer for $ty {
                fn as_buffer(&self) -> Cow<'_, [u8]> {
                    Cow::Owned(self.to_ne_bytes().to_vec())
                }
            }

            impl AsBuffer for [$ty] {
                fn as_buffer(&self) -> Cow<'_, [u8]> {
                    Cow::Owned(self.iter().flat_map(|v| v.to_ne_bytes()).collect())
                }
            }

            impl<const N: usize> AsBuffer for [$ty; N] {
                fn as_buffer(&self) -> Cow<'_, [u8]> {
                    self.as_slice().as_buffer()
                }
            }

            impl AsBuffer for Vec<$ty> {
                fn as_buffer(&self) -> Cow<'_, [u8]> {
                    self.as_slice().as_buffer()
                }
            }
        )*
    };
}

numeric_buffer!(i8, i16, u16, i32, u32, i64, u64, f32, f64);

/// Mutable mapping over logical keys
///
/// Point operations fail with [`crate::Error::NotFound`] for absent keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the bytes stored under `key`
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Write `value` under `key`, creating or overwriting it
    async fn set<V>(&mut self, key: &str, value: &V) -> Result<()>
    where
        V: AsBuffer + ?Sized + Sync;

    /// Remove `key`
    async fn delete(&mut self, key: &str) -> Result<()>;

    /// Whether `key` is stored
    async fn contains(&self, key: &str) -> Result<bool>;

    /// Lazily list every logical key
    ///
    /// Each call starts a fresh listing.
    fn keys(&self) -> BoxStream<'_, Result<String>>;

    /// Number of stored keys
    async fn len(&self) -> Result<usize>;

    /// Whether the store holds no keys
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
