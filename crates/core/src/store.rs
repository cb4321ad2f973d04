//! Hierarchical key/value store
//!
//! Presents mapping semantics plus directory semantics (children, aggregate
//! size, subtree removal) over the flat, prefix-searchable namespace of an
//! [`ObjectBackend`] container. Every logical key lives under a normalized
//! root prefix, and directory matching always tests `key + "/"` so that
//! `c/dx` is never treated as part of `c/d`.

use std::collections::BTreeSet;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::index::KeyIndex;
use crate::key;
use crate::traits::{AsBuffer, KeyValueStore, ListEntry, ListOptions, ObjectBackend, ObjectInfo};

/// Options that identify a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Container holding the store's objects
    pub container: String,

    /// Root prefix inside the container
    #[serde(default)]
    pub prefix: String,

    /// Keep a local index of known object names
    #[serde(default)]
    pub membership_cache: bool,
}

impl StoreOptions {
    /// Create options for a container with an empty prefix and no index
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            prefix: String::new(),
            membership_cache: false,
        }
    }

    /// Set the root prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Enable or disable the membership index
    pub fn with_membership_cache(mut self, enabled: bool) -> Self {
        self.membership_cache = enabled;
        self
    }
}

/// Key/value store emulating a directory tree inside one container
pub struct HierarchicalStore<B> {
    backend: B,
    container: String,
    prefix: String,
    index: Option<KeyIndex>,
}

impl<B: ObjectBackend> HierarchicalStore<B> {
    /// Open a store, creating its container when the account lacks it
    pub async fn open(backend: B, options: StoreOptions) -> Result<Self> {
        if options.container.is_empty() {
            return Err(Error::Config("Container name cannot be empty".into()));
        }

        let mut store = Self {
            backend,
            prefix: key::normalize(&options.prefix)?,
            container: options.container,
            index: None,
        };

        store.ensure_container().await?;
        if options.membership_cache {
            store.rebuild_index().await?;
        }

        tracing::debug!(
            container = %store.container,
            prefix = %store.prefix,
            indexed = store.index.is_some(),
            "Opened store"
        );
        Ok(store)
    }

    /// Create the container if the account does not list it
    pub async fn ensure_container(&self) -> Result<()> {
        let containers = self.backend.get_account().await?;
        if containers.iter().any(|c| c.name == self.container) {
            return Ok(());
        }

        tracing::info!(container = %self.container, "Creating container");
        self.backend.put_container(&self.container).await
    }

    /// Rebuild the membership index from a fresh listing
    pub async fn rebuild_index(&mut self) -> Result<()> {
        let index: KeyIndex = self
            .list_objects(self.root_listing_prefix())
            .map_ok(|info| info.name)
            .try_collect::<Vec<_>>()
            .await?
            .into_iter()
            .collect();

        tracing::debug!(objects = index.len(), "Rebuilt membership index");
        self.index = Some(index);
        Ok(())
    }

    /// Container name
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Normalized root prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Membership index, when enabled
    pub fn index(&self) -> Option<&KeyIndex> {
        self.index.as_ref()
    }

    /// Options that reopen an equivalent store
    pub fn options(&self) -> StoreOptions {
        StoreOptions {
            container: self.container.clone(),
            prefix: self.prefix.clone(),
            membership_cache: self.index.is_some(),
        }
    }

    /// Physical object name for a logical key
    pub fn physical_name(&self, key: &str) -> Result<String> {
        key::join(&self.prefix, key)
    }

    /// Physical name of a leaf key, `None` when the key is the store root
    fn object_name(&self, key: &str) -> Result<Option<String>> {
        if key::normalize(key)?.is_empty() {
            return Ok(None);
        }
        self.physical_name(key).map(Some)
    }

    fn root_listing_prefix(&self) -> String {
        key::dir_prefix(&self.prefix)
    }

    fn is_indexed_absent(&self, name: &str) -> bool {
        self.index.as_ref().is_some_and(|index| !index.contains(name))
    }

    /// Page through every entry whose name starts with `prefix`
    fn list_entries(
        &self,
        prefix: String,
        delimiter: Option<char>,
    ) -> BoxStream<'_, Result<ListEntry>> {
        stream::try_unfold(Some(None), move |cursor: Option<Option<String>>| {
            let options = cursor.map(|marker| ListOptions {
                prefix: Some(prefix.clone()),
                delimiter,
                marker,
                limit: None,
            });
            async move {
                let Some(options) = options else {
                    return Ok(None);
                };
                let page = self.backend.get_container(&self.container, options).await?;
                tracing::debug!(entries = page.entries.len(), "Listed page");
                let cursor = page.next_marker.map(Some);
                Ok::<_, Error>(Some((page.entries, cursor)))
            }
        })
        .map_ok(|entries| stream::iter(entries.into_iter().map(Ok::<_, Error>)))
        .try_flatten()
        .boxed()
    }

    /// Every object whose name starts with `prefix`
    fn list_objects(&self, prefix: String) -> BoxStream<'_, Result<ObjectInfo>> {
        self.list_entries(prefix, None)
            .try_filter_map(|entry| futures::future::ready(Ok(entry.into_object())))
            .boxed()
    }

    /// Logical keys of every object whose physical name starts with `prefix`
    fn keys_with_prefix(&self, prefix: String) -> BoxStream<'_, Result<String>> {
        let root = self.root_listing_prefix();
        self.list_objects(prefix)
            .try_filter_map(move |info| {
                let key = key::strip_dir_prefix(&info.name, &root).map(str::to_string);
                futures::future::ready(Ok(key))
            })
            .boxed()
    }

    /// Logical keys stored below `key` (every key when `None`)
    ///
    /// Keys are relative to the store root, not to `key`.
    pub fn subtree_keys(&self, key: Option<&str>) -> Result<BoxStream<'_, Result<String>>> {
        let name = self.physical_name(key.unwrap_or(""))?;
        Ok(self.keys_with_prefix(key::dir_prefix(&name)))
    }

    /// Size of a leaf object, `None` when no object has this name
    async fn leaf_size(&self, name: &str) -> Result<Option<u64>> {
        if self.is_indexed_absent(name) {
            return Ok(None);
        }
        match self.backend.head_object(&self.container, name).await {
            Ok(info) => Ok(Some(info.size_bytes)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Sorted immediate child segments below `key` (the root when `None`)
    ///
    /// A key without descendants, including a leaf or a key that was never
    /// written, has no children.
    pub async fn list_children(&self, key: Option<&str>) -> Result<Vec<String>> {
        let dir = self.physical_name(key.unwrap_or(""))?;
        let prefix = key::dir_prefix(&dir);

        let children: BTreeSet<String> = self
            .list_entries(prefix.clone(), Some(key::SEPARATOR))
            .try_fold(BTreeSet::new(), |mut children, entry| {
                if let Some(rest) = key::strip_dir_prefix(entry.name(), &prefix) {
                    let child = key::first_segment(rest);
                    if !child.is_empty() {
                        children.insert(child.to_string());
                    }
                }
                futures::future::ready(Ok(children))
            })
            .await?;

        Ok(children.into_iter().collect())
    }

    /// Byte size under `key` (the whole store when `None`)
    ///
    /// A leaf object reports its exact length. Anything else is treated as a
    /// directory and reports the sum of every object below it, which is zero
    /// when nothing matches.
    pub async fn aggregate_size(&self, key: Option<&str>) -> Result<u64> {
        let name = self.physical_name(key.unwrap_or(""))?;

        if let Some(leaf) = self.object_name(key.unwrap_or(""))? {
            if let Some(size) = self.leaf_size(&leaf).await? {
                return Ok(size);
            }
        }

        self.list_objects(key::dir_prefix(&name))
            .try_fold(0u64, |total, info| {
                futures::future::ready(Ok(total + info.size_bytes))
            })
            .await
    }

    /// Delete `key` and everything below it (the whole store when `None`)
    ///
    /// Returns the number of objects removed. A missing subtree is a no-op.
    /// The first failing request aborts the walk; earlier deletes stand.
    pub async fn remove_subtree(&mut self, key: Option<&str>) -> Result<usize> {
        let name = self.physical_name(key.unwrap_or(""))?;

        let mut names: Vec<String> = self
            .list_objects(key::dir_prefix(&name))
            .map_ok(|info| info.name)
            .try_collect()
            .await?;

        if let Some(leaf) = self.object_name(key.unwrap_or(""))? {
            if !self.is_indexed_absent(&leaf) {
                names.push(leaf);
            }
        }

        let mut removed = 0;
        for name in names {
            match self.backend.delete_object(&self.container, &name).await {
                Ok(()) => {
                    tracing::debug!(name = %name, "Removed object");
                    removed += 1;
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!(name = %name, "Object already absent");
                }
                Err(e) => return Err(e),
            }
            if let Some(index) = self.index.as_mut() {
                index.remove(&name);
            }
        }

        Ok(removed)
    }

    /// Delete every object under the root prefix
    pub async fn clear(&mut self) -> Result<()> {
        let removed = self.remove_subtree(None).await?;
        tracing::debug!(removed, "Cleared store");
        Ok(())
    }
}

#[async_trait]
impl<B: ObjectBackend> KeyValueStore for HierarchicalStore<B> {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let Some(name) = self.object_name(key)? else {
            return Err(Error::NotFound(self.prefix.clone()));
        };
        if self.is_indexed_absent(&name) {
            return Err(Error::NotFound(name));
        }

        match self.backend.get_object(&self.container, &name).await {
            Err(e) if e.is_not_found() => Err(Error::NotFound(name)),
            other => other,
        }
    }

    async fn set<V>(&mut self, key: &str, value: &V) -> Result<()>
    where
        V: AsBuffer + ?Sized + Sync,
    {
        let name = self
            .object_name(key)?
            .ok_or_else(|| Error::InvalidKey("Key cannot be empty".into()))?;
        let data = value.as_buffer().into_owned();

        tracing::debug!(name = %name, size = data.len(), "Writing object");
        self.backend
            .put_object(&self.container, &name, data)
            .await?;

        if let Some(index) = self.index.as_mut() {
            index.insert(name);
        }
        Ok(())
    }

    async fn delete(&mut self, key: &str) -> Result<()> {
        let Some(name) = self.object_name(key)? else {
            return Err(Error::NotFound(self.prefix.clone()));
        };
        if self.is_indexed_absent(&name) {
            return Err(Error::NotFound(name));
        }

        match self.backend.delete_object(&self.container, &name).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return Err(Error::NotFound(name)),
            Err(e) => return Err(e),
        }

        if let Some(index) = self.index.as_mut() {
            index.remove(&name);
        }
        Ok(())
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        let Some(name) = self.object_name(key)? else {
            return Ok(false);
        };
        if let Some(index) = &self.index {
            return Ok(index.contains(&name));
        }

        match self.backend.head_object(&self.container, &name).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn keys(&self) -> BoxStream<'_, Result<String>> {
        self.keys_with_prefix(self.root_listing_prefix())
    }

    async fn len(&self) -> Result<usize> {
        if let Some(index) = &self.index {
            return Ok(index.len());
        }
        self.keys()
            .try_fold(0usize, |count, _| futures::future::ready(Ok(count + 1)))
            .await
    }
}

impl<B> PartialEq for HierarchicalStore<B> {
    fn eq(&self, other: &Self) -> bool {
        self.container == other.container && self.prefix == other.prefix
    }
}

impl<B> Eq for HierarchicalStore<B> {}

impl<B> std::fmt::Debug for HierarchicalStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchicalStore")
            .field("container", &self.container)
            .field("prefix", &self.prefix)
            .field("indexed", &self.index.as_ref().map(KeyIndex::len))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use crate::traits::{ContainerInfo, ListPage, MockObjectBackend};
    use mockall::predicate::eq;

    async fn open(backend: &MemoryBackend, prefix: &str) -> HierarchicalStore<MemoryBackend> {
        HierarchicalStore::open(backend.clone(), StoreOptions::new("zarr").with_prefix(prefix))
            .await
            .unwrap()
    }

    async fn populate<B: ObjectBackend>(store: &mut HierarchicalStore<B>) {
        store.set("a", b"aaa").await.unwrap();
        store.set("b", b"bbb").await.unwrap();
        store.set("c/d", b"ddd").await.unwrap();
        store.set("c/e/f", b"fff").await.unwrap();
        store.set("c/e/g", b"ggg").await.unwrap();
    }

    async fn sorted_keys<B: ObjectBackend>(store: &HierarchicalStore<B>) -> Vec<String> {
        let mut keys: Vec<String> = store.keys().try_collect().await.unwrap();
        keys.sort();
        keys
    }

    #[tokio::test]
    async fn test_round_trip_is_byte_exact() {
        let backend = MemoryBackend::new();
        let mut store = open(&backend, "").await;

        let payload: Vec<u8> = (0..=255).collect();
        store.set("chunk/0.0", &payload).await.unwrap();
        assert_eq!(store.get("chunk/0.0").await.unwrap(), payload);

        store.set("chunk/0.0", b"").await.unwrap();
        assert_eq!(store.get("chunk/0.0").await.unwrap(), Vec::<u8>::new());
    }

    #[tokio::test]
    async fn test_numeric_values_are_stored_as_buffers() {
        let backend = MemoryBackend::new();
        let mut store = open(&backend, "").await;

        store.set("fill", &42.0f64).await.unwrap();
        assert_eq!(store.get("fill").await.unwrap(), 42.0f64.to_ne_bytes());
    }

    #[tokio::test]
    async fn test_missing_keys_are_not_found() {
        let backend = MemoryBackend::new();
        let mut store = open(&backend, "").await;

        assert!(matches!(store.get("nope").await, Err(Error::NotFound(_))));
        assert!(matches!(store.delete("nope").await, Err(Error::NotFound(_))));
        assert!(!store.contains("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_removes_key() {
        let backend = MemoryBackend::new();
        let mut store = open(&backend, "").await;

        store.set("a", b"aaa").await.unwrap();
        assert!(store.contains("a").await.unwrap());
        store.delete("a").await.unwrap();
        assert!(!store.contains("a").await.unwrap());
        assert!(matches!(store.get("a").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_key_is_rejected_for_writes() {
        let backend = MemoryBackend::new();
        let mut store = open(&backend, "p").await;

        assert!(matches!(store.set("", b"x").await, Err(Error::InvalidKey(_))));
        assert!(matches!(store.set("/", b"x").await, Err(Error::InvalidKey(_))));
        assert!(!store.contains("").await.unwrap());
        assert!(matches!(store.get("").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_scenario_without_prefix() {
        let backend = MemoryBackend::new();
        let mut store = open(&backend, "").await;
        populate(&mut store).await;

        assert_eq!(store.len().await.unwrap(), 5);
        assert_eq!(
            sorted_keys(&store).await,
            vec!["a", "b", "c/d", "c/e/f", "c/e/g"]
        );
        assert!(!store.contains("c").await.unwrap());
        assert!(matches!(store.get("c").await, Err(Error::NotFound(_))));

        assert_eq!(store.list_children(Some("c")).await.unwrap(), vec!["d", "e"]);
        assert_eq!(store.list_children(None).await.unwrap(), vec!["a", "b", "c"]);
        assert_eq!(store.aggregate_size(None).await.unwrap(), 15);
        assert_eq!(store.aggregate_size(Some("c")).await.unwrap(), 9);
        assert_eq!(store.aggregate_size(Some("c/e")).await.unwrap(), 6);
        assert_eq!(store.aggregate_size(Some("a")).await.unwrap(), 3);

        assert!(store.list_children(Some("x")).await.unwrap().is_empty());
        assert_eq!(store.aggregate_size(Some("x")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_scenario_with_prefix() {
        for prefix in ["test_prefix", "/test_prefix", "test_prefix/", "test/prefix"] {
            let backend = MemoryBackend::new();
            let mut store = open(&backend, prefix).await;

            assert_eq!(store.len().await.unwrap(), 0);
            assert!(store.is_empty().await.unwrap());

            store.set("a", b"aaa").await.unwrap();
            store.set("b", b"bbb").await.unwrap();
            store.set("c/d", b"ddd").await.unwrap();
            store.set("c/e/f", b"fff").await.unwrap();

            assert_eq!(store.len().await.unwrap(), 4);
            assert_eq!(sorted_keys(&store).await, vec!["a", "b", "c/d", "c/e/f"]);
            assert_eq!(store.list_children(None).await.unwrap(), vec!["a", "b", "c"]);
            assert_eq!(store.aggregate_size(None).await.unwrap(), 12);

            let expected_prefix = key::normalize(prefix).unwrap();
            for name in backend.object_names("zarr") {
                assert!(name.starts_with(&format!("{expected_prefix}/")));
            }
        }
    }

    #[tokio::test]
    async fn test_prefix_spellings_are_equal() {
        let backend = MemoryBackend::new();
        let stores = [
            open(&backend, "p").await,
            open(&backend, "/p").await,
            open(&backend, "p/").await,
            open(&backend, "p//").await,
        ];

        for store in &stores {
            assert_eq!(store, &stores[0]);
            assert_eq!(store.prefix(), "p");
            assert_eq!(store.physical_name("c/d").unwrap(), "p/c/d");
        }
    }

    #[tokio::test]
    async fn test_equality_ignores_connection() {
        let store1 = open(&MemoryBackend::new(), "").await;
        let store2 = open(&MemoryBackend::new(), "").await;
        assert_eq!(store1, store2);

        let other_prefix = open(&MemoryBackend::new(), "q").await;
        assert_ne!(store1, other_prefix);

        let other_container =
            HierarchicalStore::open(MemoryBackend::new(), StoreOptions::new("other"))
                .await
                .unwrap();
        assert_ne!(store1, other_container);
    }

    #[tokio::test]
    async fn test_prefixed_stores_are_isolated() {
        let backend = MemoryBackend::new();
        let mut left = open(&backend, "left").await;
        let mut right = open(&backend, "leftover").await;

        left.set("a", b"1").await.unwrap();
        right.set("b", b"22").await.unwrap();

        assert_eq!(sorted_keys(&left).await, vec!["a"]);
        assert_eq!(sorted_keys(&right).await, vec!["b"]);
        assert_eq!(left.aggregate_size(None).await.unwrap(), 1);

        left.clear().await.unwrap();
        assert_eq!(sorted_keys(&right).await, vec!["b"]);
    }

    #[tokio::test]
    async fn test_segment_boundaries() {
        let backend = MemoryBackend::new();
        let mut store = open(&backend, "").await;
        store.set("c/d", b"ddd").await.unwrap();
        store.set("c/dx", b"xxxxx").await.unwrap();
        store.set("cd", b"no").await.unwrap();

        assert_eq!(store.list_children(Some("c")).await.unwrap(), vec!["d", "dx"]);
        assert_eq!(store.aggregate_size(Some("c/d")).await.unwrap(), 3);
        assert_eq!(store.aggregate_size(Some("c")).await.unwrap(), 8);

        store.remove_subtree(Some("c/d")).await.unwrap();
        assert!(store.contains("c/dx").await.unwrap());
        store.remove_subtree(Some("c")).await.unwrap();
        assert!(store.contains("cd").await.unwrap());
    }

    #[tokio::test]
    async fn test_leaf_has_no_children() {
        let backend = MemoryBackend::new();
        let mut store = open(&backend, "").await;
        populate(&mut store).await;

        assert!(store.list_children(Some("a")).await.unwrap().is_empty());
        assert!(store.list_children(Some("c/d")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_subtree_sequence() {
        let backend = MemoryBackend::new();
        let mut store = open(&backend, "").await;
        populate(&mut store).await;

        assert_eq!(store.remove_subtree(Some("c/e")).await.unwrap(), 2);
        assert!(store.contains("c/d").await.unwrap());
        assert!(!store.contains("c/e/f").await.unwrap());
        assert!(!store.contains("c/e/g").await.unwrap());

        assert_eq!(store.remove_subtree(Some("c")).await.unwrap(), 1);
        assert!(!store.contains("c/d").await.unwrap());

        assert_eq!(store.remove_subtree(None).await.unwrap(), 2);
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_remove_subtree_of_leaf() {
        let backend = MemoryBackend::new();
        let mut store = open(&backend, "").await;
        populate(&mut store).await;

        assert_eq!(store.remove_subtree(Some("a")).await.unwrap(), 1);
        assert!(!store.contains("a").await.unwrap());
        assert_eq!(store.len().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_remove_missing_subtree_is_noop() {
        let backend = MemoryBackend::new();
        let mut store = open(&backend, "").await;
        populate(&mut store).await;

        assert_eq!(
            store.remove_subtree(Some("nonexistent/path")).await.unwrap(),
            0
        );
        assert_eq!(store.len().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_clear_keeps_other_containers() {
        let backend = MemoryBackend::new();
        let mut store = open(&backend, "").await;
        let mut other =
            HierarchicalStore::open(backend.clone(), StoreOptions::new("other"))
                .await
                .unwrap();

        populate(&mut store).await;
        other.set("keep", b"1").await.unwrap();

        store.clear().await.unwrap();
        assert_eq!(store.len().await.unwrap(), 0);
        assert_eq!(other.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_subtree_keys() {
        let backend = MemoryBackend::new();
        let mut store = open(&backend, "root").await;
        populate(&mut store).await;
        store.set("c/dx", b"x").await.unwrap();

        let mut keys: Vec<String> = store
            .subtree_keys(Some("c/e"))
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        keys.sort();
        assert_eq!(keys, vec!["c/e/f", "c/e/g"]);

        let all: Vec<String> = store.subtree_keys(None).unwrap().try_collect().await.unwrap();
        assert_eq!(all.len(), 6);

        let leaf: Vec<String> = store.subtree_keys(Some("a")).unwrap().try_collect().await.unwrap();
        assert!(leaf.is_empty());
        assert!(matches!(store.subtree_keys(Some("../x")), Err(Error::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_keys_is_restartable() {
        let backend = MemoryBackend::new();
        let mut store = open(&backend, "p").await;
        for i in 0..25 {
            store.set(&format!("k/{i:02}"), b"x").await.unwrap();
        }

        let first: Vec<String> = store.keys().try_collect().await.unwrap();
        let second: Vec<String> = store.keys().try_collect().await.unwrap();
        assert_eq!(first.len(), 25);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_keys_follow_listing_markers() {
        let mut backend = MockObjectBackend::new();
        backend
            .expect_get_account()
            .returning(|| Ok(vec![ContainerInfo::named("zarr")]));
        backend
            .expect_get_container()
            .withf(|_, options| options.marker.is_none())
            .times(1)
            .returning(|_, _| {
                Ok(ListPage {
                    entries: vec![ListEntry::Object(ObjectInfo::new("p/a", 1))],
                    next_marker: Some("p/a".into()),
                })
            });
        backend
            .expect_get_container()
            .withf(|_, options| options.marker.as_deref() == Some("p/a"))
            .times(1)
            .returning(|_, _| {
                Ok(ListPage {
                    entries: vec![ListEntry::Object(ObjectInfo::new("p/b/c", 1))],
                    next_marker: None,
                })
            });

        let store = HierarchicalStore::open(backend, StoreOptions::new("zarr").with_prefix("p"))
            .await
            .unwrap();
        let keys: Vec<String> = store.keys().try_collect().await.unwrap();
        assert_eq!(keys, vec!["a", "b/c"]);
    }

    #[tokio::test]
    async fn test_membership_cache_tracks_mutations() {
        let backend = MemoryBackend::new();
        let mut seeded = open(&backend, "p").await;
        seeded.set("existing", b"1").await.unwrap();

        let options = StoreOptions::new("zarr")
            .with_prefix("p")
            .with_membership_cache(true);
        let mut store = HierarchicalStore::open(backend.clone(), options)
            .await
            .unwrap();
        assert!(store.index().unwrap().contains("p/existing"));

        store.set("a", b"aaa").await.unwrap();
        assert!(store.index().unwrap().contains("p/a"));

        let before = backend.request_count();
        assert!(store.contains("a").await.unwrap());
        assert!(!store.contains("missing").await.unwrap());
        assert!(matches!(store.get("missing").await, Err(Error::NotFound(_))));
        assert_eq!(store.len().await.unwrap(), 2);
        assert_eq!(backend.request_count(), before);

        store.delete("a").await.unwrap();
        assert!(!store.index().unwrap().contains("p/a"));

        store.remove_subtree(None).await.unwrap();
        assert!(store.index().unwrap().is_empty());
        assert!(store.options().membership_cache);
    }

    #[tokio::test]
    async fn test_open_creates_missing_container() {
        let mut backend = MockObjectBackend::new();
        backend
            .expect_get_account()
            .times(1)
            .returning(|| Ok(vec![ContainerInfo::named("other")]));
        backend
            .expect_put_container()
            .with(eq("zarr"))
            .times(1)
            .returning(|_| Ok(()));

        let store = HierarchicalStore::open(backend, StoreOptions::new("zarr"))
            .await
            .unwrap();
        assert_eq!(store.container(), "zarr");
    }

    #[tokio::test]
    async fn test_open_skips_existing_container() {
        let mut backend = MockObjectBackend::new();
        backend
            .expect_get_account()
            .times(1)
            .returning(|| Ok(vec![ContainerInfo::named("zarr")]));
        backend.expect_put_container().never();

        HierarchicalStore::open(backend, StoreOptions::new("zarr"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_open_rejects_empty_container() {
        let result = HierarchicalStore::open(MemoryBackend::new(), StoreOptions::new("")).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_transport_errors_propagate() {
        let mut backend = MockObjectBackend::new();
        backend
            .expect_get_account()
            .returning(|| Ok(vec![ContainerInfo::named("zarr")]));
        backend
            .expect_head_object()
            .returning(|_, _| Err(Error::Network("connection reset".into())));
        backend
            .expect_get_object()
            .returning(|_, _| Err(Error::Auth("token expired".into())));

        let store = HierarchicalStore::open(backend, StoreOptions::new("zarr"))
            .await
            .unwrap();
        assert!(matches!(store.contains("a").await, Err(Error::Network(_))));
        assert!(matches!(store.get("a").await, Err(Error::Auth(_))));
        assert!(matches!(
            store.aggregate_size(Some("a")).await,
            Err(Error::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_subtree_stops_on_first_failure() {
        let mut backend = MockObjectBackend::new();
        backend
            .expect_get_account()
            .returning(|| Ok(vec![ContainerInfo::named("zarr")]));
        backend.expect_get_container().returning(|_, _| {
            Ok(ListPage {
                entries: ["c/a", "c/b", "c/c"]
                    .into_iter()
                    .map(|name| ListEntry::Object(ObjectInfo::new(name, 1)))
                    .collect(),
                next_marker: None,
            })
        });
        backend
            .expect_delete_object()
            .with(eq("zarr"), eq("c/a"))
            .times(1)
            .returning(|_, _| Ok(()));
        backend
            .expect_delete_object()
            .with(eq("zarr"), eq("c/b"))
            .times(1)
            .returning(|_, _| Err(Error::Network("server error".into())));

        let mut store = HierarchicalStore::open(backend, StoreOptions::new("zarr"))
            .await
            .unwrap();
        let result = store.remove_subtree(Some("c")).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }
}
