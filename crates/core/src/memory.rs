//! In-memory object backend
//!
//! Emulates the listing semantics of a Swift container (name ordering,
//! prefix, delimiter, marker and limit) over a `BTreeMap`. Clones share the
//! same underlying state, so two handles built from clones of one backend
//! see each other's writes the way two connections to one service would.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::traits::{
    ContainerInfo, ListEntry, ListOptions, ListPage, ObjectBackend, ObjectInfo,
    DEFAULT_LISTING_LIMIT,
};

type Containers = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

/// Object backend held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    containers: Arc<Mutex<Containers>>,
    requests: Arc<AtomicUsize>,
}

impl MemoryBackend {
    /// Create an empty backend with no containers
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of backend requests served so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Names of every object in a container, in name order
    pub fn object_names(&self, container: &str) -> Vec<String> {
        self.lock()
            .ok()
            .and_then(|containers| containers.get(container).map(|c| c.keys().cloned().collect()))
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Containers>> {
        self.containers
            .lock()
            .map_err(|_| Error::General("memory backend state poisoned".into()))
    }

    fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

fn container_not_found(container: &str) -> Error {
    Error::NotFound(format!("container {container}"))
}

fn object_not_found(container: &str, name: &str) -> Error {
    Error::NotFound(format!("{container}/{name}"))
}

/// Build one listing page from an ordered object map
fn list_page(objects: &BTreeMap<String, Vec<u8>>, options: &ListOptions) -> ListPage {
    let prefix = options.prefix.as_deref().unwrap_or("");
    let marker = options.marker.as_deref();
    let limit = options.limit.unwrap_or(DEFAULT_LISTING_LIMIT).max(1);

    let mut entries: Vec<ListEntry> = Vec::new();
    let mut truncated = false;

    for (name, data) in objects {
        if marker.is_some_and(|m| name.as_str() <= m) || !name.starts_with(prefix) {
            continue;
        }

        let entry = match options.delimiter {
            Some(delimiter) => {
                let rest = &name[prefix.len()..];
                match rest.find(delimiter) {
                    Some(pos) => {
                        let subdir = format!("{prefix}{}", &rest[..pos + delimiter.len_utf8()]);
                        if marker.is_some_and(|m| subdir.as_str() <= m)
                            || entries.last().is_some_and(|last| last.name() == subdir)
                        {
                            continue;
                        }
                        ListEntry::Subdir { prefix: subdir }
                    }
                    None => ListEntry::Object(ObjectInfo::new(name, data.len() as u64)),
                }
            }
            None => ListEntry::Object(ObjectInfo::new(name, data.len() as u64)),
        };

        if entries.len() == limit {
            truncated = true;
            break;
        }
        entries.push(entry);
    }

    let next_marker = if truncated {
        entries.last().map(|entry| entry.name().to_string())
    } else {
        None
    };

    ListPage {
        entries,
        next_marker,
    }
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    async fn get_account(&self) -> Result<Vec<ContainerInfo>> {
        self.record_request();
        let containers = self.lock()?;
        Ok(containers
            .iter()
            .map(|(name, objects)| ContainerInfo {
                name: name.clone(),
                object_count: objects.len() as u64,
                bytes_used: objects.values().map(|d| d.len() as u64).sum(),
                read_acl: None,
            })
            .collect())
    }

    async fn put_container(&self, container: &str) -> Result<()> {
        self.record_request();
        self.lock()?.entry(container.to_string()).or_default();
        Ok(())
    }

    async fn get_container(&self, container: &str, options: ListOptions) -> Result<ListPage> {
        self.record_request();
        let containers = self.lock()?;
        let objects = containers
            .get(container)
            .ok_or_else(|| container_not_found(container))?;
        Ok(list_page(objects, &options))
    }

    async fn head_container(&self, container: &str) -> Result<ContainerInfo> {
        self.record_request();
        let containers = self.lock()?;
        let objects = containers
            .get(container)
            .ok_or_else(|| container_not_found(container))?;
        Ok(ContainerInfo {
            name: container.to_string(),
            object_count: objects.len() as u64,
            bytes_used: objects.values().map(|d| d.len() as u64).sum(),
            read_acl: None,
        })
    }

    async fn get_object(&self, container: &str, name: &str) -> Result<Vec<u8>> {
        self.record_request();
        let containers = self.lock()?;
        containers
            .get(container)
            .ok_or_else(|| container_not_found(container))?
            .get(name)
            .cloned()
            .ok_or_else(|| object_not_found(container, name))
    }

    async fn put_object(&self, container: &str, name: &str, data: Vec<u8>) -> Result<()> {
        self.record_request();
        let mut containers = self.lock()?;
        containers
            .get_mut(container)
            .ok_or_else(|| container_not_found(container))?
            .insert(name.to_string(), data);
        Ok(())
    }

    async fn delete_object(&self, container: &str, name: &str) -> Result<()> {
        self.record_request();
        let mut containers = self.lock()?;
        containers
            .get_mut(container)
            .ok_or_else(|| container_not_found(container))?
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| object_not_found(container, name))
    }

    async fn head_object(&self, container: &str, name: &str) -> Result<ObjectInfo> {
        self.record_request();
        let containers = self.lock()?;
        containers
            .get(container)
            .ok_or_else(|| container_not_found(container))?
            .get(name)
            .map(|data| ObjectInfo::new(name, data.len() as u64))
            .ok_or_else(|| object_not_found(container, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.put_container("zarr").await.unwrap();
        for name in ["a", "b", "c/d", "c/e/f", "c/e/g"] {
            backend
                .put_object("zarr", name, name.as_bytes().to_vec())
                .await
                .unwrap();
        }
        backend
    }

    fn names(page: &ListPage) -> Vec<&str> {
        page.entries.iter().map(ListEntry::name).collect()
    }

    #[tokio::test]
    async fn test_put_container_is_idempotent() {
        let backend = seeded().await;
        backend.put_container("zarr").await.unwrap();
        assert_eq!(backend.object_names("zarr").len(), 5);
    }

    #[tokio::test]
    async fn test_put_object_requires_container() {
        let backend = MemoryBackend::new();
        let result = backend.put_object("missing", "a", vec![1]).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_listing_with_prefix() {
        let backend = seeded().await;
        let options = ListOptions {
            prefix: Some("c/".into()),
            ..Default::default()
        };
        let page = backend.get_container("zarr", options).await.unwrap();
        assert_eq!(names(&page), vec!["c/d", "c/e/f", "c/e/g"]);
        assert!(page.next_marker.is_none());
    }

    #[tokio::test]
    async fn test_listing_with_delimiter() {
        let backend = seeded().await;
        let options = ListOptions {
            delimiter: Some('/'),
            ..Default::default()
        };
        let page = backend.get_container("zarr", options).await.unwrap();
        assert_eq!(names(&page), vec!["a", "b", "c/"]);
        assert!(matches!(page.entries[2], ListEntry::Subdir { .. }));
    }

    #[tokio::test]
    async fn test_listing_pages_with_marker() {
        let backend = seeded().await;
        let options = ListOptions {
            limit: Some(2),
            ..Default::default()
        };
        let first = backend.get_container("zarr", options.clone()).await.unwrap();
        assert_eq!(names(&first), vec!["a", "b"]);
        assert_eq!(first.next_marker.as_deref(), Some("b"));

        let options = ListOptions {
            marker: first.next_marker,
            limit: Some(2),
            ..Default::default()
        };
        let second = backend.get_container("zarr", options).await.unwrap();
        assert_eq!(names(&second), vec!["c/d", "c/e/f"]);

        let options = ListOptions {
            marker: second.next_marker,
            limit: Some(2),
            ..Default::default()
        };
        let third = backend.get_container("zarr", options).await.unwrap();
        assert_eq!(names(&third), vec!["c/e/g"]);
        assert!(third.next_marker.is_none());
    }

    #[tokio::test]
    async fn test_listing_without_limit_uses_default_page_size() {
        let backend = MemoryBackend::new();
        backend.put_container("big").await.unwrap();
        for i in 0..=DEFAULT_LISTING_LIMIT {
            backend
                .put_object("big", &format!("k{i:05}"), Vec::new())
                .await
                .unwrap();
        }

        let page = backend
            .get_container("big", ListOptions::default())
            .await
            .unwrap();
        assert_eq!(page.entries.len(), DEFAULT_LISTING_LIMIT);
        assert!(page.next_marker.is_some());
    }

    #[tokio::test]
    async fn test_subdir_marker_skips_rolled_up_names() {
        let backend = seeded().await;
        let options = ListOptions {
            prefix: Some("c/".into()),
            delimiter: Some('/'),
            marker: Some("c/e/".into()),
            ..Default::default()
        };
        let page = backend.get_container("zarr", options).await.unwrap();
        assert!(page.entries.is_empty());
    }

    #[tokio::test]
    async fn test_head_container_reports_usage() {
        let backend = seeded().await;
        let info = backend.head_container("zarr").await.unwrap();
        assert_eq!(info.object_count, 5);
        assert_eq!(info.bytes_used, 1 + 1 + 3 + 5 + 5);
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let backend = seeded().await;
        assert!(matches!(
            backend.get_object("zarr", "nope").await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            backend.delete_object("zarr", "nope").await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            backend.head_object("zarr", "nope").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let backend = seeded().await;
        let other = backend.clone();
        other.delete_object("zarr", "a").await.unwrap();
        assert!(!backend.object_names("zarr").contains(&"a".to_string()));
        assert!(backend.request_count() > 0);
    }
}
