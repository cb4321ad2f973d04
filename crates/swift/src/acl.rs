//! Container read ACL helpers
//!
//! A container is public when its read ACL grants `.r:*` (any referrer).
//! Making it public also grants `.rlistings` so anonymous clients can list it.

use std::collections::BTreeSet;

use zs_core::{ObjectBackend, Result};

use crate::SwiftStore;

/// Read grant for any referrer
pub const PUBLIC_READ: &str = ".r:*";

/// Grant allowing container listings
pub const LISTINGS: &str = ".rlistings";

/// Whether a read ACL grants public access
pub fn acl_is_public(acl: &str) -> bool {
    acl.split(',').any(|entry| entry.trim() == PUBLIC_READ)
}

/// Flip the public grant of a read ACL
///
/// Entries are deduplicated and sorted; empty entries are dropped.
pub fn toggle_acl(acl: &str) -> String {
    let mut entries: BTreeSet<&str> = acl
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect();

    if entries.contains(PUBLIC_READ) {
        entries.remove(PUBLIC_READ);
    } else {
        entries.insert(PUBLIC_READ);
        entries.insert(LISTINGS);
    }

    entries.into_iter().collect::<Vec<_>>().join(",")
}

/// Whether the store's container is publicly readable
pub async fn is_public(store: &SwiftStore) -> Result<bool> {
    let info = store.backend().head_container(store.container()).await?;
    Ok(info.read_acl.as_deref().is_some_and(acl_is_public))
}

/// Toggle public read access of the store's container
///
/// Returns whether the container is public afterwards.
pub async fn toggle_public(store: &SwiftStore) -> Result<bool> {
    let info = store.backend().head_container(store.container()).await?;
    let acl = toggle_acl(info.read_acl.as_deref().unwrap_or(""));

    store.backend().set_read_acl(store.container(), &acl).await?;
    let public = acl_is_public(&acl);
    tracing::info!(container = store.container(), public, acl = %acl, "Updated read ACL");
    Ok(public)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acl_is_public() {
        assert!(acl_is_public(".r:*"));
        assert!(acl_is_public("acct:user, .r:*,.rlistings"));
        assert!(!acl_is_public(""));
        assert!(!acl_is_public(".rlistings"));
        assert!(!acl_is_public(".r:example.com"));
    }

    #[test]
    fn test_toggle_private_to_public() {
        assert_eq!(toggle_acl(""), ".r:*,.rlistings");
        assert_eq!(toggle_acl("acct:user"), ".r:*,.rlistings,acct:user");
    }

    #[test]
    fn test_toggle_public_to_private_keeps_other_grants() {
        assert_eq!(toggle_acl(".r:*,.rlistings"), ".rlistings");
        assert_eq!(toggle_acl("acct:user,.r:*,,acct:user"), "acct:user");
    }

    #[test]
    fn test_toggle_twice() {
        let public = toggle_acl("acct:user");
        assert!(acl_is_public(&public));
        let private = toggle_acl(&public);
        assert!(!acl_is_public(&private));
        assert_eq!(private, ".rlistings,acct:user");
    }
}
