//! stat command - Show container or key metadata
//!
//! `stat PROFILE` describes the profile's container; `stat PROFILE/KEY`
//! describes the object stored under the key.

use clap::Args;
use serde::Serialize;
use zs_core::{ContainerInfo, ObjectBackend, ObjectInfo};
use zs_swift::acl::acl_is_public;

use super::{fail, open_profile, parse_store_path};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Show metadata
#[derive(Args, Debug)]
pub struct StatArgs {
    /// Store path (PROFILE[/KEY])
    pub path: String,
}

#[derive(Debug, Serialize)]
struct ContainerStat {
    container: String,
    prefix: String,
    object_count: u64,
    bytes_used: u64,
    size_human: String,
    public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    read_acl: Option<String>,
}

impl ContainerStat {
    fn new(info: ContainerInfo, prefix: &str) -> Self {
        Self {
            public: info.read_acl.as_deref().is_some_and(acl_is_public),
            size_human: humansize::format_size(info.bytes_used, humansize::BINARY),
            container: info.name,
            prefix: prefix.to_string(),
            object_count: info.object_count,
            bytes_used: info.bytes_used,
            read_acl: info.read_acl,
        }
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Container", self.container.clone()),
            ("Prefix", self.prefix.clone()),
            ("Objects", self.object_count.to_string()),
            ("Size", format!("{} ({} bytes)", self.size_human, self.bytes_used)),
            ("Public", self.public.to_string()),
            ("Read ACL", self.read_acl.clone().unwrap_or_default()),
        ]
    }
}

#[derive(Debug, Serialize)]
struct KeyStat {
    key: String,
    name: String,
    size_bytes: u64,
    size_human: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
}

impl KeyStat {
    fn new(key: &str, info: ObjectInfo) -> Self {
        Self {
            key: key.to_string(),
            name: info.name,
            size_bytes: info.size_bytes,
            size_human: info.size_human,
            last_modified: info
                .last_modified
                .map(|t| t.strftime("%Y-%m-%d %H:%M:%S UTC").to_string()),
            hash: info.hash,
            content_type: info.content_type,
        }
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("Key", self.key.clone()),
            ("Object", self.name.clone()),
            ("Size", format!("{} ({} bytes)", self.size_human, self.size_bytes)),
        ];
        if let Some(modified) = &self.last_modified {
            rows.push(("Date", modified.clone()));
        }
        if let Some(hash) = &self.hash {
            rows.push(("Hash", hash.clone()));
        }
        if let Some(content_type) = &self.content_type {
            rows.push(("Type", content_type.clone()));
        }
        rows
    }
}

fn print_rows(formatter: &Formatter, rows: Vec<(&'static str, String)>) {
    let mut table = formatter.table(&["field", "value"]);
    for (field, value) in rows {
        table.add_row(vec![field.to_string(), value]);
    }
    formatter.print_table(&table);
}

/// Execute the stat command
pub async fn execute(args: StatArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match parse_store_path(&args.path, &formatter) {
        Ok(path) => path,
        Err(code) => return code,
    };

    let store = match open_profile(&path.profile, &formatter).await {
        Ok(store) => store,
        Err(code) => return code,
    };

    let Some(key) = path.key() else {
        let info = match store.backend().head_container(store.container()).await {
            Ok(info) => info,
            Err(e) => return fail(&formatter, "Failed to get container metadata", &e),
        };
        let stat = ContainerStat::new(info, store.prefix());
        if formatter.is_json() {
            formatter.json(&stat);
        } else {
            print_rows(&formatter, stat.rows());
        }
        return ExitCode::Success;
    };

    let name = match store.physical_name(key) {
        Ok(name) => name,
        Err(e) => return fail(&formatter, "Invalid key", &e),
    };

    match store.backend().head_object(store.container(), &name).await {
        Ok(info) => {
            let stat = KeyStat::new(key, info);
            if formatter.is_json() {
                formatter.json(&stat);
            } else {
                print_rows(&formatter, stat.rows());
            }
            ExitCode::Success
        }
        Err(e) if e.is_not_found() => {
            formatter.error(&format!("Key not found: {path}"));
            ExitCode::NotFound
        }
        Err(e) => fail(&formatter, "Failed to get key metadata", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_stat_detects_public_acl() {
        let info = ContainerInfo {
            name: "zarr".to_string(),
            object_count: 5,
            bytes_used: 15,
            read_acl: Some(".r:*,.rlistings".to_string()),
        };
        let stat = ContainerStat::new(info, "root");
        assert!(stat.public);
        assert_eq!(stat.size_human, "15 B");
        assert_eq!(stat.rows().len(), 6);
    }

    #[test]
    fn test_key_stat_rows_skip_missing_fields() {
        let stat = KeyStat::new("c/d", ObjectInfo::new("root/c/d", 3));
        let rows = stat.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], ("Object", "root/c/d".to_string()));
    }
}
