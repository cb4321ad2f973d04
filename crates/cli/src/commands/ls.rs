//! ls command - List children or keys below a key
//!
//! Without `-r` only the immediate child segments are shown, the way a
//! directory listing would. With `-r` every key of the subtree is listed.

use clap::Args;
use futures::TryStreamExt;
use serde::Serialize;
use zs_core::KeyValueStore;

use super::{fail, open_profile, parse_store_path};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// List children or keys
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Store path (PROFILE[/KEY])
    pub path: String,

    /// List every key below the path
    #[arg(short, long)]
    pub recursive: bool,
}

/// Output structure for ls command (JSON format)
#[derive(Debug, Serialize)]
struct LsOutput {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keys: Option<Vec<String>>,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match parse_store_path(&args.path, &formatter) {
        Ok(path) => path,
        Err(code) => return code,
    };

    let store = match open_profile(&path.profile, &formatter).await {
        Ok(store) => store,
        Err(code) => return code,
    };

    if args.recursive {
        let keys: Vec<String> = match store.subtree_keys(path.key()) {
            Ok(stream) => match stream.try_collect().await {
                Ok(keys) => keys,
                Err(e) => return fail(&formatter, "Failed to list keys", &e),
            },
            Err(e) => return fail(&formatter, "Invalid key", &e),
        };

        if formatter.is_json() {
            formatter.json(&LsOutput {
                path: path.to_string(),
                children: None,
                keys: Some(keys),
            });
        } else {
            for key in &keys {
                formatter.println(key);
            }
        }
        return ExitCode::Success;
    }

    let mut children = match store.list_children(path.key()).await {
        Ok(children) => children,
        Err(e) => return fail(&formatter, "Failed to list children", &e),
    };

    // A leaf lists as itself
    if children.is_empty() {
        if let Some(key) = path.key() {
            match store.contains(key).await {
                Ok(true) => children.push(last_segment(key).to_string()),
                Ok(false) => {}
                Err(e) => return fail(&formatter, "Failed to check key", &e),
            }
        }
    }

    if formatter.is_json() {
        formatter.json(&LsOutput {
            path: path.to_string(),
            children: Some(children),
            keys: None,
        });
    } else {
        for child in &children {
            formatter.println(child);
        }
    }

    ExitCode::Success
}

fn last_segment(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("c/e/f"), "f");
        assert_eq!(last_segment("a"), "a");
    }

    #[test]
    fn test_ls_output_omits_unused_field() {
        let output = LsOutput {
            path: "demo/c".to_string(),
            children: Some(vec!["d".to_string(), "e".to_string()]),
            keys: None,
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["children"], serde_json::json!(["d", "e"]));
        assert!(json.get("keys").is_none());
    }
}
