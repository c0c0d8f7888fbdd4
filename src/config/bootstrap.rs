//! Bootstrap descriptor — the one file every other config source is
//! discovered from (§4.E).
//!
//! The descriptor names which `ConfigStore` backend to use and carries
//! that backend's connection details (spreadsheet id, KV root, or the
//! inline spec itself). A separate credentials file keeps secrets out of
//! the descriptor so it can be committed or shared.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value as Json;

use crate::error::ConfigError;

/// Search order for the bootstrap descriptor: current directory first,
/// then the user's config directory, then the system-wide location.
fn bootstrap_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("./.fermenator")];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".fermenator").join("config"));
    }
    paths.push(PathBuf::from("/etc/fermenator/config"));
    paths
}

/// Search order for the credentials file, mirroring the descriptor's.
fn credentials_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("./.credentials.json")];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".fermenator").join("credentials.json"));
    }
    paths.push(PathBuf::from("/etc/fermenator/credentials.json"));
    paths
}

fn first_existing(paths: &[PathBuf]) -> Option<&PathBuf> {
    paths.iter().find(|p| p.exists())
}

/// Which `ConfigStore` backend the descriptor selects, and that backend's
/// non-secret connection details.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "store", rename_all = "snake_case")]
pub enum BootstrapStore {
    Inline {
        spec: Json,
    },
    TabularSheet {
        sheet_id: String,
        #[serde(default = "default_refresh_secs")]
        refresh_interval_secs: u64,
    },
    RemoteKv {
        base_url: String,
        #[serde(default)]
        root: String,
        #[serde(default = "default_refresh_secs")]
        refresh_interval_secs: u64,
    },
}

fn default_refresh_secs() -> u64 {
    60
}

/// The parsed bootstrap descriptor (§4.E). `datastore` is the block
/// `ConfigStore::resolve_inherit` substitutes for any component config
/// literally equal to `"inherit"`.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapDoc {
    #[serde(flatten)]
    pub store: BootstrapStore,
    #[serde(default)]
    pub datastore: Json,
}

impl BootstrapDoc {
    /// Locate and parse the bootstrap descriptor from the standard search
    /// path, or from `override_path` if given (`init`/`run --config`).
    pub fn load(override_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match override_path {
            Some(p) => p.to_path_buf(),
            None => first_existing(&bootstrap_search_paths())
                .cloned()
                .ok_or_else(|| {
                    ConfigError::Io("no bootstrap descriptor found in ./.fermenator, ~/.fermenator/config, or /etc/fermenator/config".into())
                })?,
        };
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Io(format!("reading {}: {e}", path.display())))?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))
    }
}

/// Credentials file: backend-specific secrets, kept separate from the
/// descriptor so it can be `.gitignore`d independently.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Credentials {
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Json>,
}

impl Credentials {
    /// Locate and parse the credentials file. Missing credentials are not
    /// an error — not every backend needs them (e.g. a local RemoteKV).
    pub fn load(override_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match override_path {
            Some(p) => Some(p.to_path_buf()),
            None => first_existing(&credentials_search_paths()).cloned(),
        };
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Io(format!("reading {}: {e}", path.display())))?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Json::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn inline_descriptor_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bootstrap.json");
        std::fs::write(
            &path,
            r#"{"store":"inline","spec":{"version":"v1","relays":{},"datasources":{},"beers":{},"managers":{}},"datastore":{}}"#,
        )
        .unwrap();
        let doc = BootstrapDoc::load(Some(&path)).unwrap();
        match doc.store {
            BootstrapStore::Inline { spec } => assert_eq!(spec["version"], "v1"),
            _ => panic!("expected inline store"),
        }
    }

    #[test]
    fn an_explicit_missing_path_is_an_error_but_no_override_is_not() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(Credentials::load(Some(&missing)).is_err());
    }

    #[test]
    fn credentials_fields_are_readable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, r#"{"token":"secret123"}"#).unwrap();
        let creds = Credentials::load(Some(&path)).unwrap();
        assert_eq!(creds.get("token"), Some("secret123"));
    }
}
