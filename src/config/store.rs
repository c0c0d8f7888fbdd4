//! ConfigStore — produces and refreshes the declarative object graph
//! (§3, §4.E).
//!
//! All three variants are equivalent at this interface (design note: "the
//! core treats them identically"). The wire bindings for the remote
//! variants (a spreadsheet API, a hierarchical KV store) are out of scope
//! per §1 — each is expressed here behind a small fetch trait so the
//! in-scope parts (tabular decoding, the `inherit` rule, load atomicity,
//! change detection) are fully implemented and independently testable.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map as JsonMap, Value as Json};

use crate::error::ConfigError;

use super::{ComponentSpec, ConfigSpec};

/// One decoded cell from a tabular/KV row: `(component_name, key, value)`.
pub type Row = (String, String, String);

/// Keys whose tabular/KV string value is unambiguously boolean. `"1"`/
/// `"0"` are otherwise decoded as numbers per §4.E.
const BOOL_KEYS: &[&str] = &["active_heating", "active_cooling"];

fn parse_bool(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Decode one tabular/KV cell per the §4.E rules: a `!int:` key prefix
/// forces integer parsing, known boolean keys parse via `parse_bool`,
/// otherwise numbers are tried before falling back to a bare string.
/// An empty cell means the key is absent.
fn decode_cell(key: &str, value: &str) -> Option<(String, Json)> {
    if value.is_empty() {
        return None;
    }
    if let Some(stripped) = key.strip_prefix("!int:") {
        let n: i64 = stripped_int(value)?;
        return Some((stripped.to_string(), Json::from(n)));
    }
    if BOOL_KEYS.contains(&key) {
        return parse_bool(value).map(|b| (key.to_string(), Json::Bool(b)));
    }
    if let Ok(n) = value.parse::<f64>() {
        return Some((key.to_string(), serde_json::json!(n)));
    }
    if let Some(b) = parse_bool(value) {
        return Some((key.to_string(), Json::Bool(b)));
    }
    Some((key.to_string(), Json::String(value.to_string())))
}

fn stripped_int(value: &str) -> Option<i64> {
    value.parse().ok()
}

/// Build the four component maps from a flat row list, one component per
/// `(type_name, name)` pair. Buffers entirely in local maps; the caller
/// only sees a fully-populated `ConfigSpec` or an error, never a partial
/// one (design note: configuration atomicity).
fn rows_to_spec(
    relay_rows: Vec<Row>,
    datasource_rows: Vec<Row>,
    beer_rows: Vec<Row>,
    manager_rows: Vec<Row>,
    version: String,
) -> Result<ConfigSpec, ConfigError> {
    let relays = rows_to_components(relay_rows)?;
    let datasources = rows_to_components(datasource_rows)?;
    let beers = rows_to_components(beer_rows)?;
    let managers = rows_to_components(manager_rows)?;
    Ok(ConfigSpec {
        version,
        relays,
        datasources,
        beers,
        managers,
    })
}

fn rows_to_components(rows: Vec<Row>) -> Result<HashMap<String, ComponentSpec>, ConfigError> {
    let mut staging: HashMap<String, JsonMap<String, Json>> = HashMap::new();
    for (name, key, value) in rows {
        let Some((key, value)) = decode_cell(&key, &value) else {
            continue;
        };
        staging.entry(name).or_default().insert(key, value);
    }

    let mut out = HashMap::new();
    for (name, mut fields) in staging {
        let kind = fields
            .remove("type")
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| ConfigError::Invalid(format!("component `{name}` missing `type`")))?;
        out.insert(
            name,
            ComponentSpec {
                kind,
                config: Json::Object(fields),
            },
        );
    }
    Ok(out)
}

/// Resolve the `inherit` rule (§4.E): a datasource config literally equal
/// to the string `"inherit"` is replaced wholesale by the bootstrap-level
/// datastore configuration block, so cloud credentials are declared once.
pub fn resolve_inherit(spec: &mut ConfigSpec, bootstrap_datastore: &Json) {
    for ds in spec.datasources.values_mut() {
        if is_inherit_marker(&ds.config) {
            ds.config = bootstrap_datastore.clone();
        }
    }
}

/// True for the bare string `"inherit"` (the shape an Inline spec or a
/// directly-constructed `ConfigSpec` uses) and for the shape a tabular/KV
/// row produces when its single `config` column holds that word — a
/// one-field object `{"config": "inherit"}`, since `rows_to_components`
/// always wraps decoded cells under their key.
fn is_inherit_marker(config: &Json) -> bool {
    config.as_str() == Some("inherit") || config.get("config").and_then(Json::as_str) == Some("inherit")
}

/// Fetches rows for one of the four well-known sheets
/// (Manager/Beer/DataSource/Relay) of a tabular remote source. The actual
/// spreadsheet wire binding (auth, pagination, rate limiting) is out of
/// scope (§1) and lives behind this trait.
#[async_trait]
pub trait SheetSource: Send + Sync {
    async fn fetch_sheet(&self, sheet: &str) -> Result<Vec<Row>, ConfigError>;
    /// Cheap change-check token (e.g. the sheet's ETag or revision id).
    async fn version_token(&self) -> Result<String, ConfigError>;
}

pub struct TabularSheetStore {
    source: Box<dyn SheetSource>,
    refresh_interval: Duration,
    bootstrap_datastore: Json,
    last_version: Mutex<Option<String>>,
}

impl TabularSheetStore {
    pub fn new(source: Box<dyn SheetSource>, refresh_interval: Duration, bootstrap_datastore: Json) -> Self {
        Self {
            source,
            refresh_interval,
            bootstrap_datastore,
            last_version: Mutex::new(None),
        }
    }

    pub async fn load(&self) -> Result<ConfigSpec, ConfigError> {
        let version = self.source.version_token().await?;
        let relay_rows = self.source.fetch_sheet("Relay").await?;
        let datasource_rows = self.source.fetch_sheet("DataSource").await?;
        let beer_rows = self.source.fetch_sheet("Beer").await?;
        let manager_rows = self.source.fetch_sheet("Manager").await?;
        let mut spec = rows_to_spec(relay_rows, datasource_rows, beer_rows, manager_rows, version.clone())?;
        resolve_inherit(&mut spec, &self.bootstrap_datastore);
        *self.last_version.lock().unwrap() = Some(version);
        Ok(spec)
    }

    pub async fn has_changed(&self) -> Result<bool, ConfigError> {
        let current = self.source.version_token().await?;
        Ok(self.last_version.lock().unwrap().as_deref() != Some(current.as_str()))
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }
}

/// Reads a hierarchical key-value store under a fixed root path: children
/// `relays/<name>/<key>`, `datasources/<name>/<key>`, etc. Wire binding is
/// out of scope (§1), expressed behind this trait.
#[async_trait]
pub trait KvSource: Send + Sync {
    async fn list_children(&self, path: &str) -> Result<Vec<String>, ConfigError>;
    async fn get(&self, path: &str) -> Result<Option<String>, ConfigError>;
    async fn version_token(&self) -> Result<String, ConfigError>;
}

pub struct RemoteKvStore {
    source: Box<dyn KvSource>,
    root: String,
    refresh_interval: Duration,
    bootstrap_datastore: Json,
    last_version: Mutex<Option<String>>,
}

impl RemoteKvStore {
    pub fn new(source: Box<dyn KvSource>, root: impl Into<String>, refresh_interval: Duration, bootstrap_datastore: Json) -> Self {
        Self {
            source,
            root: root.into(),
            refresh_interval,
            bootstrap_datastore,
            last_version: Mutex::new(None),
        }
    }

    async fn rows_under(&self, section: &str) -> Result<Vec<Row>, ConfigError> {
        let base = format!("{}/{}", self.root.trim_end_matches('/'), section);
        let mut rows = Vec::new();
        for name in self.source.list_children(&base).await? {
            let entry = format!("{base}/{name}");
            for key in self.source.list_children(&entry).await? {
                let full = format!("{entry}/{key}");
                if let Some(value) = self.source.get(&full).await? {
                    rows.push((name.clone(), key, value));
                }
            }
        }
        Ok(rows)
    }

    pub async fn load(&self) -> Result<ConfigSpec, ConfigError> {
        let version = self.source.version_token().await?;
        let relay_rows = self.rows_under("relays").await?;
        let datasource_rows = self.rows_under("datasources").await?;
        let beer_rows = self.rows_under("beers").await?;
        let manager_rows = self.rows_under("managers").await?;
        let mut spec = rows_to_spec(relay_rows, datasource_rows, beer_rows, manager_rows, version.clone())?;
        resolve_inherit(&mut spec, &self.bootstrap_datastore);
        *self.last_version.lock().unwrap() = Some(version);
        Ok(spec)
    }

    pub async fn has_changed(&self) -> Result<bool, ConfigError> {
        let current = self.source.version_token().await?;
        Ok(self.last_version.lock().unwrap().as_deref() != Some(current.as_str()))
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }
}

/// The spec is provided literally in the bootstrap descriptor (§4.E). It
/// never changes on its own — reassembly for an Inline store only ever
/// happens if the process is restarted with a different bootstrap file.
/// The `inherit` rule still applies here (design note: "the core treats
/// them identically"), so this also carries the bootstrap datastore block.
pub struct InlineConfigStore {
    spec: ConfigSpec,
    refresh_interval: Duration,
    bootstrap_datastore: Json,
}

impl InlineConfigStore {
    pub fn new(spec: ConfigSpec, refresh_interval: Duration, bootstrap_datastore: Json) -> Self {
        Self {
            spec,
            refresh_interval,
            bootstrap_datastore,
        }
    }

    pub async fn load(&self) -> Result<ConfigSpec, ConfigError> {
        let mut spec = self.spec.clone();
        resolve_inherit(&mut spec, &self.bootstrap_datastore);
        Ok(spec)
    }

    pub async fn has_changed(&self) -> Result<bool, ConfigError> {
        Ok(false)
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }
}

/// The declarative object graph's source (§4.E).
pub enum ConfigStore {
    Inline(InlineConfigStore),
    TabularSheet(TabularSheetStore),
    RemoteKV(RemoteKvStore),
}

impl ConfigStore {
    pub async fn load(&self) -> Result<ConfigSpec, ConfigError> {
        match self {
            Self::Inline(s) => s.load().await,
            Self::TabularSheet(s) => s.load().await,
            Self::RemoteKV(s) => s.load().await,
        }
    }

    pub async fn has_changed(&self) -> Result<bool, ConfigError> {
        match self {
            Self::Inline(s) => s.has_changed().await,
            Self::TabularSheet(s) => s.has_changed().await,
            Self::RemoteKV(s) => s.has_changed().await,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        match self {
            Self::Inline(s) => s.refresh_interval(),
            Self::TabularSheet(s) => s.refresh_interval(),
            Self::RemoteKV(s) => s.refresh_interval(),
        }
    }
}
