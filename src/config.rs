//! ConfigSpec — the declarative object graph produced by a
//! [`ConfigStore`](store::ConfigStore) (§3, §6).
//!
//! The four name→component maps plus a monotone `version` token are the
//! entire payload of `load()`, regardless of which backend produced them
//! (design note: "the core treats them identically").

pub mod bootstrap;
pub mod store;
pub mod store_backends;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::ConfigError;

/// One named component's declaration: its backend `type` tag plus an
/// opaque, backend-specific configuration blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub config: Json,
}

impl ComponentSpec {
    pub fn str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Json::as_str)
    }

    pub fn required_str(&self, key: &str) -> Result<&str, ConfigError> {
        self.str(key)
            .ok_or_else(|| ConfigError::Invalid(format!("missing required key `{key}`")))
    }

    pub fn f64(&self, key: &str) -> Option<f64> {
        self.config.get(key).and_then(Json::as_f64)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.config.get(key) {
            Some(Json::Bool(b)) => Some(*b),
            Some(Json::String(s)) => match s.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// The full declarative graph (§3, §6 schema).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSpec {
    pub version: String,
    #[serde(default)]
    pub relays: HashMap<String, ComponentSpec>,
    #[serde(default)]
    pub datasources: HashMap<String, ComponentSpec>,
    #[serde(default)]
    pub beers: HashMap<String, ComponentSpec>,
    #[serde(default)]
    pub managers: HashMap<String, ComponentSpec>,
}

impl ConfigSpec {
    /// Validate every cross-reference named in §3: `beers[b].datasource`,
    /// `managers[m].beer`, and `managers[m].active_{heating,cooling}_relay`
    /// must resolve, and no relay may be claimed by two Managers (§5).
    pub fn validate_referential_integrity(&self) -> Result<(), ConfigError> {
        for (name, beer) in &self.beers {
            let ds = beer.required_str("datasource")?;
            if !self.datasources.contains_key(ds) {
                return Err(ConfigError::ReferentialIntegrity(format!(
                    "beer `{name}` references unknown datasource `{ds}`"
                )));
            }
            beer.required_str("identifier")?;
        }

        let mut claimed_relays: HashMap<&str, &str> = HashMap::new();
        for (name, manager) in &self.managers {
            let beer = manager.required_str("beer")?;
            if !self.beers.contains_key(beer) {
                return Err(ConfigError::ReferentialIntegrity(format!(
                    "manager `{name}` references unknown beer `{beer}`"
                )));
            }

            for key in ["active_heating_relay", "active_cooling_relay"] {
                let Some(relay) = manager.str(key) else { continue };
                if !self.relays.contains_key(relay) {
                    return Err(ConfigError::ReferentialIntegrity(format!(
                        "manager `{name}` references unknown relay `{relay}` via `{key}`"
                    )));
                }
                if let Some(prev) = claimed_relays.insert(relay, name) {
                    if prev != name {
                        return Err(ConfigError::ReferentialIntegrity(format!(
                            "relay `{relay}` is claimed by both manager `{prev}` and `{name}`"
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}
