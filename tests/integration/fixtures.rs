use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use fermenator::config::{ComponentSpec, ConfigSpec};
use fermenator::config::store::{ConfigStore, InlineConfigStore};
use fermenator::datasource::{DataSource, InlineDataSource};
use fermenator::sample::{Sample, Value};

/// A minimal one-beer, one-relay, one-manager spec, suitable as the
/// starting point for assemble/reassemble tests.
pub fn one_beer_spec() -> ConfigSpec {
    let mut relays = HashMap::new();
    relays.insert(
        "heat_relay".to_string(),
        ComponentSpec {
            kind: "Software".into(),
            config: serde_json::json!({}),
        },
    );

    let mut datasources = HashMap::new();
    datasources.insert(
        "ds1".to_string(),
        ComponentSpec {
            kind: "Inline".into(),
            config: serde_json::json!({}),
        },
    );

    let mut beers = HashMap::new();
    beers.insert(
        "beer1".to_string(),
        ComponentSpec {
            kind: "SetPoint".into(),
            config: serde_json::json!({
                "datasource": "ds1",
                "identifier": "beer1",
                "set_point": 20.0,
                "tolerance": 0.3,
            }),
        },
    );

    let mut managers = HashMap::new();
    managers.insert(
        "mgr1".to_string(),
        ComponentSpec {
            kind: "Manager".into(),
            config: serde_json::json!({
                "beer": "beer1",
                "active_heating_relay": "heat_relay",
                "active_heating": true,
                "polling_frequency_secs": 0.05,
            }),
        },
    );

    ConfigSpec {
        version: "v1".into(),
        relays,
        datasources,
        beers,
        managers,
    }
}

pub fn inline_store(spec: ConfigSpec) -> ConfigStore {
    ConfigStore::Inline(InlineConfigStore::new(spec, Duration::from_secs(3600), serde_json::json!({})))
}

pub fn datasource_with_temperature(name: &str, identifier: &str, celsius: f64) -> DataSource {
    let mut seed = HashMap::new();
    seed.insert(
        identifier.to_string(),
        vec![Sample::new(Utc::now(), Value::Temperature(celsius))],
    );
    DataSource::Inline(InlineDataSource::new(name, seed))
}
