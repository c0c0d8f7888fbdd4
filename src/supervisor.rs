//! Supervisor — assembles the declarative graph and keeps it in sync with
//! its ConfigStore (§3, §7).
//!
//! `assemble`/`reassemble`/`disassemble` are the only three operations
//! that ever construct or tear down Relays, DataSources, Beers, and
//! Managers; everything else in the crate only ever runs inside a graph
//! that already exists.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::sync::Mutex;

use crate::beer::{Beer, BeerKind};
use crate::config::{ComponentSpec, ConfigSpec};
use crate::config::store::ConfigStore;
use crate::datasource::{DataSource, HttpDataSource, InlineDataSource};
use crate::error::{AssembleError, ConfigError};
use crate::manager::{Manager, ManagerHandle};
use crate::relay::{DutyCycle, Relay, SoftwareRelay};
use crate::units::{GravityUnit, TemperatureUnit};

/// Bound on how long a Manager gets to acknowledge a stop request before
/// the Supervisor force-offs its relays directly (§5).
const MANAGER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

struct Graph {
    relays: HashMap<String, Arc<Relay>>,
    datasources: HashMap<String, Arc<DataSource>>,
    #[allow(dead_code)] // kept alive for Managers' Arc<Beer> references
    beers: HashMap<String, Arc<Beer>>,
    managers: Vec<ManagerHandle>,
}

pub struct Supervisor {
    store: ConfigStore,
    graph: Mutex<Option<Graph>>,
}

impl Supervisor {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            store,
            graph: Mutex::new(None),
        }
    }

    /// Build the graph from whatever the store currently has and start
    /// every Manager. Call once at startup.
    pub async fn assemble(&self) -> Result<(), AssembleError> {
        let spec = self.store.load().await.map_err(AssembleError::from)?;
        let graph = build_graph(spec)?;
        *self.graph.lock().await = Some(graph);
        info!("assembled graph");
        Ok(())
    }

    /// Reload the store; on success, swap in the new graph after stopping
    /// the old one. On failure, log and keep the running graph untouched
    /// so a bad edit never takes down a working system (§7).
    pub async fn reassemble(&self) -> Result<(), AssembleError> {
        let spec = self.store.load().await.map_err(AssembleError::from)?;
        let new_graph = match build_graph(spec) {
            Ok(g) => g,
            Err(e) => {
                error!("reassemble failed validation, keeping current graph running: {e}");
                return Err(e);
            }
        };

        let mut slot = self.graph.lock().await;
        if let Some(old) = slot.take() {
            stop_graph(old).await;
        }
        *slot = Some(new_graph);
        info!("reassembled graph");
        Ok(())
    }

    /// Stop every Manager, force every Relay off, and release every
    /// DataSource. Call once on shutdown.
    pub async fn disassemble(&self) {
        if let Some(graph) = self.graph.lock().await.take() {
            stop_graph(graph).await;
        }
        info!("disassembled graph");
    }

    /// Poll the store for changes at its declared cadence until `stop` is
    /// signalled or a reassemble attempt is requested externally. This is
    /// the long-running task `main` spawns for hot reload.
    pub async fn run_refresh_loop(&self, mut stop: tokio::sync::watch::Receiver<bool>) {
        let interval = self.store.refresh_interval();
        loop {
            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                _ = stop.changed() => return,
            }
            if *stop.borrow() {
                return;
            }
            match self.store.has_changed().await {
                Ok(true) => {
                    if let Err(e) = self.reassemble().await {
                        warn!("reassemble skipped: {e}");
                    }
                }
                Ok(false) => {}
                Err(e) => warn!("checking for config changes failed: {e}"),
            }
        }
    }
}

async fn stop_graph(graph: Graph) {
    for handle in graph.managers {
        let name = handle.name().to_string();
        if !handle.stop(MANAGER_STOP_TIMEOUT).await {
            warn!("manager `{name}` did not ack stop within the timeout");
        }
    }
    // Force every relay off regardless of Manager acknowledgement — a
    // timed-out Manager's own shutdown path may not have run (§5).
    for relay in graph.relays.values() {
        relay.shutdown().await;
    }
}

fn build_graph(spec: ConfigSpec) -> Result<Graph, AssembleError> {
    spec.validate_referential_integrity()?;

    let mut relays = HashMap::new();
    for (name, component) in &spec.relays {
        relays.insert(name.clone(), Arc::new(build_relay(name, component)?));
    }

    let mut datasources = HashMap::new();
    for (name, component) in &spec.datasources {
        datasources.insert(name.clone(), Arc::new(build_datasource(name, component)?));
    }

    let mut beers = HashMap::new();
    for (name, component) in &spec.beers {
        let ds_name = component.required_str("datasource")?;
        let datasource = Arc::clone(datasources.get(ds_name).expect("validated above"));
        check_capabilities(name, component, &datasource)?;
        beers.insert(name.clone(), Arc::new(build_beer(name, component, datasource)?));
    }

    let mut managers = Vec::new();
    for (name, component) in &spec.managers {
        let beer_name = component.required_str("beer")?;
        let beer = Arc::clone(beers.get(beer_name).expect("validated above"));
        let heating = component
            .str("active_heating_relay")
            .map(|r| Arc::clone(relays.get(r).expect("validated above")));
        let cooling = component
            .str("active_cooling_relay")
            .map(|r| Arc::clone(relays.get(r).expect("validated above")));
        let manager = Arc::new(Manager {
            name: name.clone(),
            beer,
            heating,
            cooling,
            active_heating: component.bool("active_heating").unwrap_or(true),
            active_cooling: component.bool("active_cooling").unwrap_or(true),
            polling_frequency: Duration::from_secs_f64(component.f64("polling_frequency_secs").unwrap_or(60.0)),
        });
        managers.push(manager.spawn());
    }

    Ok(Graph {
        relays,
        datasources,
        beers,
        managers,
    })
}

/// §9 open question (a): reject a Beer bound to a DataSource that cannot
/// serve the reading its strategy needs, at assemble time rather than
/// discovering it tick by tick.
fn check_capabilities(name: &str, component: &ComponentSpec, datasource: &DataSource) -> Result<(), AssembleError> {
    let caps = datasource.capabilities();
    if !caps.temperature {
        return Err(ConfigError::Invalid(format!(
            "beer `{name}` requires temperature readings but datasource `{}` does not provide them",
            datasource.name()
        ))
        .into());
    }
    if component.kind == "LinearRamp" && !caps.gravity {
        return Err(ConfigError::Invalid(format!(
            "beer `{name}` is a LinearRamp and requires gravity readings but datasource `{}` does not provide them",
            datasource.name()
        ))
        .into());
    }
    Ok(())
}

/// Construct one Relay from its component spec. Exposed beyond this module
/// so the `init` subcommand can build the Relay set without assembling the
/// rest of the graph (§6).
pub fn build_relay(name: &str, component: &ComponentSpec) -> Result<Relay, AssembleError> {
    let duty = DutyCycle::new(component.f64("duty_cycle"), component.f64("cycle_time"));
    match component.kind.as_str() {
        "Software" => Ok(Relay::Software(SoftwareRelay::new(name, duty))),
        #[cfg(feature = "gpio")]
        "Gpio" => {
            let pin = component
                .f64("pin")
                .ok_or_else(|| ConfigError::Invalid(format!("relay `{name}` missing `pin`")))? as u8;
            let active_high = component.bool("active_high").unwrap_or(true);
            let relay = crate::relay::GpioRelay::new(name, pin, active_high, duty)
                .map_err(AssembleError::from)?;
            Ok(Relay::Gpio(relay))
        }
        other => Err(ConfigError::Invalid(format!("relay `{name}` has unknown type `{other}`")).into()),
    }
}

fn build_datasource(name: &str, component: &ComponentSpec) -> Result<DataSource, AssembleError> {
    match component.kind.as_str() {
        "Inline" => Ok(DataSource::Inline(InlineDataSource::new(name, HashMap::new()))),
        "Http" | "Firebase" | "GoogleSheets" | "Graphite" => {
            let base_url = component.required_str("base_url")?.to_string();
            let auth_token = component.str("auth_token").map(str::to_string);
            Ok(DataSource::Http(HttpDataSource::new(name, base_url, auth_token)))
        }
        other => Err(ConfigError::Invalid(format!("datasource `{name}` has unknown type `{other}`")).into()),
    }
}

fn build_beer(name: &str, component: &ComponentSpec, datasource: Arc<DataSource>) -> Result<Beer, AssembleError> {
    let kind = match component.kind.as_str() {
        "SetPoint" => BeerKind::SetPoint {
            set_point: component
                .f64("set_point")
                .ok_or_else(|| ConfigError::Invalid(format!("beer `{name}` missing `set_point`")))?,
        },
        "LinearRamp" => BeerKind::LinearRamp {
            original_gravity: component
                .f64("original_gravity")
                .ok_or_else(|| ConfigError::Invalid(format!("beer `{name}` missing `original_gravity`")))?,
            final_gravity: component
                .f64("final_gravity")
                .ok_or_else(|| ConfigError::Invalid(format!("beer `{name}` missing `final_gravity`")))?,
            start_set_point: component
                .f64("start_set_point")
                .ok_or_else(|| ConfigError::Invalid(format!("beer `{name}` missing `start_set_point`")))?,
            end_set_point: component
                .f64("end_set_point")
                .ok_or_else(|| ConfigError::Invalid(format!("beer `{name}` missing `end_set_point`")))?,
        },
        other => return Err(ConfigError::Invalid(format!("beer `{name}` has unknown type `{other}`")).into()),
    };

    let gravity_unit = match component.str("gravity_unit") {
        Some("SG") => GravityUnit::SpecificGravity,
        _ => GravityUnit::Plato,
    };
    let temperature_unit = match component.str("temperature_unit") {
        Some("F") => TemperatureUnit::Fahrenheit,
        _ => TemperatureUnit::Celsius,
    };

    Ok(Beer {
        name: name.to_string(),
        identifier: component.required_str("identifier")?.to_string(),
        gravity_unit,
        temperature_unit,
        data_age_warning_time: Duration::from_secs_f64(component.f64("data_age_warning_time_secs").unwrap_or(1800.0)),
        tolerance: component.f64("tolerance").unwrap_or(0.5),
        datasource,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::store::InlineConfigStore;

    fn spec_with_one_beer() -> ConfigSpec {
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
                config: serde_json::json!({"datasource": "ds1", "identifier": "beer1", "set_point": 20.0}),
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

    #[tokio::test]
    async fn assemble_then_disassemble_leaves_relays_off() {
        let store = ConfigStore::Inline(InlineConfigStore::new(
            spec_with_one_beer(),
            Duration::from_secs(60),
            serde_json::json!({}),
        ));
        let supervisor = Supervisor::new(store);
        supervisor.assemble().await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        supervisor.disassemble().await;
        assert!(supervisor.graph.lock().await.is_none());
    }

    #[tokio::test]
    async fn assemble_rejects_unknown_relay_reference() {
        let mut spec = spec_with_one_beer();
        spec.managers.get_mut("mgr1").unwrap().config = serde_json::json!({
            "beer": "beer1",
            "active_heating_relay": "does_not_exist",
        });
        let store = ConfigStore::Inline(InlineConfigStore::new(spec, Duration::from_secs(60), serde_json::json!({})));
        let supervisor = Supervisor::new(store);
        assert!(supervisor.assemble().await.is_err());
    }
}
