use std::sync::Arc;
use std::time::Duration;

use fermenator::beer::{Beer, BeerKind};
use fermenator::manager::Manager;
use fermenator::relay::{Relay, SoftwareRelay};
use fermenator::units::{GravityUnit, TemperatureUnit};

use crate::fixtures::datasource_with_temperature;

// §8 scenario 2, driven end-to-end through a running Manager rather than
// calling `Beer::evaluate` directly.
#[tokio::test]
async fn manager_turns_on_heating_relay_when_below_set_point() {
    let datasource = Arc::new(datasource_with_temperature("fridge", "beer1", 17.0));
    let beer = Arc::new(Beer {
        name: "beer1".into(),
        identifier: "beer1".into(),
        gravity_unit: GravityUnit::Plato,
        temperature_unit: TemperatureUnit::Celsius,
        data_age_warning_time: Duration::from_secs(1800),
        tolerance: 0.5,
        datasource,
        kind: BeerKind::SetPoint { set_point: 20.0 },
    });
    let heating = Arc::new(Relay::Software(SoftwareRelay::new("heat", None)));

    let manager = Arc::new(Manager {
        name: "mgr1".into(),
        beer,
        heating: Some(Arc::clone(&heating)),
        cooling: None,
        active_heating: true,
        active_cooling: false,
        polling_frequency: Duration::from_millis(30),
    });
    let handle = manager.spawn();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(heating.is_on().await);

    handle.stop(Duration::from_secs(5)).await;
    assert!(heating.is_off().await);
}

// §8 scenario 3/4: a LinearRamp beer tracks the gravity-driven set point
// end to end, including the cooling relay being commanded once the
// computed set point drops below the measured temperature.
#[tokio::test]
async fn manager_follows_linear_ramp_and_commands_cooling() {
    let mut seed = std::collections::HashMap::new();
    seed.insert(
        "beer1".to_string(),
        vec![
            fermenator::sample::Sample::new(chrono::Utc::now(), fermenator::sample::Value::Temperature(26.0)),
            fermenator::sample::Sample::new(chrono::Utc::now(), fermenator::sample::Value::Gravity(2.0)),
        ],
    );
    let datasource = Arc::new(fermenator::datasource::DataSource::Inline(
        fermenator::datasource::InlineDataSource::new("ferm", seed),
    ));
    let beer = Arc::new(Beer {
        name: "beer1".into(),
        identifier: "beer1".into(),
        gravity_unit: GravityUnit::Plato,
        temperature_unit: TemperatureUnit::Celsius,
        data_age_warning_time: Duration::from_secs(1800),
        tolerance: 0.3,
        datasource,
        kind: BeerKind::LinearRamp {
            original_gravity: 27.0,
            final_gravity: 4.0,
            start_set_point: 18.0,
            end_set_point: 25.0,
        },
    });
    let cooling = Arc::new(Relay::Software(SoftwareRelay::new("cool", None)));

    let manager = Arc::new(Manager {
        name: "mgr1".into(),
        beer,
        heating: None,
        cooling: Some(Arc::clone(&cooling)),
        active_heating: false,
        active_cooling: true,
        polling_frequency: Duration::from_millis(30),
    });
    let handle = manager.spawn();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(cooling.is_on().await);

    handle.stop(Duration::from_secs(5)).await;
    assert!(cooling.is_off().await);
}
