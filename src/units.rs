//! Unit declarations and gravity conversion (§3, §4.C).
//!
//! A [`Beer`](crate::beer::Beer) declares the units it wants samples
//! normalized into; [`DataSource`](crate::datasource::DataSource) readings
//! carry their own native unit and are converted on read so the decision
//! logic in `beer.rs` never has to think about units.

use serde::{Deserialize, Serialize};

/// Temperature unit a [`Beer`](crate::beer::Beer) is configured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "F")]
    Fahrenheit,
}

/// Gravity unit a [`Beer`](crate::beer::Beer) is configured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GravityUnit {
    #[serde(rename = "P")]
    Plato,
    #[serde(rename = "SG")]
    SpecificGravity,
}

/// Convert a Fahrenheit reading into Celsius.
pub fn f_to_c(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

/// Convert a Celsius reading into Fahrenheit.
pub fn c_to_f(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

/// Convert a temperature already in `from` into `to`.
pub fn convert_temperature(value: f64, from: TemperatureUnit, to: TemperatureUnit) -> f64 {
    match (from, to) {
        (TemperatureUnit::Celsius, TemperatureUnit::Celsius)
        | (TemperatureUnit::Fahrenheit, TemperatureUnit::Fahrenheit) => value,
        (TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit) => c_to_f(value),
        (TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius) => f_to_c(value),
    }
}

/// Plato → specific gravity, using the cubic brewing-industry relation
/// (`SG = 1 + P/(258.6 - P/258.2*227.1)`). Accurate to well within the
/// round-trip tolerance required by §4.C across the brewing range.
pub fn plato_to_sg(plato: f64) -> f64 {
    1.0 + plato / (258.6 - plato / 258.2 * 227.1)
}

/// Specific gravity → Plato, the inverse of [`plato_to_sg`] via a few
/// steps of Newton's method (the relation has no closed-form inverse).
pub fn sg_to_plato(sg: f64) -> f64 {
    let mut p = (sg - 1.0) * 250.0; // initial guess
    for _ in 0..8 {
        let f = plato_to_sg(p) - sg;
        let df = (plato_to_sg(p + 1e-6) - plato_to_sg(p - 1e-6)) / 2e-6;
        if df.abs() < 1e-12 {
            break;
        }
        p -= f / df;
    }
    p
}

/// Convert a gravity reading already in `from` into `to`.
pub fn convert_gravity(value: f64, from: GravityUnit, to: GravityUnit) -> f64 {
    match (from, to) {
        (GravityUnit::Plato, GravityUnit::Plato)
        | (GravityUnit::SpecificGravity, GravityUnit::SpecificGravity) => value,
        (GravityUnit::Plato, GravityUnit::SpecificGravity) => plato_to_sg(value),
        (GravityUnit::SpecificGravity, GravityUnit::Plato) => sg_to_plato(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gravity_round_trips_within_tolerance() {
        let mut p = 0.0;
        while p <= 30.0 {
            let sg = plato_to_sg(p);
            let back = sg_to_plato(sg);
            assert!((back - p).abs() <= 0.05, "p={p} back={back}");
            p += 0.5;
        }
    }

    #[test]
    fn temperature_round_trips() {
        let c = 20.0;
        let f = convert_temperature(c, TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit);
        let back = convert_temperature(f, TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius);
        assert!((back - c).abs() < 1e-9);
    }
}
