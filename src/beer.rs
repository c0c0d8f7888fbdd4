//! Beer — fermentation-control strategy (§3, §4.C).
//!
//! "Beer" names a control policy instance, not the beverage: it carries a
//! temperature-control strategy and a non-owning handle to the
//! [`DataSource`] it reads from. Two concrete strategies exist as enum
//! variants (design note 9 — tagged variants, not a class hierarchy).

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use log::{debug, warn};

use crate::datasource::DataSource;
use crate::sample::{Freshness, Sample, Value};
use crate::units::{self, GravityUnit, TemperatureUnit};

/// Strategy-specific configuration (§3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BeerKind {
    SetPoint { set_point: f64 },
    LinearRamp {
        original_gravity: f64,
        final_gravity: f64,
        start_set_point: f64,
        end_set_point: f64,
    },
}

/// The outcome of one decision pass — both booleans plus the freshness of
/// the data that produced them, computed together so a single poll only
/// ever queries the DataSource once per reading type and emits at most
/// one staleness warning (§4.C "at most once per poll").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub requires_heating: bool,
    pub requires_cooling: bool,
    pub freshness: Freshness,
}

pub struct Beer {
    pub name: String,
    /// Key this Beer reads under in its DataSource — distinct from `name`
    /// so the same physical probe can be shared by renamed configs (§3).
    pub identifier: String,
    pub gravity_unit: GravityUnit,
    pub temperature_unit: TemperatureUnit,
    pub data_age_warning_time: StdDuration,
    pub tolerance: f64,
    pub datasource: Arc<DataSource>,
    pub kind: BeerKind,
}

impl Beer {
    /// Run one full decision pass: read sensors, compute the effective set
    /// point, apply the dead-band rule. This is what `Manager::tick` calls;
    /// [`requires_heating`](Self::requires_heating),
    /// [`requires_cooling`](Self::requires_cooling), and
    /// [`check_freshness`](Self::check_freshness) each re-run it and are
    /// provided for the public per-operation contract in §4.C.
    pub async fn evaluate(&self) -> Decision {
        let temp_sample = self.datasource.get_temperature(self.identifier()).await.ok();
        let Some(temp_sample) = temp_sample else {
            warn!("{}: no temperature data available, forcing both off", self.name);
            return Decision {
                requires_heating: false,
                requires_cooling: false,
                freshness: Freshness::Missing,
            };
        };

        let temperature = self.normalize_temperature(&temp_sample);
        let mut newest_age = temp_sample.age(Utc::now());

        let set_point = match self.kind {
            BeerKind::SetPoint { set_point } => set_point,
            BeerKind::LinearRamp {
                original_gravity,
                final_gravity,
                start_set_point,
                end_set_point,
            } => {
                match self.datasource.get_gravity(self.identifier()).await.ok() {
                    Some(gravity_sample) => {
                        newest_age = newest_age.max(gravity_sample.age(Utc::now()));
                        let gravity = self.normalize_gravity(&gravity_sample);
                        let progress = ((original_gravity - gravity)
                            / (original_gravity - final_gravity))
                            .clamp(0.0, 1.0);
                        start_set_point + progress * (end_set_point - start_set_point)
                    }
                    None => {
                        warn!(
                            "{}: no gravity data available, falling back to start set point",
                            self.name
                        );
                        start_set_point
                    }
                }
            }
        };

        let freshness = if newest_age > chrono_duration_from_std(self.data_age_warning_time) {
            warn!(
                "{}: newest sample is {}s old (warning threshold {}s)",
                self.name,
                newest_age.num_seconds(),
                self.data_age_warning_time.as_secs()
            );
            Freshness::Stale
        } else {
            Freshness::Fresh
        };

        let requires_heating = temperature < set_point - self.tolerance;
        let requires_cooling = temperature > set_point + self.tolerance;
        debug!(
            "{}: T={temperature:.2} S={set_point:.2} tol={} -> heat={requires_heating} cool={requires_cooling}",
            self.name, self.tolerance
        );

        Decision {
            requires_heating,
            requires_cooling,
            freshness,
        }
    }

    pub async fn requires_heating(&self) -> bool {
        self.evaluate().await.requires_heating
    }

    pub async fn requires_cooling(&self) -> bool {
        self.evaluate().await.requires_cooling
    }

    pub async fn check_freshness(&self) -> Freshness {
        self.evaluate().await.freshness
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Samples arrive in the source's native unit; DataSources in this
    /// crate report Celsius/Plato. Convert to the Beer's declared unit
    /// before comparing against the set point.
    fn normalize_temperature(&self, sample: &Sample) -> f64 {
        let Value::Temperature(v) = sample.value else {
            unreachable!("get_temperature always returns a Temperature sample")
        };
        units::convert_temperature(v, TemperatureUnit::Celsius, self.temperature_unit)
    }

    fn normalize_gravity(&self, sample: &Sample) -> f64 {
        let Value::Gravity(v) = sample.value else {
            unreachable!("get_gravity always returns a Gravity sample")
        };
        units::convert_gravity(v, GravityUnit::Plato, self.gravity_unit)
    }
}

fn chrono_duration_from_std(d: StdDuration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}
