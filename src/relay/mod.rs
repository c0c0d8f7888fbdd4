//! Relay — binary actuator with optional duty-cycling (§3, §4.A).
//!
//! Per design note 9 ("polymorphism without inheritance") this is a tagged
//! enum, not a trait object: a Manager never needs to hold a mix of relay
//! kinds polymorphically, it just needs *a* relay, so the enum is the
//! simplest faithful encoding of "Relay is a capability set with two
//! concrete backends".

mod software;
mod duty;

#[cfg(feature = "gpio")]
pub mod gpio;

pub use software::SoftwareRelay;

#[cfg(feature = "gpio")]
pub use gpio::GpioRelay;

use crate::error::RelayError;

/// Soft-PWM configuration shared by both relay backends (§3 invariant).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DutyCycle {
    /// Fraction of `cycle_time` spent energized, in `[0, 1]`.
    pub duty_cycle: f64,
    /// Length of one duty-cycle window, in seconds.
    pub cycle_time: f64,
}

impl DutyCycle {
    /// `None` when duty-cycling is disabled (steady on/off), matching the
    /// `duty_cycle ∈ {0, 1}` degeneracy called out in §3.
    pub fn new(duty_cycle: Option<f64>, cycle_time: Option<f64>) -> Option<Self> {
        let duty_cycle = duty_cycle?;
        let cycle_time = cycle_time?;
        if cycle_time <= 0.0 {
            return None;
        }
        if duty_cycle <= 0.0 || duty_cycle >= 1.0 {
            return None;
        }
        Some(Self {
            duty_cycle,
            cycle_time,
        })
    }

    pub fn energized_secs(&self) -> f64 {
        self.duty_cycle * self.cycle_time
    }

    pub fn de_energized_secs(&self) -> f64 {
        (1.0 - self.duty_cycle) * self.cycle_time
    }
}

/// A named binary actuator (§4.A).
pub enum Relay {
    Software(SoftwareRelay),
    #[cfg(feature = "gpio")]
    Gpio(GpioRelay),
}

impl Relay {
    pub fn name(&self) -> &str {
        match self {
            Self::Software(r) => r.name(),
            #[cfg(feature = "gpio")]
            Self::Gpio(r) => r.name(),
        }
    }

    /// Command the relay to its logical "on" state. Idempotent.
    pub async fn on(&self) -> Result<(), RelayError> {
        match self {
            Self::Software(r) => r.on().await,
            #[cfg(feature = "gpio")]
            Self::Gpio(r) => r.on().await,
        }
    }

    /// Command the relay to its logical "off" state. Idempotent.
    pub async fn off(&self) -> Result<(), RelayError> {
        match self {
            Self::Software(r) => r.off().await,
            #[cfg(feature = "gpio")]
            Self::Gpio(r) => r.off().await,
        }
    }

    pub async fn is_on(&self) -> bool {
        match self {
            Self::Software(r) => r.is_on().await,
            #[cfg(feature = "gpio")]
            Self::Gpio(r) => r.is_on().await,
        }
    }

    pub async fn is_off(&self) -> bool {
        !self.is_on().await
    }

    /// Force off and release any hardware resource. Called on disassemble
    /// and on process termination (§4.A lifecycle).
    pub async fn shutdown(&self) {
        match self {
            Self::Software(r) => r.shutdown().await,
            #[cfg(feature = "gpio")]
            Self::Gpio(r) => r.shutdown().await,
        }
    }
}
