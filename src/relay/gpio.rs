//! Raspberry Pi GPIO relay backend (§4.A, §1 "single-board computers with
//! GPIO"). Gated behind the `gpio` feature; the physical driver details
//! are out of scope (§1) — this is one concrete, idiomatic binding.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rppal::gpio::{Gpio, OutputPin};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::RelayError;

use super::DutyCycle;

pub struct GpioRelay {
    name: String,
    energized: Arc<AtomicBool>,
    target: watch::Sender<bool>,
    _task: JoinHandle<()>,
}

impl GpioRelay {
    /// `active_high` controls electrical polarity: when `false`, "energized"
    /// drives the pin low (common for relay boards wired active-low).
    pub fn new(
        name: impl Into<String>,
        pin: u8,
        active_high: bool,
        duty: Option<DutyCycle>,
    ) -> Result<Self, RelayError> {
        let gpio = Gpio::new().map_err(|e| RelayError::HardwareFault(e.to_string()))?;
        let pin = gpio
            .get(pin)
            .map_err(|e| RelayError::HardwareFault(e.to_string()))?
            .into_output();
        let pin = Arc::new(Mutex::new(pin));

        let energized = Arc::new(AtomicBool::new(false));
        let (tx, rx) = watch::channel(false);

        let sink_energized = Arc::clone(&energized);
        let sink_pin = Arc::clone(&pin);
        let task = tokio::spawn(super::duty::run(duty, rx, move |on| {
            sink_energized.store(on, Ordering::SeqCst);
            set_level(&sink_pin, on, active_high);
        }));

        Ok(Self {
            name: name.into(),
            energized,
            target: tx,
            _task: task,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn on(&self) -> Result<(), RelayError> {
        let _ = self.target.send(true);
        Ok(())
    }

    pub async fn off(&self) -> Result<(), RelayError> {
        let _ = self.target.send(false);
        Ok(())
    }

    pub async fn is_on(&self) -> bool {
        self.energized.load(Ordering::SeqCst)
    }

    /// Force off and leave the pin de-energized, per §4.A: "on process
    /// termination by any path the pin MUST be left de-energized."
    pub async fn shutdown(&self) {
        let _ = self.off().await;
    }
}

fn set_level(pin: &Arc<Mutex<OutputPin>>, energized: bool, active_high: bool) {
    let drive_high = energized == active_high;
    if let Ok(mut pin) = pin.lock() {
        if drive_high {
            pin.set_high();
        } else {
            pin.set_low();
        }
    } else {
        log::error!("gpio relay: pin mutex poisoned, treating as off");
    }
}
