//! In-memory relay test double (§4.A).
//!
//! Accepts any configuration (including hardware-only keys like a pin
//! identifier) without complaint, so the same `ConfigSpec` can target
//! hardware or software relays unchanged.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::RelayError;

use super::DutyCycle;

pub struct SoftwareRelay {
    name: String,
    energized: Arc<AtomicBool>,
    target: watch::Sender<bool>,
    _task: JoinHandle<()>,
}

impl SoftwareRelay {
    pub fn new(name: impl Into<String>, duty: Option<DutyCycle>) -> Self {
        let energized = Arc::new(AtomicBool::new(false));
        let (tx, rx) = watch::channel(false);
        let sink = Arc::clone(&energized);
        let task = tokio::spawn(super::duty::run(duty, rx, move |on| {
            sink.store(on, Ordering::SeqCst);
        }));
        Self {
            name: name.into(),
            energized,
            target: tx,
            _task: task,
        }
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

    pub async fn shutdown(&self) {
        let _ = self.off().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn on_off_is_idempotent_and_observable() {
        let relay = SoftwareRelay::new("heat", None);
        assert!(!relay.is_on().await);
        relay.on().await.unwrap();
        relay.on().await.unwrap();
        tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
        assert!(relay.is_on().await);
        relay.off().await.unwrap();
        tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
        assert!(!relay.is_on().await);
    }

    #[tokio::test(start_paused = true)]
    async fn duty_cycle_energizes_for_its_share_of_the_window() {
        let duty = DutyCycle::new(Some(0.5), Some(600.0)).unwrap();
        let relay = SoftwareRelay::new("heat", Some(duty));
        relay.on().await.unwrap();

        // Across two full windows (1200s) held logically on, the relay
        // should be energized ~50% of the time (§8 scenario 7).
        let mut energized_ticks = 0u32;
        let mut total_ticks = 0u32;
        for _ in 0..1200 {
            tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;
            total_ticks += 1;
            if relay.is_on().await {
                energized_ticks += 1;
            }
        }
        let ratio = f64::from(energized_ticks) / f64::from(total_ticks);
        assert!((ratio - 0.5).abs() < 0.02, "ratio={ratio}");
    }
}
