//! Manager — per-beer control loop driving two relays (§3, §4.D, §5).
//!
//! One Manager owns exactly one polling task. Distinct Managers share no
//! mutable state and never touch each other's relays (§5), so each
//! Manager's tick is a self-contained async task, cancelled cooperatively
//! through a `watch` channel the Supervisor holds the send half of.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{error, info};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::beer::Beer;
use crate::relay::Relay;

/// Manager lifecycle states (§4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ManagerState {
    Idle = 0,
    Polling = 1,
    Actuating = 2,
    Sleeping = 3,
    Stopping = 4,
    Stopped = 5,
}

impl ManagerState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Idle,
            1 => Self::Polling,
            2 => Self::Actuating,
            3 => Self::Sleeping,
            4 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

/// Static configuration for a single Manager (§3).
pub struct Manager {
    pub name: String,
    pub beer: Arc<Beer>,
    pub heating: Option<Arc<Relay>>,
    pub cooling: Option<Arc<Relay>>,
    pub active_heating: bool,
    pub active_cooling: bool,
    pub polling_frequency: Duration,
}

/// A handle to a running Manager task, owned by the Supervisor. Dropping
/// this does not stop the task — call [`ManagerHandle::stop`] and await
/// the returned future (or let it time out) before dropping.
pub struct ManagerHandle {
    name: String,
    state: Arc<AtomicU8>,
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl ManagerHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ManagerState {
        ManagerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Request the Manager stop at its next suspension point (§5).
    pub fn request_stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Request stop and await acknowledgement, with the bounded timeout
    /// recommended in §5. On timeout, force both relays off directly and
    /// log — the caller (Supervisor) is responsible for that fallback.
    pub async fn stop(self, timeout: Duration) -> bool {
        self.request_stop();
        matches!(tokio::time::timeout(timeout, self.join).await, Ok(Ok(())))
    }
}

impl Manager {
    /// Spawn the polling task and return a handle to control it.
    pub fn spawn(self: Arc<Self>) -> ManagerHandle {
        let state = Arc::new(AtomicU8::new(ManagerState::Idle as u8));
        let (stop_tx, stop_rx) = watch::channel(false);
        let name = self.name.clone();
        let task_state = Arc::clone(&state);
        let join = tokio::spawn(async move {
            self.run(task_state, stop_rx).await;
        });
        ManagerHandle {
            name,
            state,
            stop_tx,
            join,
        }
    }

    async fn run(self: Arc<Self>, state: Arc<AtomicU8>, mut stop_rx: watch::Receiver<bool>) {
        loop {
            if *stop_rx.borrow() {
                state.store(ManagerState::Stopping as u8, Ordering::SeqCst);
                self.relays_off().await;
                state.store(ManagerState::Stopped as u8, Ordering::SeqCst);
                info!("{}: stopped, relays off", self.name);
                return;
            }

            let tick_start = Instant::now();
            state.store(ManagerState::Polling as u8, Ordering::SeqCst);
            let decision = self.beer.evaluate().await;

            state.store(ManagerState::Actuating as u8, Ordering::SeqCst);
            self.actuate(decision).await;

            let elapsed = tick_start.elapsed();
            let remaining = self.polling_frequency.saturating_sub(elapsed);
            state.store(ManagerState::Sleeping as u8, Ordering::SeqCst);
            tokio::select! {
                () = tokio::time::sleep(remaining) => {}
                _ = stop_rx.changed() => {}
            }
        }
    }

    /// One tick's worth of relay commands (§4.D steps 2-4).
    async fn actuate(&self, mut decision: crate::beer::Decision) {
        if decision.requires_heating && decision.requires_cooling {
            error!(
                "{}: beer requested heating and cooling simultaneously, forcing both off",
                self.name
            );
            decision.requires_heating = false;
            decision.requires_cooling = false;
        }

        self.actuate_one(&self.heating, self.active_heating, decision.requires_heating)
            .await;
        self.actuate_one(&self.cooling, self.active_cooling, decision.requires_cooling)
            .await;
    }

    async fn actuate_one(&self, relay: &Option<Arc<Relay>>, active: bool, requires: bool) {
        let Some(relay) = relay else { return };
        let command_on = active && requires;
        let result = if command_on { relay.on().await } else { relay.off().await };
        if let Err(e) = result {
            error!("{}: relay {} command failed: {e}", self.name, relay.name());
        }
    }

    async fn relays_off(&self) {
        if let Some(r) = &self.heating {
            let _ = r.off().await;
        }
        if let Some(r) = &self.cooling {
            let _ = r.off().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::{DataSource, InlineDataSource};
    use crate::relay::SoftwareRelay;
    use crate::units::{GravityUnit, TemperatureUnit};
    use chrono::Utc;
    use std::collections::HashMap;

    fn beer_always_heating() -> Arc<Beer> {
        let mut seed = HashMap::new();
        seed.insert(
            "beer1".to_string(),
            vec![crate::sample::Sample::new(
                Utc::now(),
                crate::sample::Value::Temperature(0.0),
            )],
        );
        Arc::new(Beer {
            name: "beer1".into(),
            identifier: "beer1".into(),
            gravity_unit: GravityUnit::Plato,
            temperature_unit: TemperatureUnit::Celsius,
            data_age_warning_time: Duration::from_secs(1800),
            tolerance: 0.5,
            datasource: Arc::new(DataSource::Inline(InlineDataSource::new("ds", seed))),
            kind: crate::beer::BeerKind::SetPoint { set_point: 20.0 },
        })
    }

    // §8 scenario 8: shutdown leaves both relays off within the bound.
    #[tokio::test]
    async fn stop_commands_both_relays_off() {
        let heating = Arc::new(Relay::Software(SoftwareRelay::new("heat", None)));
        let cooling = Arc::new(Relay::Software(SoftwareRelay::new("cool", None)));
        heating.on().await.unwrap();
        cooling.on().await.unwrap();

        let manager = Arc::new(Manager {
            name: "mgr1".into(),
            beer: beer_always_heating(),
            heating: Some(Arc::clone(&heating)),
            cooling: Some(Arc::clone(&cooling)),
            active_heating: true,
            active_cooling: true,
            polling_frequency: Duration::from_millis(50),
        });
        let handle = manager.spawn();
        tokio::time::sleep(Duration::from_millis(60)).await;
        let acked = handle.stop(Duration::from_secs(5)).await;
        assert!(acked);
        assert!(!heating.is_on().await);
        assert!(!cooling.is_on().await);
    }

    #[tokio::test]
    async fn inactive_relay_is_never_commanded_on() {
        let heating = Arc::new(Relay::Software(SoftwareRelay::new("heat", None)));
        let manager = Arc::new(Manager {
            name: "mgr1".into(),
            beer: beer_always_heating(),
            heating: Some(Arc::clone(&heating)),
            cooling: None,
            active_heating: false,
            active_cooling: false,
            polling_frequency: Duration::from_millis(20),
        });
        let handle = manager.spawn();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!heating.is_on().await);
        handle.stop(Duration::from_secs(5)).await;
    }
}
