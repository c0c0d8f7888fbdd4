//! Shared soft-PWM task run by both relay backends (§4.A).
//!
//! The task watches a logical on/off target. While the target is "on" and
//! duty-cycling is configured, it alternates a physical level between
//! energized and de-energized on the `duty_cycle`/`cycle_time` schedule
//! until the target flips back to "off" or the task is cancelled.

use tokio::sync::watch;
use tokio::time::{sleep, Duration};

use super::DutyCycle;

fn secs(v: f64) -> Duration {
    Duration::from_secs_f64(v.max(0.0))
}

/// Drive `set_level` according to `target`/`duty`. Returns when the
/// `target` channel is closed (the relay was shut down).
pub async fn run<F: Fn(bool) + Send>(duty: Option<DutyCycle>, mut target: watch::Receiver<bool>, set_level: F) {
    loop {
        let on = *target.borrow();
        if !on {
            set_level(false);
            if target.changed().await.is_err() {
                return;
            }
            continue;
        }

        let Some(duty) = duty else {
            // No duty-cycling: hold energized until target flips off.
            set_level(true);
            if target.changed().await.is_err() {
                return;
            }
            continue;
        };

        // Energize for its share of the window, then de-energize, each
        // phase cancellable by the target flipping to off.
        set_level(true);
        tokio::select! {
            _ = sleep(secs(duty.energized_secs())) => {}
            changed = target.changed() => {
                if changed.is_err() {
                    return;
                }
                continue;
            }
        }

        set_level(false);
        tokio::select! {
            _ = sleep(secs(duty.de_energized_secs())) => {}
            changed = target.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}
