//! Generic HTTP-backed DataSource.
//!
//! Stands in for the concrete cloud bindings (Firebase, Google Sheets,
//! Graphite) that §1 explicitly puts out of scope: all three expose a
//! "give me the newest few readings under this key" REST shape, so one
//! JSON-over-HTTP client satisfies the `DataSource` contract for any of
//! them — the wire-format specifics of a given backend are a matter of
//! `base_url`/auth header configuration, not new code.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use burster::{Limiter, TokenBucket};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::Mutex as AsyncMutex;

use crate::error::DataSourceError;
use crate::sample::{Sample, Value};

use super::Capabilities;

#[derive(Debug, Deserialize)]
struct WireSample {
    timestamp: DateTime<Utc>,
    value: f64,
    #[serde(default)]
    kind: Option<String>,
}

pub struct HttpDataSource {
    name: String,
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
    // Rate limiting is a concern of this backend, never surfaced to Beer
    // or Manager logic (§4.B).
    rate_limiter: AsyncMutex<TokenBucket<fn() -> Duration>>,
}

fn unix_now() -> Duration {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default()
}

impl HttpDataSource {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, auth_token: Option<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            auth_token,
            client: reqwest::Client::new(),
            // 5 requests/sec sustained, burst of 5 — generous enough for a
            // handful of Beers polling independently without hammering a
            // shared cloud quota.
            rate_limiter: AsyncMutex::new(TokenBucket::new_with_time_provider(
                5,
                5,
                unix_now as fn() -> Duration,
            )),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            gravity: true,
            temperature: true,
        }
    }

    async fn throttle(&self) {
        loop {
            if self.rate_limiter.lock().await.try_consume(1).is_ok() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    pub async fn get(&self, path: &[&str]) -> Result<Vec<Sample>, DataSourceError> {
        self.throttle().await;
        let url = format!("{}/{}.json", self.base_url.trim_end_matches('/'), path.join("/"));
        let mut req = self.client.get(&url);
        if let Some(token) = &self.auth_token {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| DataSourceError::Read(e.to_string()))?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED
            || resp.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Err(DataSourceError::Auth(resp.status().to_string()));
        }
        let wire: Vec<WireSample> = resp
            .json()
            .await
            .map_err(|e| DataSourceError::Read(e.to_string()))?;
        let mut samples: Vec<Sample> = wire
            .into_iter()
            .map(|w| {
                let value = match w.kind.as_deref() {
                    Some("gravity") => Value::Gravity(w.value),
                    Some("ph") => Value::Ph(w.value),
                    _ => Value::Temperature(w.value),
                };
                Sample::new(w.timestamp, value)
            })
            .collect();
        samples.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(samples)
    }

    pub async fn get_gravity(&self, identifier: &str) -> Result<Sample, DataSourceError> {
        self.get(&[identifier, "gravity"])
            .await?
            .into_iter()
            .find(|s| matches!(s.value, Value::Gravity(_)))
            .ok_or_else(|| DataSourceError::Read(format!("no gravity sample for {identifier}")))
    }

    pub async fn get_temperature(&self, identifier: &str) -> Result<Sample, DataSourceError> {
        self.get(&[identifier, "temperature"])
            .await?
            .into_iter()
            .find(|s| matches!(s.value, Value::Temperature(_)))
            .ok_or_else(|| DataSourceError::Read(format!("no temperature sample for {identifier}")))
    }

    pub async fn set(&self, _path: &[&str], _value: Sample) -> Result<(), DataSourceError> {
        // Reserved: the core never calls this (§4.B, §9 open question b).
        Err(DataSourceError::NotImplemented)
    }
}
