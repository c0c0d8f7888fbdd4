//! In-memory DataSource: samples provided literally in the bootstrap
//! descriptor or a test fixture (`ConfigStore::Inline`'s natural partner).

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::DataSourceError;
use crate::sample::{Sample, Value};

use super::Capabilities;

pub struct InlineDataSource {
    name: String,
    /// Keyed by the last path segment (the "identifier"), newest-first.
    samples: Mutex<HashMap<String, Vec<Sample>>>,
}

impl InlineDataSource {
    pub fn new(name: impl Into<String>, samples: HashMap<String, Vec<Sample>>) -> Self {
        Self {
            name: name.into(),
            samples: Mutex::new(samples),
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

    /// Insert or replace the sample list for an identifier. Test-only
    /// helper — the core never writes through this path at runtime.
    pub fn set_samples(&self, identifier: &str, samples: Vec<Sample>) {
        self.samples
            .lock()
            .unwrap()
            .insert(identifier.to_string(), samples);
    }

    pub async fn get(&self, path: &[&str]) -> Result<Vec<Sample>, DataSourceError> {
        let identifier = path
            .last()
            .ok_or_else(|| DataSourceError::Read("empty path".into()))?;
        Ok(self
            .samples
            .lock()
            .unwrap()
            .get(*identifier)
            .cloned()
            .unwrap_or_default())
    }

    pub async fn get_gravity(&self, identifier: &str) -> Result<Sample, DataSourceError> {
        self.newest_matching(identifier, |v| matches!(v, Value::Gravity(_)))
    }

    pub async fn get_temperature(&self, identifier: &str) -> Result<Sample, DataSourceError> {
        self.newest_matching(identifier, |v| matches!(v, Value::Temperature(_)))
    }

    pub async fn set(&self, _path: &[&str], _value: Sample) -> Result<(), DataSourceError> {
        Err(DataSourceError::NotImplemented)
    }

    fn newest_matching(
        &self,
        identifier: &str,
        pred: impl Fn(&Value) -> bool,
    ) -> Result<Sample, DataSourceError> {
        self.samples
            .lock()
            .unwrap()
            .get(identifier)
            .and_then(|samples| samples.iter().find(|s| pred(&s.value)).copied())
            .ok_or_else(|| DataSourceError::Read(format!("no sample for {identifier}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn returns_newest_first_and_missing_is_an_error() {
        let mut seed = HashMap::new();
        seed.insert(
            "beer1".to_string(),
            vec![Sample::new(Utc::now(), Value::Temperature(20.0))],
        );
        let ds = InlineDataSource::new("kegerator", seed);
        assert!(ds.get_temperature("beer1").await.is_ok());
        assert!(ds.get_gravity("beer1").await.is_err());
        assert!(ds.get_temperature("nonexistent").await.is_err());
    }

    #[tokio::test]
    async fn set_is_reserved_and_never_implemented() {
        let ds = InlineDataSource::new("kegerator", HashMap::new());
        let err = ds
            .set(&["beer1"], Sample::new(Utc::now(), Value::Temperature(1.0)))
            .await
            .unwrap_err();
        assert_eq!(err, DataSourceError::NotImplemented);
    }
}
