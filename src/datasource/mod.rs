//! DataSource — read-only timestamped sample provider (§3, §4.B).
//!
//! Authentication, caching, pagination, and rate limiting are concerns of
//! the concrete backend and must never leak into [`crate::beer::Beer`] or
//! [`crate::manager::Manager`] logic (§4.B) — those only ever see
//! [`Sample`]s and [`DataSourceError`]s.

mod inline;
mod http;

pub use inline::InlineDataSource;
pub use http::HttpDataSource;

use crate::error::DataSourceError;
use crate::sample::Sample;

/// What a backend can answer. Used at assemble time to reject a Beer bound
/// to a DataSource that can't serve the readings its variant needs
/// (§9 open question a).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub gravity: bool,
    pub temperature: bool,
}

/// A named, read-only view over a remote store (§3).
pub enum DataSource {
    Inline(InlineDataSource),
    Http(HttpDataSource),
}

impl DataSource {
    pub fn name(&self) -> &str {
        match self {
            Self::Inline(d) => d.name(),
            Self::Http(d) => d.name(),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            Self::Inline(d) => d.capabilities(),
            Self::Http(d) => d.capabilities(),
        }
    }

    /// Finite, newest-first sequence of samples for a hierarchical key.
    pub async fn get(&self, path: &[&str]) -> Result<Vec<Sample>, DataSourceError> {
        match self {
            Self::Inline(d) => d.get(path).await,
            Self::Http(d) => d.get(path).await,
        }
    }

    /// Most recent gravity sample for `identifier`, if this backend
    /// supports gravity readings at all.
    pub async fn get_gravity(&self, identifier: &str) -> Result<Sample, DataSourceError> {
        match self {
            Self::Inline(d) => d.get_gravity(identifier).await,
            Self::Http(d) => d.get_gravity(identifier).await,
        }
    }

    /// Most recent temperature sample for `identifier`.
    pub async fn get_temperature(&self, identifier: &str) -> Result<Sample, DataSourceError> {
        match self {
            Self::Inline(d) => d.get_temperature(identifier).await,
            Self::Http(d) => d.get_temperature(identifier).await,
        }
    }

    /// Reserved write operation (§4.B, §9 open question b). The core never
    /// calls this; every shipped backend refuses it.
    pub async fn set(&self, path: &[&str], value: Sample) -> Result<(), DataSourceError> {
        match self {
            Self::Inline(d) => d.set(path, value).await,
            Self::Http(d) => d.set(path, value).await,
        }
    }
}
