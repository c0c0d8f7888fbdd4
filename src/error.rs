//! Typed error hierarchy for the fermentation-control runtime.
//!
//! Each component gets its own error enum so call sites can match on
//! variants instead of inspecting strings. Only [`AssembleError`] is
//! fatal to the running graph (see §7 of the design doc); every other
//! error is recovered at tick scope by its caller.

use std::fmt;

/// Errors surfaced by a [`crate::relay::Relay`] actuation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// The underlying hardware (or its driver) refused a write.
    HardwareFault(String),
    /// The relay has no binding configured for this Manager slot.
    Unconfigured,
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwareFault(msg) => write!(f, "relay hardware fault: {msg}"),
            Self::Unconfigured => write!(f, "relay not configured"),
        }
    }
}

impl std::error::Error for RelayError {}

/// Errors surfaced by a [`crate::datasource::DataSource`] read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    /// The read itself failed (network, decode, missing key, ...).
    Read(String),
    /// Authentication with the remote store failed.
    Auth(String),
    /// The backend does not implement this operation (e.g. `set`).
    NotImplemented,
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(msg) => write!(f, "datasource read error: {msg}"),
            Self::Auth(msg) => write!(f, "datasource auth error: {msg}"),
            Self::NotImplemented => write!(f, "operation not implemented"),
        }
    }
}

impl std::error::Error for DataSourceError {}

/// Errors surfaced while loading or validating a [`crate::config::ConfigSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A config value was malformed, missing, or out of range.
    Invalid(String),
    /// A named reference (beer → datasource, manager → beer/relay, ...)
    /// did not resolve within the spec.
    ReferentialIntegrity(String),
    /// The descriptor or credentials file could not be read.
    Io(String),
    /// The descriptor or credentials file could not be parsed.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(msg) => write!(f, "invalid configuration: {msg}"),
            Self::ReferentialIntegrity(msg) => write!(f, "referential integrity: {msg}"),
            Self::Io(msg) => write!(f, "configuration I/O error: {msg}"),
            Self::Parse(msg) => write!(f, "configuration parse error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Fatal error aborting `assemble()`/`reassemble()`. Per §7 this is the
/// only error category that prevents the object graph from becoming
/// live — every other error is recovered at tick scope.
#[derive(Debug)]
pub enum AssembleError {
    Config(ConfigError),
    Relay(RelayError),
    DataSource(DataSourceError),
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "assemble failed: {e}"),
            Self::Relay(e) => write!(f, "assemble failed: {e}"),
            Self::DataSource(e) => write!(f, "assemble failed: {e}"),
        }
    }
}

impl std::error::Error for AssembleError {}

impl From<ConfigError> for AssembleError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<RelayError> for AssembleError {
    fn from(e: RelayError) -> Self {
        Self::Relay(e)
    }
}

impl From<DataSourceError> for AssembleError {
    fn from(e: DataSourceError) -> Self {
        Self::DataSource(e)
    }
}
