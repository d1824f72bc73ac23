use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::check_properties;
use crate::domain::ConnectorError;

/// Epsilla Cloud control-plane endpoint.
pub const DEFAULT_API_ENDPOINT: &str = "https://api.epsilla.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const EPSILLA_REQUIRED_PROPERTIES: &[&str] = &["project_id", "api_key", "db_id", "table_name"];
pub const EPSILLA_OPTIONAL_PROPERTIES: &[&str] = &["api_endpoint", "timeout_secs"];

/// Connection settings for one Epsilla Cloud table.
#[derive(Clone, Serialize, Deserialize)]
pub struct EpsillaConfig {
    pub project_id: String,
    pub api_key: String,
    pub db_id: String,
    pub table_name: String,
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl EpsillaConfig {
    pub fn new(
        project_id: impl Into<String>,
        api_key: impl Into<String>,
        db_id: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            api_key: api_key.into(),
            db_id: db_id.into(),
            table_name: table_name.into(),
            api_endpoint: default_api_endpoint(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build from a flat property map as handed over by a pipeline definition.
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self, ConnectorError> {
        check_properties(EPSILLA_REQUIRED_PROPERTIES, properties)?;

        let get = |key: &str| properties.get(key).cloned().unwrap_or_default();
        let mut config = Self::new(get("project_id"), get("api_key"), get("db_id"), get("table_name"));

        if let Some(endpoint) = properties.get("api_endpoint").filter(|v| !v.trim().is_empty()) {
            config.api_endpoint = endpoint.trim().to_string();
        }
        if let Some(raw) = properties.get("timeout_secs").filter(|v| !v.trim().is_empty()) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ConnectorError::config(format!("timeout_secs must be a positive integer, got '{raw}'"))
            })?;
            if secs == 0 {
                return Err(ConnectorError::config("timeout_secs must be greater than zero"));
            }
            config.timeout_secs = secs;
        }

        Ok(config)
    }

    /// Construct from environment variables:
    ///
    /// | Variable               | Property       |
    /// |------------------------|----------------|
    /// | `EPSILLA_PROJECT_ID`   | `project_id`   |
    /// | `EPSILLA_API_KEY`      | `api_key`      |
    /// | `EPSILLA_DB_ID`        | `db_id`        |
    /// | `EPSILLA_TABLE_NAME`   | `table_name`   |
    /// | `EPSILLA_API_ENDPOINT` | `api_endpoint` |
    /// | `EPSILLA_TIMEOUT_SECS` | `timeout_secs` |
    pub fn from_env() -> Result<Self, ConnectorError> {
        let properties: HashMap<String, String> = EPSILLA_REQUIRED_PROPERTIES
            .iter()
            .chain(EPSILLA_OPTIONAL_PROPERTIES.iter())
            .filter_map(|key| {
                let var = format!("EPSILLA_{}", key.to_uppercase());
                std::env::var(var).ok().map(|v| (key.to_string(), v))
            })
            .collect();
        Self::from_properties(&properties)
    }
}

impl fmt::Debug for EpsillaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EpsillaConfig")
            .field("project_id", &self.project_id)
            .field("api_key", &"<redacted>")
            .field("db_id", &self.db_id)
            .field("table_name", &self.table_name)
            .field("api_endpoint", &self.api_endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn from_properties_applies_defaults() {
        let config = EpsillaConfig::from_properties(&props(&[
            ("project_id", "proj"),
            ("api_key", "key"),
            ("db_id", "db"),
            ("table_name", "docs"),
        ]))
        .expect("complete properties");

        assert_eq!(config.api_endpoint, DEFAULT_API_ENDPOINT);
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.table_name, "docs");
    }

    #[test]
    fn from_properties_reads_optional_overrides() {
        let config = EpsillaConfig::from_properties(&props(&[
            ("project_id", "proj"),
            ("api_key", "key"),
            ("db_id", "db"),
            ("table_name", "docs"),
            ("api_endpoint", "http://localhost:8888"),
            ("timeout_secs", "3"),
        ]))
        .unwrap();

        assert_eq!(config.api_endpoint, "http://localhost:8888");
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn from_properties_rejects_missing_and_bad_values() {
        let err = EpsillaConfig::from_properties(&props(&[("project_id", "proj")])).unwrap_err();
        assert!(err.to_string().contains("table_name"));

        let err = EpsillaConfig::from_properties(&props(&[
            ("project_id", "proj"),
            ("api_key", "key"),
            ("db_id", "db"),
            ("table_name", "docs"),
            ("timeout_secs", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConnectorError::Config(_)));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = EpsillaConfig::new("proj", "secret-key", "db", "docs");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
