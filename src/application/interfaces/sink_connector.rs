use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::{ConnectorError, SearchResult, SinkInfo, VectorRecord};

/// Write, query and delete embeddings against one vector-store backend.
///
/// Implementations hold configuration only. Every call opens its own client,
/// so a connector can be shared between tasks without extra locking.
#[async_trait]
pub trait SinkConnector: Send + Sync {
    /// Stable identifier of the backend type.
    fn sink_name(&self) -> &'static str;

    /// Configuration keys that must be present to construct the connector.
    fn required_properties(&self) -> &'static [&'static str];

    /// Configuration keys with a backend-defined default.
    fn optional_properties(&self) -> &'static [&'static str];

    /// Check that the backend is reachable and accepts our credentials.
    ///
    /// Never mutates remote state. Every failure is reported as
    /// [`ConnectorError::Connection`].
    async fn validation(&self) -> Result<bool, ConnectorError>;

    /// Insert a batch of records, creating the collection on first use.
    ///
    /// Returns the inserted-record counters reported by the backend.
    async fn store(&self, records: &[VectorRecord]) -> Result<Vec<u64>, ConnectorError>;

    /// Nearest-neighbour query returning at most `number_of_results` matches,
    /// best match first.
    async fn search(
        &self,
        vector: &[f32],
        number_of_results: usize,
        filter: Option<&Map<String, Value>>,
    ) -> Result<Vec<SearchResult>, ConnectorError>;

    async fn info(&self) -> Result<SinkInfo, ConnectorError>;

    /// Remove every record whose promoted file entry id equals `file_id`.
    /// Deleting nothing is still a success.
    async fn delete_vectors_with_file_id(&self, file_id: &str) -> Result<bool, ConnectorError>;
}

/// Check that every required key is present and non-empty in `properties`.
///
/// All missing keys are reported in a single [`ConnectorError::Config`].
pub fn check_properties(
    required: &[&str],
    properties: &HashMap<String, String>,
) -> Result<(), ConnectorError> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|key| {
            properties
                .get(*key)
                .map(|v| v.trim().is_empty())
                .unwrap_or(true)
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConnectorError::config(format!(
            "missing required properties: {}",
            missing.join(", ")
        )))
    }
}
