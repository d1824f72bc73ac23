use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::SinkConnector;
use crate::domain::{ConnectorError, SearchResult, SinkInfo, VectorRecord};

#[derive(Debug, Clone)]
struct StoredRecord {
    record: VectorRecord,
    file_entry_id: String,
}

#[derive(Debug, Default)]
struct Collection {
    /// Fixed by the first successful store.
    dimensions: Option<usize>,
    records: HashMap<String, StoredRecord>,
}

/// Process-local sink with the same collection rules as a remote backend:
/// the dimensionality is fixed by the first store and later batches of a
/// different size are rejected as a whole.
///
/// Scores are squared Euclidean distances, smaller is closer. Metadata
/// filters are applied as AND-ed equality checks.
pub struct InMemorySink {
    collection: Arc<Mutex<Collection>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self {
            collection: Arc::new(Mutex::new(Collection::default())),
        }
    }

    pub async fn dimensions(&self) -> Option<usize> {
        self.collection.lock().await.dimensions
    }
}

impl Default for InMemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SinkConnector for InMemorySink {
    fn sink_name(&self) -> &'static str {
        "InMemorySink"
    }

    fn required_properties(&self) -> &'static [&'static str] {
        &[]
    }

    fn optional_properties(&self) -> &'static [&'static str] {
        &[]
    }

    async fn validation(&self) -> Result<bool, ConnectorError> {
        Ok(true)
    }

    async fn store(&self, records: &[VectorRecord]) -> Result<Vec<u64>, ConnectorError> {
        let first = records
            .first()
            .ok_or_else(|| ConnectorError::invalid_input("cannot store an empty batch"))?;
        let file_entry_ids = records
            .iter()
            .map(VectorRecord::file_entry_id)
            .collect::<Result<Vec<_>, _>>()?;

        let mut collection = self.collection.lock().await;
        let dimensions = collection.dimensions.unwrap_or_else(|| first.dimensions());

        if let Some(bad) = records.iter().find(|r| r.dimensions() != dimensions) {
            return Err(ConnectorError::insertion(format!(
                "record '{}' has {} dimensions, collection expects {}",
                bad.id(),
                bad.dimensions(),
                dimensions
            )));
        }

        collection.dimensions = Some(dimensions);
        for (record, file_entry_id) in records.iter().zip(file_entry_ids) {
            collection.records.insert(
                record.id().to_string(),
                StoredRecord {
                    record: record.clone(),
                    file_entry_id,
                },
            );
        }

        debug!("Saved {} records to memory", records.len());
        Ok(vec![records.len() as u64])
    }

    async fn search(
        &self,
        vector: &[f32],
        number_of_results: usize,
        filter: Option<&Map<String, Value>>,
    ) -> Result<Vec<SearchResult>, ConnectorError> {
        if number_of_results == 0 {
            return Err(ConnectorError::invalid_input(
                "number_of_results must be at least 1",
            ));
        }

        let collection = self.collection.lock().await;
        if let Some(dimensions) = collection.dimensions {
            if vector.len() != dimensions {
                return Err(ConnectorError::query(format!(
                    "query vector has {} dimensions, collection expects {}",
                    vector.len(),
                    dimensions
                )));
            }
        }

        let mut scored: Vec<(f32, &VectorRecord)> = collection
            .records
            .values()
            .map(|stored| &stored.record)
            .filter(|record| matches_filter(record.metadata(), filter))
            .map(|record| (squared_distance(vector, record.vector()), record))
            .collect();

        scored.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.id().cmp(b.1.id()))
        });

        Ok(scored
            .into_iter()
            .take(number_of_results)
            .map(|(score, record)| {
                SearchResult::new(
                    record.id(),
                    record.vector().to_vec(),
                    record.metadata().clone(),
                    score,
                )
            })
            .collect())
    }

    async fn info(&self) -> Result<SinkInfo, ConnectorError> {
        let collection = self.collection.lock().await;
        Ok(SinkInfo::new(collection.records.len() as u64))
    }

    async fn delete_vectors_with_file_id(&self, file_id: &str) -> Result<bool, ConnectorError> {
        let mut collection = self.collection.lock().await;
        let before = collection.records.len();
        collection
            .records
            .retain(|_, stored| stored.file_entry_id != file_id);
        debug!(
            "Deleted {} records with file_entry_id {}",
            before - collection.records.len(),
            file_id
        );
        Ok(true)
    }
}

fn matches_filter(metadata: &Map<String, Value>, filter: Option<&Map<String, Value>>) -> bool {
    filter
        .map(|f| f.iter().all(|(key, expected)| metadata.get(key) == Some(expected)))
        .unwrap_or(true)
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squared_distance_of_identical_vectors_is_zero() {
        assert_eq!(squared_distance(&[0.5, 1.0], &[0.5, 1.0]), 0.0);
        assert!((squared_distance(&[0.0, 0.0], &[3.0, 4.0]) - 25.0).abs() < 1e-6);
    }

    #[test]
    fn empty_filter_matches_everything() {
        let mut metadata = Map::new();
        metadata.insert("lang".to_string(), Value::from("rust"));

        assert!(matches_filter(&metadata, None));
        assert!(matches_filter(&metadata, Some(&Map::new())));

        let mut filter = Map::new();
        filter.insert("lang".to_string(), Value::from("go"));
        assert!(!matches_filter(&metadata, Some(&filter)));
    }
}
