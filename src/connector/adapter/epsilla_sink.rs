use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::epsilla_client::{
    string_eq_filter, EpsillaClient, EpsillaError, EpsillaRecord, EpsillaVectorDb, QueryRequest,
    TableField,
};
use super::insert_count::inserted_counts;
use super::{EpsillaConfig, EPSILLA_OPTIONAL_PROPERTIES, EPSILLA_REQUIRED_PROPERTIES};
use crate::application::SinkConnector;
use crate::domain::{ConnectorError, SearchResult, SinkInfo, VectorRecord};

const FILE_ENTRY_ID_COLUMN: &str = "file_entry_id";
const VECTOR_COLUMN: &str = "vector";

/// Sink connector writing to an Epsilla Cloud table.
///
/// The table is created on the first `store` with four columns: `id` (string
/// primary key), `vector` (sized from the first record), `metadata` (JSON) and
/// `file_entry_id`, which is lifted out of `metadata["_file_entry_id"]` so that
/// deletes can filter on it.
///
/// Search scores are Epsilla's `@distance`: smaller is closer. Epsilla's query
/// API does not take structured metadata filters, so the `filter` argument of
/// `search` is accepted and ignored.
#[derive(Debug, Clone)]
pub struct EpsillaSink {
    config: EpsillaConfig,
}

impl EpsillaSink {
    pub fn new(config: EpsillaConfig) -> Self {
        Self { config }
    }

    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self, ConnectorError> {
        Ok(Self::new(EpsillaConfig::from_properties(properties)?))
    }

    pub fn config(&self) -> &EpsillaConfig {
        &self.config
    }

    async fn open_db(&self) -> Result<EpsillaVectorDb, EpsillaError> {
        EpsillaClient::new(&self.config)?
            .vectordb(&self.config.db_id)
            .await
    }

    /// Credentials are checked against the project, then the database is
    /// resolved. Both are read-only calls.
    async fn check_reachable(&self) -> Result<(), EpsillaError> {
        let client = EpsillaClient::new(&self.config)?;
        client.validate().await?;
        client.vectordb(&self.config.db_id).await?;
        Ok(())
    }

    fn table_fields(dimensions: usize) -> Vec<TableField> {
        vec![
            TableField::new("id", "STRING").primary_key(),
            TableField::new(VECTOR_COLUMN, "VECTOR_FLOAT").with_dimensions(dimensions),
            TableField::new("metadata", "JSON"),
            TableField::new(FILE_ENTRY_ID_COLUMN, "STRING"),
        ]
    }

    /// Create the table when it is missing. If creation fails because another
    /// writer got there first, the table is accepted as it is; otherwise the
    /// creation error is returned.
    async fn ensure_table(&self, db: &EpsillaVectorDb, dimensions: usize) -> Result<(), EpsillaError> {
        let table = &self.config.table_name;
        if db.list_tables().await?.iter().any(|t| t == table) {
            return Ok(());
        }

        match db.create_table(table, &Self::table_fields(dimensions)).await {
            Ok(()) => {
                info!("Created Epsilla table {} with {} dimensions", table, dimensions);
                Ok(())
            }
            Err(create_err) => match db.list_tables().await {
                Ok(tables) if tables.iter().any(|t| t == table) => {
                    debug!("Epsilla table {} was created concurrently", table);
                    Ok(())
                }
                _ => Err(create_err),
            },
        }
    }
}

fn storing_failed(e: EpsillaError) -> ConnectorError {
    ConnectorError::insertion(format!("Epsilla storing failed. Try later: {e}"))
}

#[async_trait]
impl SinkConnector for EpsillaSink {
    fn sink_name(&self) -> &'static str {
        "EpsillaSink"
    }

    fn required_properties(&self) -> &'static [&'static str] {
        EPSILLA_REQUIRED_PROPERTIES
    }

    fn optional_properties(&self) -> &'static [&'static str] {
        EPSILLA_OPTIONAL_PROPERTIES
    }

    async fn validation(&self) -> Result<bool, ConnectorError> {
        self.check_reachable().await.map_err(|e| {
            ConnectorError::connection(format!(
                "Epsilla Cloud connection couldn't be initialized: {e}"
            ))
        })?;
        debug!("Validated Epsilla project {}", self.config.project_id);
        Ok(true)
    }

    async fn store(&self, records: &[VectorRecord]) -> Result<Vec<u64>, ConnectorError> {
        let first = records
            .first()
            .ok_or_else(|| ConnectorError::invalid_input("cannot store an empty batch"))?;

        // Resolve promoted ids before touching the backend so a bad record
        // never leaves a half-provisioned table behind.
        let file_entry_ids = records
            .iter()
            .map(VectorRecord::file_entry_id)
            .collect::<Result<Vec<_>, _>>()?;

        let db = self.open_db().await.map_err(storing_failed)?;
        self.ensure_table(&db, first.dimensions())
            .await
            .map_err(storing_failed)?;

        let payload: Vec<EpsillaRecord<'_>> = records
            .iter()
            .zip(file_entry_ids)
            .map(|(record, file_entry_id)| EpsillaRecord {
                id: record.id(),
                vector: record.vector(),
                metadata: record.metadata(),
                file_entry_id,
            })
            .collect();

        let response = db
            .insert(&self.config.table_name, &payload)
            .await
            .map_err(storing_failed)?;

        debug!(
            "Stored {} records in Epsilla table {}",
            records.len(),
            self.config.table_name
        );
        Ok(inserted_counts(response.result.as_ref(), &response.message))
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
        if filter.is_some_and(|f| !f.is_empty()) {
            debug!("Epsilla query does not support metadata filters; ignoring filter");
        }

        let query_failed =
            |e: EpsillaError| ConnectorError::query(format!("Failed to query Epsilla: {e}"));

        let db = self.open_db().await.map_err(query_failed)?;
        let request = QueryRequest {
            table: &self.config.table_name,
            query_field: VECTOR_COLUMN,
            query_vector: vector,
            limit: number_of_results,
            with_distance: true,
        };
        let matches = db.query(&request).await.map_err(query_failed)?;

        Ok(matches
            .into_iter()
            .take(number_of_results)
            .map(|m| SearchResult::new(m.id, m.vector, m.metadata.unwrap_or_default(), m.distance))
            .collect())
    }

    async fn info(&self) -> Result<SinkInfo, ConnectorError> {
        let info_failed = |e: EpsillaError| {
            ConnectorError::index_info(format!("Failed to get information from Epsilla: {e}"))
        };

        let db = self.open_db().await.map_err(info_failed)?;
        let rows = db
            .get(&self.config.table_name, &["id"])
            .await
            .map_err(info_failed)?;
        Ok(SinkInfo::new(rows.len() as u64))
    }

    async fn delete_vectors_with_file_id(&self, file_id: &str) -> Result<bool, ConnectorError> {
        let delete_failed = |e: EpsillaError| {
            ConnectorError::insertion(format!("Epsilla deletion failed. Try later: {e}"))
        };

        let db = self.open_db().await.map_err(delete_failed)?;
        db.delete(
            &self.config.table_name,
            &string_eq_filter(FILE_ENTRY_ID_COLUMN, file_id),
        )
        .await
        .map_err(delete_failed)?;

        debug!(
            "Deleted records with file_entry_id {} from {}",
            file_id, self.config.table_name
        );
        Ok(true)
    }
}
