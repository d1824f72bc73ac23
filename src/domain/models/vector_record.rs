use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::ConnectorError;

/// Metadata key naming the file or document a record was produced from.
///
/// Backends promote this key to a first-class column so that every chunk of a
/// file can be deleted with a single filtered request.
pub const FILE_ENTRY_ID_KEY: &str = "_file_entry_id";

/// A single embedding moved through a sink connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    id: String,
    vector: Vec<f32>,
    #[serde(default, deserialize_with = "metadata_or_empty")]
    metadata: Map<String, Value>,
}

impl VectorRecord {
    pub fn new(id: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            vector,
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_file_entry_id(mut self, file_entry_id: impl Into<String>) -> Self {
        self.metadata.insert(
            FILE_ENTRY_ID_KEY.to_string(),
            Value::String(file_entry_id.into()),
        );
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }

    /// Resolve the promoted file entry id.
    ///
    /// A missing key is an error; `null` maps to an empty string and other
    /// non-string scalars are rendered as their JSON text.
    pub fn file_entry_id(&self) -> Result<String, ConnectorError> {
        match self.metadata.get(FILE_ENTRY_ID_KEY) {
            None => Err(ConnectorError::invalid_input(format!(
                "record '{}' has no '{}' metadata entry",
                self.id, FILE_ENTRY_ID_KEY
            ))),
            Some(Value::Null) => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Ok(other.to_string()),
        }
    }
}

fn metadata_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
