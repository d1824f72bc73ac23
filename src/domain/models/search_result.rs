use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record matched by a similarity query.
///
/// `score` is passed through exactly as the backend reports it. Whether smaller
/// or larger means closer depends on the connector that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    id: String,
    vector: Vec<f32>,
    metadata: Map<String, Value>,
    score: f32,
}

impl SearchResult {
    pub fn new(
        id: impl Into<String>,
        vector: Vec<f32>,
        metadata: Map<String, Value>,
        score: f32,
    ) -> Self {
        Self {
            id: id.into(),
            vector,
            metadata,
            score,
        }
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

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn display_line(&self) -> String {
        format!("{} (score: {:.4})", self.id, self.score)
    }
}
