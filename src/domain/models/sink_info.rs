use serde::{Deserialize, Serialize};

/// Aggregate descriptor of the collection a connector writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkInfo {
    pub number_vectors_stored: u64,
}

impl SinkInfo {
    pub fn new(number_vectors_stored: u64) -> Self {
        Self {
            number_vectors_stored,
        }
    }
}
