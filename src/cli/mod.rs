use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::VectorRecord;

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the backend is reachable with the configured credentials
    Validate,

    /// Print the number of stored vectors
    Info,

    /// Store records read from a JSON file (an array of {id?, vector, metadata})
    Store { file: String },

    Search {
        /// Query vector as a JSON array, e.g. '[0.1, 0.2]'
        #[arg(long)]
        vector: String,

        #[arg(long, default_value = "10")]
        num: usize,

        /// Metadata filter as a JSON object
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Delete every vector stored for a file entry id
    Delete { file_id: String },
}

#[derive(Deserialize)]
struct RecordInput {
    id: Option<String>,
    vector: Vec<f32>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

/// Read a batch of records from `path`. Records without an id get a fresh UUID.
pub fn load_records(path: &Path) -> Result<Vec<VectorRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let inputs: Vec<RecordInput> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of records", path.display()))?;

    if inputs.is_empty() {
        bail!("{} contains no records", path.display());
    }

    Ok(inputs
        .into_iter()
        .map(|input| {
            let id = input.id.unwrap_or_else(|| Uuid::new_v4().to_string());
            VectorRecord::new(id, input.vector).with_metadata(input.metadata.unwrap_or_default())
        })
        .collect())
}

pub fn parse_vector(raw: &str) -> Result<Vec<f32>> {
    serde_json::from_str(raw).context("query vector must be a JSON array of numbers")
}

pub fn parse_filter(raw: &str) -> Result<Map<String, Value>> {
    serde_json::from_str(raw).context("filter must be a JSON object")
}
