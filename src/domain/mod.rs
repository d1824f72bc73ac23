//! # Domain Layer
//!
//! Records, search results and the connector error taxonomy.
//! This layer knows nothing about any particular vector-store backend.

mod error;
pub mod models;

pub use error::*;
pub use models::*;
