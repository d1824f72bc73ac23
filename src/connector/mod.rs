//! # Connector Layer
//!
//! Backend implementations of [`crate::application::SinkConnector`]:
//! - Epsilla Cloud over its REST API
//! - an in-process sink for tests and dry runs

pub mod adapter;

pub use adapter::*;
