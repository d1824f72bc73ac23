//! # Application Layer
//!
//! The connector contract shared by every backend.

pub mod interfaces;

pub use interfaces::*;
