//! Common utilities module
//!
//! This module contains shared utilities used across the chroma-key pipeline.

pub mod error;

pub use error::{ChromaKeyError, ConfigurationError, Result};
