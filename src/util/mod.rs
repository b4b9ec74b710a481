//! Shared utility helpers.

pub mod error;

pub use error::{NutriScanError, Result as NutriScanResult};
