//! Models Module - Data Structures & Errors
//!
//! Single source of truth for the analysis data model and the
//! application-wide error type. No hardcoded values outside this layer.

pub mod errors;
pub mod types;

pub use errors::*;
pub use types::*;
