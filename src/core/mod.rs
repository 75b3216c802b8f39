//! Core Module - Flow Analysis Pipeline
//!
//! The pure analysis stages: classification, value estimation, graph
//! building, funding tracing, pattern detection, risk aggregation, and
//! critical path identification. Everything here is deterministic and
//! side-effect-free.

pub mod classifier;
pub mod clustering;
pub mod critical_path;
pub mod entities;
pub mod funding;
pub mod graph;
pub mod patterns;
pub mod risk_score;
pub mod value;

pub use classifier::*;
pub use clustering::*;
pub use critical_path::*;
pub use entities::*;
pub use funding::*;
pub use graph::*;
pub use patterns::*;
pub use risk_score::*;
pub use value::*;
