//! Providers Module - External Data Sources
//!
//! RPC clients for on-chain transaction history.

pub mod solana;

pub use solana::*;
