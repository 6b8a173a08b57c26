//! RPC module
//!
//! - `ZcashRpc` trait: one async method per zcashd RPC the exporter uses
//! - `HttpZcashRpc`: production implementation over JSON-RPC/HTTP with
//!   basic auth
//! - Typed response structs and a per-call error taxonomy
//!
//! The exporter only ever talks to the node through the trait, so tests
//! can substitute a mock implementation.

pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpZcashRpc, ZcashRpc};
pub use error::RpcError;
