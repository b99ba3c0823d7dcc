//! Common types module for the order registry.
//!
//! This module defines the core data types shared by every registry component:
//! orders and their status graph, role assignments, consensus records, events,
//! storage namespaces and the HTTP API payloads.

/// Role and signer-set types for access control.
pub mod access;
/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Consensus submission records and quorum policy.
pub mod consensus;
/// Event types published by the registry engine.
pub mod events;
/// Order records and the status transition table.
pub mod order;
/// Base trait for self-registering implementations.
pub mod registry;
/// Storage namespaces for persisted registry tables.
pub mod storage;
/// Utility functions for timestamps and log formatting.
pub mod utils;
/// Configuration validation types for implementation-specific TOML tables.
pub mod validation;

pub use access::*;
pub use api::*;
pub use consensus::*;
pub use events::*;
pub use order::*;
pub use registry::ImplementationRegistry;
pub use storage::*;
pub use utils::{current_timestamp, truncate_id};
pub use validation::*;

/// Identity of a registry participant.
pub use alloy_primitives::Address;

/// Fixed-width 256-bit digest used for content hashes and consensus proposals.
pub type Hash256 = alloy_primitives::B256;
