//! State management for registry orders.
//!
//! Provides the order state machine: issuing records, validating status
//! changes against the transition table and persisting the result.

pub mod order;

pub use order::{is_terminal, is_valid_transition, successors, OrderStateError, OrderStateMachine};
