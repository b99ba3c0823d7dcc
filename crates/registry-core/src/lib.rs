//! Core engine for the order registry.
//!
//! Ties together access control, the order state machine and consensus
//! submission behind a single facade, [`RegistryEngine`]. The facade owns the
//! registry's writer lock, translates module failures into [`RegistryError`]
//! and publishes a [`RegistryEvent`](registry_types::RegistryEvent) for every
//! committed mutation. Engines are assembled from configuration with
//! [`RegistryBuilder`].

pub mod access;
pub mod builder;
pub mod consensus;
pub mod engine;
pub mod state;

pub use builder::{BuilderError, RegistryBuilder, RegistryFactories};
pub use engine::{event_bus::EventBus, RegistryEngine, RegistryError};
