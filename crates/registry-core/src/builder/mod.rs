//! Builder pattern for constructing registry engines.
//!
//! Composes a RegistryEngine from pluggable storage and commitment
//! implementations using factory functions keyed by the names used in the
//! configuration's `implementations` tables.

use crate::engine::{event_bus::EventBus, RegistryEngine};
use registry_commitment::{CommitmentError, CommitmentInterface, CommitmentService};
use registry_config::Config;
use registry_storage::{StorageError, StorageInterface, StorageService};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Capacity of the event bus ring buffer.
const EVENT_BUS_CAPACITY: usize = 1000;

/// Errors that can occur during registry engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions needed to build a RegistryEngine.
///
/// Each factory takes the TOML table configured for its implementation and
/// returns the constructed backend.
pub struct RegistryFactories<SF, CF> {
	pub storage_factories: HashMap<String, SF>,
	pub commitment_factories: HashMap<String, CF>,
}

/// Builder for constructing a RegistryEngine with pluggable implementations.
pub struct RegistryBuilder {
	config: Config,
}

impl RegistryBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the engine. Only the primary implementation of each component
	/// is constructed.
	pub fn build<SF, CF>(
		self,
		factories: RegistryFactories<SF, CF>,
	) -> Result<RegistryEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		CF: Fn(&toml::Value) -> Result<Box<dyn CommitmentInterface>, CommitmentError>,
	{
		let storage_backend = build_primary(
			"storage",
			&self.config.storage.primary,
			&self.config.storage.implementations,
			&factories.storage_factories,
		)?;
		let storage = Arc::new(StorageService::new(storage_backend));

		let digest = build_primary(
			"commitment",
			&self.config.commitment.primary,
			&self.config.commitment.implementations,
			&factories.commitment_factories,
		)?;
		let commitment = Arc::new(CommitmentService::new(digest));

		Ok(RegistryEngine::new(
			self.config,
			storage,
			commitment,
			EventBus::new(EVENT_BUS_CAPACITY),
		))
	}
}

fn build_primary<T, E, F>(
	component: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
	factories: &HashMap<String, F>,
) -> Result<T, BuilderError>
where
	E: std::fmt::Display,
	F: Fn(&toml::Value) -> Result<T, E>,
{
	let config = implementations.get(primary).ok_or_else(|| {
		BuilderError::Config(format!(
			"Primary {} '{}' has no configuration",
			component, primary
		))
	})?;

	let factory = factories.get(primary).ok_or_else(|| {
		BuilderError::MissingComponent(format!(
			"No {} implementation named '{}'",
			component, primary
		))
	})?;

	match factory(config) {
		Ok(implementation) => {
			tracing::info!(component = %component, implementation = %primary, "Loaded");
			Ok(implementation)
		},
		Err(e) => {
			tracing::error!(
				component = %component,
				implementation = %primary,
				error = %e,
				"Failed to create implementation"
			);
			Err(BuilderError::Config(format!(
				"Failed to create {} implementation '{}': {}",
				component, primary, e
			)))
		},
	}
}
