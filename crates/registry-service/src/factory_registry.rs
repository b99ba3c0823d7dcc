//! Factory registry for registry backends.
//!
//! Collects every storage and commitment implementation the workspace ships
//! so the engine can be assembled purely from configuration.

use registry_commitment::CommitmentFactory;
use registry_config::Config;
use registry_core::{RegistryBuilder, RegistryEngine, RegistryFactories};
use registry_storage::StorageFactory;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Global registry for all implementation factories
pub struct FactoryRegistry {
	pub storage: HashMap<String, StorageFactory>,
	pub commitment: HashMap<String, CommitmentFactory>,
}

impl FactoryRegistry {
	pub fn new() -> Self {
		Self {
			storage: HashMap::new(),
			commitment: HashMap::new(),
		}
	}

	pub fn register_storage(&mut self, name: impl Into<String>, factory: StorageFactory) {
		self.storage.insert(name.into(), factory);
	}

	pub fn register_commitment(&mut self, name: impl Into<String>, factory: CommitmentFactory) {
		self.commitment.insert(name.into(), factory);
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Returns the global registry, populating it on first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in registry_storage::get_all_implementations() {
			tracing::debug!("Registering storage implementation: {}", name);
			registry.register_storage(name, factory);
		}

		for (name, factory) in registry_commitment::get_all_implementations() {
			tracing::debug!("Registering commitment implementation: {}", name);
			registry.register_commitment(name, factory);
		}

		registry
	})
}

/// Macro to build factories from config implementations
macro_rules! build_factories {
	($registry:expr, $config_impls:expr, $registry_field:ident, $type_name:literal) => {{
		let mut factories = HashMap::new();
		for name in $config_impls.keys() {
			if let Some(factory) = $registry.$registry_field.get(name) {
				factories.insert(name.clone(), *factory);
			} else {
				let mut available: Vec<_> = $registry.$registry_field.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					$type_name,
					name,
					available.join(", ")
				)
				.into());
			}
		}
		factories
	}};
}

/// Builds the registry engine from configuration.
pub fn build_registry_from_config(
	config: Config,
) -> Result<RegistryEngine, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let storage_factories =
		build_factories!(registry, config.storage.implementations, storage, "storage");
	let commitment_factories = build_factories!(
		registry,
		config.commitment.implementations,
		commitment,
		"commitment"
	);

	let factories = RegistryFactories {
		storage_factories,
		commitment_factories,
	};

	Ok(RegistryBuilder::new(config).build(factories)?)
}
