//! Keccak-256 commitment implementation, for registries whose content hashes
//! must line up with EVM-native hashing.

use crate::{CommitmentError, CommitmentFactory, CommitmentInterface, CommitmentRegistry};
use alloy_primitives::keccak256;
use registry_types::{ConfigSchema, Hash256, ImplementationRegistry, Schema, ValidationError};

pub struct KeccakCommitment;

impl CommitmentInterface for KeccakCommitment {
	fn algorithm(&self) -> &'static str {
		Registry::NAME
	}

	fn digest(&self, content: &[u8]) -> Hash256 {
		keccak256(content)
	}
}

pub struct KeccakSchema;

impl ConfigSchema for KeccakSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

pub fn create_commitment(
	config: &toml::Value,
) -> Result<Box<dyn CommitmentInterface>, CommitmentError> {
	KeccakSchema
		.validate(config)
		.map_err(|e| CommitmentError::Configuration(e.to_string()))?;
	Ok(Box::new(KeccakCommitment))
}

/// Registry for the Keccak-256 implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "keccak256";
	type Factory = CommitmentFactory;

	fn factory() -> Self::Factory {
		create_commitment
	}
}

impl CommitmentRegistry for Registry {}
