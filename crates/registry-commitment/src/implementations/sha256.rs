//! SHA-256 commitment implementation.
//!
//! This is the default algorithm and matches the content hashes produced by
//! existing order tooling.

use crate::{CommitmentError, CommitmentFactory, CommitmentInterface, CommitmentRegistry};
use registry_types::{ConfigSchema, Hash256, ImplementationRegistry, Schema, ValidationError};
use sha2::{Digest, Sha256};

/// SHA-256 digest algorithm.
pub struct Sha256Commitment;

impl CommitmentInterface for Sha256Commitment {
	fn algorithm(&self) -> &'static str {
		Registry::NAME
	}

	fn digest(&self, content: &[u8]) -> Hash256 {
		let bytes: [u8; 32] = Sha256::digest(content).into();
		Hash256::from(bytes)
	}
}

/// SHA-256 takes no settings.
pub struct Sha256Schema;

impl ConfigSchema for Sha256Schema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

pub fn create_commitment(
	config: &toml::Value,
) -> Result<Box<dyn CommitmentInterface>, CommitmentError> {
	Sha256Schema
		.validate(config)
		.map_err(|e| CommitmentError::Configuration(e.to_string()))?;
	Ok(Box::new(Sha256Commitment))
}

/// Registry for the SHA-256 implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "sha256";
	type Factory = CommitmentFactory;

	fn factory() -> Self::Factory {
		create_commitment
	}
}

impl CommitmentRegistry for Registry {}
