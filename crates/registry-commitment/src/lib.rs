//! Hash commitment module for the order registry.
//!
//! A commitment binds off-chain order content to an on-ledger record through a
//! fixed-width 256-bit digest. The same digest function produces order
//! content hashes and the digests proposed for consensus approval. The
//! algorithm is pluggable; callers only rely on determinism and the output
//! width.

use registry_types::{Hash256, ImplementationRegistry};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod keccak;
	pub mod sha256;
}

/// Errors that can occur while constructing a commitment implementation.
#[derive(Debug, Error)]
pub enum CommitmentError {
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for digest algorithms.
///
/// Implementations must be pure: equal input always yields equal output and
/// no state is touched.
pub trait CommitmentInterface: Send + Sync {
	/// Name of the algorithm as used in configuration.
	fn algorithm(&self) -> &'static str;

	/// Computes the digest of `content`.
	fn digest(&self, content: &[u8]) -> Hash256;
}

/// Type alias for commitment factory functions.
pub type CommitmentFactory =
	fn(&toml::Value) -> Result<Box<dyn CommitmentInterface>, CommitmentError>;

/// Registry trait for commitment implementations.
pub trait CommitmentRegistry: ImplementationRegistry<Factory = CommitmentFactory> {}

/// Get all registered commitment implementations.
pub fn get_all_implementations() -> Vec<(&'static str, CommitmentFactory)> {
	use implementations::{keccak, sha256};

	vec![
		(sha256::Registry::NAME, sha256::Registry::factory()),
		(keccak::Registry::NAME, keccak::Registry::factory()),
	]
}

/// Service wrapping the configured digest algorithm.
pub struct CommitmentService {
	implementation: Box<dyn CommitmentInterface>,
}

impl CommitmentService {
	pub fn new(implementation: Box<dyn CommitmentInterface>) -> Self {
		Self { implementation }
	}

	/// Computes the digest of raw content.
	pub fn digest(&self, content: &[u8]) -> Hash256 {
		self.implementation.digest(content)
	}

	/// Computes the digest of a UTF-8 string.
	pub fn digest_str(&self, content: &str) -> Hash256 {
		self.digest(content.as_bytes())
	}

	pub fn algorithm(&self) -> &'static str {
		self.implementation.algorithm()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn empty_config() -> toml::Value {
		toml::Value::Table(toml::map::Map::new())
	}

	#[test]
	fn test_all_implementations_construct() {
		for (name, factory) in get_all_implementations() {
			let implementation = factory(&empty_config()).unwrap();
			assert_eq!(implementation.algorithm(), name);
		}
	}

	#[test]
	fn test_service_is_deterministic() {
		let factory = implementations::sha256::Registry::factory();
		let service = CommitmentService::new(factory(&empty_config()).unwrap());

		let first = service.digest_str("order 1234");
		let second = service.digest(b"order 1234");
		assert_eq!(first, second);
		assert_ne!(first, service.digest_str("order 1235"));
	}

	#[test]
	fn test_algorithms_differ() {
		let sha = implementations::sha256::Registry::factory()(&empty_config()).unwrap();
		let keccak = implementations::keccak::Registry::factory()(&empty_config()).unwrap();
		assert_ne!(sha.digest(b"abc"), keccak.digest(b"abc"));
	}
}
