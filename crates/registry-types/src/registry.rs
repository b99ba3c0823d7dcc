//! Registry trait for self-registering implementations.
//!
//! Pluggable components (storage backends, commitment hashers) expose a
//! `Registry` marker type implementing this trait so the service can map a
//! configuration name to a factory function.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// e.g. "memory" for `storage.implementations.memory` or "sha256" for
	/// `commitment.implementations.sha256`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
