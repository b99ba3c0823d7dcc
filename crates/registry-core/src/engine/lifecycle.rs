//! Lifecycle management for the registry engine.
//!
//! On startup the persisted access table wins over configuration; the
//! configured genesis admins and signers are only written when storage holds
//! no table yet.

use super::{RegistryEngine, RegistryError};
use registry_types::AccessTable;

impl RegistryEngine {
	/// Loads or seeds the access table. Must run before serving requests.
	pub async fn initialize(&self) -> Result<(), RegistryError> {
		let _guard = self.write_lock.lock().await;

		let table = match self.access.load_table().await? {
			Some(table) => {
				tracing::info!(
					registry_id = %self.config.registry.id,
					admins = table.admin_count(),
					signers = table.signers.len(),
					"Loaded persisted access table"
				);
				table
			},
			None => {
				let genesis = AccessTable::genesis(
					&self.config.access.admins,
					&self.config.access.signers,
				);
				self.access.save_table(&genesis).await?;
				tracing::info!(
					registry_id = %self.config.registry.id,
					admins = genesis.admin_count(),
					signers = genesis.signers.len(),
					"Seeded genesis access table"
				);
				genesis
			},
		};

		let policy = self.consensus.policy();
		if !policy.is_reachable(table.signers.len()) {
			tracing::warn!(
				quorum = %policy,
				signers = table.signers.len(),
				"Quorum exceeds the signer set; no digest can commit until signers are added"
			);
		}

		tracing::info!(
			quorum = %self.consensus.policy(),
			digest = self.commitment.algorithm(),
			public_reads = self.config.registry.public_reads,
			"Registry engine initialized"
		);
		Ok(())
	}

	/// Waits for in-flight mutations to finish.
	pub async fn shutdown(&self) -> Result<(), RegistryError> {
		let _guard = self.write_lock.lock().await;
		tracing::info!("Shutting down registry engine");
		Ok(())
	}
}
