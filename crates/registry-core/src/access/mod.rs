//! Role and signer-set management.
//!
//! The whole access state (role assignments plus the signer set) is persisted
//! as one record, so any change lands in a single write. Every check runs
//! against a freshly loaded table and fails closed: a missing table grants
//! nothing.

use registry_storage::StorageService;
use registry_types::{AccessTable, Address, Role, StorageKey, ACCESS_TABLE_ID};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
	#[error("Account {caller} is not authorized for the {required} role")]
	Unauthorized { caller: Address, required: Role },
	#[error("Assignment would leave the registry without an admin")]
	LastAdminProtected,
	#[error("Account {0} cannot hold access rights")]
	InvalidAccount(Address),
	#[error("Storage error: {0}")]
	Storage(String),
}

/// Whether `account` satisfies `required` under `table`.
///
/// `Admin` needs the admin role. `Signer` is met by the signer role, the admin
/// role, or signer-set membership. Nobody satisfies `None`.
pub fn is_authorized(table: &AccessTable, account: &Address, required: Role) -> bool {
	match required {
		Role::Admin => table.role_of(account) == Role::Admin,
		Role::Signer => {
			matches!(table.role_of(account), Role::Signer | Role::Admin)
				|| table.is_signer(account)
		},
		Role::None => false,
	}
}

/// Short-circuits with [`AccessError::Unauthorized`] when the check fails.
pub fn require(table: &AccessTable, caller: &Address, required: Role) -> Result<(), AccessError> {
	if is_authorized(table, caller, required) {
		Ok(())
	} else {
		Err(AccessError::Unauthorized {
			caller: *caller,
			required,
		})
	}
}

/// The zero address stands for "no caller" and never holds rights.
fn require_account(account: &Address) -> Result<(), AccessError> {
	if account.is_zero() {
		return Err(AccessError::InvalidAccount(*account));
	}
	Ok(())
}

/// Outcome of a role assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleChange {
	pub previous: Role,
	pub role: Role,
}

/// Persists and mutates the access table.
///
/// Callers are expected to hold the registry writer lock around mutations.
pub struct AccessControl {
	storage: Arc<StorageService>,
}

impl AccessControl {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Loads the persisted table, if one has been written.
	pub async fn load_table(&self) -> Result<Option<AccessTable>, AccessError> {
		self.storage
			.retrieve_optional(StorageKey::Access.as_str(), ACCESS_TABLE_ID)
			.await
			.map_err(|e| AccessError::Storage(e.to_string()))
	}

	/// Loads the table, treating a missing one as empty.
	pub async fn table(&self) -> Result<AccessTable, AccessError> {
		Ok(self.load_table().await?.unwrap_or_default())
	}

	pub async fn save_table(&self, table: &AccessTable) -> Result<(), AccessError> {
		self.storage
			.store(StorageKey::Access.as_str(), ACCESS_TABLE_ID, table)
			.await
			.map_err(|e| AccessError::Storage(e.to_string()))
	}

	/// Adds `account` to the signer set. Admin only.
	///
	/// Returns the resulting table and whether the set actually changed;
	/// re-adding a member is a no-op without a write.
	pub async fn set_signer(
		&self,
		caller: &Address,
		account: Address,
	) -> Result<(AccessTable, bool), AccessError> {
		let mut table = self.table().await?;
		require(&table, caller, Role::Admin)?;
		require_account(&account)?;

		let added = table.signers.insert(account);
		if added {
			self.save_table(&table).await?;
		}
		Ok((table, added))
	}

	/// Assigns `role` to `account`. Admin only.
	///
	/// Fails with [`AccessError::LastAdminProtected`] if the table would be
	/// left without any admin, including an admin demoting themself.
	pub async fn set_role(
		&self,
		caller: &Address,
		account: Address,
		role: Role,
	) -> Result<RoleChange, AccessError> {
		let mut table = self.table().await?;
		require(&table, caller, Role::Admin)?;
		require_account(&account)?;

		let previous = table.role_of(&account);
		if previous == role {
			return Ok(RoleChange { previous, role });
		}

		table.assign(account, role);
		if table.admin_count() == 0 {
			return Err(AccessError::LastAdminProtected);
		}

		self.save_table(&table).await?;
		Ok(RoleChange { previous, role })
	}
}
