//! Storage-related types for the registry.

use std::str::FromStr;

/// Storage namespaces for the registry tables.
///
/// This enum provides type safety for storage operations by replacing
/// string literals with strongly typed variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Order records keyed by order id
	Orders,
	/// The access table (roles and signer set), stored as a single record
	Access,
	/// Consensus records keyed by hex digest
	Transactions,
}

impl StorageKey {
	/// Returns the string representation of the storage key.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Orders => "orders",
			StorageKey::Access => "access",
			StorageKey::Transactions => "transactions",
		}
	}

	/// Returns an iterator over all StorageKey variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[Self::Orders, Self::Access, Self::Transactions].into_iter()
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"orders" => Ok(Self::Orders),
			"access" => Ok(Self::Access),
			"transactions" => Ok(Self::Transactions),
			_ => Err(()),
		}
	}
}

impl From<StorageKey> for &'static str {
	fn from(key: StorageKey) -> Self {
		key.as_str()
	}
}

/// Record id under [`StorageKey::Access`] holding the access table.
pub const ACCESS_TABLE_ID: &str = "table";
