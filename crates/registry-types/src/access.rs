//! Access control types for the registry.
//!
//! Role assignments and the signer set are kept together in one
//! [`AccessTable`] so that every access-control mutation is a single record
//! write.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::Address;

/// Role an account may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	/// May issue orders and update their status.
	Signer,
	/// May manage roles and the signer set.
	Admin,
	/// No privileges.
	#[default]
	None,
}

impl Role {
	pub fn as_str(&self) -> &'static str {
		match self {
			Role::Signer => "signer",
			Role::Admin => "admin",
			Role::None => "none",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Role {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"signer" => Ok(Role::Signer),
			"admin" => Ok(Role::Admin),
			"none" => Ok(Role::None),
			other => Err(format!("Unknown role: {}", other)),
		}
	}
}

/// A single account-to-role binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
	pub account: Address,
	pub role: Role,
}

/// Persisted access-control state: role assignments plus the signer set.
///
/// Assignments are kept sorted by account and never contain [`Role::None`];
/// assigning `None` removes the entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTable {
	/// Active role assignments, at most one per account.
	pub roles: Vec<RoleAssignment>,
	/// Accounts entitled to approve consensus submissions.
	pub signers: BTreeSet<Address>,
}

impl AccessTable {
	/// Builds the initial table from configured admins and signers.
	pub fn genesis(admins: &[Address], signers: &[Address]) -> Self {
		let mut table = Self::default();
		for admin in admins {
			table.assign(*admin, Role::Admin);
		}
		table.signers.extend(signers.iter().copied());
		table
	}

	/// Returns the role held by `account`, or [`Role::None`].
	pub fn role_of(&self, account: &Address) -> Role {
		self.roles
			.binary_search_by(|entry| entry.account.cmp(account))
			.map(|idx| self.roles[idx].role)
			.unwrap_or(Role::None)
	}

	/// Replaces the role held by `account`.
	pub fn assign(&mut self, account: Address, role: Role) {
		match self
			.roles
			.binary_search_by(|entry| entry.account.cmp(&account))
		{
			Ok(idx) if role == Role::None => {
				self.roles.remove(idx);
			},
			Ok(idx) => self.roles[idx].role = role,
			Err(_) if role == Role::None => {},
			Err(idx) => self.roles.insert(idx, RoleAssignment { account, role }),
		}
	}

	/// Number of accounts currently holding the admin role.
	pub fn admin_count(&self) -> usize {
		self.roles.iter().filter(|r| r.role == Role::Admin).count()
	}

	pub fn is_signer(&self, account: &Address) -> bool {
		self.signers.contains(account)
	}
}
