//! Order types for the registry.
//!
//! This module defines the order record bound to an off-chain content hash and
//! the fixed status enumeration orders move through. The permitted transitions
//! between statuses live in the core order store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Address, Hash256};

/// A logistics order tracked by the registry.
///
/// `id`, `content_hash`, `issuer` and `created_at` are fixed at issue time.
/// Only `status` and the update bookkeeping change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	/// Caller-assigned unique identifier.
	pub id: String,
	/// Digest of the off-chain order content.
	pub content_hash: Hash256,
	/// Current lifecycle status.
	pub status: OrderStatus,
	/// Identity that issued the order.
	pub issuer: Address,
	/// Timestamp when this order was issued.
	pub created_at: u64,
	/// Timestamp of the last status change.
	pub updated_at: u64,
	/// Identity that performed the last status change.
	pub updated_by: Address,
}

impl Order {
	/// Creates a freshly issued order in the `accepted` state.
	pub fn issued(id: String, content_hash: Hash256, issuer: Address, now: u64) -> Self {
		Self {
			id,
			content_hash,
			status: OrderStatus::Accepted,
			issuer,
			created_at: now,
			updated_at: now,
			updated_by: issuer,
		}
	}
}

/// Lifecycle status of an order.
///
/// Variants are declared in the order of the legacy numeric encoding, which
/// [`OrderStatus::ordinal`] and [`OrderStatus::from_ordinal`] preserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
	Accepted,
	CallShip,
	#[serde(alias = "taked")]
	Taken,
	Warehouse,
	Delivering,
	DeliverySuccess,
	Rejected,
	ReturnWarehouse,
	ReturnShop,
	Cancel,
	Checking,
	Checked,
	WaitDeposit,
	Deposited,
}

impl OrderStatus {
	/// Every status in legacy ordinal order.
	pub const ALL: [OrderStatus; 14] = [
		OrderStatus::Accepted,
		OrderStatus::CallShip,
		OrderStatus::Taken,
		OrderStatus::Warehouse,
		OrderStatus::Delivering,
		OrderStatus::DeliverySuccess,
		OrderStatus::Rejected,
		OrderStatus::ReturnWarehouse,
		OrderStatus::ReturnShop,
		OrderStatus::Cancel,
		OrderStatus::Checking,
		OrderStatus::Checked,
		OrderStatus::WaitDeposit,
		OrderStatus::Deposited,
	];

	/// Returns the wire name of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Accepted => "accepted",
			OrderStatus::CallShip => "call_ship",
			OrderStatus::Taken => "taken",
			OrderStatus::Warehouse => "warehouse",
			OrderStatus::Delivering => "delivering",
			OrderStatus::DeliverySuccess => "delivery_success",
			OrderStatus::Rejected => "rejected",
			OrderStatus::ReturnWarehouse => "return_warehouse",
			OrderStatus::ReturnShop => "return_shop",
			OrderStatus::Cancel => "cancel",
			OrderStatus::Checking => "checking",
			OrderStatus::Checked => "checked",
			OrderStatus::WaitDeposit => "wait_deposit",
			OrderStatus::Deposited => "deposited",
		}
	}

	/// Position of the status in the legacy numeric encoding.
	pub fn ordinal(&self) -> u8 {
		Self::ALL
			.iter()
			.position(|s| s == self)
			.map(|p| p as u8)
			.unwrap_or(u8::MAX)
	}

	/// Resolves a status from its legacy numeric encoding.
	pub fn from_ordinal(ordinal: u8) -> Option<Self> {
		Self::ALL.get(ordinal as usize).copied()
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when a status name or ordinal is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
	type Err = UnknownStatus;

	/// Accepts wire names, the legacy `taked` spelling, and numeric ordinals.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let normalized = s.trim().to_ascii_lowercase();
		if let Ok(ordinal) = normalized.parse::<u8>() {
			return Self::from_ordinal(ordinal).ok_or_else(|| UnknownStatus(s.to_string()));
		}
		if normalized == "taked" {
			return Ok(OrderStatus::Taken);
		}
		Self::ALL
			.iter()
			.find(|status| status.as_str() == normalized)
			.copied()
			.ok_or_else(|| UnknownStatus(s.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_ordinals_follow_legacy_encoding() {
		assert_eq!(OrderStatus::Accepted.ordinal(), 0);
		assert_eq!(OrderStatus::Cancel.ordinal(), 9);
		assert_eq!(OrderStatus::Deposited.ordinal(), 13);
		assert_eq!(OrderStatus::from_ordinal(4), Some(OrderStatus::Delivering));
		assert_eq!(OrderStatus::from_ordinal(14), None);
	}

	#[test]
	fn test_parse_names_and_aliases() {
		assert_eq!("call_ship".parse::<OrderStatus>(), Ok(OrderStatus::CallShip));
		assert_eq!("TAKED".parse::<OrderStatus>(), Ok(OrderStatus::Taken));
		assert_eq!("9".parse::<OrderStatus>(), Ok(OrderStatus::Cancel));
		assert!("shipped".parse::<OrderStatus>().is_err());
	}

	#[test]
	fn test_serde_uses_snake_case() {
		let json = serde_json::to_string(&OrderStatus::DeliverySuccess).unwrap();
		assert_eq!(json, "\"delivery_success\"");

		let legacy: OrderStatus = serde_json::from_str("\"taked\"").unwrap();
		assert_eq!(legacy, OrderStatus::Taken);
	}

	#[test]
	fn test_issued_order_starts_accepted() {
		let issuer = Address::repeat_byte(0x11);
		let order = Order::issued("O1".into(), Hash256::repeat_byte(0xab), issuer, 42);

		assert_eq!(order.status, OrderStatus::Accepted);
		assert_eq!(order.updated_by, issuer);
		assert_eq!(order.created_at, order.updated_at);

		let json = serde_json::to_value(&order).unwrap();
		assert!(json.get("contentHash").is_some());
	}
}
