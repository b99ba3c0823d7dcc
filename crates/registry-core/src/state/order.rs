//! Order state machine implementation.
//!
//! Orders start in `accepted` and move along an explicit adjacency table. The
//! main line runs accepted -> call_ship -> taken -> warehouse -> delivering ->
//! delivery_success. Two side branches (checking -> checked, wait_deposit ->
//! deposited) rejoin at call_ship, a failed delivery returns through
//! return_warehouse -> return_shop, and every non-terminal state may cancel.

use once_cell::sync::Lazy;
use registry_storage::{StorageError, StorageService};
use registry_types::{Address, Order, OrderStatus, StorageKey};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during order state management.
#[derive(Debug, Error)]
pub enum OrderStateError {
	#[error("Storage error: {0}")]
	Storage(String),
	#[error("Invalid state transition from {from} to {to}")]
	InvalidTransition { from: OrderStatus, to: OrderStatus },
	#[error("Order not found: {0}")]
	OrderNotFound(String),
	#[error("Order already exists: {0}")]
	DuplicateOrder(String),
}

impl From<StorageError> for OrderStateError {
	fn from(err: StorageError) -> Self {
		OrderStateError::Storage(err.to_string())
	}
}

// Static transition table - each state maps to allowed next states
static TRANSITIONS: Lazy<HashMap<OrderStatus, HashSet<OrderStatus>>> = Lazy::new(|| {
	use OrderStatus::*;

	let mut m = HashMap::new();
	m.insert(
		Accepted,
		HashSet::from([CallShip, Checking, WaitDeposit, Cancel]),
	);
	m.insert(CallShip, HashSet::from([Taken, Cancel]));
	m.insert(Taken, HashSet::from([Warehouse, Cancel]));
	m.insert(Warehouse, HashSet::from([Delivering, Cancel]));
	m.insert(
		Delivering,
		HashSet::from([DeliverySuccess, Rejected, ReturnWarehouse, Cancel]),
	);
	m.insert(ReturnWarehouse, HashSet::from([ReturnShop, Cancel]));
	m.insert(Checking, HashSet::from([Checked, Cancel]));
	m.insert(Checked, HashSet::from([CallShip, Cancel]));
	m.insert(WaitDeposit, HashSet::from([Deposited, Cancel]));
	m.insert(Deposited, HashSet::from([CallShip, Cancel]));
	// terminal
	m.insert(DeliverySuccess, HashSet::new());
	m.insert(Rejected, HashSet::new());
	m.insert(Cancel, HashSet::new());
	m.insert(ReturnShop, HashSet::new());
	m
});

/// Checks if a state transition is valid. Same-state moves never are.
pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
	TRANSITIONS
		.get(&from)
		.is_some_and(|next| next.contains(&to))
}

/// Permitted successors of `status`, in declaration order.
pub fn successors(status: OrderStatus) -> Vec<OrderStatus> {
	OrderStatus::ALL
		.iter()
		.copied()
		.filter(|next| is_valid_transition(status, *next))
		.collect()
}

/// Whether no transition leaves `status`.
pub fn is_terminal(status: OrderStatus) -> bool {
	TRANSITIONS.get(&status).is_none_or(|next| next.is_empty())
}

/// Manages order records and their status transitions.
///
/// Every method performs at most one write. Callers serialize mutations with
/// the registry writer lock.
pub struct OrderStateMachine {
	storage: Arc<StorageService>,
}

impl OrderStateMachine {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Stores a freshly issued order, refusing to overwrite an existing id.
	pub async fn issue(&self, order: &Order) -> Result<(), OrderStateError> {
		if self
			.storage
			.exists(StorageKey::Orders.as_str(), &order.id)
			.await?
		{
			return Err(OrderStateError::DuplicateOrder(order.id.clone()));
		}

		self.storage
			.store(StorageKey::Orders.as_str(), &order.id, order)
			.await?;
		Ok(())
	}

	/// Transitions an order to a new status with validation.
	///
	/// Returns the previous status alongside the updated order.
	pub async fn transition_order_status(
		&self,
		order_id: &str,
		new_status: OrderStatus,
		caller: Address,
		now: u64,
	) -> Result<(OrderStatus, Order), OrderStateError> {
		let mut order = self.get_order(order_id).await?;
		let previous = order.status;

		if !is_valid_transition(previous, new_status) {
			return Err(OrderStateError::InvalidTransition {
				from: previous,
				to: new_status,
			});
		}

		order.status = new_status;
		order.updated_at = now;
		order.updated_by = caller;

		self.storage
			.update(StorageKey::Orders.as_str(), order_id, &order)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => OrderStateError::OrderNotFound(order_id.to_string()),
				other => other.into(),
			})?;

		Ok((previous, order))
	}

	/// Gets an order by ID.
	pub async fn get_order(&self, order_id: &str) -> Result<Order, OrderStateError> {
		self.storage
			.retrieve_optional(StorageKey::Orders.as_str(), order_id)
			.await?
			.ok_or_else(|| OrderStateError::OrderNotFound(order_id.to_string()))
	}
}
