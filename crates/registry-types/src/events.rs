//! Event types published by the registry engine.
//!
//! Every successful mutation produces one or two events on the event bus so
//! that observers (logging, downstream reconciliation) can follow the ledger
//! without polling storage.

use serde::{Deserialize, Serialize};

use crate::{Address, Hash256, Order, OrderStatus, Role};

/// Main event type encompassing all registry events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegistryEvent {
	/// Events from the order store.
	Order(OrderEvent),
	/// Events from access control.
	Access(AccessEvent),
	/// Events from consensus submission.
	Consensus(ConsensusEvent),
}

/// Events related to order records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderEvent {
	/// A new order has been issued.
	Issued { order: Order },
	/// An order moved along the status graph.
	StatusChanged {
		order_id: String,
		from: OrderStatus,
		to: OrderStatus,
		caller: Address,
	},
}

/// Events related to roles and the signer set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AccessEvent {
	/// An account joined the signer set.
	SignerAdded { account: Address, caller: Address },
	/// An account's role changed.
	RoleAssigned {
		account: Address,
		previous: Role,
		role: Role,
		caller: Address,
	},
}

/// Events related to consensus submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConsensusEvent {
	/// A digest was submitted for the first time.
	Proposed {
		digest: Hash256,
		proposer: Address,
		threshold: usize,
	},
	/// A further signer approved a pending digest.
	Approved {
		digest: Hash256,
		signer: Address,
		approvals: usize,
		threshold: usize,
	},
	/// A digest reached its quorum. Published exactly once per digest.
	Committed { digest: Hash256, approvals: usize },
}
