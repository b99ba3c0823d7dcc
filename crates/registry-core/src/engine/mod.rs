//! Registry facade.
//!
//! [`RegistryEngine`] exposes the registry operations, routes each to its
//! module and maps module failures onto [`RegistryError`]. All mutations run
//! under one writer lock and write exactly one storage record after every
//! check has passed, so a failed call leaves no trace. Reads go straight to
//! storage.

pub mod event_bus;
pub mod lifecycle;

use crate::access::{self, AccessControl, AccessError};
use crate::consensus::{ConsensusError, ConsensusService, SubmissionKind};
use crate::state::{OrderStateError, OrderStateMachine};
use registry_commitment::CommitmentService;
use registry_config::Config;
use registry_storage::StorageService;
use registry_types::{
	current_timestamp, truncate_id, AccessEvent, Address, ConsensusEvent, Hash256, Order,
	OrderEvent, OrderStatus, PendingTransaction, RegistryEvent, Role, RoleAssignment,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::instrument;

/// Failures surfaced by registry operations.
///
/// Every variant except `Storage` is a rejection decided before any state
/// changed.
#[derive(Debug, Error)]
pub enum RegistryError {
	#[error("Account {caller} is not authorized for the {required} role")]
	Unauthorized { caller: Address, required: Role },
	#[error("Order already exists: {0}")]
	DuplicateOrder(String),
	#[error("Order not found: {0}")]
	OrderNotFound(String),
	#[error("Invalid state transition from {from} to {to}")]
	InvalidTransition { from: OrderStatus, to: OrderStatus },
	#[error("Signer {signer} already approved {digest}")]
	AlreadyApproved { digest: Hash256, signer: Address },
	#[error("Transaction {0} is already committed")]
	AlreadyCommitted(Hash256),
	#[error("Assignment would leave the registry without an admin")]
	LastAdminProtected,
	#[error("Account {0} cannot hold access rights")]
	InvalidAccount(Address),
	#[error("Storage error: {0}")]
	Storage(String),
}

impl From<AccessError> for RegistryError {
	fn from(err: AccessError) -> Self {
		match err {
			AccessError::Unauthorized { caller, required } => {
				RegistryError::Unauthorized { caller, required }
			},
			AccessError::LastAdminProtected => RegistryError::LastAdminProtected,
			AccessError::InvalidAccount(account) => RegistryError::InvalidAccount(account),
			AccessError::Storage(e) => RegistryError::Storage(e),
		}
	}
}

impl From<OrderStateError> for RegistryError {
	fn from(err: OrderStateError) -> Self {
		match err {
			OrderStateError::DuplicateOrder(id) => RegistryError::DuplicateOrder(id),
			OrderStateError::OrderNotFound(id) => RegistryError::OrderNotFound(id),
			OrderStateError::InvalidTransition { from, to } => {
				RegistryError::InvalidTransition { from, to }
			},
			OrderStateError::Storage(e) => RegistryError::Storage(e),
		}
	}
}

impl From<ConsensusError> for RegistryError {
	fn from(err: ConsensusError) -> Self {
		match err {
			ConsensusError::AlreadyApproved { digest, signer } => {
				RegistryError::AlreadyApproved { digest, signer }
			},
			ConsensusError::AlreadyCommitted(digest) => RegistryError::AlreadyCommitted(digest),
			ConsensusError::Storage(e) => RegistryError::Storage(e),
		}
	}
}

/// The registry engine.
#[derive(Clone)]
pub struct RegistryEngine {
	/// Registry configuration.
	pub(crate) config: Config,
	/// Digest algorithm for content hashes.
	pub(crate) commitment: Arc<CommitmentService>,
	/// Role and signer-set tables.
	pub(crate) access: Arc<AccessControl>,
	/// Order records and transitions.
	pub(crate) orders: Arc<OrderStateMachine>,
	/// Digest approvals.
	pub(crate) consensus: Arc<ConsensusService>,
	/// Event bus for registry notifications.
	pub(crate) event_bus: event_bus::EventBus,
	/// Serializes every mutation.
	write_lock: Arc<Mutex<()>>,
}

impl RegistryEngine {
	pub fn new(
		config: Config,
		storage: Arc<StorageService>,
		commitment: Arc<CommitmentService>,
		event_bus: event_bus::EventBus,
	) -> Self {
		let policy = config.consensus.quorum_policy();
		Self {
			config,
			commitment,
			access: Arc::new(AccessControl::new(storage.clone())),
			orders: Arc::new(OrderStateMachine::new(storage.clone())),
			consensus: Arc::new(ConsensusService::new(storage, policy)),
			event_bus,
			write_lock: Arc::new(Mutex::new(())),
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn event_bus(&self) -> &event_bus::EventBus {
		&self.event_bus
	}

	/// Name of the configured digest algorithm.
	pub fn digest_algorithm(&self) -> &'static str {
		self.commitment.algorithm()
	}

	/// Digests raw content with the configured algorithm.
	pub fn digest(&self, content: &[u8]) -> Hash256 {
		self.commitment.digest(content)
	}

	/// Registers a new order in `accepted` bound to `content_hash`.
	#[instrument(skip_all, fields(order_id = %truncate_id(id), caller = %caller))]
	pub async fn issue(
		&self,
		caller: Address,
		id: &str,
		content_hash: Hash256,
	) -> Result<Order, RegistryError> {
		let _guard = self.write_lock.lock().await;

		let table = self.access.table().await?;
		access::require(&table, &caller, Role::Signer)?;

		let order = Order::issued(id.to_string(), content_hash, caller, current_timestamp());
		self.orders.issue(&order).await?;

		tracing::info!(content_hash = %content_hash, "Order issued");
		self.event_bus
			.publish(RegistryEvent::Order(OrderEvent::Issued {
				order: order.clone(),
			}))
			.ok();

		Ok(order)
	}

	/// Like [`issue`](Self::issue), hashing `content` with the configured
	/// algorithm first.
	pub async fn issue_content(
		&self,
		caller: Address,
		id: &str,
		content: &[u8],
	) -> Result<Order, RegistryError> {
		let content_hash = self.digest(content);
		self.issue(caller, id, content_hash).await
	}

	/// Moves an order to `new_status` if the transition table allows it.
	#[instrument(skip_all, fields(order_id = %truncate_id(id), caller = %caller, to = %new_status))]
	pub async fn update_order_status(
		&self,
		caller: Address,
		id: &str,
		new_status: OrderStatus,
	) -> Result<Order, RegistryError> {
		let _guard = self.write_lock.lock().await;

		let table = self.access.table().await?;
		access::require(&table, &caller, Role::Signer)?;

		let (previous, order) = self
			.orders
			.transition_order_status(id, new_status, caller, current_timestamp())
			.await?;

		tracing::info!(from = %previous, "Order status changed");
		self.event_bus
			.publish(RegistryEvent::Order(OrderEvent::StatusChanged {
				order_id: order.id.clone(),
				from: previous,
				to: new_status,
				caller,
			}))
			.ok();

		Ok(order)
	}

	/// Reads an order.
	///
	/// Open to anyone unless `registry.public_reads` is off, in which case the
	/// caller must hold the signer role or better. Anonymous callers are
	/// rejected without consulting the access table.
	pub async fn get_order(
		&self,
		caller: Option<Address>,
		id: &str,
	) -> Result<Order, RegistryError> {
		if !self.config.registry.public_reads {
			let Some(caller) = caller else {
				return Err(RegistryError::Unauthorized {
					caller: Address::ZERO,
					required: Role::Signer,
				});
			};
			let table = self.access.table().await?;
			access::require(&table, &caller, Role::Signer)?;
		}

		Ok(self.orders.get_order(id).await?)
	}

	/// Adds `account` to the signer set and returns the resulting set.
	#[instrument(skip_all, fields(caller = %caller, account = %account))]
	pub async fn set_signer(
		&self,
		caller: Address,
		account: Address,
	) -> Result<Vec<Address>, RegistryError> {
		let _guard = self.write_lock.lock().await;

		let (table, added) = self.access.set_signer(&caller, account).await?;
		if added {
			tracing::info!(signers = table.signers.len(), "Signer added");
			self.event_bus
				.publish(RegistryEvent::Access(AccessEvent::SignerAdded { account, caller }))
				.ok();
		} else {
			tracing::debug!("Account already in signer set");
		}

		Ok(table.signers.into_iter().collect())
	}

	/// Assigns `role` to `account`, replacing any previous role.
	#[instrument(skip_all, fields(caller = %caller, account = %account, role = %role))]
	pub async fn set_role(
		&self,
		caller: Address,
		account: Address,
		role: Role,
	) -> Result<RoleAssignment, RegistryError> {
		let _guard = self.write_lock.lock().await;

		let change = self.access.set_role(&caller, account, role).await?;
		if change.previous != change.role {
			tracing::info!(previous = %change.previous, "Role assigned");
			self.event_bus
				.publish(RegistryEvent::Access(AccessEvent::RoleAssigned {
					account,
					previous: change.previous,
					role,
					caller,
				}))
				.ok();
		}

		Ok(RoleAssignment { account, role })
	}

	/// Records the caller's approval of `digest`.
	///
	/// Only signer-set members may submit. The returned record reflects the
	/// state after this approval.
	#[instrument(skip_all, fields(digest = %truncate_id(&digest.to_string()), caller = %caller))]
	pub async fn submit_transaction(
		&self,
		caller: Address,
		digest: Hash256,
	) -> Result<PendingTransaction, RegistryError> {
		let _guard = self.write_lock.lock().await;

		let table = self.access.table().await?;
		if !table.is_signer(&caller) {
			return Err(RegistryError::Unauthorized {
				caller,
				required: Role::Signer,
			});
		}

		let submission = self
			.consensus
			.submit(caller, digest, table.signers.len(), current_timestamp())
			.await?;
		let transaction = submission.transaction;
		let approvals = transaction.approvals.len();

		let event = match submission.kind {
			SubmissionKind::Proposed => ConsensusEvent::Proposed {
				digest,
				proposer: caller,
				threshold: transaction.threshold,
			},
			SubmissionKind::Approved => ConsensusEvent::Approved {
				digest,
				signer: caller,
				approvals,
				threshold: transaction.threshold,
			},
		};
		tracing::info!(approvals, threshold = transaction.threshold, "Approval recorded");
		self.event_bus.publish(RegistryEvent::Consensus(event)).ok();

		if submission.committed {
			tracing::info!(approvals, "Transaction committed");
			self.event_bus
				.publish(RegistryEvent::Consensus(ConsensusEvent::Committed {
					digest,
					approvals,
				}))
				.ok();
		}

		Ok(transaction)
	}

	/// Reads the consensus record for `digest`, if any.
	pub async fn get_transaction(
		&self,
		digest: &Hash256,
	) -> Result<Option<PendingTransaction>, RegistryError> {
		Ok(self.consensus.get_transaction(digest).await?)
	}

	pub async fn role_of(&self, account: &Address) -> Result<Role, RegistryError> {
		Ok(self.access.table().await?.role_of(account))
	}

	/// Current signer set in ascending address order.
	pub async fn signers(&self) -> Result<Vec<Address>, RegistryError> {
		Ok(self.access.table().await?.signers.into_iter().collect())
	}
}
