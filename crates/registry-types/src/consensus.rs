//! Consensus submission types.
//!
//! A digest proposed for approval is tracked by a [`PendingTransaction`]
//! record whose quorum threshold is frozen when the record is created.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::{Address, Hash256};

/// How the approval threshold for a new digest is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuorumPolicy {
	/// A constant number of approvals.
	Fixed(usize),
	/// A simple majority of the signer set at proposal time.
	Majority,
}

impl QuorumPolicy {
	/// Computes the threshold for a digest proposed while the signer set
	/// holds `signer_count` accounts. Never returns less than one.
	pub fn threshold_for(&self, signer_count: usize) -> usize {
		match self {
			QuorumPolicy::Fixed(threshold) => (*threshold).max(1),
			QuorumPolicy::Majority => signer_count / 2 + 1,
		}
	}

	/// Whether a signer set of `signer_count` accounts can ever commit.
	pub fn is_reachable(&self, signer_count: usize) -> bool {
		self.threshold_for(signer_count) <= signer_count
	}
}

impl fmt::Display for QuorumPolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			QuorumPolicy::Fixed(threshold) => write!(f, "fixed({})", threshold),
			QuorumPolicy::Majority => write!(f, "majority"),
		}
	}
}

/// Lifecycle of a proposed digest. There is no path back from `Committed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
	Pending,
	Committed,
}

/// Approval record for a proposed digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransaction {
	/// The digest being approved.
	pub digest: Hash256,
	/// Signer that first submitted the digest.
	pub proposer: Address,
	/// Distinct signers that approved the digest.
	pub approvals: BTreeSet<Address>,
	/// Approvals required to commit, frozen at creation.
	pub threshold: usize,
	pub state: TransactionState,
	pub created_at: u64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub committed_at: Option<u64>,
}

impl PendingTransaction {
	/// Creates a record carrying the proposer's approval.
	pub fn propose(digest: Hash256, proposer: Address, threshold: usize, now: u64) -> Self {
		Self {
			digest,
			proposer,
			approvals: BTreeSet::from([proposer]),
			threshold,
			state: TransactionState::Pending,
			created_at: now,
			committed_at: None,
		}
	}

	/// Whether the approvals collected so far satisfy the frozen threshold.
	pub fn quorum_reached(&self) -> bool {
		self.approvals.len() >= self.threshold
	}

	pub fn is_committed(&self) -> bool {
		self.state == TransactionState::Committed
	}
}
