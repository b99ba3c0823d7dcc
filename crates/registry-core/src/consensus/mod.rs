//! Multi-party approval of opaque digests.
//!
//! The first submission of a digest creates a pending record, counts the
//! proposer as its first approval and freezes the threshold from the quorum
//! policy and the signer-set size at that moment. Later submissions add one
//! approval each. The record flips to committed once approvals reach the
//! threshold, and from then on it only rejects further approvals.

use registry_storage::StorageService;
use registry_types::{
	Address, Hash256, PendingTransaction, QuorumPolicy, StorageKey, TransactionState,
};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsensusError {
	#[error("Signer {signer} already approved {digest}")]
	AlreadyApproved { digest: Hash256, signer: Address },
	#[error("Transaction {0} is already committed")]
	AlreadyCommitted(Hash256),
	#[error("Storage error: {0}")]
	Storage(String),
}

/// What a single submission did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
	/// The digest was new; the submitter is the proposer.
	Proposed,
	/// An approval was added to an existing pending record.
	Approved,
}

/// Result of a submission.
#[derive(Debug, Clone)]
pub struct Submission {
	pub kind: SubmissionKind,
	/// Whether this submission moved the record to committed.
	pub committed: bool,
	pub transaction: PendingTransaction,
}

fn storage_id(digest: &Hash256) -> String {
	hex::encode(digest)
}

pub struct ConsensusService {
	storage: Arc<StorageService>,
	policy: QuorumPolicy,
}

impl ConsensusService {
	pub fn new(storage: Arc<StorageService>, policy: QuorumPolicy) -> Self {
		Self { storage, policy }
	}

	pub fn policy(&self) -> QuorumPolicy {
		self.policy
	}

	/// Records an approval of `digest` by `signer`.
	///
	/// Signer-set membership is checked by the caller; `signer_count` is the
	/// current size of that set and only matters when the digest is new.
	pub async fn submit(
		&self,
		signer: Address,
		digest: Hash256,
		signer_count: usize,
		now: u64,
	) -> Result<Submission, ConsensusError> {
		let (kind, mut transaction) = match self.get_transaction(&digest).await? {
			None => {
				let threshold = self.policy.threshold_for(signer_count);
				(
					SubmissionKind::Proposed,
					PendingTransaction::propose(digest, signer, threshold, now),
				)
			},
			Some(existing) if existing.is_committed() => {
				return Err(ConsensusError::AlreadyCommitted(digest));
			},
			Some(existing) if existing.approvals.contains(&signer) => {
				return Err(ConsensusError::AlreadyApproved { digest, signer });
			},
			Some(mut existing) => {
				existing.approvals.insert(signer);
				(SubmissionKind::Approved, existing)
			},
		};

		let committed = transaction.quorum_reached();
		if committed {
			transaction.state = TransactionState::Committed;
			transaction.committed_at = Some(now);
		}

		self.storage
			.store(
				StorageKey::Transactions.as_str(),
				&storage_id(&digest),
				&transaction,
			)
			.await
			.map_err(|e| ConsensusError::Storage(e.to_string()))?;

		Ok(Submission {
			kind,
			committed,
			transaction,
		})
	}

	pub async fn get_transaction(
		&self,
		digest: &Hash256,
	) -> Result<Option<PendingTransaction>, ConsensusError> {
		self.storage
			.retrieve_optional(StorageKey::Transactions.as_str(), &storage_id(digest))
			.await
			.map_err(|e| ConsensusError::Storage(e.to_string()))
	}
}
