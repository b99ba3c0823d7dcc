//! Broadcast channel for registry events.
//!
//! Every subscriber sees every event published after it subscribed. A slow
//! subscriber that falls more than `capacity` events behind receives a
//! `Lagged` error and skips ahead; publishers never block.

use registry_types::RegistryEvent;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<RegistryEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event, returning the number of subscribers reached.
	///
	/// Fails only when nobody is subscribed, which callers usually ignore.
	pub fn publish(
		&self,
		event: RegistryEvent,
	) -> Result<usize, broadcast::error::SendError<RegistryEvent>> {
		self.sender.send(event)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use registry_types::{Address, ConsensusEvent, Hash256};

	#[tokio::test]
	async fn test_publish_reaches_subscribers() {
		let bus = EventBus::new(8);
		let mut first = bus.subscribe();
		let mut second = bus.subscribe();

		let delivered = bus
			.publish(RegistryEvent::Consensus(ConsensusEvent::Committed {
				digest: Hash256::ZERO,
				approvals: 2,
			}))
			.unwrap();
		assert_eq!(delivered, 2);

		for receiver in [&mut first, &mut second] {
			match receiver.recv().await.unwrap() {
				RegistryEvent::Consensus(ConsensusEvent::Committed { approvals, .. }) => {
					assert_eq!(approvals, 2)
				},
				other => panic!("unexpected event {:?}", other),
			}
		}
	}

	#[test]
	fn test_publish_without_subscribers() {
		let bus = EventBus::new(8);
		let result = bus.publish(RegistryEvent::Consensus(ConsensusEvent::Proposed {
			digest: Hash256::ZERO,
			proposer: Address::ZERO,
			threshold: 1,
		}));
		assert!(result.is_err());
	}
}
