use std::collections::VecDeque;

use frame_message::Envelope;

use crate::Target;

/// Envelopes waiting for their target's origin to become known, in send order.
#[derive(Debug, Default)]
pub struct MessageQueues {
	parent: VecDeque<Envelope>,
	child: VecDeque<Envelope>,
}

impl MessageQueues {
	pub fn new() -> Self {
		Self::default()
	}

	fn queue(&mut self, target: Target) -> &mut VecDeque<Envelope> {
		match target {
			Target::Parent => &mut self.parent,
			Target::Child => &mut self.child,
		}
	}

	pub fn push(&mut self, target: Target, envelope: Envelope) {
		self.queue(target).push_back(envelope);
	}

	/// Remove every queued envelope for the target, oldest first.
	pub fn take(&mut self, target: Target) -> Vec<Envelope> {
		self.queue(target).drain(..).collect()
	}

	pub fn len(&self, target: Target) -> usize {
		match target {
			Target::Parent => self.parent.len(),
			Target::Child => self.child.len(),
		}
	}

	pub fn is_empty(&self, target: Target) -> bool {
		self.len(target) == 0
	}
}

#[cfg(test)]
mod test {
	use frame_message::{Event, MessageId, Request};

	use super::*;

	#[test]
	fn fifo_per_target() {
		let mut queues = MessageQueues::new();
		for id in 0..3 {
			queues.push(Target::Parent, Request::new(MessageId(id), "a", vec![]).into());
		}
		queues.push(Target::Child, Event::new("themeChange", vec![]).into());

		assert_eq!(queues.len(Target::Parent), 3);
		assert_eq!(queues.len(Target::Child), 1);

		let ids: Vec<_> = queues.take(Target::Parent).iter().filter_map(Envelope::id).collect();
		assert_eq!(ids, [MessageId(0), MessageId(1), MessageId(2)]);
		assert!(queues.is_empty(Target::Parent));
		assert!(queues.take(Target::Parent).is_empty());
		assert_eq!(queues.len(Target::Child), 1);
	}
}
