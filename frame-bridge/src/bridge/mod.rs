mod dispatch;
mod init;
mod lifecycle;
mod send;


pub use lifecycle::*;
pub use send::*;

use std::{
	cell::RefCell,
	fmt,
	rc::{Rc, Weak},
};

use frame_message::MessageId;
use tokio::sync::watch;

use crate::{Correlator, Handlers, MessageQueues, OriginValidator, Relationships, Target, Transport, TransportMode};
use init::Initialization;
use lifecycle::Lifecycle;

/// Everything one window knows about its conversations, reset by [Bridge::uninitialize].
struct State<W> {
	mode: TransportMode,
	relationships: Relationships<W>,
	queues: MessageQueues,
	correlator: Correlator,
	origins: OriginValidator,
	init: Initialization,

	// Bumped on every reset so stale handles can't touch reused ids.
	generation: u64,
}

impl<W> Default for State<W> {
	fn default() -> Self {
		Self {
			mode: TransportMode::default(),
			relationships: Relationships::default(),
			queues: MessageQueues::default(),
			correlator: Correlator::default(),
			origins: OriginValidator::default(),
			init: Initialization::default(),
			generation: 0,
		}
	}
}

struct Inner<T: Transport> {
	transport: T,
	state: RefCell<State<T::Window>>,
	handlers: RefCell<Handlers>,
	lifecycle: RefCell<Lifecycle>,

	// Signalled whenever a queue is emptied.
	drained: watch::Sender<()>,
}

/// The communication layer between this window, its host (parent) and any window it opened (child).
///
/// A bridge is single-threaded and cheap to clone; clones share the same state.
/// No borrow of that state is held while user code runs,
/// so handlers and callbacks may freely call back into the bridge.
pub struct Bridge<T: Transport> {
	inner: Rc<Inner<T>>,
}

impl<T: Transport> Bridge<T> {
	pub fn new(transport: T) -> Self {
		Self {
			inner: Rc::new(Inner {
				transport,
				state: RefCell::new(State::default()),
				handlers: RefCell::new(Handlers::new()),
				lifecycle: RefCell::new(Lifecycle::default()),
				drained: watch::channel(()).0,
			}),
		}
	}

	fn downgrade(&self) -> WeakBridge<T> {
		WeakBridge(Rc::downgrade(&self.inner))
	}

	pub fn transport(&self) -> &T {
		&self.inner.transport
	}

	pub fn transport_mode(&self) -> TransportMode {
		self.inner.state.borrow().mode
	}

	/// The tracked parent or child window.
	pub fn window(&self, target: Target) -> Option<T::Window> {
		self.inner.state.borrow().relationships.window(target).cloned()
	}

	/// The validated origin of the tracked parent or child window.
	pub fn origin(&self, target: Target) -> Option<String> {
		self.inner.state.borrow().relationships.origin(target).map(ToOwned::to_owned)
	}

	/// The number of envelopes queued until the target's origin is known.
	pub fn pending_messages(&self, target: Target) -> usize {
		self.inner.state.borrow().queues.len(target)
	}

	/// The number of requests still waiting for a response.
	pub fn pending_responses(&self) -> usize {
		self.inner.state.borrow().correlator.pending()
	}

	pub fn is_pending(&self, id: MessageId) -> bool {
		self.inner.state.borrow().correlator.is_pending(id)
	}

	/// Extra trusted origins supplied during initialization.
	pub fn additional_origins(&self) -> Vec<String> {
		self.inner.state.borrow().origins.additional().to_vec()
	}
}

impl<T: Transport> Clone for Bridge<T> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T: Transport> fmt::Debug for Bridge<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.inner.state.borrow();
		f.debug_struct("Bridge")
			.field("mode", &state.mode)
			.field("relationships", &state.relationships)
			.field("correlator", &state.correlator)
			.field("handlers", &self.inner.handlers.borrow())
			.finish()
	}
}

// Held by closures stored inside the bridge, which would otherwise keep it alive forever.
struct WeakBridge<T: Transport>(Weak<Inner<T>>);

impl<T: Transport> WeakBridge<T> {
	fn upgrade(&self) -> Option<Bridge<T>> {
		self.0.upgrade().map(|inner| Bridge { inner })
	}
}

impl<T: Transport> Clone for WeakBridge<T> {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}
