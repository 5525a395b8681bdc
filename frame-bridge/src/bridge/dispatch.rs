use std::panic::{self, AssertUnwindSafe};

use frame_message::{Payload, Request, Response, Value};

use super::Bridge;
use crate::{Action, Dispatched, Handler, Inbound, Target, Transport, Waiter, callback};

impl<T: Transport> Bridge<T> {
	/// Handle a message delivered to the current window.
	///
	/// Messages without a payload or source, from the current window itself, or from an untrusted origin are ignored.
	/// Accepted messages update the parent/child relationships and flush anything queued for them.
	pub fn process_message(&self, inbound: Inbound<T::Window>) {
		let Inbound { source, origin, data } = inbound;
		if !data.is_object() {
			tracing::trace!("ignoring message without a payload");
			return;
		}

		let (Some(source), Some(origin)) = (source, origin) else {
			tracing::trace!("ignoring message without a source");
			return;
		};

		if !self.should_process(&source, &origin) {
			tracing::trace!(%origin, "ignoring message from untrusted origin");
			return;
		}

		self.update_relationships(source.clone(), origin);

		let payload = match Payload::from_value(data) {
			Ok(payload) => payload,
			Err(err) => {
				tracing::debug!(%err, "ignoring invalid message");
				return;
			}
		};

		let target = self.inner.state.borrow().relationships.classify(&source);
		match target {
			Some(Target::Parent) => self.handle_parent_message(payload),
			Some(Target::Child) => self.handle_child_message(payload),
			None => tracing::debug!(?source, "ignoring message from untracked window"),
		}
	}

	/// Handle a message from the frameless host's native bridge, which always acts as the parent.
	pub fn process_native_message(&self, data: Value) {
		match Payload::from_value(data) {
			Ok(payload) => self.handle_parent_message(payload),
			Err(err) => tracing::debug!(%err, "ignoring invalid native message"),
		}
	}

	fn should_process(&self, source: &T::Window, origin: &str) -> bool {
		let transport = &self.inner.transport;
		if *source == transport.current() {
			return false;
		}

		if transport.origin().as_deref() == Some(origin) {
			return true;
		}

		self.inner.state.borrow().origins.is_trusted(origin)
	}

	fn update_relationships(&self, source: T::Window, origin: String) {
		{
			let mut state = self.inner.state.borrow_mut();
			let mode = state.mode;
			let transport = &self.inner.transport;
			state.relationships.update(source, origin, mode, |window| transport.is_closed(window));
		}

		self.flush(Target::Parent);
		self.flush(Target::Child);
	}

	fn handle_parent_message(&self, payload: Payload) {
		if let Some(id) = payload.id {
			let response = Response::new(id, payload.args).partial(payload.is_partial_response);
			self.resolve(response);
			return;
		}

		if payload.has_numeric_id {
			tracing::debug!("ignoring response with an invalid id");
			return;
		}

		let Some(func) = payload.func else {
			tracing::debug!("ignoring message without an id or func");
			return;
		};

		tracing::debug!(action = %func, "received action from parent");

		// Anything we don't handle ourselves is passed down to the child.
		let relay = self.window(Target::Child).is_some().then(|| payload.args.clone());
		if let (Dispatched::NotFound, Some(args)) = (self.call_handler(&func, payload.args), relay) {
			tracing::debug!(action = %func, "relaying action to child");
			self.send_message_event_to_child(func, args);
		}
	}

	fn resolve(&self, response: Response) {
		let id = response.id;
		let waiter = self.inner.state.borrow_mut().correlator.resolve(&response);

		match waiter {
			Some(Waiter::Callback(callback)) => {
				tracing::debug!(%id, partial = response.is_partial(), "invoking response callback");
				let partial = response.is_partial();
				if panic::catch_unwind(AssertUnwindSafe(|| callback(response.args, partial))).is_err() {
					tracing::warn!(%id, "response callback panicked");
				}
			}
			Some(Waiter::Promise(resolve)) => {
				tracing::debug!(%id, "resolving pending response");
				// The receiver may have been dropped, that's fine.
				let _ = resolve.send(response.args);
			}
			None => tracing::debug!(%id, "no callback registered for response"),
		}
	}

	fn handle_child_message(&self, payload: Payload) {
		let request = match payload.into_request() {
			Ok(request) => request,
			Err(err) => {
				tracing::debug!(%err, "ignoring invalid child message");
				return;
			}
		};

		tracing::debug!(id = %request.id, action = %request.func, "received request from child");

		match self.call_handler(&request.func, request.args.clone()) {
			Dispatched::Handled(Some(result)) => {
				let args = match result {
					Value::Array(args) => args,
					result => vec![result],
				};
				self.respond_to_child(request.id, args, None);
			}
			Dispatched::Handled(None) | Dispatched::NotFound => self.relay_to_parent(request),
			Dispatched::Panicked => {}
		}
	}

	// Forward the child's request up, sending every response back down under the child's id.
	fn relay_to_parent(&self, request: Request) {
		let child_id = request.id;
		let bridge = self.downgrade();

		let relay = callback(move |args, partial| {
			let Some(bridge) = bridge.upgrade() else {
				return;
			};
			bridge.respond_to_child(child_id, args, partial.then_some(true));
		});

		let id = self.send_request(Action::from(request.func), request.args, Some(Waiter::Callback(relay)), None);
		tracing::debug!(%child_id, %id, "relayed child request to parent");
	}

	/// Register a handler for an action, or remove it when `handler` is None.
	///
	/// When `notify` is set, the parent is told with `registerHandler [name, ...extra]`.
	pub fn register_handler<A>(&self, name: A, handler: Option<Handler>, notify: bool, extra: Vec<Value>)
	where
		A: Into<Action>,
	{
		let action = name.into();

		let Some(handler) = handler else {
			self.remove_handler(action);
			return;
		};

		self.inner.handlers.borrow_mut().insert(action.clone(), handler);

		if notify {
			let mut args = vec![Value::String(action.to_string())];
			args.extend(extra);
			self.send_request(Action::RegisterHandler, args, None, None);
		}
	}

	pub fn remove_handler<A: Into<Action>>(&self, name: A) {
		self.inner.handlers.borrow_mut().remove(&name.into());
	}

	pub fn has_handler<A: Into<Action>>(&self, name: A) -> bool {
		self.inner.handlers.borrow().contains(&name.into())
	}

	/// Run the handler registered for an action.
	///
	/// A panicking handler is contained and reported as [Dispatched::Panicked].
	pub fn call_handler(&self, name: &str, args: Vec<Value>) -> Dispatched {
		let handler = self.inner.handlers.borrow().get(&Action::from(name));
		let Some(handler) = handler else {
			tracing::debug!(action = name, "no handler registered");
			return Dispatched::NotFound;
		};

		match panic::catch_unwind(AssertUnwindSafe(|| handler(args))) {
			Ok(result) => Dispatched::Handled(result),
			Err(_) => {
				tracing::warn!(action = name, "handler panicked");
				Dispatched::Panicked
			}
		}
	}
}
