use std::{
	future::Future,
	pin::Pin,
	rc::Rc,
	task::{Context, Poll, ready},
};

use frame_message::{Envelope, Event, MessageId, Response, Value};
use serde::de::DeserializeOwned;
use tokio::sync::oneshot;

use super::{Bridge, State, WeakBridge};
use crate::{Action, Error, Result, SdkError, Target, Transport, TransportMode, Waiter};

/// Where an outgoing envelope ends up.
enum Delivery<W> {
	Post(W, String),
	Native,
	Queued,
}

impl<W: Clone + PartialEq> State<W> {
	// Queues the envelope when the target's window or origin is still unknown.
	fn route(&mut self, target: Target, envelope: &Envelope, target_origin: Option<&str>) -> Delivery<W> {
		if target == Target::Parent && self.mode == TransportMode::Frameless {
			return Delivery::Native;
		}

		let window = self.relationships.window(target).cloned();
		let origin = target_origin.or(self.relationships.origin(target)).map(ToOwned::to_owned);

		match (window, origin) {
			(Some(window), Some(origin)) => Delivery::Post(window, origin),
			_ => {
				self.queues.push(target, envelope.clone());
				Delivery::Queued
			}
		}
	}
}

impl<T: Transport> Bridge<T> {
	/// Send a request to the parent without waiting for a response.
	pub fn send_message_to_parent<A: Into<Action>>(&self, action: A, args: Vec<Value>) -> Result<MessageId> {
		self.ensure_initialize_called()?;
		Ok(self.send_request(action.into(), args, None, None))
	}

	/// Send a request to the parent, invoking `callback` with each response.
	///
	/// The callback is called once per partial response and a final time with `partial = false`.
	pub fn send_message_to_parent_with_callback<A, F>(
		&self,
		action: A,
		args: Vec<Value>,
		callback: F,
	) -> Result<MessageId>
	where
		A: Into<Action>,
		F: Fn(Vec<Value>, bool) + 'static,
	{
		self.ensure_initialize_called()?;
		let waiter = Waiter::Callback(Rc::new(callback));
		Ok(self.send_request(action.into(), args, Some(waiter), None))
	}

	/// Send a request to the parent and wait for the first response.
	///
	/// There's no timeout; drop the returned future to stop waiting.
	pub fn send_message_to_parent_async<A>(&self, action: A, args: Vec<Value>) -> Result<PendingResponse<T>>
	where
		A: Into<Action>,
	{
		self.ensure_initialize_called()?;

		let (tx, rx) = oneshot::channel();
		let id = self.send_request(action.into(), args, Some(Waiter::Promise(tx)), None);

		Ok(PendingResponse {
			id,
			rx,
			generation: self.inner.state.borrow().generation,
			bridge: self.downgrade(),
			done: false,
		})
	}

	/// Stop waiting for the response to a request, returning true if anything was waiting.
	pub fn cancel(&self, id: MessageId) -> bool {
		self.inner.state.borrow_mut().correlator.cancel(id)
	}

	/// Push an action to the child window, queued until the child's origin is known.
	pub fn send_message_event_to_child<A: Into<Action>>(&self, action: A, args: Vec<Value>) {
		let action = action.into();
		let envelope: Envelope = Event::new(action.as_str(), args).into();

		let delivery = self.inner.state.borrow_mut().route(Target::Child, &envelope, None);
		tracing::debug!(%action, "sending event to child");

		self.deliver(&envelope, delivery);
	}

	// Register the waiter before posting, so even a synchronous reply finds it.
	pub(super) fn send_request(
		&self,
		action: Action,
		args: Vec<Value>,
		waiter: Option<Waiter>,
		target_origin: Option<&str>,
	) -> MessageId {
		let (id, envelope, delivery) = {
			let mut state = self.inner.state.borrow_mut();
			let request = state.correlator.request(action.as_str(), args);
			let id = request.id;
			if let Some(waiter) = waiter {
				state.correlator.wait(id, waiter);
			}

			let envelope = Envelope::from(request);
			let delivery = state.route(Target::Parent, &envelope, target_origin);
			(id, envelope, delivery)
		};

		tracing::debug!(%id, %action, "sending message to parent");

		self.deliver(&envelope, delivery);
		id
	}

	/// Reply to a child request; dropped if the child's origin is unknown.
	pub(super) fn respond_to_child(&self, id: MessageId, args: Vec<Value>, partial: Option<bool>) {
		let endpoint = self.endpoint(Target::Child);
		let Some((window, origin)) = endpoint else {
			tracing::debug!(%id, "dropping response for unknown child");
			return;
		};

		let response = Response {
			id,
			args,
			is_partial_response: partial,
		};

		tracing::debug!(%id, "sending response to child");
		self.deliver(&response.into(), Delivery::Post(window, origin));
	}

	/// Post everything queued for the target, oldest first, once its origin is known.
	pub(super) fn flush(&self, target: Target) {
		let (window, origin, queued) = {
			let mut state = self.inner.state.borrow_mut();
			if state.queues.is_empty(target) {
				return;
			}

			let endpoint = state.relationships.endpoint(target).map(|(w, o)| (w.clone(), o.to_string()));
			let Some((window, origin)) = endpoint else {
				return;
			};

			(window, origin, state.queues.take(target))
		};

		for envelope in queued {
			tracing::debug!(id = ?envelope.id(), %target, "flushing queued message");
			self.inner.transport.post(&window, &envelope, &origin);
		}

		self.inner.drained.send_replace(());
	}

	/// Resolves once nothing is queued for the target, ex. before navigating away from a popup.
	///
	/// Also resolves if the queue is discarded by [Bridge::uninitialize] or the bridge is dropped.
	pub fn wait_for_message_queue(&self, target: Target) -> impl Future<Output = ()> + use<T> {
		// Subscribed before checking, so a flush in between isn't missed.
		let mut drained = self.inner.drained.subscribe();
		let bridge = self.downgrade();

		async move {
			loop {
				match bridge.upgrade() {
					Some(bridge) if bridge.pending_messages(target) > 0 => {}
					_ => return,
				}

				if drained.changed().await.is_err() {
					return;
				}
			}
		}
	}

	fn endpoint(&self, target: Target) -> Option<(T::Window, String)> {
		let state = self.inner.state.borrow();
		state
			.relationships
			.endpoint(target)
			.map(|(window, origin)| (window.clone(), origin.to_string()))
	}

	fn deliver(&self, envelope: &Envelope, delivery: Delivery<T::Window>) {
		let transport = &self.inner.transport;

		match delivery {
			Delivery::Post(window, origin) => transport.post(&window, envelope, &origin),
			Delivery::Native if !transport.has_native_bridge() => {
				tracing::warn!(id = ?envelope.id(), "no native bridge to send to");
			}
			Delivery::Native => match envelope.to_json() {
				Ok(json) => transport.post_native(&json),
				Err(err) => tracing::warn!(%err, "failed to encode message"),
			},
			Delivery::Queued => tracing::debug!(id = ?envelope.id(), "queued until the origin is known"),
		}
	}

	/// Send a request and decode the first response argument.
	pub async fn send_and_unwrap<A, D>(&self, action: A, args: Vec<Value>) -> Result<D>
	where
		A: Into<Action>,
		D: DeserializeOwned,
	{
		let args = self.send_message_to_parent_async(action, args)?.await?;
		decode(args.into_iter().next())
	}

	/// Send a request answered with `[status, reason]`, failing with the reason when the status isn't true.
	pub async fn send_and_handle_status_and_reason<A: Into<Action>>(&self, action: A, args: Vec<Value>) -> Result<()> {
		let args = self.send_message_to_parent_async(action, args)?.await?;
		status_and_reason(&args, None)
	}

	/// Like [Bridge::send_and_handle_status_and_reason], using `default_error` when the host gives no reason.
	pub async fn send_and_handle_status_and_reason_with_default_error<A: Into<Action>>(
		&self,
		action: A,
		default_error: &str,
		args: Vec<Value>,
	) -> Result<()> {
		let args = self.send_message_to_parent_async(action, args)?.await?;
		status_and_reason(&args, Some(default_error))
	}

	/// Send a request answered with `[error, result]`, failing with the [SdkError] if one is present.
	pub async fn send_and_handle_sdk_error<A, D>(&self, action: A, args: Vec<Value>) -> Result<D>
	where
		A: Into<Action>,
		D: DeserializeOwned,
	{
		let args = self.send_message_to_parent_async(action, args)?.await?;
		let mut args = args.into_iter();

		match args.next() {
			None | Some(Value::Null) => {}
			Some(err) => {
				let err: SdkError = serde_json::from_value(err).map_err(|err| Error::InvalidResponse(err.to_string()))?;
				return Err(Error::Sdk(err));
			}
		}

		decode(args.next())
	}
}

fn decode<D: DeserializeOwned>(value: Option<Value>) -> Result<D> {
	serde_json::from_value(value.unwrap_or(Value::Null)).map_err(|err| Error::InvalidResponse(err.to_string()))
}

fn status_and_reason(args: &[Value], default_error: Option<&str>) -> Result<()> {
	if args.first().and_then(Value::as_bool).unwrap_or(false) {
		return Ok(());
	}

	let reason = args
		.get(1)
		.and_then(Value::as_str)
		.or(default_error)
		.unwrap_or("request failed");

	Err(Error::Host(reason.to_string()))
}

/// The first response to a request sent with [Bridge::send_message_to_parent_async].
///
/// Resolves to [Error::Cancelled] if the bridge is uninitialized first.
/// Dropping it before it resolves unregisters the request.
pub struct PendingResponse<T: Transport> {
	id: MessageId,
	rx: oneshot::Receiver<Vec<Value>>,
	generation: u64,
	bridge: WeakBridge<T>,
	done: bool,
}

impl<T: Transport> PendingResponse<T> {
	pub fn id(&self) -> MessageId {
		self.id
	}
}

impl<T: Transport> Future for PendingResponse<T> {
	type Output = Result<Vec<Value>>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let res = ready!(Pin::new(&mut self.rx).poll(cx));
		self.done = true;
		Poll::Ready(res.map_err(|_| Error::Cancelled))
	}
}

impl<T: Transport> Drop for PendingResponse<T> {
	fn drop(&mut self) {
		if self.done {
			return;
		}

		let Some(bridge) = self.bridge.upgrade() else {
			return;
		};

		// Skipped if the bridge is mid-update; the sender is then dropped with the rest of the state.
		if let Ok(mut state) = bridge.inner.state.try_borrow_mut() {
			if state.generation == self.generation {
				state.correlator.cancel(self.id);
			}
		}
	}
}

impl<T: Transport> std::fmt::Debug for PendingResponse<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PendingResponse").field("id", &self.id).finish()
	}
}

