use std::{future::Future, rc::Rc};

use frame_message::Value;
use tokio::sync::watch;

use super::Bridge;
use crate::{
	Action, Config, Error, FrameContext, HostClientType, InitializeResponse, Result, Runtime, Transport, TransportMode,
	Waiter, callback, compare_sdk_versions,
};

/// The only message allowed to go out before the parent's origin is known.
const WILDCARD_ORIGIN: &str = "*";

type Outcome = Option<Result<InitializeResponse>>;

#[derive(Default)]
pub(super) struct Initialization {
	// Set as soon as initialize is called.
	called: bool,

	// Set once the host answered the handshake.
	response: Option<InitializeResponse>,

	// Shared by every concurrent initialize call.
	outcome: Option<watch::Sender<Outcome>>,
}

impl<T: Transport> Bridge<T> {
	/// Connect to the host and perform the `initialize` handshake.
	///
	/// The handshake starts immediately, not when the future is first polled.
	/// Calling this again, before or after the handshake completes, joins the same handshake.
	/// Additional valid origins from every call are merged.
	pub fn initialize(&self, config: &Config) -> impl Future<Output = Result<InitializeResponse>> + use<T> {
		let mut outcome = self.start(config);

		async move {
			loop {
				if let Some(result) = outcome.borrow_and_update().clone() {
					return result;
				}

				if outcome.changed().await.is_err() {
					return Err(Error::Cancelled);
				}
			}
		}
	}

	fn start(&self, config: &Config) -> watch::Receiver<Outcome> {
		let outcome = {
			let mut state = self.inner.state.borrow_mut();
			state.origins.extend(&config.valid_origins);

			if let Some(outcome) = &state.init.outcome {
				return outcome.subscribe();
			}

			let (tx, rx) = watch::channel(None);
			state.init.called = true;
			state.init.outcome = Some(tx);
			rx
		};

		tracing::debug!(version = %config.sdk_version, "initializing");
		self.install_lifecycle_handlers();

		if let Err(err) = self.connect(config) {
			self.finish(Err(err));
		}

		outcome
	}

	fn connect(&self, config: &Config) -> Result<()> {
		let transport = &self.inner.transport;
		let parent = transport.parent();

		// Apps that open popups without being framed still want to hear from them.
		if parent.is_some() || !config.valid_origins.is_empty() {
			let bridge = self.downgrade();
			transport.listen(Rc::new(move |inbound| {
				if let Some(bridge) = bridge.upgrade() {
					bridge.process_message(inbound);
				}
			}));
		}

		let mode = match parent {
			Some(_) => TransportMode::Framed,
			None if transport.has_native_bridge() => {
				let bridge = self.downgrade();
				transport.listen_native(Rc::new(move |data| {
					if let Some(bridge) = bridge.upgrade() {
						bridge.process_native_message(data);
					}
				}));
				TransportMode::Frameless
			}
			None => return Err(Error::NoParentWindow),
		};

		tracing::debug!(%mode, "connected");

		{
			let mut state = self.inner.state.borrow_mut();
			state.mode = mode;
			if parent.is_some() {
				state.relationships.set_parent(parent);
			}
		}

		let bridge = self.downgrade();
		let handshake = callback(move |args, _| {
			if let Some(bridge) = bridge.upgrade() {
				bridge.finish(InitializeResponse::from_args(&args));
			}
		});

		let args = vec![Value::from(config.sdk_version.clone()), Value::from(config.runtime_api_version)];
		self.send_request(Action::Initialize, args, Some(Waiter::Callback(handshake)), Some(WILDCARD_ORIGIN));

		Ok(())
	}

	fn finish(&self, result: Result<InitializeResponse>) {
		let mut state = self.inner.state.borrow_mut();

		match &result {
			Ok(response) => {
				tracing::info!(context = %response.context, client = %response.client_type, "initialized");
				state.init.response = Some(response.clone());
			}
			Err(err) => tracing::warn!(%err, "initialization failed"),
		}

		if let Some(outcome) = &state.init.outcome {
			outcome.send_replace(Some(result));
		}
	}

	/// Tear down everything initialization set up, so it can run again.
	///
	/// Listeners are detached, every handler and queued message is dropped, ids restart at 0,
	/// and anything still waiting on a response or the handshake resolves to [Error::Cancelled].
	pub fn uninitialize(&self) {
		self.inner.transport.unlisten();

		let previous = {
			let mut state = self.inner.state.borrow_mut();
			let generation = state.generation + 1;
			let previous = std::mem::take(&mut *state);
			state.generation = generation;
			previous
		};

		let handlers = std::mem::take(&mut *self.inner.handlers.borrow_mut());
		let lifecycle = std::mem::take(&mut *self.inner.lifecycle.borrow_mut());

		tracing::debug!("uninitialized");
		self.inner.drained.send_replace(());

		// Dropped last, outside any borrow, in case a waiter's drop calls back in.
		drop((previous, handlers, lifecycle));
	}

	/// Fails unless [Bridge::initialize] has been called, even if the handshake hasn't completed.
	pub fn ensure_initialize_called(&self) -> Result<()> {
		match self.inner.state.borrow().init.called {
			true => Ok(()),
			false => Err(Error::NotInitialized),
		}
	}

	/// Fails unless the handshake completed and, if any contexts are given, the frame context is one of them.
	pub fn ensure_initialized(&self, contexts: &[FrameContext]) -> Result<()> {
		let state = self.inner.state.borrow();
		let Some(response) = &state.init.response else {
			return Err(Error::NotInitialized);
		};

		if contexts.is_empty() || contexts.contains(&response.context) {
			return Ok(());
		}

		Err(Error::NotAllowedInContext {
			expected: contexts.to_vec(),
			current: Some(response.context.clone()),
		})
	}

	pub fn is_initialize_called(&self) -> bool {
		self.inner.state.borrow().init.called
	}

	pub fn is_initialized(&self) -> bool {
		self.inner.state.borrow().init.response.is_some()
	}

	/// The negotiated handshake outcome, once completed.
	pub fn initialize_response(&self) -> Option<InitializeResponse> {
		self.inner.state.borrow().init.response.clone()
	}

	pub fn frame_context(&self) -> Option<FrameContext> {
		self.inner.state.borrow().init.response.as_ref().map(|r| r.context.clone())
	}

	pub fn host_client_type(&self) -> Option<HostClientType> {
		self.inner.state.borrow().init.response.as_ref().map(|r| r.client_type.clone())
	}

	pub fn runtime(&self) -> Option<Runtime> {
		self.inner.state.borrow().init.response.as_ref().map(|r| r.runtime.clone())
	}

	pub fn is_host_client_mobile(&self) -> bool {
		self.host_client_type().is_some_and(|client| client.is_mobile())
	}

	/// Whether the host reported an SDK version at least `required`; false before the handshake completes.
	pub fn is_host_sdk_version_at_least(&self, required: &str) -> bool {
		let state = self.inner.state.borrow();
		let Some(response) = &state.init.response else {
			return false;
		};

		compare_sdk_versions(&response.client_supported_sdk_version, required).is_some_and(|ord| ord.is_ge())
	}
}
