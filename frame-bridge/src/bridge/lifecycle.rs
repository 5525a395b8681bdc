use std::{fmt, rc::Rc};

use frame_message::Value;
use serde::{Deserialize, Serialize};

use super::Bridge;
use crate::{Action, Result, Target, Transport, handler};

/// Sent by the host when the app is about to be shown again from the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadContext {
	pub entity_id: String,
	pub content_url: String,
}

/// Handed to a before-unload handler; call [ReadyToUnload::ready] once cleanup is done.
pub struct ReadyToUnload(Box<dyn FnOnce()>);

impl ReadyToUnload {
	pub fn ready(self) {
		(self.0)()
	}
}

impl fmt::Debug for ReadyToUnload {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("ReadyToUnload")
	}
}

#[derive(Default)]
pub(super) struct Lifecycle {
	theme_change: Option<Rc<dyn Fn(String)>>,
	context_change: Option<Rc<dyn Fn(Value)>>,
	load: Option<Rc<dyn Fn(LoadContext)>>,

	// Returns true if the handler will call ready itself.
	before_unload: Option<Rc<dyn Fn(ReadyToUnload) -> bool>>,
}

impl<T: Transport> Bridge<T> {
	/// Called with the new theme name whenever the host theme changes.
	pub fn on_theme_change<F: Fn(String) + 'static>(&self, handler: F) -> Result<()> {
		self.ensure_initialize_called()?;
		self.inner.lifecycle.borrow_mut().theme_change = Some(Rc::new(handler));
		self.notify_handler(Action::ThemeChange);
		Ok(())
	}

	/// Called with the host's new context object whenever it changes.
	pub fn on_context_change<F: Fn(Value) + 'static>(&self, handler: F) -> Result<()> {
		self.ensure_initialize_called()?;
		self.inner.lifecycle.borrow_mut().context_change = Some(Rc::new(handler));
		self.notify_handler(Action::ContextChange);
		Ok(())
	}

	/// Called when a cached app is loaded again.
	pub fn on_load<F: Fn(LoadContext) + 'static>(&self, handler: F) -> Result<()> {
		self.ensure_initialize_called()?;
		self.inner.lifecycle.borrow_mut().load = Some(Rc::new(handler));
		self.notify_handler(Action::Load);
		Ok(())
	}

	/// Called before the host unloads the app.
	///
	/// Return true to take ownership of [ReadyToUnload] and call it later;
	/// returning false tells the host the app is ready right away.
	pub fn on_before_unload<F: Fn(ReadyToUnload) -> bool + 'static>(&self, handler: F) -> Result<()> {
		self.ensure_initialize_called()?;
		self.inner.lifecycle.borrow_mut().before_unload = Some(Rc::new(handler));
		self.notify_handler(Action::BeforeUnload);
		Ok(())
	}

	fn notify_handler(&self, action: Action) {
		self.send_request(Action::RegisterHandler, vec![Value::from(action.as_str())], None, None);
	}

	/// The built-in handlers that route host pushes to the lifecycle callbacks.
	pub(super) fn install_lifecycle_handlers(&self) {
		let mut handlers = self.inner.handlers.borrow_mut();

		let bridge = self.downgrade();
		handlers.insert(
			Action::ThemeChange,
			handler(move |args| {
				if let Some(bridge) = bridge.upgrade() {
					bridge.handle_theme_change(args);
				}
				None
			}),
		);

		let bridge = self.downgrade();
		handlers.insert(
			Action::ContextChange,
			handler(move |args| {
				if let Some(bridge) = bridge.upgrade() {
					bridge.handle_context_change(args);
				}
				None
			}),
		);

		let bridge = self.downgrade();
		handlers.insert(
			Action::Load,
			handler(move |args| {
				if let Some(bridge) = bridge.upgrade() {
					bridge.handle_load(args);
				}
				None
			}),
		);

		let bridge = self.downgrade();
		handlers.insert(
			Action::BeforeUnload,
			handler(move |_| {
				if let Some(bridge) = bridge.upgrade() {
					bridge.handle_before_unload();
				}
				None
			}),
		);
	}

	fn handle_theme_change(&self, args: Vec<Value>) {
		let theme = args.first().and_then(Value::as_str).unwrap_or_default().to_string();

		let callback = self.inner.lifecycle.borrow().theme_change.clone();
		if let Some(callback) = callback {
			callback(theme.clone());
		}

		if self.window(Target::Child).is_some() {
			self.send_message_event_to_child(Action::ThemeChange, vec![Value::from(theme)]);
		}
	}

	fn handle_context_change(&self, args: Vec<Value>) {
		let Some(context) = args.into_iter().next() else {
			tracing::debug!("contextChange without a context");
			return;
		};

		let callback = self.inner.lifecycle.borrow().context_change.clone();
		if let Some(callback) = callback {
			callback(context.clone());
		}

		if self.window(Target::Child).is_some() {
			self.send_message_event_to_child(Action::ContextChange, vec![context]);
		}
	}

	fn handle_load(&self, args: Vec<Value>) {
		let Some(value) = args.into_iter().next() else {
			tracing::debug!("load without a context");
			return;
		};

		let context: LoadContext = match serde_json::from_value(value.clone()) {
			Ok(context) => context,
			Err(err) => {
				tracing::debug!(%err, "invalid load context");
				return;
			}
		};

		let callback = self.inner.lifecycle.borrow().load.clone();
		if let Some(callback) = callback {
			callback(context);
		}

		if self.window(Target::Child).is_some() {
			self.send_message_event_to_child(Action::Load, vec![value]);
		}
	}

	fn handle_before_unload(&self) {
		let bridge = self.downgrade();
		let ready = ReadyToUnload(Box::new(move || {
			if let Some(bridge) = bridge.upgrade() {
				bridge.send_request(Action::ReadyToUnload, vec![], None, None);
			}
		}));

		let callback = self.inner.lifecycle.borrow().before_unload.clone();
		if callback.is_some_and(|callback| callback(ready)) {
			return;
		}

		// Nobody deferred the unload: let the child decide, or tell the host we're ready.
		if self.window(Target::Child).is_some() {
			self.send_message_event_to_child(Action::BeforeUnload, vec![]);
		} else {
			self.send_request(Action::ReadyToUnload, vec![], None, None);
		}
	}
}
