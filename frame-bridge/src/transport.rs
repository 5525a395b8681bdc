use std::{fmt, rc::Rc};

use derive_more::Display;
use frame_message::{Envelope, Value};

/// A message delivered to the current window.
#[derive(Debug, Clone)]
pub struct Inbound<W> {
	/// The window that posted the message, if it could be determined.
	pub source: Option<W>,

	/// The origin of the posting document, ex. `https://teams.microsoft.com`.
	pub origin: Option<String>,

	pub data: Value,
}

pub type Listener<W> = Rc<dyn Fn(Inbound<W>)>;

/// Frameless hosts deliver the message data directly, without a source or origin.
pub type NativeListener = Rc<dyn Fn(Value)>;

/// How the current window talks to its parent, decided once during initialization.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
	/// The parent is a real window reached through `postMessage`.
	#[default]
	#[display("framed")]
	Framed,

	/// There is no parent window; the host injected a native bridge instead.
	/// Child windows are still reached through `postMessage`.
	#[display("frameless")]
	Frameless,
}

/// The window system the bridge runs on.
///
/// The browser implementation lives in [BrowserTransport](crate::BrowserTransport); tests use an in-memory fake.
/// Implementations must not call back into the bridge synchronously from [Transport::post] or [Transport::post_native].
pub trait Transport: 'static {
	/// A handle to a window, compared by identity.
	type Window: Clone + PartialEq + fmt::Debug + 'static;

	/// The window this bridge runs in.
	fn current(&self) -> Self::Window;

	/// The embedding frame if we're in one, otherwise the window that opened us.
	fn parent(&self) -> Option<Self::Window>;

	/// The origin of the current document.
	fn origin(&self) -> Option<String>;

	fn is_closed(&self, window: &Self::Window) -> bool;

	/// Post an envelope to a window, only delivered if its document matches `target_origin`.
	fn post(&self, window: &Self::Window, envelope: &Envelope, target_origin: &str);

	/// Whether the host injected a native bridge object.
	fn has_native_bridge(&self) -> bool;

	/// Hand a JSON-encoded envelope to the native bridge.
	fn post_native(&self, json: &str);

	/// Start delivering inbound window messages to `listener`, replacing any previous one.
	fn listen(&self, listener: Listener<Self::Window>);

	/// Start delivering native bridge messages to `listener`, replacing any previous one.
	fn listen_native(&self, listener: NativeListener);

	/// Stop delivering messages to both listeners.
	fn unlisten(&self);
}
