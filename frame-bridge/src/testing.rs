use std::{
	cell::{Cell, RefCell},
	collections::HashSet,
	rc::Rc,
};

use frame_message::{Envelope, Value};

use crate::{Inbound, Listener, NativeListener, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u32);

pub const APP: WindowId = WindowId(0);
pub const HOST: WindowId = WindowId(1);
pub const POPUP: WindowId = WindowId(2);

pub const APP_ORIGIN: &str = "https://app.contoso.com";
pub const HOST_ORIGIN: &str = "https://teams.microsoft.com";

#[derive(Debug, Clone, PartialEq)]
pub struct Posted {
	pub window: WindowId,
	pub envelope: Envelope,
	pub origin: String,
}

#[derive(Default)]
struct Windows {
	parent: Option<WindowId>,
	native: bool,
	closed: RefCell<HashSet<WindowId>>,
	posted: RefCell<Vec<Posted>>,
	native_posted: RefCell<Vec<String>>,
	listener: RefCell<Option<Listener<WindowId>>>,
	native_listener: RefCell<Option<NativeListener>>,
	listens: Cell<usize>,
}

/// An in-memory window system that records everything posted.
#[derive(Clone)]
pub struct FakeTransport(Rc<Windows>);

impl FakeTransport {
	/// Running inside a frame of [HOST].
	pub fn framed() -> Self {
		Self(Rc::new(Windows {
			parent: Some(HOST),
			..Default::default()
		}))
	}

	/// No parent frame, but the host injected a native bridge.
	pub fn frameless() -> Self {
		Self(Rc::new(Windows {
			native: true,
			..Default::default()
		}))
	}

	/// Neither a parent frame nor a native bridge.
	pub fn detached() -> Self {
		Self(Rc::new(Windows::default()))
	}

	pub fn close(&self, window: WindowId) {
		self.0.closed.borrow_mut().insert(window);
	}

	pub fn take_posted(&self) -> Vec<Posted> {
		std::mem::take(&mut *self.0.posted.borrow_mut())
	}

	pub fn take_native(&self) -> Vec<Value> {
		std::mem::take(&mut *self.0.native_posted.borrow_mut())
			.iter()
			.map(|json| serde_json::from_str(json).unwrap())
			.collect()
	}

	pub fn is_listening(&self) -> bool {
		self.0.listener.borrow().is_some()
	}

	pub fn listens(&self) -> usize {
		self.0.listens.get()
	}

	/// Deliver a message as if `source` had posted it from `origin`.
	pub fn deliver(&self, source: WindowId, origin: &str, data: Value) {
		let listener = self.0.listener.borrow().clone();
		if let Some(listener) = listener {
			listener(Inbound {
				source: Some(source),
				origin: Some(origin.to_string()),
				data,
			});
		}
	}

	pub fn deliver_native(&self, data: Value) {
		let listener = self.0.native_listener.borrow().clone();
		if let Some(listener) = listener {
			listener(data);
		}
	}
}

impl Transport for FakeTransport {
	type Window = WindowId;

	fn current(&self) -> WindowId {
		APP
	}

	fn parent(&self) -> Option<WindowId> {
		self.0.parent
	}

	fn origin(&self) -> Option<String> {
		Some(APP_ORIGIN.to_string())
	}

	fn is_closed(&self, window: &WindowId) -> bool {
		self.0.closed.borrow().contains(window)
	}

	fn post(&self, window: &WindowId, envelope: &Envelope, target_origin: &str) {
		self.0.posted.borrow_mut().push(Posted {
			window: *window,
			envelope: envelope.clone(),
			origin: target_origin.to_string(),
		});
	}

	fn has_native_bridge(&self) -> bool {
		self.0.native
	}

	fn post_native(&self, json: &str) {
		self.0.native_posted.borrow_mut().push(json.to_string());
	}

	fn listen(&self, listener: Listener<WindowId>) {
		self.0.listens.set(self.0.listens.get() + 1);
		self.0.listener.replace(Some(listener));
	}

	fn listen_native(&self, listener: NativeListener) {
		self.0.native_listener.replace(Some(listener));
	}

	fn unlisten(&self) {
		self.0.listener.take();
		self.0.native_listener.take();
	}
}
