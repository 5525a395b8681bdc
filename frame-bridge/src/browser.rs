use std::cell::RefCell;

use frame_message::{Envelope, Message, Value};
use js_sys::{Function, Object, Reflect};
use wasm_bindgen::prelude::*;

use crate::{Inbound, Listener, NativeListener, Transport};

/// The real window system, reached through `web_sys`.
///
/// Window handles are compared by identity, which also works for cross-origin windows.
pub struct BrowserTransport {
	window: web_sys::Window,
	on_message: RefCell<Option<Closure<dyn FnMut(web_sys::MessageEvent)>>>,
	on_native: RefCell<Option<Closure<dyn FnMut(JsValue)>>>,
}

impl BrowserTransport {
	pub fn new(window: web_sys::Window) -> Self {
		Self {
			window,
			on_message: RefCell::default(),
			on_native: RefCell::default(),
		}
	}

	/// The transport for the global `window`, if there is one (ex. not in a worker).
	pub fn global() -> Option<Self> {
		web_sys::window().map(Self::new)
	}

	fn native_interface(&self) -> Option<Object> {
		let native = Reflect::get(&self.window, &"nativeInterface".into()).ok()?;
		native.dyn_into().ok()
	}
}

// Wrapped events (ex. from jQuery) carry the real one in `originalEvent`.
fn original<T: JsCast>(event: &web_sys::MessageEvent, field: &str) -> Option<T> {
	let inner = Reflect::get(event, &"originalEvent".into()).ok()?;
	let value = Reflect::get(&inner, &field.into()).ok()?;
	if value.is_undefined() || value.is_null() {
		return None;
	}
	Some(value.unchecked_into())
}

fn inbound(event: web_sys::MessageEvent) -> Option<Inbound<web_sys::Window>> {
	// Cross-origin windows fail instanceof checks, so the source is cast unchecked.
	let source = event
		.source()
		.map(|source| source.unchecked_into())
		.or_else(|| original(&event, "source"));

	let origin = Some(event.origin())
		.filter(|origin| !origin.is_empty())
		.or_else(|| original::<JsValue>(&event, "origin").and_then(|origin| origin.as_string()));

	let data = match Value::from_message(event.data()) {
		Ok(data) => data,
		Err(err) => {
			tracing::trace!(%err, "ignoring message with unsupported data");
			return None;
		}
	};

	Some(Inbound { source, origin, data })
}

impl Transport for BrowserTransport {
	type Window = web_sys::Window;

	fn current(&self) -> web_sys::Window {
		self.window.clone()
	}

	fn parent(&self) -> Option<web_sys::Window> {
		// A top-level window is its own parent.
		if let Ok(Some(parent)) = self.window.parent() {
			if parent != self.window {
				return Some(parent);
			}
		}

		let opener = self.window.opener().ok()?;
		if opener.is_null() || opener.is_undefined() {
			return None;
		}

		Some(opener.unchecked_into())
	}

	fn origin(&self) -> Option<String> {
		self.window.location().origin().ok()
	}

	fn is_closed(&self, window: &web_sys::Window) -> bool {
		window.closed().unwrap_or(true)
	}

	fn post(&self, window: &web_sys::Window, envelope: &Envelope, target_origin: &str) {
		let message = envelope.clone().into_message();
		if let Err(err) = window.post_message(&message, target_origin) {
			tracing::warn!(?err, "failed to post message");
		}
	}

	fn has_native_bridge(&self) -> bool {
		self.native_interface().is_some()
	}

	fn post_native(&self, json: &str) {
		let Some(native) = self.native_interface() else {
			return;
		};

		let post = Reflect::get(&native, &"framelessPostMessage".into())
			.ok()
			.and_then(|post| post.dyn_into::<Function>().ok());

		match post {
			Some(post) => {
				if let Err(err) = post.call1(&native, &JsValue::from_str(json)) {
					tracing::warn!(?err, "native bridge rejected message");
				}
			}
			None => tracing::warn!("native bridge has no framelessPostMessage"),
		}
	}

	fn listen(&self, listener: Listener<web_sys::Window>) {
		self.unlisten_messages();

		let on_message = Closure::wrap(Box::new(move |event: web_sys::MessageEvent| {
			if let Some(inbound) = inbound(event) {
				listener(inbound);
			}
		}) as Box<dyn FnMut(_)>);

		if let Err(err) = self
			.window
			.add_event_listener_with_callback("message", on_message.as_ref().unchecked_ref())
		{
			tracing::warn!(?err, "failed to listen for messages");
		}

		self.on_message.replace(Some(on_message));
	}

	fn listen_native(&self, listener: NativeListener) {
		// The host calls `window.onNativeMessage({ data })`.
		let on_native = Closure::wrap(Box::new(move |event: JsValue| {
			let data = Reflect::get(&event, &"data".into()).unwrap_or(JsValue::UNDEFINED);
			match Value::from_message(data) {
				Ok(data) => listener(data),
				Err(err) => tracing::trace!(%err, "ignoring native message with unsupported data"),
			}
		}) as Box<dyn FnMut(_)>);

		if let Err(err) = Reflect::set(&self.window, &"onNativeMessage".into(), on_native.as_ref()) {
			tracing::warn!(?err, "failed to install native listener");
		}

		self.on_native.replace(Some(on_native));
	}

	fn unlisten(&self) {
		self.unlisten_messages();

		if self.on_native.take().is_some() {
			Reflect::delete_property(&self.window, &"onNativeMessage".into()).ok();
		}
	}
}

impl BrowserTransport {
	fn unlisten_messages(&self) {
		if let Some(on_message) = self.on_message.take() {
			self.window
				.remove_event_listener_with_callback("message", on_message.as_ref().unchecked_ref())
				.ok();
		}
	}
}

impl Drop for BrowserTransport {
	fn drop(&mut self) {
		self.unlisten();
	}
}
