use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

/// Correlates a [Response] with the [Request] that caused it.
///
/// Ids are assigned by the sending window, starting at 0, and are only unique within that window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl From<u64> for MessageId {
	fn from(id: u64) -> Self {
		Self(id)
	}
}

/// A call that expects a [Response] with the same id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Request {
	pub id: MessageId,
	pub func: String,
	pub args: Vec<Value>,

	/// Milliseconds since the epoch when the request was created.
	/// Informational only.
	pub timestamp: u64,
}

impl Request {
	pub fn new<T: Into<String>>(id: MessageId, func: T, args: Vec<Value>) -> Self {
		Self {
			id,
			func: func.into(),
			args,
			timestamp: now(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
	pub id: MessageId,
	pub args: Vec<Value>,

	/// More responses with the same id will follow.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub is_partial_response: Option<bool>,
}

impl Response {
	pub fn new(id: MessageId, args: Vec<Value>) -> Self {
		Self {
			id,
			args,
			is_partial_response: None,
		}
	}

	pub fn partial(mut self, partial: bool) -> Self {
		self.is_partial_response = Some(partial);
		self
	}

	pub fn is_partial(&self) -> bool {
		self.is_partial_response == Some(true)
	}
}

/// A fire-and-forget push with no id; nothing answers it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
	pub func: String,
	pub args: Vec<Value>,
}

impl Event {
	pub fn new<T: Into<String>>(func: T, args: Vec<Value>) -> Self {
		Self {
			func: func.into(),
			args,
		}
	}
}

/// Anything this side ever puts on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
	Request(Request),
	Response(Response),
	Event(Event),
}

impl Envelope {
	/// The id, if this envelope has one.
	pub fn id(&self) -> Option<MessageId> {
		match self {
			Self::Request(request) => Some(request.id),
			Self::Response(response) => Some(response.id),
			Self::Event(_) => None,
		}
	}

	/// The action name, if this envelope carries one.
	pub fn func(&self) -> Option<&str> {
		match self {
			Self::Request(request) => Some(&request.func),
			Self::Response(_) => None,
			Self::Event(event) => Some(&event.func),
		}
	}

	pub fn args(&self) -> &[Value] {
		match self {
			Self::Request(request) => &request.args,
			Self::Response(response) => &response.args,
			Self::Event(event) => &event.args,
		}
	}

	/// Encode for the frameless native bridge.
	pub fn to_json(&self) -> Result<String, Error> {
		Ok(serde_json::to_string(self)?)
	}

	pub fn to_value(&self) -> Result<Value, Error> {
		Ok(serde_json::to_value(self)?)
	}
}

impl From<Request> for Envelope {
	fn from(request: Request) -> Self {
		Self::Request(request)
	}
}

impl From<Response> for Envelope {
	fn from(response: Response) -> Self {
		Self::Response(response)
	}
}

impl From<Event> for Envelope {
	fn from(event: Event) -> Self {
		Self::Event(event)
	}
}

#[cfg(target_arch = "wasm32")]
fn now() -> u64 {
	web_sys::js_sys::Date::now() as u64
}

#[cfg(not(target_arch = "wasm32"))]
fn now() -> u64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_millis() as u64)
		.unwrap_or_default()
}
