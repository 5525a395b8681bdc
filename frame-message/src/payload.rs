use serde_json::{Map, Value};

use crate::{Error, MessageId, Request, Response};

/// A loosely-typed view of an inbound message.
///
/// Parent windows send responses (`id`) and pushes (`func`), child windows send requests (`id` and `func`).
/// Which one a message is depends on who sent it, so the fields are kept optional until the receiver decides.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payload {
	/// Only set when `id` is a non-negative integer.
	pub id: Option<MessageId>,

	/// Set whenever `id` is a number, including ones that can't be a [MessageId] (ex. `-1` or `1.5`).
	/// A parent message like that is still a response, just not one we could have asked for.
	pub has_numeric_id: bool,

	/// Only set when `func` is a string.
	pub func: Option<String>,

	/// A missing or non-array `args` is treated as empty.
	pub args: Vec<Value>,

	/// Strictly `isPartialResponse === true`.
	pub is_partial_response: bool,
}

impl Payload {
	/// Inspect a message object, failing if it is not an object at all.
	pub fn from_value(value: Value) -> Result<Self, Error> {
		match value {
			Value::Object(obj) => Ok(Self::from_object(obj)),
			_ => Err(Error::UnexpectedType),
		}
	}

	pub fn from_json(json: &str) -> Result<Self, Error> {
		Self::from_value(serde_json::from_str(json)?)
	}

	fn from_object(mut obj: Map<String, Value>) -> Self {
		let has_numeric_id = matches!(obj.get("id"), Some(Value::Number(_)));
		let id = obj.get("id").and_then(as_id);
		let func = match obj.remove("func") {
			Some(Value::String(func)) => Some(func),
			_ => None,
		};
		let args = match obj.remove("args") {
			Some(Value::Array(args)) => args,
			_ => Vec::new(),
		};
		let is_partial_response = obj.get("isPartialResponse") == Some(&Value::Bool(true));

		Self {
			id,
			has_numeric_id,
			func,
			args,
			is_partial_response,
		}
	}

	/// Reinterpret as a request, as sent by a child window.
	pub fn into_request(self) -> Result<Request, Error> {
		let id = self.id.ok_or(Error::MissingField("id"))?;
		let func = self.func.ok_or(Error::MissingField("func"))?;
		Ok(Request::new(id, func, self.args))
	}

	/// Reinterpret as a response, as sent by a parent window.
	pub fn into_response(self) -> Result<Response, Error> {
		let id = self.id.ok_or(Error::MissingField("id"))?;
		Ok(Response::new(id, self.args).partial(self.is_partial_response))
	}
}

// JS numbers arrive as floats; 7.0 is a valid id but 7.5 and -1 are not.
fn as_id(value: &Value) -> Option<MessageId> {
	let Value::Number(number) = value else {
		return None;
	};
	if let Some(id) = number.as_u64() {
		return Some(MessageId(id));
	}

	let float = number.as_f64()?;
	match float.fract() == 0.0 && float >= 0.0 && float <= u64::MAX as f64 {
		true => Some(MessageId(float as u64)),
		false => None,
	}
}
