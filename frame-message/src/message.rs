use js_sys::wasm_bindgen;
use js_sys::{Array, Object, Reflect};
use serde_json::{Map, Number, Value};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::js_sys;

use crate::{Envelope, Error, Event, Request, Response};

/// Conversion to and from the structured-clone values handed to `postMessage`.
pub trait Message: Sized {
	// Serializes the message into a JsValue.
	fn into_message(self) -> JsValue;

	// Deserializes the message from a JsValue.
	fn from_message(message: JsValue) -> Result<Self, Error>;
}

impl Message for Value {
	fn into_message(self) -> JsValue {
		match self {
			Value::Null => JsValue::NULL,
			Value::Bool(value) => value.into(),
			Value::Number(value) => value.as_f64().map(JsValue::from_f64).unwrap_or(JsValue::NULL),
			Value::String(value) => value.into(),
			Value::Array(values) => {
				let array = Array::new();
				for value in values {
					array.push(&value.into_message());
				}
				array.into()
			}
			Value::Object(fields) => {
				let obj = Object::new();
				for (key, value) in fields {
					// Setting a data property on a fresh plain object cannot throw.
					let _ = Reflect::set(&obj, &key.into(), &value.into_message());
				}
				obj.into()
			}
		}
	}

	fn from_message(message: JsValue) -> Result<Self, Error> {
		if message.is_null() || message.is_undefined() {
			return Ok(Value::Null);
		}

		if let Some(value) = message.as_bool() {
			return Ok(Value::Bool(value));
		}

		if let Some(value) = message.as_f64() {
			return Ok(number(value));
		}

		if let Some(value) = message.as_string() {
			return Ok(Value::String(value));
		}

		if message.is_array() {
			let array = Array::from(&message);
			let mut values = Vec::with_capacity(array.length() as usize);
			for i in 0..array.length() {
				values.push(Value::from_message(array.get(i))?);
			}
			return Ok(Value::Array(values));
		}

		if message.is_function() || message.is_symbol() || message.is_bigint() {
			return Err(Error::InvalidType("structured-clone value"));
		}

		let obj = message.dyn_into::<Object>().map_err(|_| Error::UnexpectedType)?;
		let mut fields = Map::new();
		for key in Object::keys(&obj) {
			let Some(name) = key.as_string() else {
				continue;
			};
			let value = Reflect::get(&obj, &key).map_err(|_| Error::MissingField("object key"))?;
			fields.insert(name, Value::from_message(value)?);
		}
		Ok(Value::Object(fields))
	}
}

// Integral floats become integers so ids and counters survive the trip into serde.
fn number(value: f64) -> Value {
	const MAX_SAFE_INTEGER: f64 = 9007199254740991.0;

	if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
		return Value::Number(Number::from(value as i64));
	}

	Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

macro_rules! via_value {
	($($t:ty),*) => {
		$(
			impl Message for $t {
				fn into_message(self) -> JsValue {
					match serde_json::to_value(self) {
						Ok(value) => value.into_message(),
						Err(_) => JsValue::NULL,
					}
				}

				fn from_message(message: JsValue) -> Result<Self, Error> {
					let value = Value::from_message(message)?;
					serde_json::from_value(value).map_err(|_| Error::InvalidType(stringify!($t)))
				}
			}
		)*
	};
}

// The envelopes only contain JSON-compatible fields, so they go through Value.
via_value!(Request, Response, Event, Envelope);
