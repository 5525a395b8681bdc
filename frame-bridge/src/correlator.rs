use std::{collections::HashMap, fmt, rc::Rc};

use frame_message::{MessageId, Request, Response, Value};
use tokio::sync::oneshot;

/// Invoked with the response args and whether more responses will follow.
pub type Callback = Rc<dyn Fn(Vec<Value>, bool)>;

pub fn callback<F>(f: F) -> Callback
where
	F: Fn(Vec<Value>, bool) + 'static,
{
	Rc::new(f)
}

/// Who is waiting for the response to a request.
pub enum Waiter {
	Callback(Callback),
	Promise(oneshot::Sender<Vec<Value>>),
}

impl fmt::Debug for Waiter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Callback(_) => f.write_str("Callback"),
			Self::Promise(_) => f.write_str("Promise"),
		}
	}
}

/// Assigns request ids and remembers who is waiting for each response.
///
/// Nothing here times out: an unanswered request stays registered until it is cancelled or the bridge is reset.
#[derive(Default)]
pub struct Correlator {
	next_id: u64,
	callbacks: HashMap<MessageId, Callback>,
	promises: HashMap<MessageId, oneshot::Sender<Vec<Value>>>,
}

impl Correlator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build a request with the next id; ids are never reused by the same correlator.
	pub fn request<T: Into<String>>(&mut self, func: T, args: Vec<Value>) -> Request {
		let id = MessageId(self.next_id);
		self.next_id += 1;
		Request::new(id, func, args)
	}

	pub fn wait(&mut self, id: MessageId, waiter: Waiter) {
		match waiter {
			Waiter::Callback(callback) => {
				self.callbacks.insert(id, callback);
			}
			Waiter::Promise(resolve) => {
				self.promises.insert(id, resolve);
			}
		}
	}

	/// Find who is waiting on this response.
	///
	/// Callbacks stay registered for partial responses; promises only ever see the first response.
	pub fn resolve(&mut self, response: &Response) -> Option<Waiter> {
		if response.is_partial() {
			if let Some(callback) = self.callbacks.get(&response.id) {
				return Some(Waiter::Callback(callback.clone()));
			}
		} else if let Some(callback) = self.callbacks.remove(&response.id) {
			return Some(Waiter::Callback(callback));
		}

		self.promises.remove(&response.id).map(Waiter::Promise)
	}

	/// Stop waiting for a response, returning true if anything was waiting.
	pub fn cancel(&mut self, id: MessageId) -> bool {
		let callback = self.callbacks.remove(&id).is_some();
		let promise = self.promises.remove(&id).is_some();
		callback || promise
	}

	pub fn is_pending(&self, id: MessageId) -> bool {
		self.callbacks.contains_key(&id) || self.promises.contains_key(&id)
	}

	pub fn pending(&self) -> usize {
		self.callbacks.len() + self.promises.len()
	}

}

impl fmt::Debug for Correlator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Correlator")
			.field("next_id", &self.next_id)
			.field("callbacks", &self.callbacks.len())
			.field("promises", &self.promises.len())
			.finish()
	}
}
