use std::{collections::HashMap, fmt, rc::Rc};

use frame_message::Value;

/// Handles an inbound call; a returned value is sent back when the caller expects a response.
pub type Handler = Rc<dyn Fn(Vec<Value>) -> Option<Value>>;

pub fn handler<F>(f: F) -> Handler
where
	F: Fn(Vec<Value>) -> Option<Value> + 'static,
{
	Rc::new(f)
}

/// Action names the bridge itself sends or handles.
/// Capability namespaces use [Action::Custom], ex. `"dialog.url.submit"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
	Initialize,
	RegisterHandler,
	ThemeChange,
	ContextChange,
	Load,
	BeforeUnload,
	ReadyToUnload,
	Custom(String),
}

impl Action {
	pub fn as_str(&self) -> &str {
		match self {
			Self::Initialize => "initialize",
			Self::RegisterHandler => "registerHandler",
			Self::ThemeChange => "themeChange",
			Self::ContextChange => "contextChange",
			Self::Load => "load",
			Self::BeforeUnload => "beforeUnload",
			Self::ReadyToUnload => "readyToUnload",
			Self::Custom(name) => name,
		}
	}
}

impl From<&str> for Action {
	fn from(name: &str) -> Self {
		match name {
			"initialize" => Self::Initialize,
			"registerHandler" => Self::RegisterHandler,
			"themeChange" => Self::ThemeChange,
			"contextChange" => Self::ContextChange,
			"load" => Self::Load,
			"beforeUnload" => Self::BeforeUnload,
			"readyToUnload" => Self::ReadyToUnload,
			name => Self::Custom(name.to_string()),
		}
	}
}

impl From<String> for Action {
	fn from(name: String) -> Self {
		match Action::from(name.as_str()) {
			Self::Custom(_) => Self::Custom(name),
			known => known,
		}
	}
}

impl From<&String> for Action {
	fn from(name: &String) -> Self {
		name.as_str().into()
	}
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The outcome of looking up and running a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
	Handled(Option<Value>),
	NotFound,

	/// The handler panicked; nothing is sent back.
	Panicked,
}

/// One handler per action; the last registration wins.
#[derive(Default)]
pub struct Handlers {
	handlers: HashMap<Action, Handler>,
}

impl Handlers {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, action: Action, handler: Handler) -> Option<Handler> {
		self.handlers.insert(action, handler)
	}

	pub fn remove(&mut self, action: &Action) -> Option<Handler> {
		self.handlers.remove(action)
	}

	pub fn get(&self, action: &Action) -> Option<Handler> {
		self.handlers.get(action).cloned()
	}

	pub fn contains(&self, action: &Action) -> bool {
		self.handlers.contains_key(action)
	}
}

impl fmt::Debug for Handlers {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.handlers.keys()).finish()
	}
}
