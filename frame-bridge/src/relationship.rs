use derive_more::Display;

use crate::TransportMode;

/// The two windows a bridge can talk to.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
	#[display("parent")]
	Parent,

	#[display("child")]
	Child,
}

#[derive(Debug, Clone)]
struct Slot<W> {
	window: Option<W>,
	origin: Option<String>,
}

impl<W> Default for Slot<W> {
	fn default() -> Self {
		Self {
			window: None,
			origin: None,
		}
	}
}

/// Tracks which window is our parent and which is our child.
///
/// A window can't always know whether a sender is above it (the host) or below it (a popup it opened),
/// so the slots are (re)assigned from the provenance of each accepted message.
#[derive(Debug, Clone)]
pub struct Relationships<W> {
	parent: Slot<W>,
	child: Slot<W>,
}

impl<W> Default for Relationships<W> {
	fn default() -> Self {
		Self {
			parent: Slot::default(),
			child: Slot::default(),
		}
	}
}

impl<W: Clone + PartialEq> Relationships<W> {
	pub fn new() -> Self {
		Self::default()
	}

	fn slot(&self, target: Target) -> &Slot<W> {
		match target {
			Target::Parent => &self.parent,
			Target::Child => &self.child,
		}
	}

	/// Record the parent known before any message arrives; its origin stays unknown.
	pub fn set_parent(&mut self, window: Option<W>) {
		self.parent = Slot { window, origin: None };
	}

	pub fn window(&self, target: Target) -> Option<&W> {
		self.slot(target).window.as_ref()
	}

	pub fn origin(&self, target: Target) -> Option<&str> {
		self.slot(target).origin.as_deref()
	}

	/// The window and origin, only if both are known.
	pub fn endpoint(&self, target: Target) -> Option<(&W, &str)> {
		let slot = self.slot(target);
		Some((slot.window.as_ref()?, slot.origin.as_deref()?))
	}

	/// Which slot, if any, the window occupies.
	pub fn classify(&self, window: &W) -> Option<Target> {
		if self.parent.window.as_ref() == Some(window) {
			Some(Target::Parent)
		} else if self.child.window.as_ref() == Some(window) {
			Some(Target::Child)
		} else {
			None
		}
	}

	/// Attribute an accepted message to the parent or child slot, then drop closed windows.
	///
	/// The parent slot is taken when empty, closed, or already held by the source.
	/// Otherwise the child slot is, under the same conditions.
	/// Frameless windows have no parent frame, so everything is attributed to the child.
	pub fn update<F>(&mut self, source: W, origin: String, mode: TransportMode, is_closed: F)
	where
		F: Fn(&W) -> bool,
	{
		let replaceable = |slot: &Slot<W>| match &slot.window {
			None => true,
			Some(window) => is_closed(window) || *window == source,
		};

		if mode == TransportMode::Framed && replaceable(&self.parent) {
			self.parent = Slot {
				window: Some(source),
				origin: Some(origin),
			};
		} else if replaceable(&self.child) {
			self.child = Slot {
				window: Some(source),
				origin: Some(origin),
			};
		}

		self.prune(is_closed);
	}

	/// Forget any tracked window that has been closed.
	pub fn prune<F>(&mut self, is_closed: F)
	where
		F: Fn(&W) -> bool,
	{
		for slot in [&mut self.parent, &mut self.child] {
			if slot.window.as_ref().is_some_and(&is_closed) {
				*slot = Slot::default();
			}
		}
	}
}
