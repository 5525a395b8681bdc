//! Request/response messaging between an embedded app window and the host that embeds it.
//!
//! A [Bridge] sends requests up to its parent window and correlates the responses,
//! dispatches pushes from the parent to registered handlers,
//! and proxies requests from a child window (ex. a popup the app opened) up to the parent.
//!
//! The window system is abstracted by [Transport]; [BrowserTransport] is the real one on wasm32.

mod bridge;
mod config;
mod correlator;
mod error;
mod handlers;
mod origin;
mod queue;
mod relationship;
mod runtime;
mod transport;

#[cfg(target_arch = "wasm32")]
mod browser;

#[cfg(test)]
mod testing;

pub use bridge::*;
pub use config::*;
pub use correlator::*;
pub use error::*;
pub use handlers::*;
pub use origin::*;
pub use queue::*;
pub use relationship::*;
pub use runtime::*;
pub use transport::*;

#[cfg(target_arch = "wasm32")]
pub use browser::*;

pub use frame_message::{Envelope, Event, MessageId, Payload, Request, Response, Value};
