//! Envelopes exchanged between an embedded frame and its host.
//!
//! Three shapes travel over the wire, in both directions:
//!
//! ```text
//! Request:  { id: number, func: string, args: any[], timestamp: number }
//! Response: { id: number, args: any[], isPartialResponse?: boolean }
//! Event:    { func: string, args: any[] }
//! ```
//!
//! Framed windows exchange them through `postMessage`, so [Message] converts them
//! to and from a [JsValue](web_sys::wasm_bindgen::JsValue) without a JSON round trip.
//! Frameless windows (native hosts that inject a bridge object instead of a parent frame)
//! exchange the same envelopes as JSON strings, see [Envelope::to_json] and [Payload::from_json].
//!
//! Inbound data is untrusted and frequently comes from older hosts,
//! so it is never deserialized directly into an [Envelope].
//! Instead [Payload] exposes the optional `id`, `func`, `args` and `isPartialResponse` fields
//! and lets the caller decide what the message is.

mod envelope;
mod error;
mod message;
mod payload;

pub use envelope::*;
pub use error::*;
pub use message::*;
pub use payload::*;

/// Arguments are arbitrary structured-clone values.
pub use serde_json::Value;
