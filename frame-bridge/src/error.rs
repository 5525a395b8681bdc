use crate::{FrameContext, SdkError};

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum Error {
	#[error("The library has not yet been initialized")]
	NotInitialized,

	#[error(
		"This call is only allowed in following contexts: [{}]. Current context: \"{}\".",
		list(.expected),
		name(.current)
	)]
	NotAllowedInContext {
		expected: Vec<FrameContext>,
		current: Option<FrameContext>,
	},

	#[error("Initialization Failed. No Parent window found.")]
	NoParentWindow,

	#[error("cancelled")]
	Cancelled,

	#[error("invalid response: {0}")]
	InvalidResponse(String),

	#[error("{0}")]
	Host(String),

	#[error("host error: {0}")]
	Sdk(SdkError),
}

fn list(contexts: &[FrameContext]) -> String {
	contexts
		.iter()
		.map(|context| format!("\"{context}\""))
		.collect::<Vec<_>>()
		.join(",")
}

fn name(context: &Option<FrameContext>) -> String {
	context.as_ref().map(ToString::to_string).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;
