#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
	#[error("missing '{0}' field")]
	MissingField(&'static str),

	#[error("unexpected type")]
	UnexpectedType,

	#[error("invalid type: expected {0}")]
	InvalidType(&'static str),

	#[error("invalid JSON: {0}")]
	InvalidJson(String),
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::InvalidJson(err.to_string())
	}
}

pub type Result<T> = std::result::Result<T, Error>;
