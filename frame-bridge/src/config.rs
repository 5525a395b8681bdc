/// The version reported to the host during the handshake.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The newest runtime descriptor format we understand.
pub const LATEST_RUNTIME_API_VERSION: u32 = 4;

#[derive(Debug, Clone)]
pub struct Config {
	/// Extra origins to trust, in addition to the well-known hosts.
	/// Only `https://` origins are kept; `https://*.contoso.com` matches a single subdomain level.
	///
	/// When non-empty, messages are received even without a parent window (ex. from a child popup).
	pub valid_origins: Vec<String>,

	/// Reported to the host in the handshake.
	pub sdk_version: String,

	/// Reported to the host in the handshake.
	pub runtime_api_version: u32,
}

impl Config {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn valid_origin<T: Into<String>>(mut self, origin: T) -> Self {
		self.valid_origins.push(origin.into());
		self
	}

	pub fn valid_origins<I, T>(mut self, origins: I) -> Self
	where
		I: IntoIterator<Item = T>,
		T: Into<String>,
	{
		self.valid_origins.extend(origins.into_iter().map(Into::into));
		self
	}

	pub fn sdk_version<T: Into<String>>(mut self, version: T) -> Self {
		self.sdk_version = version.into();
		self
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			valid_origins: Vec::new(),
			sdk_version: VERSION.to_string(),
			runtime_api_version: LATEST_RUNTIME_API_VERSION,
		}
	}
}
