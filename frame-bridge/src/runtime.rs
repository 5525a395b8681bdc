use std::{cmp::Ordering, fmt};

use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{Error, Result};

/// The host client SDK version assumed when the host does not report one.
pub const DEFAULT_SDK_VERSION_FOR_COMPAT_CHECK: &str = "2.0.1";

/// The surface of the host UI the app is rendered in.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FrameContext {
	#[display("settings")]
	Settings,

	#[display("content")]
	Content,

	#[display("authentication")]
	Authentication,

	#[display("remove")]
	Remove,

	#[display("task")]
	Task,

	#[display("sidePanel")]
	SidePanel,

	#[display("stage")]
	Stage,

	#[display("meetingStage")]
	MeetingStage,

	/// A context this version doesn't know about yet.
	#[display("{_0}")]
	Other(String),
}

impl From<String> for FrameContext {
	fn from(context: String) -> Self {
		match context.as_str() {
			"settings" => Self::Settings,
			"content" => Self::Content,
			"authentication" => Self::Authentication,
			"remove" => Self::Remove,
			"task" => Self::Task,
			"sidePanel" => Self::SidePanel,
			"stage" => Self::Stage,
			"meetingStage" => Self::MeetingStage,
			_ => Self::Other(context),
		}
	}
}

impl From<&str> for FrameContext {
	fn from(context: &str) -> Self {
		context.to_string().into()
	}
}

impl From<FrameContext> for String {
	fn from(context: FrameContext) -> Self {
		context.to_string()
	}
}

#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HostClientType {
	#[display("desktop")]
	Desktop,

	#[display("web")]
	Web,

	#[display("android")]
	Android,

	#[display("ios")]
	Ios,

	#[display("ipados")]
	IpadOs,

	#[display("surfaceHub")]
	SurfaceHub,

	#[display("teamsRoomsWindows")]
	TeamsRoomsWindows,

	#[display("teamsRoomsAndroid")]
	TeamsRoomsAndroid,

	#[display("teamsPhones")]
	TeamsPhones,

	#[display("teamsDisplays")]
	TeamsDisplays,

	#[display("{_0}")]
	Other(String),
}

impl HostClientType {
	pub fn is_mobile(&self) -> bool {
		matches!(self, Self::Android | Self::Ios | Self::IpadOs)
	}
}

impl From<String> for HostClientType {
	fn from(client: String) -> Self {
		match client.as_str() {
			"desktop" => Self::Desktop,
			"web" => Self::Web,
			"android" => Self::Android,
			"ios" => Self::Ios,
			"ipados" => Self::IpadOs,
			"surfaceHub" => Self::SurfaceHub,
			"teamsRoomsWindows" => Self::TeamsRoomsWindows,
			"teamsRoomsAndroid" => Self::TeamsRoomsAndroid,
			"teamsPhones" => Self::TeamsPhones,
			"teamsDisplays" => Self::TeamsDisplays,
			_ => Self::Other(client),
		}
	}
}

impl From<&str> for HostClientType {
	fn from(client: &str) -> Self {
		client.to_string().into()
	}
}

impl From<HostClientType> for String {
	fn from(client: HostClientType) -> Self {
		client.to_string()
	}
}

/// The capabilities negotiated with the host during the handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runtime {
	pub api_version: u32,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub is_legacy_teams: Option<bool>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub host_version_info: Option<Value>,

	/// A tree of capability namespaces; a namespace is supported when it is present as an object.
	#[serde(default)]
	pub supports: Value,
}

impl Runtime {
	/// Applied when the host predates runtime negotiation.
	pub fn legacy_teams() -> Self {
		Self {
			api_version: 1,
			is_legacy_teams: Some(true),
			host_version_info: None,
			supports: json!({
				"appInstallDialog": {},
				"appEntity": {},
				"call": {},
				"chat": {},
				"conversations": {},
				"dialog": { "bot": {}, "update": {} },
				"logs": {},
				"meetingRoom": {},
				"menus": {},
				"monetization": {},
				"notifications": {},
				"pages": { "appButton": {}, "tabs": {}, "config": {}, "backStack": {}, "fullTrust": {} },
				"remoteCamera": {},
				"sharing": {},
				"stageView": {},
				"teams": { "fullTrust": {} },
				"teamsCore": {},
				"video": { "sharedFrame": {} },
			}),
		}
	}

	/// Whether a dotted capability path, ex. `pages.config`, is supported.
	pub fn supports(&self, path: &str) -> bool {
		let mut node = &self.supports;
		for name in path.split('.') {
			match node.get(name) {
				Some(child) if child.is_object() => node = child,
				_ => return false,
			}
		}
		true
	}

	fn parse(config: &str) -> std::result::Result<Self, ParseError> {
		let value: Value = serde_json::from_str(config).map_err(|_| ParseError::NotJson)?;
		let runtime: Runtime = serde_json::from_value(value).map_err(|err| ParseError::Invalid(err.to_string()))?;

		if runtime.api_version == 0 {
			return Err(ParseError::Invalid("Received runtime config is invalid".to_string()));
		}

		Ok(runtime)
	}
}

enum ParseError {
	NotJson,
	Invalid(String),
}

/// The negotiated outcome of the `initialize` handshake.
#[derive(Debug, Clone, PartialEq)]
pub struct InitializeResponse {
	pub context: FrameContext,
	pub client_type: HostClientType,
	pub runtime: Runtime,
	pub client_supported_sdk_version: String,
}

impl InitializeResponse {
	/// Decode the handshake reply: `[frameContext, clientType, runtimeConfig, clientSupportedSDKVersion]`.
	///
	/// Older hosts swap the last two slots or omit the runtime entirely,
	/// so a `runtimeConfig` that isn't JSON is read as an SDK version and the runtime is looked for in the last slot.
	/// If neither slot holds a runtime, the legacy Teams runtime applies.
	pub fn from_args(args: &[Value]) -> Result<Self> {
		let context = args
			.first()
			.and_then(Value::as_str)
			.ok_or_else(|| Error::InvalidResponse("missing frame context".to_string()))?;

		let client_type = args
			.get(1)
			.and_then(Value::as_str)
			.ok_or_else(|| Error::InvalidResponse("missing client type".to_string()))?;

		let runtime_config = args.get(2).and_then(Value::as_str);
		let mut version = args
			.get(3)
			.and_then(Value::as_str)
			.unwrap_or(DEFAULT_SDK_VERSION_FOR_COMPAT_CHECK)
			.to_string();

		let runtime = match runtime_config.map(Runtime::parse) {
			Some(Ok(runtime)) => runtime,
			Some(Err(ParseError::Invalid(err))) => return Err(Error::InvalidResponse(err)),
			Some(Err(ParseError::NotJson)) | None => {
				let swapped = args.get(3).and_then(Value::as_str);

				let is_version =
					|config: &&str| compare_sdk_versions(config, DEFAULT_SDK_VERSION_FOR_COMPAT_CHECK).is_some();
				if let Some(config) = runtime_config.filter(is_version) {
					version = config.to_string();
				}

				match swapped.map(Runtime::parse) {
					Some(Ok(runtime)) => runtime,
					Some(Err(ParseError::Invalid(err))) => return Err(Error::InvalidResponse(err)),
					Some(Err(ParseError::NotJson)) | None => Runtime::legacy_teams(),
				}
			}
		};

		Ok(Self {
			context: context.into(),
			client_type: client_type.into(),
			runtime,
			client_supported_sdk_version: version,
		})
	}
}

/// Compare two dotted version strings, padding the shorter one with zeros.
///
/// Returns None if either side has a non-numeric component.
pub fn compare_sdk_versions(v1: &str, v2: &str) -> Option<Ordering> {
	fn parts(version: &str) -> Option<Vec<u64>> {
		version.split('.').map(|part| part.parse().ok()).collect()
	}

	let (a, b) = (parts(v1)?, parts(v2)?);
	let len = a.len().max(b.len());
	for i in 0..len {
		let (x, y) = (a.get(i).copied().unwrap_or(0), b.get(i).copied().unwrap_or(0));
		match x.cmp(&y) {
			Ordering::Equal => continue,
			other => return Some(other),
		}
	}

	Some(Ordering::Equal)
}

/// Well-known error codes carried by [SdkError].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(pub u32);

impl ErrorCode {
	pub const NOT_SUPPORTED_ON_PLATFORM: Self = Self(100);
	pub const INTERNAL_ERROR: Self = Self(500);
	pub const NOT_SUPPORTED_IN_CURRENT_CONTEXT: Self = Self(501);
	pub const PERMISSION_DENIED: Self = Self(1000);
	pub const NETWORK_ERROR: Self = Self(2000);
	pub const NO_HW_SUPPORT: Self = Self(3000);
	pub const INVALID_ARGUMENTS: Self = Self(4000);
	pub const UNAUTHORIZED_USER_OPERATION: Self = Self(5000);
	pub const INSUFFICIENT_RESOURCES: Self = Self(6000);
	pub const THROTTLE: Self = Self(7000);
	pub const USER_ABORT: Self = Self(8000);
	pub const OPERATION_TIMED_OUT: Self = Self(8001);
	pub const OLD_PLATFORM: Self = Self(9000);
	pub const FILE_NOT_FOUND: Self = Self(404);
	pub const SIZE_EXCEEDED: Self = Self(10000);
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// The error object hosts return as the first response argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkError {
	pub error_code: ErrorCode,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

impl fmt::Display for SdkError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.message {
			Some(message) => write!(f, "{} ({})", message, self.error_code),
			None => write!(f, "error code {}", self.error_code),
		}
	}
}
