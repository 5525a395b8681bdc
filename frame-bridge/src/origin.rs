use std::collections::HashSet;

use url::Url;

/// Hosts allowed to message us, either exact hosts (with port, if any) or `*.suffix` patterns.
pub const VALID_ORIGINS: &[&str] = &[
	"teams.microsoft.com",
	"teams.microsoft.us",
	"gov.teams.microsoft.us",
	"dod.teams.microsoft.us",
	"int.teams.microsoft.com",
	"teams.live.com",
	"devspaces.skype.com",
	"ssauth.skype.com",
	"local.teams.live.com",
	"local.teams.live.com:8080",
	"local.teams.office.com",
	"local.teams.office.com:8080",
	"outlook.office.com",
	"outlook-sdf.office.com",
	"outlook.office365.com",
	"outlook-sdf.office365.com",
	"outlook.live.com",
	"outlook-sdf.live.com",
	"*.teams.microsoft.com",
	"*.www.office.com",
	"www.office.com",
	"word.office.com",
	"excel.office.com",
	"powerpoint.office.com",
	"www.officeppe.com",
	"*.www.microsoft365.com",
	"www.microsoft365.com",
	"bing.com",
	"edgeservices.bing.com",
	"www.bing.com",
	"www.staging-bing-int.com",
	"teams.cloud.microsoft",
	"outlook.cloud.microsoft",
	"m365.cloud.microsoft",
];

const HTTPS: &str = "https://";

/// Decides whether a message origin is trusted.
///
/// The static [VALID_ORIGINS] are always trusted; apps may add their own during initialization.
#[derive(Debug, Default, Clone)]
pub struct OriginValidator {
	additional: Vec<String>,
}

impl OriginValidator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Merge app-supplied origins, keeping only `https://` entries and dropping duplicates.
	pub fn extend<I, S>(&mut self, origins: I)
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut seen: HashSet<String> = self.additional.iter().cloned().collect();
		for origin in origins {
			let origin = origin.as_ref();
			if origin.starts_with(HTTPS) && seen.insert(origin.to_string()) {
				self.additional.push(origin.to_string());
			}
		}
	}

	pub fn additional(&self) -> &[String] {
		&self.additional
	}

	/// Only `https:` origins are ever trusted, regardless of host.
	pub fn is_trusted(&self, origin: &str) -> bool {
		let Ok(url) = Url::parse(origin) else {
			return false;
		};

		if url.scheme() != "https" {
			return false;
		}

		let Some(host) = url.host_str() else {
			return false;
		};

		// Match `URL.host`, which includes any non-default port.
		let host = match url.port() {
			Some(port) => format!("{host}:{port}"),
			None => host.to_string(),
		};

		if VALID_ORIGINS.iter().any(|pattern| matches_host(pattern, &host)) {
			return true;
		}

		self.additional.iter().any(|origin| {
			let pattern = origin.strip_prefix(HTTPS).unwrap_or(origin);
			matches_host(pattern, &host)
		})
	}
}

/// A `*.suffix` pattern only matches hosts with exactly one more label than the suffix.
/// Anything else must match exactly.
pub fn matches_host(pattern: &str, host: &str) -> bool {
	match pattern.strip_prefix('*') {
		Some(suffix) if suffix.starts_with('.') => {
			host.len() > suffix.len()
				&& host.split('.').count() == suffix.split('.').count()
				&& host.ends_with(suffix)
		}
		_ => pattern == host,
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn wildcard() {
		let pattern = "*.teams.microsoft.com";
		assert!(matches_host(pattern, "sub.teams.microsoft.com"));
		assert!(!matches_host(pattern, "teams.microsoft.com"));
		assert!(!matches_host(pattern, "a.b.teams.microsoft.com"));
		assert!(!matches_host(pattern, "evil.com.teams.microsoft.com.attacker.net"));
		assert!(!matches_host(pattern, "subteams.microsoft.com"));
	}

	#[test]
	fn exact() {
		assert!(matches_host("teams.microsoft.com", "teams.microsoft.com"));
		assert!(!matches_host("teams.microsoft.com", "team.microsoft.com"));
		assert!(!matches_host("teams.microsoft.com", "teams.microsoft.com.evil.net"));
	}

	#[test]
	fn static_origins() {
		let validator = OriginValidator::new();
		assert!(validator.is_trusted("https://teams.microsoft.com"));
		assert!(validator.is_trusted("https://tenant.teams.microsoft.com"));
		assert!(validator.is_trusted("https://local.teams.live.com:8080"));
		assert!(validator.is_trusted("https://TEAMS.microsoft.com"));
		assert!(!validator.is_trusted("https://local.teams.live.com:9090"));
		assert!(!validator.is_trusted("https://teams.microsoft.com.evil.net"));
	}

	#[test]
	fn https_only() {
		let validator = OriginValidator::new();
		assert!(!validator.is_trusted("http://teams.microsoft.com"));
		assert!(!validator.is_trusted("wss://teams.microsoft.com"));
		assert!(!validator.is_trusted("teams.microsoft.com"));
		assert!(!validator.is_trusted("null"));
		assert!(!validator.is_trusted(""));
	}

	#[test]
	fn additional_origins() {
		let mut validator = OriginValidator::new();
		assert!(!validator.is_trusted("https://app.contoso.com"));

		validator.extend(["https://app.contoso.com", "http://insecure.contoso.com", "https://*.fabrikam.com"]);
		validator.extend(["https://app.contoso.com"]);

		assert_eq!(validator.additional(), ["https://app.contoso.com", "https://*.fabrikam.com"]);
		assert!(validator.is_trusted("https://app.contoso.com"));
		assert!(validator.is_trusted("https://tabs.fabrikam.com"));
		assert!(!validator.is_trusted("https://fabrikam.com"));
		assert!(!validator.is_trusted("http://app.contoso.com"));
		assert!(!validator.is_trusted("https://insecure.contoso.com"));
	}
}
