//! Validated client configuration: API base URL, refresh and sign-in paths, refresh
//! timeout.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError};

/// Environment variable holding the API base URL.
pub const BASE_URL_VAR: &str = "WORKAREA_API_URL";
/// Environment variable holding the refresh timeout in whole seconds.
pub const REFRESH_TIMEOUT_VAR: &str = "WORKAREA_REFRESH_TIMEOUT_SECS";

/// Immutable configuration consumed by [`SessionClient`](crate::client::SessionClient).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// Base URL every request path is resolved against.
	pub base_url: Url,
	/// Path of the token refresh endpoint.
	pub refresh_path: String,
	/// Application path the session hook should navigate to once a session ends.
	pub sign_in_path: String,
	/// Upper bound for the refresh call; `None` waits indefinitely.
	pub refresh_timeout: Option<Duration>,
}
impl ClientConfig {
	/// Default refresh endpoint path.
	pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh-token";
	/// Default sign-in entry point.
	pub const DEFAULT_SIGN_IN_PATH: &str = "/signin";

	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Loads the configuration from [`BASE_URL_VAR`] and [`REFRESH_TIMEOUT_VAR`].
	pub fn from_env() -> Result<Self, ConfigError> {
		let raw = env::var(BASE_URL_VAR)
			.ok()
			.filter(|value| !value.trim().is_empty())
			.ok_or(ConfigError::MissingBaseUrl { var: BASE_URL_VAR })?;
		let base_url =
			Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { source })?;
		let mut builder = Self::builder(base_url);

		if let Ok(value) = env::var(REFRESH_TIMEOUT_VAR) {
			let secs = value
				.trim()
				.parse::<i64>()
				.map_err(|_| ConfigError::InvalidTimeout { var: REFRESH_TIMEOUT_VAR, value })?;

			builder = builder.refresh_timeout(Duration::seconds(secs));
		}

		builder.build()
	}

	/// Resolves an API path (optionally carrying a query string) against the base URL.
	///
	/// Paths are appended to the base URL's own path, so a base of
	/// `https://host/api/` and a path of `/task` yield `https://host/api/task`.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let base = self.base_url.as_str().trim_end_matches('/');
		let path = path.trim_start_matches('/');

		Url::parse(&format!("{base}/{path}")).map_err(|source| ConfigError::InvalidUrl { source })
	}

	/// Absolute URL of the refresh endpoint.
	pub fn refresh_url(&self) -> Result<Url, ConfigError> {
		self.endpoint(&self.refresh_path)
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Base URL every request path is resolved against.
	pub base_url: Url,
	/// Path of the token refresh endpoint.
	pub refresh_path: String,
	/// Sign-in entry point handed to the session hook.
	pub sign_in_path: String,
	/// Optional upper bound for the refresh call.
	pub refresh_timeout: Option<Duration>,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with the provided base URL and default paths.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			refresh_path: ClientConfig::DEFAULT_REFRESH_PATH.into(),
			sign_in_path: ClientConfig::DEFAULT_SIGN_IN_PATH.into(),
			refresh_timeout: None,
		}
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the sign-in entry point.
	pub fn sign_in_path(mut self, path: impl Into<String>) -> Self {
		self.sign_in_path = path.into();

		self
	}

	/// Bounds the refresh call.
	pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
		self.refresh_timeout = Some(timeout);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		if !matches!(self.base_url.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedScheme { scheme: self.base_url.scheme().into() });
		}
		if self.base_url.cannot_be_a_base() {
			return Err(ConfigError::CannotBeBase { url: self.base_url.to_string() });
		}

		validate_path("refresh", &self.refresh_path)?;
		validate_path("sign-in", &self.sign_in_path)?;

		if let Some(timeout) = self.refresh_timeout
			&& !timeout.is_positive()
		{
			return Err(ConfigError::NonPositiveTimeout);
		}

		Ok(ClientConfig {
			base_url: self.base_url,
			refresh_path: self.refresh_path,
			sign_in_path: self.sign_in_path,
			refresh_timeout: self.refresh_timeout,
		})
	}
}

fn validate_path(field: &'static str, path: &str) -> Result<(), ConfigError> {
	if path.starts_with('/') {
		Ok(())
	} else {
		Err(ConfigError::InvalidPath { field, path: path.into() })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Fixture URL should parse.")
	}

	#[test]
	fn builder_applies_defaults() {
		let config = ClientConfig::builder(url("https://api.example.com"))
			.build()
			.expect("Default configuration should validate.");

		assert_eq!(config.refresh_path, "/auth/refresh-token");
		assert_eq!(config.sign_in_path, "/signin");
		assert_eq!(config.refresh_timeout, None);
		assert_eq!(
			config.refresh_url().expect("Refresh URL should resolve.").as_str(),
			"https://api.example.com/auth/refresh-token"
		);
	}

	#[test]
	fn endpoint_keeps_base_path_and_query() {
		let config = ClientConfig::builder(url("https://api.example.com/v1/"))
			.build()
			.expect("Configuration with a base path should validate.");

		assert_eq!(
			config.endpoint("/task?page=2").expect("Endpoint should resolve.").as_str(),
			"https://api.example.com/v1/task?page=2"
		);
	}

	#[test]
	fn builder_rejects_invalid_values() {
		let err = ClientConfig::builder(url("ftp://files.example.com"))
			.build()
			.expect_err("Non-HTTP schemes should be rejected.");

		assert!(matches!(err, ConfigError::UnsupportedScheme { .. }));

		let err = ClientConfig::builder(url("https://api.example.com"))
			.refresh_path("auth/refresh-token")
			.build()
			.expect_err("Relative refresh paths should be rejected.");

		assert!(matches!(err, ConfigError::InvalidPath { field: "refresh", .. }));

		let err = ClientConfig::builder(url("https://api.example.com"))
			.refresh_timeout(Duration::ZERO)
			.build()
			.expect_err("Zero timeouts should be rejected.");

		assert!(matches!(err, ConfigError::NonPositiveTimeout));
	}
}
