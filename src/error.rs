//! Client-level error types shared by the transport, refresh coordinator, stores, and API
//! wrappers.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Message surfaced for every response with a 5xx status; raw server bodies are dropped.
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Session store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeouts).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The refresh endpoint failed; the session has been terminated.
	#[error(transparent)]
	RefreshFailed(#[from] RefreshFailure),

	/// Request stayed unauthorized after the single allowed replay.
	#[error("Request is unauthorized: {message}.")]
	Unauthorized {
		/// Server-supplied message, when present.
		message: String,
	},
	/// Server-side failure (status 500 and above); the message is always normalized.
	#[error("{message}")]
	Server {
		/// HTTP status code.
		status: u16,
		/// Normalized message, see [`INTERNAL_SERVER_ERROR`].
		message: String,
	},
	/// Client-side failure (4xx other than 401), passed through unmodified.
	#[error("Request failed with status {status}: {message}.")]
	Client {
		/// HTTP status code.
		status: u16,
		/// The `error` (or `message`) field of the body, or the raw body text.
		message: String,
		/// Raw JSON body, [`serde_json::Value::Null`] when the body was not JSON.
		body: serde_json::Value,
	},
	/// Response body could not be decoded into the requested type.
	#[error("Response body could not be decoded.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: Option<u16>,
	},
	/// Caller-supplied input was rejected before any request was made.
	#[error("Invalid input: {reason}.")]
	InvalidInput {
		/// Reason string.
		reason: String,
	},
}
impl Error {
	/// Returns the HTTP status tied to the error, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Unauthorized { .. } => Some(401),
			Self::Server { status, .. } | Self::Client { status, .. } => Some(*status),
			Self::Decode { status, .. } => *status,
			Self::RefreshFailed(failure) => failure.status,
			_ => None,
		}
	}

	/// Returns `true` when a failed refresh ended the session and the caller was sent to
	/// sign-in.
	///
	/// An [`Abandoned`](RefreshFailureKind::Abandoned) episode leaves the stored tokens in
	/// place, so it does not count.
	pub fn is_session_terminated(&self) -> bool {
		matches!(self, Self::RefreshFailed(failure) if failure.kind != RefreshFailureKind::Abandoned)
	}

	pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
		Self::InvalidInput { reason: reason.into() }
	}
}

/// Why a refresh episode failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshFailureKind {
	/// No refresh token was stored when the 401 arrived.
	MissingRefreshToken,
	/// The session store could not read the refresh token or keep the new access token.
	Storage,
	/// The refresh endpoint answered with a non-success status.
	Rejected,
	/// The refresh call never produced a response.
	Transport,
	/// The refresh endpoint answered without a usable access token.
	MalformedResponse,
	/// The future driving the refresh was dropped before it settled.
	Abandoned,
	/// An earlier episode already ended the session while the request was in flight.
	SessionEnded,
}
impl RefreshFailureKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::MissingRefreshToken => "missing_refresh_token",
			Self::Storage => "storage",
			Self::Rejected => "rejected",
			Self::Transport => "transport",
			Self::MalformedResponse => "malformed_response",
			Self::Abandoned => "abandoned",
			Self::SessionEnded => "session_ended",
		}
	}
}
impl Display for RefreshFailureKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Refresh episode failure, fanned out to the triggering caller and every queued caller.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Access token refresh failed ({kind}): {reason}.")]
pub struct RefreshFailure {
	/// Failure classification.
	pub kind: RefreshFailureKind,
	/// Human-readable reason.
	pub reason: String,
	/// HTTP status returned by the refresh endpoint, when available.
	pub status: Option<u16>,
}
impl RefreshFailure {
	/// Creates a failure of the given kind.
	pub fn new(kind: RefreshFailureKind, reason: impl Into<String>) -> Self {
		Self { kind, reason: reason.into(), status: None }
	}

	/// Attaches the HTTP status returned by the refresh endpoint.
	pub fn with_status(mut self, status: u16) -> Self {
		self.status = Some(status);

		self
	}

	pub(crate) fn missing_refresh_token() -> Self {
		Self::new(RefreshFailureKind::MissingRefreshToken, "no refresh token is stored")
	}

	pub(crate) fn session_ended() -> Self {
		Self::new(RefreshFailureKind::SessionEnded, "the session was cleared by an earlier refresh")
	}

	pub(crate) fn abandoned() -> Self {
		Self::new(RefreshFailureKind::Abandoned, "the refresh call was dropped before it settled")
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] ::http::Error),
	/// Required environment variable is unset.
	#[error("Environment variable `{var}` is not set.")]
	MissingBaseUrl {
		/// Variable name.
		var: &'static str,
	},
	/// Base URL or request path cannot be parsed.
	#[error("URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than http or https.
	#[error("Base URL must use http or https, got `{scheme}`.")]
	UnsupportedScheme {
		/// Offending scheme.
		scheme: String,
	},
	/// Base URL cannot have paths joined onto it.
	#[error("Base URL `{url}` cannot be used as a base.")]
	CannotBeBase {
		/// Offending URL.
		url: String,
	},
	/// A configured path is not absolute.
	#[error("The {field} path must start with `/`: {path}.")]
	InvalidPath {
		/// Which path failed validation.
		field: &'static str,
		/// Offending value.
		path: String,
	},
	/// Refresh timeout is zero or negative.
	#[error("The refresh timeout must be positive.")]
	NonPositiveTimeout,
	/// Timeout environment variable is not a whole number of seconds.
	#[error("Environment variable `{var}` must be a whole number of seconds, got `{value}`.")]
	InvalidTimeout {
		/// Variable name.
		var: &'static str,
		/// Offending value.
		value: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request exceeded its timeout.
	#[error("Request timed out.")]
	Timeout,
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::network(e) }
	}
}
