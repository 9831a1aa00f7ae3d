//! Transport primitives for API calls.
//!
//! The module exposes [`HttpTransport`] alongside the [`ApiRequest`] and [`ApiResponse`]
//! value objects so downstream crates can plug in a custom HTTP stack (or a scripted fake
//! in tests) without touching the session logic. Transports only move bytes: they never
//! inspect status codes, attach credentials, or retry. All of that lives in
//! [`SessionClient`](crate::client::SessionClient).

// std
use std::ops::Deref;
// crates.io
use ::http::{
	HeaderMap, HeaderValue, Method, StatusCode,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderName},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, TransportError},
};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing a single API request.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by every
/// clone of a [`SessionClient`](crate::client::SessionClient), and the returned future must
/// be `Send` so callers can spawn requests onto multi-threaded executors. Any status code,
/// including 4xx and 5xx, is a successful transport outcome; only failures to obtain a
/// response at all map to [`TransportError`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with the full response.
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// Outbound request description: method, absolute URL, headers, optional JSON body.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Request headers.
	pub headers: HeaderMap,
	/// JSON payload, serialized by the transport.
	pub body: Option<serde_json::Value>,
	/// Per-request timeout enforced by the transport.
	pub timeout: Option<Duration>,
	/// Sent without credentials; a `401` is surfaced instead of starting a refresh.
	pub anonymous: bool,
}
impl ApiRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: None, timeout: None, anonymous: false }
	}

	/// Shorthand for a `GET` request.
	pub fn get(url: Url) -> Self {
		Self::new(Method::GET, url)
	}

	/// Shorthand for a `POST` request.
	pub fn post(url: Url) -> Self {
		Self::new(Method::POST, url)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(url: Url) -> Self {
		Self::new(Method::PUT, url)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(url: Url) -> Self {
		Self::new(Method::DELETE, url)
	}

	/// Serializes `body` as the JSON payload.
	pub fn with_json<B>(mut self, body: &B) -> Result<Self>
	where
		B: ?Sized + Serialize,
	{
		let value = serde_json::to_value(body).map_err(|e| {
			Error::invalid_input(format!("request body cannot be serialized: {e}"))
		})?;

		self.body = Some(value);

		Ok(self)
	}

	/// Adds or replaces a header.
	pub fn with_header(mut self, name: HeaderName, value: &str) -> Result<Self> {
		let value = HeaderValue::from_str(value)
			.map_err(|e| ConfigError::from(::http::Error::from(e)))?;

		self.headers.insert(name, value);

		Ok(self)
	}

	/// Sets a per-request timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Marks the request as credential-free (sign-in, sign-up, account activation).
	pub fn anonymous(mut self) -> Self {
		self.anonymous = true;

		self
	}

	/// Replaces the `Authorization` header with a bearer credential.
	pub fn authorize(&mut self, token: &TokenSecret) -> Result<()> {
		let mut value = HeaderValue::from_str(&token.bearer())
			.map_err(|e| ConfigError::from(::http::Error::from(e)))?;

		value.set_sensitive(true);
		self.headers.insert(AUTHORIZATION, value);

		Ok(())
	}

	/// Returns the bearer token currently attached, if any.
	pub fn bearer_token(&self) -> Option<&str> {
		self.headers.get(AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ")
	}

	/// Fills in the JSON content negotiation headers unless the caller set them.
	pub(crate) fn with_json_headers(mut self) -> Self {
		let json = HeaderValue::from_static("application/json");

		self.headers.entry(ACCEPT).or_insert_with(|| json.clone());

		if self.body.is_some() {
			self.headers.entry(CONTENT_TYPE).or_insert(json);
		}

		self
	}
}

/// Response captured by a transport.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response with the given status and body.
	pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: HeaderMap::new(), body: body.into() }
	}

	/// Creates a response carrying a JSON body.
	pub fn json_body(status: StatusCode, body: &serde_json::Value) -> Self {
		let mut response = Self::new(status, body.to_string());

		response.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		response
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Decodes the body into `T`, reporting the failing JSON path on error.
	///
	/// An empty body decodes as JSON `null`, so `()` and `Option<T>` targets accept
	/// `204 No Content` answers.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let bytes: &[u8] = if self.body.iter().all(u8::is_ascii_whitespace) {
			b"null"
		} else {
			&self.body
		};
		let mut de = serde_json::Deserializer::from_slice(bytes);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| Error::Decode { source, status: Some(self.status.as_u16()) })
	}

	/// Returns the body as loosely typed JSON, or [`serde_json::Value::Null`] when it is not
	/// JSON.
	pub fn json_value(&self) -> serde_json::Value {
		serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
	}

	/// Extracts the API's error message: the `error` field, then `message`, then the raw
	/// body text.
	pub fn error_message(&self) -> String {
		let value = self.json_value();

		["error", "message"]
			.iter()
			.find_map(|field| match value.get(field) {
				Some(serde_json::Value::String(text)) => Some(text.clone()),
				Some(serde_json::Value::Array(items)) => Some(
					items
						.iter()
						.filter_map(serde_json::Value::as_str)
						.collect::<Vec<_>>()
						.join(", "),
				),
				_ => None,
			})
			.unwrap_or_else(|| String::from_utf8_lossy(&self.body).trim().to_owned())
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	async fn send(client: ReqwestClient, request: ApiRequest) -> Result<ApiResponse, TransportError> {
		let mut builder = client.request(request.method, request.url).headers(request.headers);

		if let Some(body) = &request.body {
			builder = builder.body(body.to_string());
		}
		if let Some(timeout) = request.timeout.and_then(|t| std::time::Duration::try_from(t).ok())
		{
			builder = builder.timeout(timeout);
		}

		let response = builder.send().await?;
		let status = response.status();
		let headers = response.headers().to_owned();
		let body = response.bytes().await?.to_vec();

		Ok(ApiResponse { status, headers, body })
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Debug for ReqwestTransport {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ReqwestTransport(..)")
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(Self::send(self.0.clone(), request))
	}
}
