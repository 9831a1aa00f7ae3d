//! Session-aware API client: bearer credentials, refresh-and-replay on `401`, and status
//! classification.
//!
//! [`SessionClient::send`] is the single call surface every typed endpoint goes through.
//! A request is sent with the stored access token; when the API answers `401` the client
//! enters the current refresh episode of its [`RefreshCoordinator`], either performing the
//! one refresh call itself or waiting for the caller that does, and then replays the
//! request exactly once with the new token. Replays that are rejected again surface as
//! [`Error::Unauthorized`]; they never start a second episode. A `401` that arrives after
//! its episode already settled replays with that episode's token, or fails with
//! [`RefreshFailureKind::SessionEnded`] when the episode ended the session.

// crates.io
use ::http::{Method, StatusCode};
// self
use crate::{
	_prelude::*,
	auth::{SessionTokens, TokenSecret},
	config::ClientConfig,
	error::{INTERNAL_SERVER_ERROR, RefreshFailure, RefreshFailureKind, TransportError},
	http::{ApiRequest, ApiResponse, HttpTransport},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	refresh::{Epoch, RefreshCoordinator, RefreshMetrics, RefreshTicket},
	store::SessionStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestSessionClient = SessionClient<ReqwestTransport>;

/// Callback invoked once a failed refresh has ended the session.
///
/// This is where an application navigates back to its sign-in entry point. The hook runs
/// after both tokens have been cleared and before queued callers are rejected.
pub trait SessionHook
where
	Self: Send + Sync,
{
	/// Called with the configured sign-in path and the failure that ended the session.
	fn session_terminated(&self, sign_in_path: &str, failure: &RefreshFailure);
}
impl<F> SessionHook for F
where
	F: Fn(&str, &RefreshFailure) + Send + Sync,
{
	fn session_terminated(&self, sign_in_path: &str, failure: &RefreshFailure) {
		self(sign_in_path, failure)
	}
}

/// Hook that only records the termination in the observability pipeline.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSessionHook;
impl SessionHook for NoopSessionHook {
	fn session_terminated(&self, _sign_in_path: &str, _failure: &RefreshFailure) {}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
	refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
	access_token: TokenSecret,
}

/// Authenticated client shared by every page-level caller.
///
/// Cloning is cheap; all clones share the transport, the store, and the refresh
/// coordinator, so concurrent requests from any clone join the same refresh episode.
pub struct SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound request, including the refresh call.
	pub transport: Arc<T>,
	/// Persistent home of the access/refresh token pair.
	pub store: Arc<dyn SessionStore>,
	/// Base URL, refresh endpoint, and sign-in path.
	pub config: Arc<ClientConfig>,
	hook: Arc<dyn SessionHook>,
	coordinator: Arc<RefreshCoordinator>,
}
impl<T> SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client over the caller-provided transport.
	pub fn with_transport(
		config: ClientConfig,
		store: Arc<dyn SessionStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			config: Arc::new(config),
			hook: Arc::new(NoopSessionHook),
			coordinator: Default::default(),
		}
	}

	/// Sets the hook invoked when a failed refresh ends the session.
	pub fn with_session_hook(mut self, hook: impl 'static + SessionHook) -> Self {
		self.hook = Arc::new(hook);

		self
	}

	/// Refresh-episode state shared by every clone of this client.
	pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
		&self.coordinator
	}

	/// Refresh counters.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		self.coordinator.metrics()
	}

	/// Returns the stored session, if any.
	pub async fn session(&self) -> Result<Option<SessionTokens>> {
		Ok(self.store.load_session().await?)
	}

	/// Persists a token pair, typically right after sign-in.
	pub async fn store_session(&self, tokens: &SessionTokens) -> Result<()> {
		Ok(self.store.save_session(tokens).await?)
	}

	/// Forgets the session by clearing every stored credential.
	pub async fn logout(&self) -> Result<()> {
		Ok(self.store.clear_session().await?)
	}

	/// Builds a request for `path` resolved against the configured base URL.
	pub fn request(&self, method: Method, path: &str) -> Result<ApiRequest> {
		Ok(ApiRequest::new(method, self.config.endpoint(path)?))
	}

	/// Sends `request`, refreshing the session and replaying once if the API answers `401`.
	///
	/// Successful (non-error) responses are returned as-is; error statuses are classified
	/// into [`Error::Unauthorized`], [`Error::Server`] (message normalized to
	/// [`INTERNAL_SERVER_ERROR`]), or [`Error::Client`] (passed through unmodified).
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: FlowKind = FlowKind::Request;

		let span = FlowSpan::new(KIND, "send");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.send_with_replay(request.with_json_headers())).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// `GET`s `path` and decodes the JSON response.
	pub async fn get<R>(&self, path: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.send(self.request(Method::GET, path)?).await?.json()
	}

	/// `POST`s `body` to `path` and decodes the JSON response.
	pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.send(self.request(Method::POST, path)?.with_json(body)?).await?.json()
	}

	/// `PUT`s `body` to `path` and decodes the JSON response.
	pub async fn put<B, R>(&self, path: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.send(self.request(Method::PUT, path)?.with_json(body)?).await?.json()
	}

	/// `DELETE`s `path` and decodes the JSON response.
	pub async fn delete<R>(&self, path: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.send(self.request(Method::DELETE, path)?).await?.json()
	}

	/// `DELETE`s `path` with a JSON body and decodes the JSON response.
	pub async fn delete_with_body<B, R>(&self, path: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.send(self.request(Method::DELETE, path)?.with_json(body)?).await?.json()
	}

	/// Joins (or starts) the current refresh episode and returns the resulting access token.
	///
	/// Concurrent callers share one refresh call. On failure both tokens are cleared and
	/// the session hook runs before the error is returned.
	pub async fn refresh_session(&self) -> Result<TokenSecret> {
		self.join_episode(self.coordinator.epoch(), None).await
	}

	async fn send_with_replay(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: FlowKind = FlowKind::Replay;

		if request.anonymous {
			let response = self.transport.execute(request).await?;

			return classify(response);
		}

		let sent = self.coordinator.epoch();
		let sent_with = self.store.access_token().await?;
		let mut first = request.clone();

		if let Some(token) = &sent_with {
			first.authorize(token)?;
		}

		let response = self.transport.execute(first).await?;

		if response.status != StatusCode::UNAUTHORIZED {
			return classify(response);
		}

		let token = self.join_episode(sent, sent_with.as_ref()).await?;
		let mut replay = request;

		replay.authorize(&token)?;
		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = FlowSpan::new(KIND, "send")
			.instrument(self.transport.execute(replay))
			.await
			.map_err(Error::from)
			.and_then(classify);

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Returns the token to replay with after a `401` on a request sent at `sent` with
	/// `sent_with`, performing the refresh call when this caller leads the episode.
	async fn join_episode(
		&self,
		sent: Epoch,
		sent_with: Option<&TokenSecret>,
	) -> Result<TokenSecret> {
		let lease = match self.coordinator.begin(sent, sent_with) {
			RefreshTicket::Leader(lease) => lease,
			RefreshTicket::Follower(pending) => return pending.await.map_err(Error::from),
			RefreshTicket::Settled(Ok(token)) => return Ok(token),
			// That episode already cleared the session and ran the hook.
			RefreshTicket::Settled(Err(_)) => return Err(RefreshFailure::session_ended().into()),
		};
		let outcome = match self.call_refresh_endpoint().await {
			Ok(token) => self.store.save_access_token(&token).await.map(|()| token).map_err(|e| {
				RefreshFailure::new(
					RefreshFailureKind::Storage,
					format!("the new access token could not be stored: {e}"),
				)
			}),
			Err(failure) => Err(failure),
		};

		if let Err(failure) = &outcome {
			self.terminate_session(failure).await;
		}

		lease.settle(outcome.clone());

		outcome.map_err(Error::from)
	}

	async fn call_refresh_endpoint(&self) -> Result<TokenSecret, RefreshFailure> {
		const KIND: FlowKind = FlowKind::Refresh;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = FlowSpan::new(KIND, "call_refresh_endpoint")
			.instrument(async {
				let refresh_token = self
					.store
					.refresh_token()
					.await
					.map_err(|e| RefreshFailure::new(RefreshFailureKind::Storage, e.to_string()))?
					.ok_or_else(RefreshFailure::missing_refresh_token)?;
				let url = self.config.refresh_url().map_err(|e| {
					RefreshFailure::new(RefreshFailureKind::Transport, e.to_string())
				})?;
				let mut request = ApiRequest::post(url)
					.with_json(&RefreshRequest { refresh_token: refresh_token.expose() })
					.map_err(|e| {
						RefreshFailure::new(RefreshFailureKind::Transport, e.to_string())
					})?
					.with_json_headers();

				if let Some(timeout) = self.config.refresh_timeout {
					request = request.with_timeout(timeout);
				}

				let response = self.transport.execute(request).await.map_err(|e| match e {
					TransportError::Timeout => RefreshFailure::new(
						RefreshFailureKind::Transport,
						"the refresh call timed out",
					),
					other => RefreshFailure::new(RefreshFailureKind::Transport, other.to_string()),
				})?;

				if !response.is_success() {
					let status = response.status.as_u16();
					let reason = if status >= 500 {
						INTERNAL_SERVER_ERROR.to_owned()
					} else {
						response.error_message()
					};

					return Err(RefreshFailure::new(RefreshFailureKind::Rejected, reason)
						.with_status(status));
				}

				response
					.json::<RefreshResponse>()
					.map(|body| body.access_token)
					.map_err(|e| {
						RefreshFailure::new(RefreshFailureKind::MalformedResponse, e.to_string())
					})
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn terminate_session(&self, failure: &RefreshFailure) {
		// Clearing is best effort; the session is over either way.
		let _ = self.store.clear_session().await;

		obs::session_terminated_event(failure, &self.config.sign_in_path);
		self.hook.session_terminated(&self.config.sign_in_path, failure);
	}
}
#[cfg(feature = "reqwest")]
impl SessionClient<ReqwestTransport> {
	/// Creates a client backed by a default reqwest transport.
	pub fn new(config: ClientConfig, store: Arc<dyn SessionStore>) -> Self {
		Self::with_transport(config, store, ReqwestTransport::default())
	}
}
impl<T> Clone for SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			hook: self.hook.clone(),
			coordinator: self.coordinator.clone(),
		}
	}
}
impl<T> Debug for SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("coordinator", &self.coordinator)
			.finish()
	}
}

/// Maps a final response onto the client's error taxonomy.
fn classify(response: ApiResponse) -> Result<ApiResponse> {
	let status = response.status;

	if status.as_u16() >= 500 {
		return Err(Error::Server { status: status.as_u16(), message: INTERNAL_SERVER_ERROR.into() });
	}
	if status == StatusCode::UNAUTHORIZED {
		return Err(Error::Unauthorized { message: response.error_message() });
	}
	if status.is_client_error() {
		return Err(Error::Client {
			status: status.as_u16(),
			message: response.error_message(),
			body: response.json_value(),
		});
	}

	Ok(response)
}
