//! Access/refresh token pair held for the lifetime of a signed-in session.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Credentials minted by sign-in and rotated by the refresh endpoint.
///
/// The access token is short-lived and attached to every request; the refresh token is
/// exchanged for a new access token when the API answers `401`. Sessions created through
/// the legacy single-token sign-in carry no refresh token, so a `401` ends them at once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
	/// Short-lived credential attached as `Authorization: Bearer <token>`.
	pub access_token: TokenSecret,
	/// Long-lived credential used to mint a new access token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
}
impl SessionTokens {
	/// Creates a pair from an access and a refresh token.
	pub fn new(access_token: impl Into<TokenSecret>, refresh_token: impl Into<TokenSecret>) -> Self {
		Self { access_token: access_token.into(), refresh_token: Some(refresh_token.into()) }
	}

	/// Creates a session that only carries an access token.
	pub fn access_only(access_token: impl Into<TokenSecret>) -> Self {
		Self { access_token: access_token.into(), refresh_token: None }
	}

	/// Returns `true` when the session can survive a `401` by refreshing.
	pub fn can_refresh(&self) -> bool {
		self.refresh_token.is_some()
	}
}
