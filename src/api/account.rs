//! Account endpoints: sign-in, sign-up, account activation, and the signed-in profile.

// crates.io
use ::http::Method;
use base64::{Engine, engine::general_purpose::STANDARD};
// self
use crate::{
	_prelude::*,
	api::EntityId,
	auth::{SessionTokens, TokenSecret},
	client::SessionClient,
	http::HttpTransport,
};

/// Signed-in user profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	/// User identifier.
	pub id: EntityId,
	/// Display name.
	#[serde(default)]
	pub name: Option<String>,
	/// Unique handle used for workarea invitations.
	#[serde(default)]
	pub username: Option<String>,
	/// Contact email.
	pub email: String,
	/// Avatar location or inline image.
	#[serde(default, alias = "imageURL")]
	pub avatar_url: Option<String>,
	/// Remaining fields, passed through unmodified.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Credentials posted to the sign-in endpoint.
#[derive(Clone, Serialize)]
pub struct SignIn {
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: String,
}
impl Debug for SignIn {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignIn").field("email", &self.email).finish_non_exhaustive()
	}
}

/// Registration form posted to the sign-up endpoint.
#[derive(Clone, Serialize)]
pub struct SignUp {
	/// Display name.
	pub name: String,
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: String,
}
impl Debug for SignUp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignUp")
			.field("name", &self.name)
			.field("email", &self.email)
			.finish_non_exhaustive()
	}
}

/// Activation code sent to a freshly registered account.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateAccount {
	/// Account being activated.
	pub user_id: EntityId,
	/// Code delivered out of band.
	pub code: String,
}

/// Profile changes; at least one field must be set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
	/// New display name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// New avatar, base64 encoded.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub avatar_url: Option<String>,
}
impl UpdateProfile {
	/// Sets a new display name; blank names are ignored.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		let name = name.into();

		self.name = (!name.trim().is_empty()).then_some(name);

		self
	}

	/// Sets a new avatar from raw image bytes.
	pub fn with_avatar_bytes(mut self, bytes: &[u8]) -> Self {
		self.avatar_url = (!bytes.is_empty()).then(|| STANDARD.encode(bytes));

		self
	}

	/// Returns `true` when the update would change nothing.
	pub fn is_empty(&self) -> bool {
		self.name.is_none() && self.avatar_url.is_none()
	}
}

/// Token payload returned by sign-in and sign-up, in either the single-token or the
/// access/refresh pair shape.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionGrant {
	#[serde(alias = "token")]
	access_token: TokenSecret,
	#[serde(default)]
	refresh_token: Option<TokenSecret>,
}
impl From<SessionGrant> for SessionTokens {
	fn from(grant: SessionGrant) -> Self {
		Self { access_token: grant.access_token, refresh_token: grant.refresh_token }
	}
}

impl<T> SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Signs in and stores the returned session.
	///
	/// Wrong credentials surface as [`Error::Unauthorized`] carrying the server's message;
	/// they never start a refresh.
	pub async fn sign_in(&self, credentials: &SignIn) -> Result<SessionTokens> {
		self.open_session("/user/signin", credentials).await
	}

	/// Registers an account and stores the returned session.
	pub async fn sign_up(&self, registration: &SignUp) -> Result<SessionTokens> {
		self.open_session("/user/signup", registration).await
	}

	/// Activates an account with the code sent after sign-up.
	pub async fn activate_account(&self, activation: &ActivateAccount) -> Result<()> {
		let request = self.request(Method::POST, "/auth/active-account")?.with_json(activation)?;

		self.send(request).await?;

		Ok(())
	}

	/// Returns the signed-in user, or `None` when no session is stored or the API rejects
	/// it.
	///
	/// Unlike [`current_user`](Self::current_user) this never refreshes: it answers "is the
	/// stored token still good" without side effects on the session.
	pub async fn has_logged_in(&self) -> Result<Option<User>> {
		let Some(token) = self.store.access_token().await? else {
			return Ok(None);
		};
		let mut request = self.request(Method::GET, "/user/hasloggedin")?.anonymous();

		request.authorize(&token)?;

		match self.send(request).await {
			Ok(response) => response.json().map(Some),
			Err(Error::Unauthorized { .. } | Error::Client { .. }) => Ok(None),
			Err(e) => Err(e),
		}
	}

	/// Fetches the signed-in user's profile.
	pub async fn current_user(&self) -> Result<User> {
		self.get("/user").await
	}

	/// Updates the signed-in user's name and/or avatar.
	pub async fn update_profile(&self, update: &UpdateProfile) -> Result<User> {
		if update.is_empty() {
			return Err(Error::invalid_input("a profile update needs a name or an avatar"));
		}

		self.put("/user", update).await
	}

	async fn open_session<B>(&self, path: &str, body: &B) -> Result<SessionTokens>
	where
		B: Serialize,
	{
		let request = self.request(Method::POST, path)?.with_json(body)?.anonymous();
		let tokens = SessionTokens::from(self.send(request).await?.json::<SessionGrant>()?);

		self.store_session(&tokens).await?;

		Ok(tokens)
	}
}
