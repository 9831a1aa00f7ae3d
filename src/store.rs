//! Key/value persistence for session credentials and the built-in store backends.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{SessionTokens, TokenSecret},
};

/// Boxed future returned by [`SessionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for session credentials.
///
/// Backends only deal in string values under a fixed set of keys; the typed view lives in
/// the inherent helpers on `dyn SessionStore`.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`, if present.
	fn get(&self, key: StorageKey) -> StoreFuture<'_, Option<String>>;

	/// Stores or replaces the value under `key`.
	fn set(&self, key: StorageKey, value: String) -> StoreFuture<'_, ()>;

	/// Removes the value under `key`; removing a missing key is not an error.
	fn remove(&self, key: StorageKey) -> StoreFuture<'_, ()>;
}
impl dyn SessionStore {
	/// Returns the stored access token, falling back to the legacy combined key.
	pub async fn access_token(&self) -> Result<Option<TokenSecret>, StoreError> {
		if let Some(value) = self.get(StorageKey::AccessToken).await? {
			return Ok(Some(TokenSecret::new(value)));
		}

		Ok(self.get(StorageKey::LegacyToken).await?.map(TokenSecret::new))
	}

	/// Returns the stored refresh token.
	pub async fn refresh_token(&self) -> Result<Option<TokenSecret>, StoreError> {
		Ok(self.get(StorageKey::RefreshToken).await?.map(TokenSecret::new))
	}

	/// Loads the full session, if an access token is stored.
	pub async fn load_session(&self) -> Result<Option<SessionTokens>, StoreError> {
		let Some(access_token) = self.access_token().await? else {
			return Ok(None);
		};
		let refresh_token = self.refresh_token().await?;

		Ok(Some(SessionTokens { access_token, refresh_token }))
	}

	/// Persists a freshly minted access token, leaving the refresh token untouched.
	pub async fn save_access_token(&self, token: &TokenSecret) -> Result<(), StoreError> {
		self.set(StorageKey::AccessToken, token.expose().to_owned()).await
	}

	/// Persists a whole session, replacing whatever was stored before.
	pub async fn save_session(&self, tokens: &SessionTokens) -> Result<(), StoreError> {
		self.set(StorageKey::AccessToken, tokens.access_token.expose().to_owned()).await?;

		match &tokens.refresh_token {
			Some(refresh) => self.set(StorageKey::RefreshToken, refresh.expose().to_owned()).await?,
			None => self.remove(StorageKey::RefreshToken).await?,
		}

		self.remove(StorageKey::LegacyToken).await
	}

	/// Removes every credential key.
	pub async fn clear_session(&self) -> Result<(), StoreError> {
		for key in StorageKey::ALL {
			self.remove(key).await?;
		}

		Ok(())
	}
}

/// Keys under which session credentials are persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKey {
	/// Current access token.
	#[serde(rename = "ACCESS_TOKEN")]
	AccessToken,
	/// Current refresh token.
	#[serde(rename = "REFRESH_TOKEN")]
	RefreshToken,
	/// Combined token written by the single-token sign-in flow.
	#[serde(rename = "TOKEN")]
	LegacyToken,
}
impl StorageKey {
	/// Every key, in a stable order.
	pub const ALL: [Self; 3] = [Self::AccessToken, Self::RefreshToken, Self::LegacyToken];

	/// Returns the persisted key name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::AccessToken => "ACCESS_TOKEN",
			Self::RefreshToken => "REFRESH_TOKEN",
			Self::LegacyToken => "TOKEN",
		}
	}
}
impl Display for StorageKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
