//! Session-aware client for the workarea to-do API: bearer tokens on every request,
//! single-flight access-token refresh with replay of every request caught in the refresh
//! episode, and typed account/task/workarea endpoints on top.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod refresh;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::SessionTokens,
		client::{ReqwestSessionClient, SessionClient},
		config::ClientConfig,
		http::ReqwestTransport,
		store::{MemoryStore, SessionStore},
	};

	/// Builds a [`ClientConfig`] pointing at the provided mock server base URL.
	pub fn test_config(base_url: &str) -> ClientConfig {
		ClientConfig::builder(
			Url::parse(base_url).expect("Mock server base URL should parse successfully."),
		)
		.build()
		.expect("Test client configuration should validate.")
	}

	/// Constructs a reqwest-backed [`SessionClient`] over an in-memory store seeded with the
	/// provided token pair.
	pub async fn build_reqwest_test_client(
		base_url: &str,
		tokens: Option<SessionTokens>,
	) -> (ReqwestSessionClient, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn SessionStore> = store_backend.clone();
		let client = SessionClient::with_transport(
			test_config(base_url),
			store,
			ReqwestTransport::default(),
		);

		if let Some(tokens) = tokens {
			client.store_session(&tokens).await.expect("Seeding test session tokens should succeed.");
		}

		(client, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use ::http as http_types;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
