//! Demonstrates a session against a mocked workarea API: sign in, let the access token expire,
//! and watch two concurrent requests share one refresh before being replayed.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use workarea_client::{
	api::{SignIn, TaskQuery},
	client::SessionClient,
	config::ClientConfig,
	error::RefreshFailure,
	store::{MemoryStore, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let sign_in = server
		.mock_async(|when, then| {
			when.method(POST).path("/user/signin");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"accessToken\":\"expired-access\",\"refreshToken\":\"demo-refresh\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"accessToken\":\"fresh-access\"}");
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).header("authorization", "Bearer expired-access");
			then.status(401).header("content-type", "application/json").body("{\"error\":\"jwt expired\"}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/task").header("authorization", "Bearer fresh-access");
			then.status(200).header("content-type", "application/json").body(
				"{\"total\":1,\"tasks\":[{\"id\":1,\"title\":\"Try the demo\",\"status\":\"PENDING\",\"createdAt\":\"2025-01-01T09:00:00Z\"}]}",
			);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/workarea").header("authorization", "Bearer fresh-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"id\":7,\"name\":\"Household\"}]");
		})
		.await;

	let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::default());
	let config = ClientConfig::builder(Url::parse(&server.base_url())?).build()?;
	let client = SessionClient::new(config, store).with_session_hook(
		|sign_in_path: &str, failure: &RefreshFailure| {
			eprintln!("Session ended ({failure}); redirecting to {sign_in_path}.");
		},
	);

	client
		.sign_in(&SignIn { email: "demo@example.com".into(), password: "demo-password".into() })
		.await?;

	let task_query = TaskQuery::default();
	let (tasks, workareas) = tokio::join!(client.list_tasks(&task_query), client.list_workareas());
	let (tasks, workareas) = (tasks?, workareas?);

	println!("Fetched {} task(s) over {} page(s).", tasks.tasks.len(), tasks.total_pages());
	println!("Fetched {} workarea(s).", workareas.len());
	println!("Refresh episodes: {}.", client.refresh_metrics().attempts());

	sign_in.assert_async().await;
	refresh.assert_async().await;

	Ok(())
}
