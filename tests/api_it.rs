#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use workarea_client::{
	_preludet::*,
	api::{
		ActivateAccount, EntityId, NewTask, SignIn, SignUp, TaskQuery, TaskStatus, UpdateProfile,
		WorkareaRole,
	},
	auth::SessionTokens,
	store::StorageKey,
};

fn session() -> Option<SessionTokens> {
	Some(SessionTokens::new("A1", "R1"))
}

#[tokio::test]
async fn sign_in_stores_the_returned_session() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url(), None).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/user/signin")
				.json_body(serde_json::json!({ "email": "ana@example.com", "password": "hunter2" }));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"accessToken\":\"A1\",\"refreshToken\":\"R1\"}");
		})
		.await;
	let tokens = client
		.sign_in(&SignIn { email: "ana@example.com".into(), password: "hunter2".into() })
		.await
		.expect("Sign-in should succeed.");

	mock.assert_async().await;

	assert_eq!(tokens, SessionTokens::new("A1", "R1"));
	assert_eq!(store.peek(StorageKey::AccessToken).as_deref(), Some("A1"));
	assert_eq!(store.peek(StorageKey::RefreshToken).as_deref(), Some("R1"));
}

#[tokio::test]
async fn rejected_sign_in_reports_message_without_refreshing() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url(), None).await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/user/signin");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"Invalid credentials\"}");
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(200).header("content-type", "application/json").body("{\"accessToken\":\"A2\"}");
		})
		.await;
	let err = client
		.sign_in(&SignIn { email: "ana@example.com".into(), password: "wrong".into() })
		.await
		.expect_err("Wrong credentials must fail.");

	match err {
		Error::Unauthorized { message } => assert_eq!(message, "Invalid credentials"),
		other => panic!("Unexpected error variant: {other:?}."),
	}

	refresh.assert_calls_async(0).await;

	assert!(store.is_empty());
}

#[tokio::test]
async fn sign_up_accepts_single_token_answers_and_activation_posts_code() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url(), None).await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/user/signup").json_body(serde_json::json!({
				"name": "Ana",
				"email": "ana@example.com",
				"password": "hunter2"
			}));
			then.status(201).header("content-type", "application/json").body("{\"token\":\"T1\"}");
		})
		.await;

	let activation = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/active-account")
				.header("authorization", "Bearer T1")
				.json_body(serde_json::json!({ "userId": 5, "code": "123456" }));
			then.status(204);
		})
		.await;
	let tokens = client
		.sign_up(&SignUp {
			name: "Ana".into(),
			email: "ana@example.com".into(),
			password: "hunter2".into(),
		})
		.await
		.expect("Sign-up should succeed.");

	assert!(!tokens.can_refresh());
	assert_eq!(store.peek(StorageKey::AccessToken).as_deref(), Some("T1"));

	client
		.activate_account(&ActivateAccount { user_id: EntityId::from(5), code: "123456".into() })
		.await
		.expect("Activation should succeed.");
	activation.assert_async().await;
}

#[tokio::test]
async fn has_logged_in_answers_none_for_missing_or_rejected_tokens() {
	let server = MockServer::start_async().await;
	let (anonymous, _) = build_reqwest_test_client(&server.base_url(), None).await;
	let logged_in = server
		.mock_async(|when, then| {
			when.method(GET).path("/user/hasloggedin").header("authorization", "Bearer A1");
			then.status(401).header("content-type", "application/json").body("{\"error\":\"expired\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh-token");
			then.status(200).header("content-type", "application/json").body("{\"accessToken\":\"A2\"}");
		})
		.await;

	assert_eq!(anonymous.has_logged_in().await.expect("Session check without a token should succeed."), None);

	logged_in.assert_calls_async(0).await;

	let (client, store) = build_reqwest_test_client(&server.base_url(), session()).await;

	assert_eq!(client.has_logged_in().await.expect("Session check with a stale token should succeed."), None);

	logged_in.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;

	assert_eq!(store.peek(StorageKey::AccessToken).as_deref(), Some("A1"));
}

#[tokio::test]
async fn profile_reads_and_updates() {
	let server = MockServer::start_async().await;
	let (client, _) = build_reqwest_test_client(&server.base_url(), session()).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/user");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":5,\"username\":\"ana\",\"email\":\"ana@example.com\",\"imageURL\":null}");
		})
		.await;

	let update = server
		.mock_async(|when, then| {
			when.method(PUT)
				.path("/user")
				.json_body(serde_json::json!({ "name": "Ana Maria", "avatarUrl": "cG5n" }));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":5,\"name\":\"Ana Maria\",\"email\":\"ana@example.com\",\"avatarUrl\":\"cG5n\"}");
		})
		.await;
	let user = client.current_user().await.expect("Profile fetch should succeed.");

	assert_eq!(user.username.as_deref(), Some("ana"));

	let updated = client
		.update_profile(&UpdateProfile::default().with_name("Ana Maria").with_avatar_bytes(b"png"))
		.await
		.expect("Profile update should succeed.");

	update.assert_async().await;

	assert_eq!(updated.name.as_deref(), Some("Ana Maria"));

	let err = client
		.update_profile(&UpdateProfile::default())
		.await
		.expect_err("Empty profile updates must be rejected locally.");

	assert!(matches!(err, Error::InvalidInput { .. }));
}

#[tokio::test]
async fn task_endpoints_shape_requests() {
	let server = MockServer::start_async().await;
	let (client, _) = build_reqwest_test_client(&server.base_url(), session()).await;
	let listing = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/task")
				.query_param("page", "2")
				.query_param("status", "DONE")
				.query_param("text", "docs");
			then.status(200).header("content-type", "application/json").body(
				"{\"total\":11,\"tasks\":[{\"id\":3,\"title\":\"Write docs\",\"status\":\"DONE\",\"createdAt\":\"2024-05-01T12:00:00Z\"}]}",
			);
		})
		.await;
	let create = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/task")
				.json_body(serde_json::json!({ "title": "Ship", "status": "PENDING" }));
			then.status(201).header("content-type", "application/json").body(
				"{\"id\":4,\"title\":\"Ship\",\"status\":\"PENDING\",\"createdAt\":\"2024-05-02T08:00:00Z\"}",
			);
		})
		.await;
	let status = server
		.mock_async(|when, then| {
			when.method(PUT).path("/task/4").json_body(serde_json::json!({ "status": "CANCELED" }));
			then.status(200).header("content-type", "application/json").body(
				"{\"id\":4,\"title\":\"Ship\",\"status\":\"CANCELED\",\"createdAt\":\"2024-05-02T08:00:00Z\"}",
			);
		})
		.await;
	let removal = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/workarea/9/task").json_body(serde_json::json!({ "id": 4 }));
			then.status(200).header("content-type", "application/json").body("{}");
		})
		.await;
	let page = client
		.list_tasks(&TaskQuery::default().page(2).status(TaskStatus::Done).text("docs"))
		.await
		.expect("Task listing should succeed.");

	listing.assert_async().await;

	assert_eq!(page.total_pages(), 2);
	assert_eq!(page.tasks[0].title, "Write docs");

	let task = client
		.create_task(&NewTask::new("Ship").with_description("   "))
		.await
		.expect("Task creation should succeed.");

	create.assert_async().await;

	let task = client
		.update_task_status(&task.id, TaskStatus::Canceled)
		.await
		.expect("Status update should succeed.");

	status.assert_async().await;

	assert_eq!(task.status, TaskStatus::Canceled);

	client
		.delete_workarea_task(&EntityId::from(9), &task.id)
		.await
		.expect("Task removal should succeed.");
	removal.assert_async().await;
}

#[tokio::test]
async fn workarea_endpoints_shape_requests() {
	let server = MockServer::start_async().await;
	let (client, _) = build_reqwest_test_client(&server.base_url(), session()).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/workarea/9/members");
			then.status(200).header("content-type", "application/json").body(
				"[{\"id\":\"u1\",\"email\":\"m@example.com\",\"username\":\"member\",\"memberWorkarea\":[{\"role\":\"MEMBER\"}]},\
				 {\"id\":\"u2\",\"email\":\"l@example.com\",\"username\":\"leader\",\"memberWorkarea\":[{\"role\":\"LEADER\"}]},\
				 {\"id\":\"u3\",\"email\":\"o@example.com\",\"username\":\"owner\"}]",
			);
		})
		.await;

	let rename = server
		.mock_async(|when, then| {
			when.method(PUT).path("/workarea/9").json_body(serde_json::json!({ "name": "Team" }));
			then.status(200).header("content-type", "application/json").body("{\"id\":9,\"name\":\"Team\"}");
		})
		.await;
	let invite = server
		.mock_async(|when, then| {
			when.method(POST).path("/workarea/9/member").json_body(serde_json::json!({ "member": "bob" }));
			then.status(201).header("content-type", "application/json").body("{}");
		})
		.await;
	let removal = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/workarea/9/member/u1");
			then.status(204);
		})
		.await;
	let id = EntityId::from(9);
	let members = client.members(&id).await.expect("Member listing should succeed.");
	let usernames = members.iter().map(|m| m.username.as_str()).collect::<Vec<_>>();

	assert_eq!(usernames, ["owner", "leader", "member"]);
	assert_eq!(members[1].role(), Some(WorkareaRole::Leader));

	let workarea = client.update_workarea(&id, "Team").await.expect("Rename should succeed.");

	rename.assert_async().await;

	assert_eq!(workarea.name, "Team");

	client.invite_member(&id, " bob ").await.expect("Invitation should succeed.");
	invite.assert_async().await;
	client.remove_member(&id, &"u1".into()).await.expect("Member removal should succeed.");
	removal.assert_async().await;
}
