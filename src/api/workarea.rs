//! Shared workarea endpoints and membership management.

// crates.io
use ::http::Method;
// self
use crate::{_prelude::*, api::EntityId, client::SessionClient, http::HttpTransport};

/// A shared board of tasks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workarea {
	/// Workarea identifier.
	pub id: EntityId,
	/// Display name.
	pub name: String,
	/// Remaining fields (tasks, creation date, ...), passed through unmodified.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Role of a member inside a workarea.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkareaRole {
	/// Owns the workarea and manages members.
	Leader,
	/// Regular participant.
	Member,
}

/// Role assignment attached to a member record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRole {
	/// The assigned role.
	pub role: WorkareaRole,
}

/// A user listed as a workarea member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
	/// User identifier.
	pub id: EntityId,
	/// Contact email.
	pub email: String,
	/// Unique handle.
	pub username: String,
	/// Role assignments for the requested workarea.
	#[serde(default)]
	pub member_workarea: Option<Vec<MemberRole>>,
	/// Remaining fields, passed through unmodified.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}
impl Member {
	/// The member's role, if the API reported one.
	pub fn role(&self) -> Option<WorkareaRole> {
		self.member_workarea.as_deref()?.first().map(|assignment| assignment.role)
	}
}

/// Orders members for display: members without a role first, then leaders, then members.
///
/// The sort is stable, so members in the same group keep the API's order.
pub fn sort_members(members: &mut [Member]) {
	fn rank(role: Option<WorkareaRole>) -> u8 {
		match role {
			None => 0,
			Some(WorkareaRole::Leader) => 1,
			Some(WorkareaRole::Member) => 2,
		}
	}

	members.sort_by_key(|member| rank(member.role()));
}

#[derive(Serialize)]
struct Rename<'a> {
	name: &'a str,
}

#[derive(Serialize)]
struct Invite<'a> {
	member: &'a str,
}

impl<T> SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Lists the workareas the signed-in user belongs to.
	pub async fn list_workareas(&self) -> Result<Vec<Workarea>> {
		self.get("/workarea").await
	}

	/// Fetches one workarea.
	pub async fn workarea(&self, id: &EntityId) -> Result<Workarea> {
		self.get(&format!("/workarea/{id}")).await
	}

	/// Renames a workarea.
	pub async fn update_workarea(&self, id: &EntityId, name: &str) -> Result<Workarea> {
		if name.trim().is_empty() {
			return Err(Error::invalid_input("a workarea needs a name"));
		}

		self.put(&format!("/workarea/{id}"), &Rename { name }).await
	}

	/// Lists a workarea's members in display order (see [`sort_members`]).
	pub async fn members(&self, id: &EntityId) -> Result<Vec<Member>> {
		let mut members: Vec<Member> = self.get(&format!("/workarea/{id}/members")).await?;

		sort_members(&mut members);

		Ok(members)
	}

	/// Invites a user, by username, into a workarea.
	pub async fn invite_member(&self, id: &EntityId, username: &str) -> Result<()> {
		let username = username.trim();

		if username.is_empty() {
			return Err(Error::invalid_input("an invitation needs a username"));
		}

		let request = self
			.request(Method::POST, &format!("/workarea/{id}/member"))?
			.with_json(&Invite { member: username })?;

		self.send(request).await?;

		Ok(())
	}

	/// Removes a member from a workarea.
	pub async fn remove_member(&self, id: &EntityId, member_id: &EntityId) -> Result<()> {
		self.send(self.request(Method::DELETE, &format!("/workarea/{id}/member/{member_id}"))?)
			.await?;

		Ok(())
	}
}
