//! Personal to-do endpoints and workarea task removal.

// crates.io
use ::http::Method;
// self
use crate::{
	_prelude::*,
	api::{EntityId, Pagination, page_count},
	client::SessionClient,
	http::HttpTransport,
};

/// Number of tasks the API returns per page.
pub const TASK_PAGE_SIZE: u32 = 10;

/// Lifecycle state of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
	/// Not done yet.
	Pending,
	/// Completed.
	Done,
	/// Dropped.
	Canceled,
}
impl TaskStatus {
	/// Wire name of the status.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "PENDING",
			Self::Done => "DONE",
			Self::Canceled => "CANCELED",
		}
	}
}
impl Display for TaskStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for TaskStatus {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"PENDING" => Ok(Self::Pending),
			"DONE" => Ok(Self::Done),
			"CANCELED" => Ok(Self::Canceled),
			other => Err(Error::invalid_input(format!("unknown task status `{other}`"))),
		}
	}
}

/// A to-do item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
	/// Task identifier.
	pub id: EntityId,
	/// Short title.
	pub title: String,
	/// Optional longer description.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Current status.
	pub status: TaskStatus,
	/// Creation instant.
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	/// Remaining fields, passed through unmodified.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One page of the task listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskPage {
	/// Number of tasks matching the query across all pages.
	pub total: u64,
	/// Tasks on this page.
	pub tasks: Vec<Task>,
}
impl TaskPage {
	/// Number of pages for the query; `0` when nothing matched.
	pub fn total_pages(&self) -> u32 {
		page_count(self.total, TASK_PAGE_SIZE)
	}

	/// Page cursor for this listing positioned at `page`.
	pub fn pagination(&self, page: u32) -> Pagination {
		Pagination::new(page, self.total_pages())
	}
}

/// Filters for [`SessionClient::list_tasks`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskQuery {
	/// Page to fetch; `None` means the first page.
	pub page: Option<u32>,
	/// Status filter; `None` means any status.
	pub status: Option<TaskStatus>,
	/// Free-text search; blank text is not sent.
	pub text: Option<String>,
}
impl TaskQuery {
	/// Sets the page to fetch.
	pub fn page(mut self, page: u32) -> Self {
		self.page = Some(page);

		self
	}

	/// Restricts the listing to one status.
	pub fn status(mut self, status: TaskStatus) -> Self {
		self.status = Some(status);

		self
	}

	/// Searches titles and descriptions.
	pub fn text(mut self, text: impl Into<String>) -> Self {
		self.text = Some(text.into());

		self
	}

	/// Renders the query string, always including `page`.
	pub fn to_query_string(&self) -> String {
		let mut query = url::form_urlencoded::Serializer::new(String::new());

		query.append_pair("page", &self.page.unwrap_or(1).max(1).to_string());

		if let Some(status) = self.status {
			query.append_pair("status", status.as_str());
		}
		if let Some(text) = self.text.as_deref().filter(|t| !t.trim().is_empty()) {
			query.append_pair("text", text);
		}

		query.finish()
	}
}

/// Task creation form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewTask {
	/// Short title.
	pub title: String,
	/// Optional longer description; omitted when blank.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Initial status.
	pub status: TaskStatus,
}
impl NewTask {
	/// Creates a pending task with the given title.
	pub fn new(title: impl Into<String>) -> Self {
		Self { title: title.into(), description: None, status: TaskStatus::Pending }
	}

	/// Sets the description; blank text clears it.
	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		let description = description.into();

		self.description = (!description.trim().is_empty()).then_some(description);

		self
	}

	/// Sets the initial status.
	pub fn with_status(mut self, status: TaskStatus) -> Self {
		self.status = status;

		self
	}
}

#[derive(Serialize)]
struct StatusChange {
	status: TaskStatus,
}

#[derive(Serialize)]
struct TaskRef<'a> {
	id: &'a EntityId,
}

impl<T> SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Lists the signed-in user's tasks.
	pub async fn list_tasks(&self, query: &TaskQuery) -> Result<TaskPage> {
		let mut request = self.request(Method::GET, "/task")?;

		request.url.set_query(Some(&query.to_query_string()));

		self.send(request).await?.json()
	}

	/// Creates a task.
	pub async fn create_task(&self, task: &NewTask) -> Result<Task> {
		if task.title.trim().is_empty() {
			return Err(Error::invalid_input("a task needs a title"));
		}

		self.post("/task", task).await
	}

	/// Moves a task to `status` and returns the updated record.
	pub async fn update_task_status(&self, id: &EntityId, status: TaskStatus) -> Result<Task> {
		self.put(&format!("/task/{id}"), &StatusChange { status }).await
	}

	/// Removes a task from a workarea board.
	pub async fn delete_workarea_task(
		&self,
		workarea_id: &EntityId,
		task_id: &EntityId,
	) -> Result<()> {
		self.delete_with_body::<_, serde_json::Value>(
			&format!("/workarea/{workarea_id}/task"),
			&TaskRef { id: task_id },
		)
		.await?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn query_string_defaults_page_and_skips_empty_filters() {
		assert_eq!(TaskQuery::default().to_query_string(), "page=1");
		assert_eq!(
			TaskQuery::default().page(3).status(TaskStatus::Done).text("buy milk").to_query_string(),
			"page=3&status=DONE&text=buy+milk"
		);
		assert_eq!(TaskQuery::default().page(0).text("   ").to_query_string(), "page=1");
	}

	#[test]
	fn task_page_counts_pages_of_ten() {
		let page = TaskPage { total: 21, tasks: Vec::new() };

		assert_eq!(page.total_pages(), 3);
		assert_eq!(page.pagination(5).page, 3);
		assert_eq!(TaskPage { total: 0, tasks: Vec::new() }.total_pages(), 0);
	}

	#[test]
	fn task_decodes_api_payload() {
		let task: Task = serde_json::from_value(serde_json::json!({
			"id": 12,
			"title": "Write docs",
			"status": "CANCELED",
			"createdAt": "2024-05-01T12:30:00.000Z",
			"userId": 4
		}))
		.expect("Task payload should deserialize.");

		assert_eq!(task.id, EntityId::from(12));
		assert_eq!(task.description, None);
		assert_eq!(task.status, TaskStatus::Canceled);
		assert_eq!(task.created_at.year(), 2024);
		assert_eq!(task.extra.get("userId"), Some(&serde_json::json!(4)));
	}

	#[test]
	fn new_task_omits_blank_description() {
		let body = serde_json::to_value(NewTask::new("Ship").with_description(" \t"))
			.expect("New task should serialize.");

		assert_eq!(body, serde_json::json!({ "title": "Ship", "status": "PENDING" }));
		assert_eq!("DONE".parse::<TaskStatus>().expect("Known status should parse."), TaskStatus::Done);
		assert!("Filter".parse::<TaskStatus>().is_err());
	}
}
