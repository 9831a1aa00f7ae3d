//! Typed endpoints of the workarea API and the payload models they exchange.
//!
//! Every call goes through [`SessionClient::send`](crate::client::SessionClient::send), so
//! all of them share bearer handling, refresh-and-replay, and error classification. Unknown
//! fields on records are kept in `extra` maps and otherwise passed through unmodified.

pub mod account;
pub mod task;
pub mod workarea;

pub use account::*;
pub use task::*;
pub use workarea::*;

// self
use crate::_prelude::*;

/// Identifier of an API record; the backend sends both numeric and string ids.
///
/// Numeric ids are written back as JSON numbers so request bodies keep the shape the API
/// handed out.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(from = "RawId")]
pub struct EntityId(String);
impl EntityId {
	/// Wraps an identifier value.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the identifier as text.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl From<RawId> for EntityId {
	fn from(raw: RawId) -> Self {
		match raw {
			RawId::Number(n) => Self(n.to_string()),
			RawId::Text(s) => Self(s),
		}
	}
}
impl Serialize for EntityId {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		match self.0.parse::<u64>() {
			Ok(n) if n.to_string() == self.0 => serializer.serialize_u64(n),
			_ => serializer.serialize_str(&self.0),
		}
	}
}
impl From<&str> for EntityId {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<u64> for EntityId {
	fn from(value: u64) -> Self {
		Self(value.to_string())
	}
}
impl Debug for EntityId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "EntityId({})", self.0)
	}
}
impl Display for EntityId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
	Number(u64),
	Text(String),
}

/// Page cursor over a paginated listing, clamped to `1..=total_pages`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
	/// Current page, starting at 1.
	pub page: u32,
	/// Number of pages available; at least 1.
	pub total_pages: u32,
}
impl Pagination {
	/// Creates a cursor, clamping `page` into range.
	pub fn new(page: u32, total_pages: u32) -> Self {
		let total_pages = total_pages.max(1);

		Self { page: page.clamp(1, total_pages), total_pages }
	}

	/// Derives the page count from a total item count and a page size.
	pub fn from_total(page: u32, total_items: u64, page_size: u32) -> Self {
		Self::new(page, page_count(total_items, page_size))
	}

	/// Returns `true` unless the cursor is on the first page.
	pub fn has_previous(&self) -> bool {
		self.page > 1
	}

	/// Returns `true` unless the cursor is on the last page.
	pub fn has_next(&self) -> bool {
		self.page < self.total_pages
	}

	/// The previous page, if any.
	pub fn previous(&self) -> Option<u32> {
		self.has_previous().then(|| self.page - 1)
	}

	/// The next page, if any.
	pub fn next(&self) -> Option<u32> {
		self.has_next().then(|| self.page + 1)
	}
}

/// Number of pages needed for `total_items` at `page_size` items per page.
pub fn page_count(total_items: u64, page_size: u32) -> u32 {
	if page_size == 0 {
		return 0;
	}

	u32::try_from(total_items.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX)
}
