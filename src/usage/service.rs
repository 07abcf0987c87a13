//! Contract of the repository usage API.

// crates.io
use serde::Deserializer;
// self
use crate::{
	_prelude::*,
	auth::{AuthKey, CourseId, ResourceId, Ticket},
	usage::ResourceRecord,
};

/// Boxed future returned by [`UsageService`] methods.
pub type UsageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Remote usage-tracking operations offered by the repository.
///
/// Calls are single attempts: implementations must not retry, and any timeout is left to
/// the underlying transport.
pub trait UsageService
where
	Self: Send + Sync,
{
	/// Creates (or refreshes) the usage linking a local resource to a repository node.
	fn create_usage<'a>(&'a self, request: &'a UsageRequest) -> UsageFuture<'a, Usage>;

	/// Fetches a fresh repository ticket on behalf of `user`.
	fn fetch_ticket<'a>(&'a self, user: &'a AuthKey) -> UsageFuture<'a, Ticket>;
}

/// Payload of a usage registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsageRequest {
	/// Course embedding the resource.
	pub container_id: CourseId,
	/// Local resource record id.
	pub resource_id: ResourceId,
	/// Repository object id.
	pub node_id: String,
	/// Requested object version; empty asks the repository for the latest.
	pub node_version: String,
	/// Session ticket, when the call runs on behalf of a user.
	pub ticket: Option<Ticket>,
}
impl UsageRequest {
	/// Builds a request from a persisted record.
	pub fn from_record(record: &ResourceRecord, resource_id: ResourceId, container_id: CourseId) -> Self {
		Self {
			container_id,
			resource_id,
			node_id: crate::auth::extract_object_id(&record.object_url),
			node_version: record.object_version.clone().unwrap_or_default(),
			ticket: None,
		}
	}

	/// Attaches a session ticket.
	pub fn with_ticket(mut self, ticket: Ticket) -> Self {
		self.ticket = Some(ticket);

		self
	}
}

/// Usage handle returned by the repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
	/// Repository-side usage id.
	pub usage_id: String,
	/// Concrete object version the usage was registered for.
	#[serde(default, deserialize_with = "string_or_number")]
	pub node_version: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw {
		Text(String),
		Number(serde_json::Number),
		Null(()),
	}

	Ok(match Raw::deserialize(deserializer)? {
		Raw::Text(text) => text,
		Raw::Number(number) => number.to_string(),
		Raw::Null(()) => String::new(),
	})
}
