//! Storage contracts and built-in store implementations for resource records.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::ResourceId,
	usage::{IdField, ResourceRecord},
};

/// Boxed future returned by [`ResourceStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Host record store holding resource records.
pub trait ResourceStore
where
	Self: Send + Sync,
{
	/// Inserts a record (ignoring any `id` it carries) and returns the assigned id.
	fn insert(&self, record: ResourceRecord) -> StoreFuture<'_, ResourceId>;

	/// Fetches the record with the given id, if present.
	fn fetch(&self, id: ResourceId) -> StoreFuture<'_, Option<ResourceRecord>>;

	/// Replaces the record identified by `record.id`.
	fn update(&self, record: ResourceRecord) -> StoreFuture<'_, ()>;

	/// Deletes the record with the given id, returning whether it existed.
	fn delete(&self, id: ResourceId) -> StoreFuture<'_, bool>;

	/// Sets a container id field on the record with the given id.
	fn set_field(&self, id: ResourceId, field: IdField, value: i64) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`ResourceStore`] implementations.
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
	/// The addressed record does not exist.
	#[error("Record {id} does not exist.")]
	Missing {
		/// Identifier that was addressed.
		id: ResourceId,
	},
	/// The record passed to an update carries no id.
	#[error("Record has no identifier.")]
	MissingId,
}

pub(crate) fn record_id(record: &ResourceRecord) -> Result<ResourceId, StoreError> {
	record.id.ok_or(StoreError::MissingId)
}
