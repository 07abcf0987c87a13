//! Thread-safe in-memory [`ResourceStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::ResourceId,
	store::{self, ResourceStore, StoreError, StoreFuture},
	usage::{IdField, ResourceRecord},
};

#[derive(Debug, Default)]
struct Table {
	last_id: i64,
	rows: BTreeMap<ResourceId, ResourceRecord>,
}

/// Storage backend that keeps records in-process; ids are assigned sequentially from 1.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<Table>>);
impl MemoryStore {
	/// Number of stored records.
	pub fn len(&self) -> usize {
		self.0.read().rows.len()
	}

	/// Returns `true` if no records are stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().rows.is_empty()
	}

	/// Returns a copy of every stored record ordered by id.
	pub fn snapshot(&self) -> Vec<ResourceRecord> {
		self.0.read().rows.values().cloned().collect()
	}

	fn insert_now(&self, mut record: ResourceRecord) -> ResourceId {
		let mut table = self.0.write();

		table.last_id += 1;

		let id = ResourceId::new(table.last_id);

		record.id = Some(id);
		table.rows.insert(id, record);

		id
	}

	fn update_now(&self, record: ResourceRecord) -> Result<(), StoreError> {
		let id = store::record_id(&record)?;
		let mut table = self.0.write();
		let row = table.rows.get_mut(&id).ok_or(StoreError::Missing { id })?;

		*row = record;

		Ok(())
	}

	fn set_field_now(&self, id: ResourceId, field: IdField, value: i64) -> Result<(), StoreError> {
		let mut table = self.0.write();
		let row = table.rows.get_mut(&id).ok_or(StoreError::Missing { id })?;

		row.set_id_field(field, value);

		Ok(())
	}
}
impl ResourceStore for MemoryStore {
	fn insert(&self, record: ResourceRecord) -> StoreFuture<'_, ResourceId> {
		Box::pin(async move { Ok(self.insert_now(record)) })
	}

	fn fetch(&self, id: ResourceId) -> StoreFuture<'_, Option<ResourceRecord>> {
		Box::pin(async move { Ok(self.0.read().rows.get(&id).cloned()) })
	}

	fn update(&self, record: ResourceRecord) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.update_now(record) })
	}

	fn delete(&self, id: ResourceId) -> StoreFuture<'_, bool> {
		Box::pin(async move { Ok(self.0.write().rows.remove(&id).is_some()) })
	}

	fn set_field(&self, id: ResourceId, field: IdField, value: i64) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.set_field_now(id, field, value) })
	}
}
