//! Simple file-backed [`ResourceStore`] for lightweight deployments.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::ResourceId,
	store::{self, ResourceStore, StoreError, StoreFuture},
	usage::{IdField, ResourceRecord},
};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
	last_id: i64,
	records: Vec<ResourceRecord>,
}

#[derive(Debug, Default)]
struct Table {
	last_id: i64,
	rows: BTreeMap<ResourceId, ResourceRecord>,
}
impl Table {
	fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
		let mut rows = BTreeMap::new();

		for record in snapshot.records {
			let id = store::record_id(&record).map_err(|_| StoreError::Serialization {
				message: "Snapshot contains a record without id".into(),
			})?;

			rows.insert(id, record);
		}

		let last_id = rows.keys().next_back().map_or(0, |id| id.get()).max(snapshot.last_id);

		Ok(Self { last_id, rows })
	}

	fn to_snapshot(&self) -> Snapshot {
		Snapshot { last_id: self.last_id, records: self.rows.values().cloned().collect() }
	}
}

/// Persists resource records to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Table>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let table = Table::from_snapshot(Self::load_snapshot(&path)?)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(table)) })
	}

	fn load_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
		if !path.exists() {
			return Ok(Snapshot::default());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(Snapshot::default());
		}

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, table: &Table) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized = serde_json::to_vec_pretty(&table.to_snapshot()).map_err(|e| {
			StoreError::Serialization { message: format!("Failed to serialize store snapshot: {e}") }
		})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	/// Applies `mutate` under the write lock and persists the table; on persistence failure
	/// the in-memory table is restored so memory and disk stay aligned.
	fn mutate<T>(
		&self,
		mutate: impl FnOnce(&mut Table) -> Result<T, StoreError>,
	) -> Result<T, StoreError> {
		let mut guard = self.inner.write();
		let before = Table { last_id: guard.last_id, rows: guard.rows.clone() };
		let value = mutate(&mut *guard)?;

		if let Err(e) = self.persist_locked(&*guard) {
			*guard = before;

			return Err(e);
		}

		Ok(value)
	}
}
impl ResourceStore for FileStore {
	fn insert(&self, mut record: ResourceRecord) -> StoreFuture<'_, ResourceId> {
		Box::pin(async move {
			self.mutate(|table| {
				table.last_id += 1;

				let id = ResourceId::new(table.last_id);

				record.id = Some(id);
				table.rows.insert(id, record);

				Ok(id)
			})
		})
	}

	fn fetch(&self, id: ResourceId) -> StoreFuture<'_, Option<ResourceRecord>> {
		Box::pin(async move { Ok(self.inner.read().rows.get(&id).cloned()) })
	}

	fn update(&self, record: ResourceRecord) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let id = store::record_id(&record)?;

			self.mutate(|table| {
				let row = table.rows.get_mut(&id).ok_or(StoreError::Missing { id })?;

				*row = record;

				Ok(())
			})
		})
	}

	fn delete(&self, id: ResourceId) -> StoreFuture<'_, bool> {
		Box::pin(async move {
			if !self.inner.read().rows.contains_key(&id) {
				return Ok(false);
			}

			self.mutate(|table| Ok(table.rows.remove(&id).is_some()))
		})
	}

	fn set_field(&self, id: ResourceId, field: IdField, value: i64) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.mutate(|table| {
				table
					.rows
					.get_mut(&id)
					.ok_or(StoreError::Missing { id })?
					.set_id_field(field, value);

				Ok(())
			})
		})
	}
}
