// self
use edu_sharing_broker::{
	auth::ResourceId,
	store::{MemoryStore, ResourceStore, StoreError},
	usage::{IdField, ResourceRecord},
};

#[tokio::test]
async fn insert_assigns_sequential_ids() {
	let store = MemoryStore::default();
	let first = store
		.insert(ResourceRecord { id: Some(ResourceId::new(99)), ..ResourceRecord::new("ccrep://l/a") })
		.await
		.expect("First insert should succeed.");
	let second =
		store.insert(ResourceRecord::new("ccrep://l/b")).await.expect("Second insert should succeed.");

	assert_eq!(first, ResourceId::new(1), "Inserted ids must ignore caller-provided ids.");
	assert_eq!(second, ResourceId::new(2));

	let fetched = store
		.fetch(first)
		.await
		.expect("Fetching from memory store should succeed.")
		.expect("Inserted record should be present.");

	assert_eq!(fetched.id, Some(first));
	assert_eq!(fetched.object_url, "ccrep://l/a");
}

#[tokio::test]
async fn update_replaces_whole_record() {
	let store = MemoryStore::default();
	let id = store
		.insert(ResourceRecord { name: "Old".into(), ..ResourceRecord::new("ccrep://l/a") })
		.await
		.expect("Insert should succeed.");
	let replacement = ResourceRecord {
		id: Some(id),
		name: "New".into(),
		usage_id: Some("usage-5".into()),
		..ResourceRecord::new("ccrep://l/b")
	};

	store.update(replacement.clone()).await.expect("Update should succeed.");

	assert_eq!(store.snapshot(), vec![replacement]);
}

#[tokio::test]
async fn missing_records_are_reported() {
	let store = MemoryStore::default();
	let ghost = ResourceId::new(12);

	assert_eq!(store.fetch(ghost).await, Ok(None));
	assert_eq!(store.delete(ghost).await, Ok(false));
	assert_eq!(
		store.set_field(ghost, IdField::SectionId, 3).await,
		Err(StoreError::Missing { id: ghost })
	);
	assert_eq!(
		store.update(ResourceRecord::new("ccrep://l/a")).await,
		Err(StoreError::MissingId)
	);
}

#[tokio::test]
async fn clones_share_the_same_table() {
	let store = MemoryStore::default();
	let view = store.clone();
	let id = store.insert(ResourceRecord::new("ccrep://l/a")).await.expect("Insert should succeed.");

	view.set_field(id, IdField::SectionId, 8).await.expect("Setting section should succeed.");

	assert_eq!(store.snapshot()[0].section_id, Some(8));
	assert!(view.delete(id).await.expect("Delete should succeed."));
	assert!(store.is_empty());
}
