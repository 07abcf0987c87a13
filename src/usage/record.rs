//! Resource records: one embedded repository object in a course.

// self
use crate::{
	_prelude::*,
	auth::{CourseId, ResourceId},
};

/// Version selection made in the host's edit form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionShow {
	/// Pin the version shown in the form (`window_version`).
	Current,
	/// Always render the latest version.
	Latest,
}

/// Record fields that can be stamped with the id of the host container embedding them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdField {
	/// Course module the resource appears in.
	ModuleId,
	/// Course section the resource appears in.
	SectionId,
}
impl IdField {
	/// Returns the column name of the field.
	pub const fn as_str(self) -> &'static str {
		match self {
			IdField::ModuleId => "module_id",
			IdField::SectionId => "section_id",
		}
	}
}
impl Display for IdField {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Persisted resource record plus the transient edit-form fields the host submits with it.
///
/// `usage_id` is only set once a usage registration succeeded for the current
/// `object_url` + `object_version`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceRecord {
	/// Local primary key, assigned on insert.
	pub id: Option<ResourceId>,
	/// Alias of `id` used when the host submits a module edit form.
	pub instance: Option<ResourceId>,
	/// Course the resource is embedded in.
	pub course: Option<CourseId>,
	/// Display name.
	pub name: String,
	/// Description shown on the course page.
	pub intro: String,
	/// Host text format of `intro`.
	pub intro_format: i32,
	/// Repository object reference (`ccrep://repository/object`).
	pub object_url: String,
	/// Pinned object version; empty or `0` means latest, `1` asks for resolution on create.
	pub object_version: Option<String>,
	/// Usage handle returned by the repository.
	pub usage_id: Option<String>,
	/// Offer the object as a download.
	pub force_download: bool,
	/// Open the object in a popup window.
	pub popup_window: bool,
	/// Render the object inline as a block.
	pub blockdisplay: bool,
	/// Display options belonging to the popup or block behaviors.
	pub options: String,
	/// Completion tracking mode; normalized to `Some(0)` when unset.
	pub tracking: Option<i64>,
	/// Version choice from the edit form.
	pub window_versionshow: Option<VersionShow>,
	/// Version shown in the edit form.
	pub window_version: Option<String>,
	/// Submitted by the legacy simple editor, which skips version negotiation.
	pub editor_atto: bool,
	/// Course module embedding the resource.
	pub module_id: Option<i64>,
	/// Course section embedding the resource.
	pub section_id: Option<i64>,
	/// Creation instant.
	#[serde(with = "time::serde::timestamp::option")]
	pub time_created: Option<OffsetDateTime>,
	/// Last modification through the create flow.
	#[serde(with = "time::serde::timestamp::option")]
	pub time_modified: Option<OffsetDateTime>,
	/// Last normalization instant.
	#[serde(with = "time::serde::timestamp::option")]
	pub time_updated: Option<OffsetDateTime>,
}
impl ResourceRecord {
	/// Creates a record for the object at `object_url`.
	pub fn new(object_url: impl Into<String>) -> Self {
		Self { object_url: object_url.into(), ..Default::default() }
	}

	/// Returns the effective record id, preferring the edit-form `instance` alias.
	pub fn resolved_id(&self) -> Option<ResourceId> {
		self.instance.or(self.id)
	}

	/// Sets one of the container id fields.
	pub fn set_id_field(&mut self, field: IdField, value: i64) {
		match field {
			IdField::ModuleId => self.module_id = Some(value),
			IdField::SectionId => self.section_id = Some(value),
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn instance_alias_takes_precedence() {
		let mut record = ResourceRecord::new("ccrep://local/node");

		assert_eq!(record.resolved_id(), None);

		record.id = Some(ResourceId::new(3));

		assert_eq!(record.resolved_id(), Some(ResourceId::new(3)));

		record.instance = Some(ResourceId::new(8));

		assert_eq!(record.resolved_id(), Some(ResourceId::new(8)));
	}

	#[test]
	fn timestamps_serialize_as_unix_seconds() {
		let record = ResourceRecord {
			time_created: Some(datetime!(2024-05-01 00:00 UTC)),
			..ResourceRecord::new("ccrep://local/node")
		};
		let value = serde_json::to_value(&record).expect("Record should serialize.");

		assert_eq!(value["time_created"], 1_714_521_600);
		assert!(value["time_updated"].is_null());

		let back: ResourceRecord = serde_json::from_value(value).expect("Record should parse.");

		assert_eq!(back, record);
	}

	#[test]
	fn id_fields_map_to_columns() {
		let mut record = ResourceRecord::default();

		record.set_id_field(IdField::SectionId, 4);

		assert_eq!(record.section_id, Some(4));
		assert_eq!(IdField::ModuleId.to_string(), "module_id");
	}
}
