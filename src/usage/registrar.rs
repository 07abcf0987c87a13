//! Create/update orchestration keeping local records and repository usages in step.
//!
//! Both flows persist locally first and then register the usage remotely. When the remote
//! call (or the follow-up write) fails, a compensating action restores the local state:
//! create deletes the inserted row, update writes back the record read before the call.
//! Failures of the compensating action are logged and never mask the original error.
//!
//! Flows take no locks. Two concurrent updates of the same record race and the last
//! store write wins.

// self
use crate::{
	_prelude::*,
	auth::{AuthKeyResolver, CourseId, ResourceId},
	config::PluginConfig,
	markup,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	redirect::RequestContext,
	store::ResourceStore,
	usage::{IdField, ResourceRecord, UsageRequest, UsageService, VersionShow, normalize},
};

/// Course-page summary of a resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleInfo {
	/// Display name.
	pub name: String,
	/// Description, present only when the host shows descriptions.
	pub content: Option<String>,
	/// Whether following the link opens a new window.
	pub open_in_new_window: bool,
}

/// Coordinates the record store with the repository usage API.
#[derive(Clone)]
pub struct UsageRegistrar {
	store: Arc<dyn ResourceStore>,
	service: Arc<dyn UsageService>,
	resolver: AuthKeyResolver,
}
impl UsageRegistrar {
	/// Creates a registrar resolving auth keys with the configured policy.
	pub fn new(
		store: Arc<dyn ResourceStore>,
		service: Arc<dyn UsageService>,
		config: &PluginConfig,
	) -> Self {
		Self { store, service, resolver: AuthKeyResolver::from_config(config) }
	}

	/// Overrides the auth-key resolver used by [`UsageRegistrar::update`].
	pub fn with_resolver(mut self, resolver: AuthKeyResolver) -> Self {
		self.resolver = resolver;

		self
	}

	/// Inserts `record` and registers its first usage, returning the new id.
	///
	/// Version selection happens before the insert:
	///
	/// - records from the simple editor skip versioning and get `intro_format` 0;
	/// - an explicit version `1` asks the repository to resolve the concrete version, which is
	///   stored after the call;
	/// - any other explicit version is reset to `0` (latest);
	/// - without one, the pinned form version is used when "current" was chosen, else `0`.
	///
	/// On failure the inserted row is deleted again.
	pub async fn create(&self, record: ResourceRecord, ctx: &RequestContext) -> Result<ResourceId> {
		const KIND: FlowKind = FlowKind::CreateUsage;

		let span = FlowSpan::new(KIND, "create");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.create_inner(record, ctx)).await;

		match &result {
			Ok(id) => {
				tracing::info!(resource_id = %id, "Resource created and usage registered.");
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
			},
			Err(e) => {
				tracing::error!(error = %e, "Failed to create resource.");
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn create_inner(&self, mut record: ResourceRecord, ctx: &RequestContext) -> Result<ResourceId> {
		let now = OffsetDateTime::now_utc();

		record.time_created = Some(now);
		record.time_modified = Some(now);
		normalize(&mut record, ctx.course, now);

		let resolve_version = select_create_version(&mut record);
		let id = self.store.insert(record.clone()).await?;
		let container_id = record.course.unwrap_or(ctx.course);

		record.id = Some(id);

		match self.register_created(record, container_id, resolve_version).await {
			Ok(()) => Ok(id),
			Err(e) => {
				match self.store.delete(id).await {
					Ok(_) => obs::record_flow_outcome(FlowKind::CreateUsage, FlowOutcome::RolledBack),
					Err(delete_error) => tracing::error!(
						resource_id = %id,
						error = %delete_error,
						"Failed to delete resource after usage registration failure."
					),
				}

				Err(e)
			},
		}
	}

	async fn register_created(
		&self,
		mut record: ResourceRecord,
		container_id: CourseId,
		resolve_version: bool,
	) -> Result<()> {
		let id = record.id.ok_or(Error::MissingRecordId)?;
		let request = UsageRequest::from_record(&record, id, container_id);
		let usage = self.service.create_usage(&request).await?;

		record.usage_id = Some(usage.usage_id);

		if resolve_version {
			record.object_version = Some(usage.node_version);
		}

		self.store.update(record).await?;

		Ok(())
	}

	/// Re-registers the usage of an existing record and persists the submitted fields.
	///
	/// The record is addressed by `instance` (falling back to `id`). A ticket for the caller
	/// is fetched before anything is written; if that fails nothing changes. On a later
	/// failure the stored record is restored to its state before the call.
	pub async fn update(&self, record: ResourceRecord, ctx: &RequestContext) -> Result<()> {
		const KIND: FlowKind = FlowKind::UpdateUsage;

		let span = FlowSpan::new(KIND, "update");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.update_inner(record, ctx)).await;

		match &result {
			Ok(id) => {
				tracing::info!(resource_id = %id, "Resource updated and usage refreshed.");
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
			},
			Err(e) => {
				tracing::error!(error = %e, "Failed to update resource.");
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result.map(|_| ())
	}

	async fn update_inner(&self, mut record: ResourceRecord, ctx: &RequestContext) -> Result<ResourceId> {
		let id = record.resolved_id().ok_or(Error::MissingRecordId)?;

		record.id = Some(id);
		record.instance = None;
		normalize(&mut record, ctx.course, OffsetDateTime::now_utc());

		let memento = self.store.fetch(id).await?.ok_or(Error::RecordNotFound { id })?;
		let auth_key = self.resolver.resolve(&ctx.user, ctx.sso.as_ref());
		let ticket = self.service.fetch_ticket(&auth_key).await?;
		let container_id = record.course.unwrap_or(ctx.course);
		let request = UsageRequest::from_record(&record, id, container_id).with_ticket(ticket);

		match self.register_updated(record, &request).await {
			Ok(()) => Ok(id),
			Err(e) => {
				match self.store.update(memento).await {
					Ok(()) => obs::record_flow_outcome(FlowKind::UpdateUsage, FlowOutcome::RolledBack),
					Err(restore_error) => tracing::error!(
						resource_id = %id,
						error = %restore_error,
						"Failed to restore resource after usage refresh failure."
					),
				}

				Err(e)
			},
		}
	}

	async fn register_updated(&self, mut record: ResourceRecord, request: &UsageRequest) -> Result<()> {
		let usage = self.service.create_usage(request).await?;

		record.usage_id = Some(usage.usage_id);

		self.store.update(record).await?;

		Ok(())
	}

	/// Stamps `container_id` into `field` of every resource embedded in `text`.
	///
	/// Failures for single resources are logged and skipped; returns how many records were
	/// updated.
	pub async fn link_embedded_resources(&self, text: &str, container_id: i64, field: IdField) -> usize {
		let span = FlowSpan::new(FlowKind::LinkMarkup, "link_embedded_resources");

		span.instrument(async {
			let mut linked = 0;

			for id in markup::extract_resource_ids(text) {
				match self.store.set_field(id, field, container_id).await {
					Ok(()) => linked += 1,
					Err(e) => tracing::warn!(
						resource_id = %id,
						field = field.as_str(),
						error = %e,
						"Failed to link embedded resource."
					),
				}
			}

			linked
		})
		.await
	}

	/// Builds the course-page summary of the resource `instance`.
	pub async fn course_module_info(
		&self,
		instance: ResourceId,
		show_description: bool,
	) -> Result<ModuleInfo> {
		let record = match self.store.fetch(instance).await? {
			Some(record) => record,
			None => {
				tracing::error!(resource_id = %instance, "Resource not found.");

				return Err(Error::RecordNotFound { id: instance });
			},
		};

		Ok(ModuleInfo {
			name: record.name,
			content: show_description.then_some(record.intro),
			open_in_new_window: record.popup_window,
		})
	}
}
impl Debug for UsageRegistrar {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("UsageRegistrar").field("resolver", &self.resolver).finish_non_exhaustive()
	}
}

/// Applies the create-time version selection, returning whether the repository should
/// resolve the version.
fn select_create_version(record: &mut ResourceRecord) -> bool {
	if record.editor_atto {
		record.intro_format = 0;

		return false;
	}

	match record.object_version.as_deref() {
		Some(version) if leading_integer(version) == 1 => {
			record.object_version = Some(String::new());

			true
		},
		Some(_) => {
			record.object_version = Some("0".into());

			false
		},
		None => {
			let pinned = match (record.window_versionshow, &record.window_version) {
				(Some(VersionShow::Current), Some(version)) => version.clone(),
				_ => "0".into(),
			};

			record.object_version = Some(pinned);

			false
		},
	}
}

/// Reads the integer prefix of `value` (`"1.7"` and `"1abc"` give 1); no prefix gives 0.
fn leading_integer(value: &str) -> i64 {
	let value = value.trim_start();
	let (sign, digits) = match value.strip_prefix('-') {
		Some(rest) => (-1, rest),
		None => (1, value.strip_prefix('+').unwrap_or(value)),
	};
	let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());

	digits[..end].parse::<i64>().map_or(0, |n| sign * n)
}
