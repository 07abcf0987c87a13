//! Observability helpers for registrar and redirect flows.
//!
//! - Spans are named `edu_sharing_broker.flow` and carry the `flow` and `stage` fields.
//! - Enable `metrics` to increment the `edu_sharing_broker_flow_total` counter for every
//!   attempt/success/failure/rollback, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// Flow kinds observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Insert of a new resource followed by its first usage registration.
	CreateUsage,
	/// Refresh of the usage of an existing resource.
	UpdateUsage,
	/// Construction of a rendering-proxy URL.
	Redirect,
	/// Linking of resources referenced from editor markup.
	LinkMarkup,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::CreateUsage => "create_usage",
			FlowKind::UpdateUsage => "update_usage",
			FlowKind::Redirect => "redirect",
			FlowKind::LinkMarkup => "link_markup",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// A compensating action restored the local record after a failure.
	RolledBack,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
			FlowOutcome::RolledBack => "rolled_back",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
