//! Shared reqwest transport for repository calls.

// std
use std::ops::Deref;
// crates.io
use reqwest::redirect::Policy;
// self
use crate::{_prelude::*, error::ConfigError};

const BODY_PREVIEW_LIMIT: usize = 256;

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Repository REST endpoints answer directly; the default client built by
/// [`ReqwestHttpClient::new`] therefore does not follow redirects. Timeouts are left to
/// whatever the wrapped client was configured with.
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Builds a client that does not follow redirects.
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().redirect(Policy::none()).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// Truncates a response body for error reports; `None` for blank bodies.
pub fn body_preview(body: &str) -> Option<String> {
	let trimmed = body.trim();

	if trimmed.is_empty() {
		return None;
	}

	Some(trimmed.chars().take(BODY_PREVIEW_LIMIT).collect())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn body_preview_truncates_and_skips_blank() {
		assert_eq!(body_preview("  \n"), None);
		assert_eq!(body_preview(" oops "), Some("oops".into()));
		assert_eq!(
			body_preview(&"x".repeat(1000)).map(|preview| preview.len()),
			Some(BODY_PREVIEW_LIMIT)
		);
	}
}
