//! Embed edu-sharing repository objects into learning-management courses: signed
//! rendering-proxy redirects, encrypted user tokens, and usage registration with local
//! rollback.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
#[cfg(feature = "reqwest")] pub mod http;
pub mod markup;
pub mod obs;
pub mod redirect;
pub mod store;
pub mod usage;
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and fixtures shared by unit and integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{AuthKeyField, CourseId, UserIdentity},
		config::PluginConfig,
		redirect::RequestContext,
	};

	/// PEM-encoded public key of the fixture repository (PKCS#8).
	pub const REPOSITORY_PUBLIC_KEY: &str = include_str!("../tests/fixtures/repository_public.pem");
	/// PEM-encoded private key matching [`REPOSITORY_PUBLIC_KEY`].
	pub const REPOSITORY_PRIVATE_KEY: &str =
		include_str!("../tests/fixtures/repository_private.pem");
	/// PEM-encoded private key used to sign application requests.
	pub const APP_PRIVATE_KEY: &str = include_str!("../tests/fixtures/app_private.pem");
	/// PEM-encoded public key matching [`APP_PRIVATE_KEY`].
	pub const APP_PUBLIC_KEY: &str = include_str!("../tests/fixtures/app_public.pem");

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_http_client() -> crate::http::ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		crate::http::ReqwestHttpClient::with_client(client)
	}

	/// Builds a plugin configuration pointing at `base_url` with the fixture repository key.
	pub fn test_config(base_url: &str) -> PluginConfig {
		PluginConfig::builder()
			.application_cc_gui_url(
				Url::parse(base_url).expect("Fixture base URL should parse successfully."),
			)
			.application_appid("moodle-test")
			.repository_public_key(REPOSITORY_PUBLIC_KEY)
			.edu_auth_key(AuthKeyField::Username)
			.build()
			.expect("Fixture plugin configuration should build successfully.")
	}

	/// Builds a request context for a teacher enrolled in `course`.
	pub fn test_context(course: i64) -> RequestContext {
		let user = UserIdentity {
			id: 42,
			username: "jdoe".into(),
			idnumber: "ID-42".into(),
			email: "jdoe@example.org".into(),
			profile: BTreeMap::new(),
		};

		RequestContext::new("sess-0001", user, CourseId::new(course))
			.with_roles(["editingteacher"])
			.with_locale("de")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
