//! Crate-level error types shared by the redirect builder, the usage registrar, and stores.

// self
use crate::{_prelude::*, auth::ResourceId};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Key loading, encryption, or signing failed.
	#[error(transparent)]
	Encryption(#[from] EncryptionError),
	/// The repository usage API was unreachable or rejected the call.
	#[error(transparent)]
	RemoteCall(#[from] RemoteCallError),

	/// Repository object reference could not be parsed.
	#[error("Repository object reference `{reference}` cannot be parsed.")]
	UnparsableReference {
		/// Offending reference string.
		reference: String,
	},
	/// Record passed to an update carried neither `id` nor `instance`.
	#[error("Resource record has no identifier.")]
	MissingRecordId,
	/// Record expected in the store was absent.
	#[error("Resource record {id} does not exist.")]
	RecordNotFound {
		/// Identifier that was looked up.
		id: ResourceId,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A required setting is missing or empty.
	#[error("Setting `{setting}` is required.")]
	MissingSetting {
		/// Setting name as stored in the plugin settings table.
		setting: &'static str,
	},
	/// A URL setting cannot be parsed.
	#[error("Setting `{setting}` is not a valid URL.")]
	InvalidUrl {
		/// Setting name as stored in the plugin settings table.
		setting: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The repository GUI URL must use HTTP(S).
	#[error("Setting `{setting}` must use http or https: {url}.")]
	UnsupportedScheme {
		/// Setting name as stored in the plugin settings table.
		setting: &'static str,
		/// URL that failed validation.
		url: String,
	},
	/// JSON configuration document could not be parsed.
	#[error("Configuration document is malformed.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised while loading keys or producing ciphertext/signatures.
#[derive(Debug, ThisError)]
pub enum EncryptionError {
	/// PEM text did not contain a usable RSA public key.
	#[error("Repository public key cannot be loaded.")]
	PublicKey {
		/// Underlying decoding failure.
		#[source]
		source: BoxError,
	},
	/// PEM text did not contain a usable RSA private key.
	#[error("Application private key cannot be loaded.")]
	PrivateKey {
		/// Underlying decoding failure.
		#[source]
		source: BoxError,
	},
	/// The RSA operation itself failed (e.g., payload too long for the key).
	#[error("Encryption with the repository public key failed.")]
	Encrypt(#[source] rsa::Error),
}
impl EncryptionError {
	/// Wraps a public key decoding failure.
	pub fn public_key(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::PublicKey { source: Box::new(src) }
	}

	/// Wraps a private key decoding failure.
	pub fn private_key(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::PrivateKey { source: Box::new(src) }
	}
}

/// Failures talking to the repository usage API.
#[derive(Debug, ThisError)]
pub enum RemoteCallError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the repository.")]
	Transport {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Repository answered with a non-success status.
	#[error("Repository rejected the {operation} call with status {status}.")]
	Rejected {
		/// Operation label (`create_usage`, `fetch_ticket`).
		operation: &'static str,
		/// HTTP status code.
		status: u16,
		/// Truncated response body for diagnostics.
		body_preview: Option<String>,
	},
	/// Repository responded with JSON that does not match the expected shape.
	#[error("Repository returned a malformed {operation} response.")]
	Decode {
		/// Operation label (`create_usage`, `fetch_ticket`).
		operation: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Request could not be built from the configured endpoint.
	#[error("Repository endpoint for {operation} is invalid.")]
	Endpoint {
		/// Operation label (`create_usage`, `fetch_ticket`).
		operation: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Any other failure reported by a [`UsageService`](crate::usage::UsageService) implementation.
	#[error("Repository call failed: {message}.")]
	Other {
		/// Human-readable error payload.
		message: String,
	},
}
impl RemoteCallError {
	/// Wraps a transport-specific network error.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for RemoteCallError {
	fn from(e: ReqwestError) -> Self {
		Self::transport(e)
	}
}
