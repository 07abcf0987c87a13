//! Parsing of repository object references such as `ccrep://homeRepository/abc-123`.
//!
//! The host part names the repository and the path names the object (node). Object ids
//! degrade to an empty string when the reference is unusable, while repository ids fail
//! hard: without one no redirect or usage call can be addressed.

// self
use crate::{_prelude::*, auth::RepositoryId};

/// A parsed `scheme://repositoryId/objectId` reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectReference {
	/// Repository hosting the object.
	pub repository: RepositoryId,
	/// Object (node) identifier with path separators stripped.
	pub object_id: String,
}
impl ObjectReference {
	/// Parses both components, failing if either the URI or its host is unusable.
	pub fn parse(reference: &str) -> Result<Self> {
		let repository = extract_repository_id(reference)?;
		let object_id = extract_object_id(reference);

		Ok(Self { repository, object_id })
	}
}
impl Display for ObjectReference {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "ccrep://{}/{}", self.repository, self.object_id)
	}
}
impl FromStr for ObjectReference {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

/// Returns the object id (URI path without separators), or `""` when the reference cannot
/// be parsed.
pub fn extract_object_id(reference: &str) -> String {
	match Url::parse(reference) {
		Ok(url) => url.path().replace('/', ""),
		Err(e) => {
			tracing::warn!(reference, error = %e, "Failed to extract object id from reference.");

			String::new()
		},
	}
}

/// Returns the repository id (URI host).
pub fn extract_repository_id(reference: &str) -> Result<RepositoryId> {
	let unparsable = || Error::UnparsableReference { reference: reference.to_owned() };
	let url = Url::parse(reference).map_err(|_| unparsable())?;
	let host = url.host_str().filter(|host| !host.is_empty()).ok_or_else(unparsable)?;

	RepositoryId::new(host).map_err(|_| unparsable())
}
