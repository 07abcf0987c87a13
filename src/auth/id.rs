//! Strongly typed identifiers for repository objects and host records.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

macro_rules! def_record_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(
			Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
		)]
		#[serde(transparent)]
		pub struct $name(i64);
		impl $name {
			/// Wraps a host primary key.
			pub const fn new(value: i64) -> Self {
				Self(value)
			}

			/// Returns the raw primary key.
			pub const fn get(self) -> i64 {
				self.0
			}
		}
		impl From<i64> for $name {
			fn from(value: i64) -> Self {
				Self(value)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				Display::fmt(&self.0, f)
			}
		}
		impl FromStr for $name {
			type Err = std::num::ParseIntError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				s.trim().parse().map(Self)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 255;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (repository, application).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (repository, application).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (repository, application).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! { RepositoryId, "Identifier of the repository hosting an object (URI host part).", "Repository" }
def_id! { AppId, "Identifier the host application is registered under at the repository.", "App" }

def_record_id! { ResourceId, "Primary key of a local resource record.", "Resource" }
def_record_id! { CourseId, "Primary key of the course a resource is embedded in.", "Course" }

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn string_identifiers_validate() {
		assert!(RepositoryId::new(" home").is_err(), "Leading whitespace must be rejected.");
		assert!(AppId::new("").is_err());

		let repository =
			RepositoryId::new("homeRepository").expect("Repository fixture should be valid.");

		assert_eq!(repository.as_ref(), "homeRepository");
		assert_eq!(format!("{repository:?}"), "Repository(homeRepository)");
	}

	#[test]
	fn serde_enforces_validation() {
		let repository: RepositoryId =
			serde_json::from_str("\"local\"").expect("Repository should deserialize.");

		assert_eq!(&*repository, "local");
		assert!(serde_json::from_str::<RepositoryId>("\"with space\"").is_err());
	}

	#[test]
	fn record_ids_are_transparent_numbers() {
		let id = ResourceId::new(17);

		assert_eq!(serde_json::to_string(&id).expect("Id should serialize."), "17");
		assert_eq!(id.to_string(), "17");
		assert_eq!(" 17".parse::<ResourceId>().expect("Id should parse."), id);
		assert_eq!(format!("{:?}", CourseId::new(3)), "Course(3)");
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<AppId, u8> = HashMap::from_iter([(
			AppId::new("moodle").expect("App id used for lookup should be valid."),
			7_u8,
		)]);

		assert_eq!(map.get("moodle"), Some(&7));
	}
}
