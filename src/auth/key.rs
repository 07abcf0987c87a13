//! Resolution of the auth key: the string the repository uses to identify the caller.
//!
//! Precedence (first match wins):
//!
//! 1. An SSO session established by an external script; its configured sub-field is used.
//! 2. Guest mode; the configured guest id or [`DEFAULT_GUEST_ID`].
//! 3. The user attribute selected by [`AuthKeyField`], falling back to the username.

// self
use crate::{_prelude::*, auth::AuthKey, config::PluginConfig};

/// Guest identity used when guest mode is on and no guest id is configured.
pub const DEFAULT_GUEST_ID: &str = "esguest";
/// SSO sub-field read when no parameter name is configured.
pub const DEFAULT_SSO_USERID_PARAM: &str = "userid";

/// User attribute selected by the `EDU_AUTH_KEY` setting.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuthKeyField {
	/// Numeric host user id.
	Id,
	/// Alternate (institution-assigned) identifier.
	IdNumber,
	/// Email address.
	Email,
	/// Named custom profile attribute; falls back to the username when unset.
	Profile(String),
	#[default]
	/// Login name.
	Username,
}
impl AuthKeyField {
	/// Returns the setting value this selector is stored as.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Id => "id",
			Self::IdNumber => "idnumber",
			Self::Email => "email",
			Self::Profile(name) => name,
			Self::Username => "username",
		}
	}
}
impl From<&str> for AuthKeyField {
	fn from(value: &str) -> Self {
		match value.trim() {
			"id" => Self::Id,
			"idnumber" => Self::IdNumber,
			"email" => Self::Email,
			"" | "username" => Self::Username,
			other => Self::Profile(other.to_owned()),
		}
	}
}
impl From<String> for AuthKeyField {
	fn from(value: String) -> Self {
		Self::from(value.as_str())
	}
}
impl From<AuthKeyField> for String {
	fn from(value: AuthKeyField) -> Self {
		value.as_str().to_owned()
	}
}
impl Display for AuthKeyField {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// The host user on whose behalf a request runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
	/// Numeric host user id.
	pub id: i64,
	/// Login name.
	pub username: String,
	/// Alternate identifier.
	pub idnumber: String,
	/// Email address.
	pub email: String,
	/// Custom profile attributes keyed by short name.
	pub profile: BTreeMap<String, String>,
}

/// Values placed into the session by an external SSO script.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SsoSession(pub BTreeMap<String, String>);
impl SsoSession {
	/// Builds a session from key/value pairs.
	pub fn new<I, K, V>(values: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self(values.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}

	/// Returns `true` when the SSO script stored nothing.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Looks up a sub-field.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}
}

/// Pure lookup of the caller's auth key against user, session, and configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthKeyResolver {
	/// Attribute consulted when neither SSO nor guest mode applies.
	pub field: AuthKeyField,
	/// Guest mode toggle.
	pub guest_enabled: bool,
	/// Configured guest identity, if any.
	pub guest_id: Option<String>,
	/// SSO sub-field holding the user id.
	pub sso_userid_param: String,
}
impl AuthKeyResolver {
	/// Extracts the resolver settings from a plugin configuration.
	pub fn from_config(config: &PluginConfig) -> Self {
		Self {
			field: config.edu_auth_key.clone(),
			guest_enabled: config.edu_guest_option,
			guest_id: config.edu_guest_guest_id.clone(),
			sso_userid_param: config.edu_auth_param_name_userid.clone(),
		}
	}

	/// Resolves the auth key for `user`, honoring an SSO session when present.
	pub fn resolve(&self, user: &UserIdentity, sso: Option<&SsoSession>) -> AuthKey {
		if let Some(session) = sso.filter(|session| !session.is_empty()) {
			return match session.get(&self.sso_userid_param) {
				Some(value) => AuthKey::new(value),
				None => {
					tracing::warn!(
						param = %self.sso_userid_param,
						"SSO session lacks the configured user id field."
					);

					AuthKey::new("")
				},
			};
		}
		if self.guest_enabled {
			let guest = self
				.guest_id
				.as_deref()
				.filter(|id| !id.is_empty())
				.unwrap_or(DEFAULT_GUEST_ID);

			return AuthKey::new(guest);
		}

		let value = match &self.field {
			AuthKeyField::Id => user.id.to_string(),
			AuthKeyField::IdNumber => user.idnumber.clone(),
			AuthKeyField::Email => user.email.clone(),
			AuthKeyField::Profile(name) =>
				user.profile.get(name).cloned().unwrap_or_else(|| user.username.clone()),
			AuthKeyField::Username => user.username.clone(),
		};

		AuthKey::new(value)
	}
}
impl Default for AuthKeyResolver {
	fn default() -> Self {
		Self {
			field: AuthKeyField::default(),
			guest_enabled: false,
			guest_id: None,
			sso_userid_param: DEFAULT_SSO_USERID_PARAM.into(),
		}
	}
}
