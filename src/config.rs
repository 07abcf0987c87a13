//! Plugin configuration: repository endpoints, application identity, keys, and the
//! identity strategy used for auth keys.
//!
//! Configurations come from three places: the validated [`PluginConfigBuilder`], the host
//! plugin-settings table ([`PluginConfig::from_settings`], keyed by the host's setting
//! names), or a JSON document ([`PluginConfig::from_json`]).

// self
use crate::{
	_prelude::*,
	auth::{AppId, AuthKeyField, DEFAULT_SSO_USERID_PARAM},
	error::ConfigError,
};

/// Setting names as stored in the host plugin-settings table.
pub mod setting {
	/// Repository GUI base URL.
	pub const APPLICATION_CC_GUI_URL: &str = "application_cc_gui_url";
	/// Application id registered at the repository.
	pub const APPLICATION_APPID: &str = "application_appid";
	/// Repository public key (PEM).
	pub const REPOSITORY_PUBLIC_KEY: &str = "repository_public_key";
	/// Application private key (PEM) used to sign repository calls.
	pub const APPLICATION_PRIVATE_KEY: &str = "application_private_key";
	/// Guest mode toggle.
	pub const EDU_GUEST_OPTION: &str = "edu_guest_option";
	/// Guest identity.
	pub const EDU_GUEST_GUEST_ID: &str = "edu_guest_guest_id";
	/// Auth key field selector.
	pub const EDU_AUTH_KEY: &str = "EDU_AUTH_KEY";
	/// SSO sub-field carrying the user id.
	pub const EDU_AUTH_PARAM_NAME_USERID: &str = "EDU_AUTH_PARAM_NAME_USERID";
}

const RENDERING_PROXY_PATH: &str = "renderingproxy";

/// Immutable plugin configuration consumed by every component.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
	/// Repository GUI base URL; the rendering proxy and REST API live beneath it.
	pub application_cc_gui_url: Url,
	/// Application id registered at the repository.
	pub application_appid: AppId,
	/// Repository public key (PEM) used to encrypt auth keys.
	pub repository_public_key: String,
	/// Optional application private key (PEM) used to sign repository calls.
	#[serde(default)]
	pub application_private_key: Option<String>,
	/// Guest mode toggle.
	#[serde(default)]
	pub edu_guest_option: bool,
	/// Guest identity used when guest mode is on.
	#[serde(default)]
	pub edu_guest_guest_id: Option<String>,
	/// User attribute used as auth key.
	#[serde(default)]
	pub edu_auth_key: AuthKeyField,
	/// SSO sub-field carrying the user id.
	#[serde(default = "default_sso_userid_param")]
	pub edu_auth_param_name_userid: String,
}
impl PluginConfig {
	/// Creates a new builder.
	pub fn builder() -> PluginConfigBuilder {
		PluginConfigBuilder::default()
	}

	/// Loads the configuration from the host plugin-settings table.
	pub fn from_settings(settings: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
		let get = |name: &str| settings.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());
		let base = get(setting::APPLICATION_CC_GUI_URL)
			.ok_or(ConfigError::MissingSetting { setting: setting::APPLICATION_CC_GUI_URL })?;
		let base = Url::parse(base).map_err(|source| ConfigError::InvalidUrl {
			setting: setting::APPLICATION_CC_GUI_URL,
			source,
		})?;
		let mut builder = Self::builder()
			.application_cc_gui_url(base)
			.application_appid(get(setting::APPLICATION_APPID).unwrap_or_default())
			.repository_public_key(
				settings.get(setting::REPOSITORY_PUBLIC_KEY).map(String::as_str).unwrap_or_default(),
			)
			.edu_guest_option(get(setting::EDU_GUEST_OPTION).is_some_and(|v| v != "0"))
			.edu_auth_key(AuthKeyField::from(get(setting::EDU_AUTH_KEY).unwrap_or_default()));

		if let Some(key) = get(setting::APPLICATION_PRIVATE_KEY) {
			builder = builder.application_private_key(key);
		}
		if let Some(guest) = get(setting::EDU_GUEST_GUEST_ID) {
			builder = builder.edu_guest_guest_id(guest);
		}
		if let Some(param) = get(setting::EDU_AUTH_PARAM_NAME_USERID) {
			builder = builder.edu_auth_param_name_userid(param);
		}

		builder.build()
	}

	/// Parses and validates a JSON configuration document.
	pub fn from_json(document: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(document);
		let config: Self = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ConfigError::Parse { source })?;

		config.validate()?;

		Ok(config)
	}

	/// Endpoint the browser is redirected to for rendering an object.
	pub fn rendering_proxy_url(&self) -> String {
		self.endpoint(RENDERING_PROXY_PATH)
	}

	/// Absolute URL of a repository REST resource (`path` without leading slash).
	pub fn rest_url(&self, path: &str) -> String {
		self.endpoint(&format!("rest/{path}"))
	}

	fn endpoint(&self, path: &str) -> String {
		format!("{}/{path}", self.application_cc_gui_url.as_str().trim_end_matches('/'))
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if !matches!(self.application_cc_gui_url.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedScheme {
				setting: setting::APPLICATION_CC_GUI_URL,
				url: self.application_cc_gui_url.to_string(),
			});
		}
		if self.repository_public_key.trim().is_empty() {
			return Err(ConfigError::MissingSetting { setting: setting::REPOSITORY_PUBLIC_KEY });
		}
		if self.edu_auth_param_name_userid.is_empty() {
			return Err(ConfigError::MissingSetting {
				setting: setting::EDU_AUTH_PARAM_NAME_USERID,
			});
		}

		Ok(())
	}
}
impl Debug for PluginConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PluginConfig")
			.field("application_cc_gui_url", &self.application_cc_gui_url.as_str())
			.field("application_appid", &self.application_appid)
			.field("application_private_key_set", &self.application_private_key.is_some())
			.field("edu_guest_option", &self.edu_guest_option)
			.field("edu_guest_guest_id", &self.edu_guest_guest_id)
			.field("edu_auth_key", &self.edu_auth_key)
			.field("edu_auth_param_name_userid", &self.edu_auth_param_name_userid)
			.finish()
	}
}

/// Builder for [`PluginConfig`] values.
#[derive(Debug, Default)]
pub struct PluginConfigBuilder {
	application_cc_gui_url: Option<Url>,
	application_appid: String,
	repository_public_key: String,
	application_private_key: Option<String>,
	edu_guest_option: bool,
	edu_guest_guest_id: Option<String>,
	edu_auth_key: AuthKeyField,
	edu_auth_param_name_userid: Option<String>,
}
impl PluginConfigBuilder {
	/// Sets the repository GUI base URL.
	pub fn application_cc_gui_url(mut self, url: Url) -> Self {
		self.application_cc_gui_url = Some(url);

		self
	}

	/// Sets the application id.
	pub fn application_appid(mut self, app_id: impl Into<String>) -> Self {
		self.application_appid = app_id.into();

		self
	}

	/// Sets the repository public key (PEM).
	pub fn repository_public_key(mut self, pem: impl Into<String>) -> Self {
		self.repository_public_key = pem.into();

		self
	}

	/// Sets the application private key (PEM) used for request signatures.
	pub fn application_private_key(mut self, pem: impl Into<String>) -> Self {
		self.application_private_key = Some(pem.into());

		self
	}

	/// Toggles guest mode.
	pub fn edu_guest_option(mut self, enabled: bool) -> Self {
		self.edu_guest_option = enabled;

		self
	}

	/// Sets the guest identity.
	pub fn edu_guest_guest_id(mut self, guest_id: impl Into<String>) -> Self {
		self.edu_guest_guest_id = Some(guest_id.into());

		self
	}

	/// Selects the user attribute used as auth key.
	pub fn edu_auth_key(mut self, field: AuthKeyField) -> Self {
		self.edu_auth_key = field;

		self
	}

	/// Overrides the SSO sub-field carrying the user id.
	pub fn edu_auth_param_name_userid(mut self, param: impl Into<String>) -> Self {
		self.edu_auth_param_name_userid = Some(param.into());

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<PluginConfig, ConfigError> {
		let application_cc_gui_url = self
			.application_cc_gui_url
			.ok_or(ConfigError::MissingSetting { setting: setting::APPLICATION_CC_GUI_URL })?;
		let application_appid = AppId::new(&self.application_appid)
			.map_err(|_| ConfigError::MissingSetting { setting: setting::APPLICATION_APPID })?;
		let config = PluginConfig {
			application_cc_gui_url,
			application_appid,
			repository_public_key: self.repository_public_key,
			application_private_key: self.application_private_key,
			edu_guest_option: self.edu_guest_option,
			edu_guest_guest_id: self.edu_guest_guest_id,
			edu_auth_key: self.edu_auth_key,
			edu_auth_param_name_userid: self
				.edu_auth_param_name_userid
				.unwrap_or_else(default_sso_userid_param),
		};

		config.validate()?;

		Ok(config)
	}
}

fn default_sso_userid_param() -> String {
	DEFAULT_SSO_USERID_PARAM.into()
}
