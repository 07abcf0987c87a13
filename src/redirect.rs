//! Rendering-proxy redirect URLs.
//!
//! The URL is a plain concatenation of individually percent-encoded query parameters in a
//! fixed order: `app_id`, `session`, `rep_id`, `obj_id`, `resource_id`, `course_id`, one
//! `role` per course role, `display`, `version`, `locale` (repository) and `language`
//! (rendering service) with the same value, and finally `u`, the base64 ciphertext of the
//! caller's auth key.

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{
		AuthKeyResolver, CourseId, SsoSession, UserIdentity, extract_object_id,
		extract_repository_id,
	},
	config::PluginConfig,
	crypto::{EncryptedToken, PayloadEncryptor},
	obs::{FlowKind, FlowSpan},
	usage::ResourceRecord,
};

/// How the rendering service should present the object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
	#[default]
	/// Full rendering in its own window.
	Window,
	/// Inline rendering embedded in course content.
	Inline,
}
impl DisplayMode {
	/// Returns the wire value of the mode.
	pub const fn as_str(self) -> &'static str {
		match self {
			DisplayMode::Window => "window",
			DisplayMode::Inline => "inline",
		}
	}
}
impl Display for DisplayMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Request-scoped facts the host application knows about the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestContext {
	/// Host session id.
	pub session_id: String,
	/// Current user.
	pub user: UserIdentity,
	/// Course the request runs in; used when a record lacks one.
	pub course: CourseId,
	/// Role short names the user holds in the course, in provider order.
	pub roles: Vec<String>,
	/// Current UI language.
	pub locale: String,
	/// Values stored by an external SSO script, if any.
	pub sso: Option<SsoSession>,
}
impl RequestContext {
	/// Creates a context without roles, with locale `en` and no SSO session.
	pub fn new(session_id: impl Into<String>, user: UserIdentity, course: CourseId) -> Self {
		Self {
			session_id: session_id.into(),
			user,
			course,
			roles: Vec::new(),
			locale: "en".into(),
			sso: None,
		}
	}

	/// Replaces the role list.
	pub fn with_roles<I, S>(mut self, roles: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.roles = roles.into_iter().map(Into::into).collect();

		self
	}

	/// Overrides the locale.
	pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
		self.locale = locale.into();

		self
	}

	/// Attaches an SSO session.
	pub fn with_sso(mut self, sso: SsoSession) -> Self {
		self.sso = Some(sso);

		self
	}
}

/// Composes rendering-proxy URLs for embedded resources.
#[derive(Clone, Debug)]
pub struct RedirectUrlBuilder {
	config: Arc<PluginConfig>,
	resolver: AuthKeyResolver,
	encryptor: Option<PayloadEncryptor>,
}
impl RedirectUrlBuilder {
	/// Creates a builder; an unusable repository key is logged and yields empty tokens.
	pub fn new(config: Arc<PluginConfig>) -> Self {
		let encryptor = match PayloadEncryptor::from_pem(&config.repository_public_key) {
			Ok(encryptor) => Some(encryptor),
			Err(e) => {
				tracing::warn!(
					error = %e,
					"Repository public key is unusable; redirect tokens will be empty."
				);

				None
			},
		};

		Self { resolver: AuthKeyResolver::from_config(&config), config, encryptor }
	}

	/// Builds the URL, or returns `""` (after logging) if the repository id is unusable.
	pub fn build(
		&self,
		resource: &ResourceRecord,
		display: DisplayMode,
		ctx: &RequestContext,
	) -> String {
		self.try_build(resource, display, ctx).unwrap_or_else(|e| {
			tracing::error!(
				resource_id = ?resource.id,
				object_url = %resource.object_url,
				error = %e,
				"Failed to build redirect URL."
			);

			String::new()
		})
	}

	/// Builds the URL, surfacing an unparsable object reference as an error.
	pub fn try_build(
		&self,
		resource: &ResourceRecord,
		display: DisplayMode,
		ctx: &RequestContext,
	) -> Result<String> {
		let _span = FlowSpan::new(FlowKind::Redirect, "build").entered();
		let mut url = self.config.rendering_proxy_url();

		push_param(&mut url, '?', "app_id", &self.config.application_appid);
		push_param(&mut url, '&', "session", &ctx.session_id);

		let repository = extract_repository_id(&resource.object_url)?;

		push_param(&mut url, '&', "rep_id", &repository);
		push_param(&mut url, '&', "obj_id", &extract_object_id(&resource.object_url));
		push_param(
			&mut url,
			'&',
			"resource_id",
			&resource.id.map(|id| id.to_string()).unwrap_or_default(),
		);
		push_param(&mut url, '&', "course_id", &resource.course.unwrap_or(ctx.course).to_string());

		for role in &ctx.roles {
			push_param(&mut url, '&', "role", role);
		}

		push_param(&mut url, '&', "display", display.as_str());
		push_param(
			&mut url,
			'&',
			"version",
			resource.object_version.as_deref().unwrap_or_default(),
		);
		push_param(&mut url, '&', "locale", &ctx.locale);
		push_param(&mut url, '&', "language", &ctx.locale);

		let token = self.user_token(ctx);

		url.push_str("&u=");
		url.push_str(&urlencoding::encode(&token.to_base64()));

		Ok(url)
	}

	fn user_token(&self, ctx: &RequestContext) -> EncryptedToken {
		let auth_key = self.resolver.resolve(&ctx.user, ctx.sso.as_ref());
		let Some(encryptor) = self.encryptor.as_ref() else {
			return EncryptedToken::default();
		};

		encryptor.encrypt(auth_key.expose().as_bytes()).unwrap_or_else(|e| {
			tracing::warn!(error = %e, "Failed to encrypt auth key; redirect token is empty.");

			EncryptedToken::default()
		})
	}
}

fn push_param(url: &mut String, separator: char, name: &str, value: &str) {
	url.push(separator);
	url.push_str(name);
	url.push('=');
	url.extend(
		form_urlencoded::byte_serialize(value.as_bytes()).map(|chunk| chunk.replace('*', "%2A")),
	);
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::{Engine as _, engine::general_purpose::STANDARD};
	use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, pkcs8::DecodePrivateKey};
	// self
	use super::*;
	use crate::{
		_preludet::{REPOSITORY_PRIVATE_KEY, test_config, test_context},
		auth::ResourceId,
	};

	fn resource() -> ResourceRecord {
		ResourceRecord {
			id: Some(ResourceId::new(11)),
			course: Some(CourseId::new(5)),
			object_url: "ccrep://homeRepository/abc-123-xyz-456789".into(),
			object_version: Some("1.2".into()),
			..Default::default()
		}
	}

	fn query_pairs(url: &str) -> Vec<(String, String)> {
		Url::parse(url)
			.expect("Redirect URL should parse.")
			.query_pairs()
			.map(|(k, v)| (k.into_owned(), v.into_owned()))
			.collect()
	}

	#[test]
	fn parameters_follow_fixed_order() {
		let config = test_config("https://repo.example.org/edu-sharing");
		let builder = RedirectUrlBuilder::new(Arc::new(config));
		let ctx = test_context(5).with_roles(["editingteacher", "student"]);
		let url = builder.build(&resource(), DisplayMode::Inline, &ctx);

		assert!(url.starts_with(
			"https://repo.example.org/edu-sharing/renderingproxy?app_id=moodle-test&session=sess-0001&rep_id=homeRepository&obj_id=abc-123-xyz-456789&resource_id=11&course_id=5&role=editingteacher&role=student&display=inline&version=1.2&locale=de&language=de&u="
		));

		let names: Vec<String> = query_pairs(&url).into_iter().map(|(k, _)| k).collect();

		assert_eq!(
			names,
			[
				"app_id", "session", "rep_id", "obj_id", "resource_id", "course_id", "role",
				"role", "display", "version", "locale", "language", "u",
			]
		);
	}

	#[test]
	fn values_are_percent_encoded() {
		let builder = RedirectUrlBuilder::new(Arc::new(test_config("https://repo.example.org")));
		let ctx = test_context(5).with_roles(["a&b", "x y", "a*b"]).with_locale("de_DE@formal");
		let url = builder.build(&resource(), DisplayMode::Window, &ctx);

		assert!(url.contains("&role=a%26b&role=x+y&role=a%2Ab&"));
		assert!(url.contains("&locale=de_DE%40formal&language=de_DE%40formal&"));

		let token = url.rsplit("&u=").next().expect("Token parameter should be last.");

		assert!(!token.contains('+') && !token.contains('/') && !token.contains('='));
	}

	#[test]
	fn token_decrypts_to_resolved_auth_key() {
		let builder = RedirectUrlBuilder::new(Arc::new(test_config("https://repo.example.org")));
		let url = builder.build(&resource(), DisplayMode::Window, &test_context(5));
		let (_, token) = query_pairs(&url).pop().expect("Token parameter should exist.");
		let ciphertext = STANDARD.decode(token).expect("Token should be base64.");
		let key = RsaPrivateKey::from_pkcs8_pem(REPOSITORY_PRIVATE_KEY)
			.expect("Repository private key fixture should load.");
		let plaintext =
			key.decrypt(Pkcs1v15Encrypt, &ciphertext).expect("Token should decrypt.");

		assert_eq!(plaintext, b"jdoe");
	}

	#[test]
	fn zero_roles_emit_no_role_parameter() {
		let builder = RedirectUrlBuilder::new(Arc::new(test_config("https://repo.example.org")));
		let ctx = test_context(5).with_roles(Vec::<String>::new());
		let url = builder.build(&resource(), DisplayMode::Window, &ctx);

		assert!(!url.contains("&role="));
	}

	#[test]
	fn unparsable_reference_yields_empty_url() {
		let builder = RedirectUrlBuilder::new(Arc::new(test_config("https://repo.example.org")));
		let broken = ResourceRecord { object_url: "not a reference".into(), ..resource() };

		assert_eq!(builder.build(&broken, DisplayMode::Window, &test_context(5)), "");
		assert!(matches!(
			builder.try_build(&broken, DisplayMode::Window, &test_context(5)),
			Err(Error::UnparsableReference { .. })
		));
	}

	#[test]
	fn unusable_key_keeps_url_with_empty_token() {
		let mut config = test_config("https://repo.example.org");

		config.repository_public_key = "broken".into();

		let builder = RedirectUrlBuilder::new(Arc::new(config));
		let url = builder.build(&resource(), DisplayMode::Window, &test_context(5));

		assert!(url.ends_with("&language=de&u="));
	}

	#[test]
	fn missing_record_course_falls_back_to_context() {
		let builder = RedirectUrlBuilder::new(Arc::new(test_config("https://repo.example.org")));
		let record = ResourceRecord { course: None, object_version: None, ..resource() };
		let url = builder.build(&record, DisplayMode::Window, &test_context(9));

		assert!(url.contains("&course_id=9&"));
		assert!(url.contains("&version=&"));
	}
}
