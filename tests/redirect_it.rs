// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, pkcs8::DecodePrivateKey};
// self
use edu_sharing_broker::{
	_preludet::*,
	auth::{AuthKeyField, CourseId, ResourceId, SsoSession},
	config::PluginConfig,
	redirect::{DisplayMode, RedirectUrlBuilder, RequestContext},
	usage::ResourceRecord,
};

fn record() -> ResourceRecord {
	ResourceRecord {
		id: Some(ResourceId::new(21)),
		course: Some(CourseId::new(6)),
		object_url: "ccrep://homeRepository/9a8b-7c6d".into(),
		..Default::default()
	}
}

fn decrypted_auth_key(url: &str) -> String {
	let token = Url::parse(url)
		.expect("Redirect URL should parse.")
		.query_pairs()
		.find(|(name, _)| name == "u")
		.map(|(_, value)| value.into_owned())
		.expect("Redirect URL should carry a token.");
	let ciphertext = STANDARD.decode(token).expect("Token should be base64.");
	let key = RsaPrivateKey::from_pkcs8_pem(REPOSITORY_PRIVATE_KEY)
		.expect("Repository private key fixture should load.");
	let plaintext = key.decrypt(Pkcs1v15Encrypt, &ciphertext).expect("Token should decrypt.");

	String::from_utf8(plaintext).expect("Auth key should be UTF-8.")
}

fn build(config: PluginConfig, ctx: &RequestContext) -> String {
	RedirectUrlBuilder::new(Arc::new(config)).build(&record(), DisplayMode::Window, ctx)
}

#[test]
fn settings_driven_builder_encrypts_configured_field() {
	let settings = BTreeMap::from([
		("application_cc_gui_url".to_owned(), "https://repo.example.org/edu-sharing/".to_owned()),
		("application_appid".to_owned(), "moodle-prod".to_owned()),
		("repository_public_key".to_owned(), REPOSITORY_PUBLIC_KEY.to_owned()),
		("EDU_AUTH_KEY".to_owned(), "email".to_owned()),
	]);
	let config = PluginConfig::from_settings(&settings).expect("Settings should form a config.");
	let url = build(config, &test_context(6));

	assert!(url.starts_with(
		"https://repo.example.org/edu-sharing/renderingproxy?app_id=moodle-prod&session=sess-0001&"
	));
	assert_eq!(decrypted_auth_key(&url), "jdoe@example.org");
}

#[test]
fn sso_session_overrides_configured_field() {
	let config =
		PluginConfig { edu_auth_key: AuthKeyField::Email, ..test_config("https://repo.example.org") };
	let ctx = test_context(6).with_sso(SsoSession::new([("userid", "sso-user-7")]));

	assert_eq!(decrypted_auth_key(&build(config, &ctx)), "sso-user-7");
}

#[test]
fn guest_mode_uses_guest_identity() {
	let config = PluginConfig {
		edu_guest_option: true,
		edu_guest_guest_id: None,
		..test_config("https://repo.example.org")
	};

	assert_eq!(decrypted_auth_key(&build(config, &test_context(6))), "esguest");
}

#[test]
fn pkcs1_repository_key_is_accepted() {
	let config = PluginConfig {
		repository_public_key: include_str!("fixtures/repository_public_pkcs1.pem").into(),
		..test_config("https://repo.example.org")
	};

	assert_eq!(decrypted_auth_key(&build(config, &test_context(6))), "jdoe");
}
