//! Application request signatures expected by the repository REST API.
//!
//! Each signed call carries the application id, the signed string (`appId` followed by a
//! millisecond timestamp), and a base64 RSA-SHA256 signature over it.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rsa::{
	RsaPrivateKey,
	pkcs1::DecodeRsaPrivateKey,
	pkcs1v15::SigningKey,
	pkcs8::DecodePrivateKey,
	signature::{SignatureEncoding, Signer},
};
use sha2::Sha256;
// self
use crate::{_prelude::*, auth::AppId, error::EncryptionError};

/// Header carrying the application id.
pub const HEADER_APP_ID: &str = "X-Edu-App-Id";
/// Header carrying the signed string.
pub const HEADER_APP_SIGNED: &str = "X-Edu-App-Signed";
/// Header carrying the base64 signature.
pub const HEADER_APP_SIG: &str = "X-Edu-App-Sig";
/// Header carrying the millisecond timestamp.
pub const HEADER_APP_TS: &str = "X-Edu-App-Ts";

/// Signature headers for one outbound call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppSignature {
	/// Application id.
	pub app_id: AppId,
	/// Milliseconds since the Unix epoch.
	pub timestamp_ms: i128,
	/// `appId` concatenated with the timestamp.
	pub signed: String,
	/// Base64 RSA-SHA256 signature over `signed`.
	pub signature: String,
}
impl AppSignature {
	/// Header name/value pairs in the order the repository documents them.
	pub fn headers(&self) -> [(&'static str, String); 4] {
		[
			(HEADER_APP_ID, self.app_id.to_string()),
			(HEADER_APP_SIGNED, self.signed.clone()),
			(HEADER_APP_SIG, self.signature.clone()),
			(HEADER_APP_TS, self.timestamp_ms.to_string()),
		]
	}
}

/// Signs application requests with the configured private key.
#[derive(Clone)]
pub struct AppSigner {
	app_id: AppId,
	key: SigningKey<Sha256>,
}
impl AppSigner {
	/// Loads the private key (PKCS#8 `PRIVATE KEY` or PKCS#1 `RSA PRIVATE KEY`).
	pub fn from_pem(app_id: AppId, pem: &str) -> Result<Self, EncryptionError> {
		let pem = pem.trim();
		let key = match RsaPrivateKey::from_pkcs8_pem(pem) {
			Ok(key) => key,
			Err(pkcs8) =>
				RsaPrivateKey::from_pkcs1_pem(pem).map_err(|_| EncryptionError::private_key(pkcs8))?,
		};

		Ok(Self { app_id, key: SigningKey::new(key) })
	}

	/// Signs `appId + timestamp` for the given instant.
	pub fn sign_at(&self, instant: OffsetDateTime) -> AppSignature {
		let timestamp_ms = instant.unix_timestamp_nanos() / 1_000_000;
		let signed = format!("{}{timestamp_ms}", self.app_id);
		let signature = STANDARD.encode(self.key.sign(signed.as_bytes()).to_bytes());

		AppSignature { app_id: self.app_id.clone(), timestamp_ms, signed, signature }
	}

	/// Signs using the current UTC clock.
	pub fn sign_now(&self) -> AppSignature {
		self.sign_at(OffsetDateTime::now_utc())
	}
}
impl Debug for AppSigner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AppSigner").field("app_id", &self.app_id).finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use rsa::{
		RsaPublicKey,
		pkcs1v15::{Signature, VerifyingKey},
		pkcs8::DecodePublicKey,
		signature::Verifier,
	};
	use time::macros::datetime;
	// self
	use super::*;
	use crate::_preludet::{APP_PRIVATE_KEY, APP_PUBLIC_KEY};

	#[test]
	fn signature_verifies_against_app_public_key() {
		let app_id = AppId::new("moodle").expect("App id fixture should be valid.");
		let signer =
			AppSigner::from_pem(app_id, APP_PRIVATE_KEY).expect("App key fixture should load.");
		let signature = signer.sign_at(datetime!(2025-01-02 03:04:05 UTC));

		assert_eq!(signature.timestamp_ms, 1_735_787_045_000);
		assert_eq!(signature.signed, "moodle1735787045000");

		let public = RsaPublicKey::from_public_key_pem(APP_PUBLIC_KEY)
			.expect("App public key fixture should load.");
		let raw = STANDARD.decode(&signature.signature).expect("Signature should be base64.");
		let parsed = Signature::try_from(raw.as_slice()).expect("Signature bytes should parse.");

		VerifyingKey::<Sha256>::new(public)
			.verify(signature.signed.as_bytes(), &parsed)
			.expect("Signature should verify.");

		let headers = signature.headers();

		assert_eq!(headers[0], (HEADER_APP_ID, "moodle".to_owned()));
		assert_eq!(headers[3], (HEADER_APP_TS, "1735787045000".to_owned()));
	}

	#[test]
	fn invalid_private_key_is_rejected() {
		let app_id = AppId::new("moodle").expect("App id fixture should be valid.");
		let err = AppSigner::from_pem(app_id, "garbage").expect_err("Garbage must not load.");

		assert!(matches!(err, EncryptionError::PrivateKey { .. }));
	}
}
