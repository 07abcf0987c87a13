//! Asymmetric encryption of auth keys with the repository public key, plus signing of
//! application requests.

pub mod signer;

pub use signer::*;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rsa::{
	Pkcs1v15Encrypt, RsaPublicKey, pkcs1::DecodeRsaPublicKey, pkcs8::DecodePublicKey,
};
// self
use crate::{_prelude::*, error::EncryptionError};

/// Opaque ciphertext produced by [`PayloadEncryptor`]. Empty means encryption failed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EncryptedToken(Vec<u8>);
impl EncryptedToken {
	/// Returns the raw ciphertext.
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	/// Returns `true` when no ciphertext is present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Standard (padded) base64 form carried in redirect URLs.
	pub fn to_base64(&self) -> String {
		STANDARD.encode(&self.0)
	}
}
impl Debug for EncryptedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "EncryptedToken({} bytes)", self.0.len())
	}
}

/// Encrypts payloads for the repository with its published RSA key (PKCS#1 v1.5 padding).
#[derive(Clone, Debug)]
pub struct PayloadEncryptor {
	key: RsaPublicKey,
}
impl PayloadEncryptor {
	/// Loads the repository key from PEM text (SPKI `PUBLIC KEY` or PKCS#1 `RSA PUBLIC KEY`).
	pub fn from_pem(pem: &str) -> Result<Self, EncryptionError> {
		let pem = pem.trim();
		let key = match RsaPublicKey::from_public_key_pem(pem) {
			Ok(key) => key,
			Err(spki) =>
				RsaPublicKey::from_pkcs1_pem(pem).map_err(|_| EncryptionError::public_key(spki))?,
		};

		Ok(Self { key })
	}

	/// Encrypts `plaintext` with the repository key.
	pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedToken, EncryptionError> {
		let mut rng = rand::thread_rng();
		let ciphertext = self
			.key
			.encrypt(&mut rng, Pkcs1v15Encrypt, plaintext)
			.map_err(EncryptionError::Encrypt)?;

		Ok(EncryptedToken(ciphertext))
	}
}

/// Loads `public_key_pem` and encrypts `plaintext`, degrading to an empty token on failure.
///
/// The failure is logged; callers must treat an empty token as unusable.
pub fn encrypt_with_repository_key(plaintext: &[u8], public_key_pem: &str) -> EncryptedToken {
	match PayloadEncryptor::from_pem(public_key_pem)
		.and_then(|encryptor| encryptor.encrypt(plaintext))
	{
		Ok(token) => token,
		Err(e) => {
			tracing::warn!(error = %e, "Failed to encrypt payload with the repository key.");

			EncryptedToken::default()
		},
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use rsa::{RsaPrivateKey, pkcs8::DecodePrivateKey};
	// self
	use super::*;
	use crate::_preludet::{REPOSITORY_PRIVATE_KEY, REPOSITORY_PUBLIC_KEY};

	fn decrypt(token: &EncryptedToken) -> Vec<u8> {
		let key = RsaPrivateKey::from_pkcs8_pem(REPOSITORY_PRIVATE_KEY)
			.expect("Repository private key fixture should load.");

		key.decrypt(Pkcs1v15Encrypt, token.as_bytes()).expect("Ciphertext should decrypt.")
	}

	#[test]
	fn encrypts_for_the_repository_key() {
		let encryptor = PayloadEncryptor::from_pem(REPOSITORY_PUBLIC_KEY)
			.expect("Repository public key fixture should load.");
		let token = encryptor.encrypt(b"jdoe").expect("Short payload should encrypt.");

		assert_eq!(token.as_bytes().len(), 256);
		assert_eq!(decrypt(&token), b"jdoe");
		assert_eq!(STANDARD.decode(token.to_base64()).expect("Base64 should decode."), token.0);
	}

	#[test]
	fn accepts_pkcs1_public_keys() {
		let pem = include_str!("../tests/fixtures/repository_public_pkcs1.pem");
		let token = encrypt_with_repository_key(b"visitor", pem);

		assert_eq!(decrypt(&token), b"visitor");
	}

	#[test]
	fn invalid_key_degrades_to_empty_token() {
		let err = PayloadEncryptor::from_pem("not a key").expect_err("Garbage must not load.");

		assert!(matches!(err, EncryptionError::PublicKey { .. }));
		assert!(encrypt_with_repository_key(b"jdoe", "not a key").is_empty());
	}

	#[test]
	fn oversized_payload_fails_to_encrypt() {
		let encryptor = PayloadEncryptor::from_pem(REPOSITORY_PUBLIC_KEY)
			.expect("Repository public key fixture should load.");
		let err = encryptor.encrypt(&[b'x'; 300]).expect_err("Payload exceeds the modulus.");

		assert!(matches!(err, EncryptionError::Encrypt(_)));
	}
}
