use aws_lc_rs::hmac;
use base64::{Engine, engine::general_purpose::STANDARD};

/// Calculate the base64 encoded HMAC-SHA512 digest of a serialized token.
///
/// The HMAC key is the application ID immediately followed by the secret, so a precomputed
/// lookup table has to be built per application.
/// The result is deterministic: the same inputs always produce the same digest.
pub fn calculate_digest(application_id: &str, secret: &str, token: &str) -> String {
	let salt = [application_id.as_bytes(), secret.as_bytes()].concat();
	let key = hmac::Key::new(hmac::HMAC_SHA512, &salt);
	let tag = hmac::sign(&key, token.as_bytes());

	STANDARD.encode(tag.as_ref())
}
