use std::fmt;

use aws_lc_rs::constant_time;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result, Token, calculate_digest};

/// Every digest token starts with this prefix.
pub const DIGEST_TOKEN_PREFIX: &str = "DIGEST:";

/// The outcome of verifying a token.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Code {
	/// The digest matched and the payload was decoded.
	Verified,
	/// The token could not be decoded.
	BadToken,
	/// The digest did not match, usually because of the wrong secret.
	BadDigest,
	/// The value is not a `DIGEST:` token at all.
	NotADigestToken,
	/// The digest algorithm is not available.
	Unsupported,
}

impl Code {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Verified => "verified",
			Self::BadToken => "bad-token",
			Self::BadDigest => "bad-digest",
			Self::NotADigestToken => "not-a-digest-token",
			Self::Unsupported => "unsupported",
		}
	}
}

impl fmt::Display for Code {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The result of [`DigestTokens::verify_and_decode`].
///
/// Untrusted input routinely fails verification, so failures are data rather than errors.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Verification {
	pub verified: bool,
	pub code: Code,

	/// The decoded payload, with `applicationId` injected. Only set when verified.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub value: Option<Token>,
}

impl Verification {
	fn verified(value: Token) -> Self {
		Self {
			verified: true,
			code: Code::Verified,
			value: Some(value),
		}
	}

	fn rejected(code: Code) -> Self {
		tracing::debug!(%code, "digest token rejected");

		Self {
			verified: false,
			code,
			value: None,
		}
	}
}

// The outer wrapper that gets base64 encoded. Field order is part of the encoding.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a> {
	application_id: &'a str,
	digest: &'a str,
	token: &'a str,
}

impl<'a> Envelope<'a> {
	// Every field must be present as a non-empty string.
	fn from_map(map: &'a Map<String, Value>) -> Option<Self> {
		let field = |name: &str| map.get(name)?.as_str().filter(|value| !value.is_empty());

		Some(Self {
			application_id: field("applicationId")?,
			digest: field("digest")?,
			token: field("token")?,
		})
	}
}

/// Signs, encodes, verifies and decodes digest tokens.
///
/// An encoded token is `DIGEST:` followed by the standard base64 encoding of the JSON envelope
/// `{"applicationId":...,"digest":...,"token":...}`, where `token` is the compact JSON payload
/// and `digest` is the HMAC computed by [`calculate_digest`] over that exact string.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestTokens;

impl DigestTokens {
	pub fn new() -> Self {
		Self
	}

	/// Returns true if the value looks like a digest token; no verification is performed.
	pub fn is_digest_token(&self, value: &str) -> bool {
		value.starts_with(DIGEST_TOKEN_PREFIX)
	}

	/// Sign the payload and encode it as a digest token.
	///
	/// The payload must have a numeric `expires` and must not have an `applicationId`.
	pub fn sign_and_encode(&self, application_id: &str, secret: &str, token: &Token) -> Result<String> {
		match token.get(Token::EXPIRES) {
			None => return Err(Error::MissingExpiration),
			Some(expires) if !expires.is_number() => return Err(Error::InvalidExpiration),
			Some(_) => {}
		}

		if token.contains(Token::APPLICATION_ID) {
			return Err(Error::ReservedApplicationId);
		}

		let token = token.to_string()?;
		let digest = calculate_digest(application_id, secret, &token);

		let envelope = Envelope {
			application_id,
			digest: &digest,
			token: &token,
		};
		let envelope = serde_json::to_string(&envelope)?;

		tracing::trace!(%application_id, %token, "signed digest token");

		Ok(format!("{}{}", DIGEST_TOKEN_PREFIX, STANDARD.encode(envelope)))
	}

	/// Verify the digest of an encoded token and decode its payload.
	///
	/// Never fails: malformed or forged input produces a [`Verification`] with the reason in
	/// [`Verification::code`].
	///
	/// The encoded token is matched exactly: surrounding whitespace, such as a trailing newline
	/// from a file or stdin, is not trimmed and yields [`Code::BadToken`]. Trim it first.
	pub fn verify_and_decode(&self, secret: &str, encoded_token: &str) -> Verification {
		let Some(encoded) = encoded_token.strip_prefix(DIGEST_TOKEN_PREFIX) else {
			return Verification::rejected(Code::NotADigestToken);
		};

		let Ok(decoded) = STANDARD.decode(encoded) else {
			return Verification::rejected(Code::BadToken);
		};

		let Ok(map) = serde_json::from_slice::<Map<String, Value>>(&decoded) else {
			return Verification::rejected(Code::BadToken);
		};

		let Some(envelope) = Envelope::from_map(&map) else {
			return Verification::rejected(Code::BadToken);
		};

		let expected = calculate_digest(envelope.application_id, secret, envelope.token);

		if constant_time::verify_slices_are_equal(expected.as_bytes(), envelope.digest.as_bytes()).is_err() {
			return Verification::rejected(Code::BadDigest);
		}

		let Ok(mut value) = Token::from_str(envelope.token) else {
			return Verification::rejected(Code::BadToken);
		};

		value.insert(Token::APPLICATION_ID, envelope.application_id);

		Verification::verified(value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const APPLICATION_ID: &str = "my-application-id";
	const SECRET: &str = "my-secret";

	fn payload() -> Token {
		let mut token = Token::new();
		token.insert(Token::EXPIRES, 1000);
		token.insert(Token::TYPE, "publish");
		token
	}

	// Wrap an arbitrary envelope the same way sign_and_encode does.
	fn encode(envelope: &str) -> String {
		format!("{}{}", DIGEST_TOKEN_PREFIX, STANDARD.encode(envelope))
	}

	#[test]
	fn sign_fixture() {
		let encoded = DigestTokens::new().sign_and_encode(APPLICATION_ID, SECRET, &payload()).unwrap();

		assert_eq!(
			encoded,
			"DIGEST:eyJhcHBsaWNhdGlvbklkIjoibXktYXBwbGljYXRpb24taWQiLCJkaWdlc3QiOiJrVElBcDh4ZUlqRXBxU2p0R3Zha3JOR2FFWnl5S1hMdmRMdmpBTHpJYkhYQmtqVXg2eU9hOHNmTGVoMFJydnNHaDJFbHF5OE5MMVBFVG51QjdQR3Z6dz09IiwidG9rZW4iOiJ7XCJleHBpcmVzXCI6MTAwMCxcInR5cGVcIjpcInB1Ymxpc2hcIn0ifQ=="
		);
	}

	#[test]
	fn envelope_layout() {
		let encoded = DigestTokens::new().sign_and_encode(APPLICATION_ID, SECRET, &payload()).unwrap();
		let decoded = STANDARD.decode(encoded.strip_prefix(DIGEST_TOKEN_PREFIX).unwrap()).unwrap();

		assert_eq!(
			String::from_utf8(decoded).unwrap(),
			r#"{"applicationId":"my-application-id","digest":"kTIAp8xeIjEpqSjtGvakrNGaEZyyKXLvdLvjALzIbHXBkjUx6yOa8sfLeh0RrvsGh2Elqy8NL1PETnuB7PGvzw==","token":"{\"expires\":1000,\"type\":\"publish\"}"}"#
		);
	}

	#[test]
	fn round_trip() {
		let tokens = DigestTokens::new();

		let mut token = payload();
		token.append(Token::CAPABILITIES, "multi-bitrate");
		token.insert(Token::URI, "https://my-custom-backend.example.org/ünïcode");

		let encoded = tokens.sign_and_encode(APPLICATION_ID, SECRET, &token).unwrap();
		let result = tokens.verify_and_decode(SECRET, &encoded);

		assert!(result.verified);
		assert_eq!(result.code, Code::Verified);

		let mut expected = token.clone();
		expected.insert(Token::APPLICATION_ID, APPLICATION_ID);
		assert_eq!(result.value, Some(expected));
	}

	#[test]
	fn wrong_secret() {
		let tokens = DigestTokens::new();
		let encoded = tokens.sign_and_encode(APPLICATION_ID, SECRET, &payload()).unwrap();

		let result = tokens.verify_and_decode("bad-secret", &encoded);
		assert!(!result.verified);
		assert_eq!(result.code, Code::BadDigest);
		assert_eq!(result.value, None);
	}

	#[test]
	fn not_a_digest_token() {
		let tokens = DigestTokens::new();
		assert!(!tokens.is_digest_token("not-a-digest-token"));
		assert!(!tokens.is_digest_token("digest:abc"));
		assert!(tokens.is_digest_token("DIGEST:"));

		let result = tokens.verify_and_decode(SECRET, "not-a-digest-token");
		assert!(!result.verified);
		assert_eq!(result.code, Code::NotADigestToken);
		assert_eq!(result.value, None);
	}

	#[test]
	fn bad_base64() {
		let result = DigestTokens::new().verify_and_decode(SECRET, "DIGEST:bad-token");
		assert!(!result.verified);
		assert_eq!(result.code, Code::BadToken);
		assert_eq!(result.value, None);
	}

	#[test]
	fn bad_json() {
		let tokens = DigestTokens::new();
		assert_eq!(tokens.verify_and_decode(SECRET, &encode("not json")).code, Code::BadToken);
		assert_eq!(tokens.verify_and_decode(SECRET, &encode("[]")).code, Code::BadToken);
		assert_eq!(tokens.verify_and_decode(SECRET, "DIGEST:").code, Code::BadToken);

		let not_utf8 = format!("{}{}", DIGEST_TOKEN_PREFIX, STANDARD.encode([0xff, 0xfe, b'{', b'}']));
		assert_eq!(tokens.verify_and_decode(SECRET, &not_utf8).code, Code::BadToken);
	}

	#[test]
	fn surrounding_whitespace() {
		let tokens = DigestTokens::new();
		let encoded = tokens.sign_and_encode(APPLICATION_ID, SECRET, &payload()).unwrap();

		assert_eq!(tokens.verify_and_decode(SECRET, &format!("{encoded}\n")).code, Code::BadToken);
		assert_eq!(tokens.verify_and_decode(SECRET, format!(" {encoded}").trim()).code, Code::Verified);
	}

	#[test]
	fn bad_envelope() {
		let tokens = DigestTokens::new();

		let missing = encode(r#"{"applicationId":"my-application-id","token":"{}"}"#);
		assert_eq!(tokens.verify_and_decode(SECRET, &missing).code, Code::BadToken);

		let wrong_type = encode(r#"{"applicationId":42,"digest":"abc","token":"{}"}"#);
		assert_eq!(tokens.verify_and_decode(SECRET, &wrong_type).code, Code::BadToken);

		let array = encode(r#"["my-application-id","abc","{}"]"#);
		assert_eq!(tokens.verify_and_decode(SECRET, &array).code, Code::BadToken);

		let empty = encode(r#"{"applicationId":"","digest":"abc","token":"{}"}"#);
		assert_eq!(tokens.verify_and_decode(SECRET, &empty).code, Code::BadToken);
	}

	#[test]
	fn signed_payload_not_an_object() {
		let token = "[1,2,3]";
		let envelope = serde_json::json!({
			"applicationId": APPLICATION_ID,
			"digest": calculate_digest(APPLICATION_ID, SECRET, token),
			"token": token,
		});

		let result = DigestTokens::new().verify_and_decode(SECRET, &encode(&envelope.to_string()));
		assert!(!result.verified);
		assert_eq!(result.code, Code::BadToken);
	}

	#[test]
	fn digest_is_case_sensitive() {
		let token = r#"{"expires":1000}"#;
		let digest = calculate_digest(APPLICATION_ID, SECRET, token);
		let envelope = serde_json::json!({
			"applicationId": APPLICATION_ID,
			"digest": digest.to_lowercase(),
			"token": token,
		});

		let result = DigestTokens::new().verify_and_decode(SECRET, &encode(&envelope.to_string()));
		assert_eq!(result.code, Code::BadDigest);
	}

	#[test]
	fn application_id_is_overwritten() {
		// A foreign issuer may sign a payload that already carries an applicationId.
		let token = r#"{"expires":1000,"applicationId":"spoofed"}"#;
		let envelope = serde_json::json!({
			"applicationId": APPLICATION_ID,
			"digest": calculate_digest(APPLICATION_ID, SECRET, token),
			"token": token,
		});

		let result = DigestTokens::new().verify_and_decode(SECRET, &encode(&envelope.to_string()));
		assert!(result.verified);
		assert_eq!(result.value.unwrap().application_id(), Some(APPLICATION_ID));
	}

	#[test]
	fn missing_expiration() {
		let mut token = Token::new();
		token.insert(Token::TYPE, "stream");

		let err = DigestTokens::new().sign_and_encode(APPLICATION_ID, SECRET, &token).unwrap_err();
		assert!(matches!(err, Error::MissingExpiration));
		assert_eq!(err.to_string(), "token must have an expiration (milliseconds since UNIX epoch)");
	}

	#[test]
	fn invalid_expiration() {
		let mut token = Token::new();
		token.insert(Token::EXPIRES, "tomorrow");

		let err = DigestTokens::new().sign_and_encode(APPLICATION_ID, SECRET, &token).unwrap_err();
		assert!(matches!(err, Error::InvalidExpiration));
	}

	#[test]
	fn reserved_application_id() {
		let mut token = payload();
		token.insert(Token::APPLICATION_ID, APPLICATION_ID);

		let err = DigestTokens::new().sign_and_encode(APPLICATION_ID, SECRET, &token).unwrap_err();
		assert!(matches!(err, Error::ReservedApplicationId));
	}

	#[test]
	fn verification_json() {
		let tokens = DigestTokens::new();

		let rejected = tokens.verify_and_decode(SECRET, "DIGEST:bad-token");
		assert_eq!(
			serde_json::to_string(&rejected).unwrap(),
			r#"{"verified":false,"code":"bad-token"}"#
		);

		let encoded = tokens.sign_and_encode(APPLICATION_ID, SECRET, &payload()).unwrap();
		let verified = tokens.verify_and_decode(SECRET, &encoded);
		assert_eq!(
			serde_json::to_string(&verified).unwrap(),
			r#"{"verified":true,"code":"verified","value":{"expires":1000,"type":"publish","applicationId":"my-application-id"}}"#
		);
	}
}
