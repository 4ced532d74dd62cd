use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Result;

/// What a token may be used for.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
	/// Authentication only.
	Auth,
	/// Subscribing to a stream only.
	Stream,
	/// Publishing a stream only.
	Publish,
}

impl TokenType {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Auth => "auth",
			Self::Stream => "stream",
			Self::Publish => "publish",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			"auth" => Some(Self::Auth),
			"stream" => Some(Self::Stream),
			"publish" => Some(Self::Publish),
			_ => None,
		}
	}
}

impl fmt::Display for TokenType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The payload of a digest token: the claims that get signed.
///
/// Fields are kept in the order they were first inserted, and serialized in that order.
/// The digest covers the serialized string, so the order is part of the wire contract:
/// two payloads with the same fields in a different order produce different tokens.
///
/// Overwriting an existing field keeps its original position.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct Token(Map<String, Value>);

impl Token {
	/// Injected by the verifier; reserved when signing.
	pub const APPLICATION_ID: &str = "applicationId";
	pub const URI: &str = "uri";
	pub const EXPIRES: &str = "expires";
	pub const TYPE: &str = "type";
	pub const SESSION_ID: &str = "sessionId";
	pub const REMOTE_ADDRESS: &str = "remoteAddress";
	pub const ORIGIN_STREAM_ID: &str = "originStreamId";
	pub const REQUIRED_TAG: &str = "requiredTag";
	pub const CAPABILITIES: &str = "capabilities";
	pub const APPLY_TAGS: &str = "applyTags";

	pub fn new() -> Self {
		Self::default()
	}

	/// Parse a payload from its JSON representation, which must be an object.
	#[allow(clippy::should_implement_trait)]
	pub fn from_str(s: &str) -> Result<Self> {
		Ok(serde_json::from_str(s)?)
	}

	/// Serialize the payload to compact JSON, fields in insertion order.
	pub fn to_string(&self) -> Result<String> {
		Ok(serde_json::to_string(self)?)
	}

	pub fn get(&self, field: &str) -> Option<&Value> {
		self.0.get(field)
	}

	pub fn contains(&self, field: &str) -> bool {
		self.0.contains_key(field)
	}

	/// Set a field, returning the previous value if there was one.
	pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
		self.0.insert(field.into(), value.into())
	}

	/// Append to a list field, creating the list on first use.
	pub fn append(&mut self, field: &str, value: impl Into<String>) {
		let value = Value::String(value.into());

		match self.0.get_mut(field) {
			Some(Value::Array(list)) => list.push(value),
			_ => {
				self.0.insert(field.to_string(), Value::Array(vec![value]));
			}
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Milliseconds since the UNIX epoch, if set to an integer.
	pub fn expires(&self) -> Option<i64> {
		self.get(Self::EXPIRES)?.as_i64()
	}

	/// The token type, if set to a known value.
	pub fn kind(&self) -> Option<TokenType> {
		TokenType::from_name(self.string(Self::TYPE)?)
	}

	/// Only present on verified payloads.
	pub fn application_id(&self) -> Option<&str> {
		self.string(Self::APPLICATION_ID)
	}

	pub fn uri(&self) -> Option<&str> {
		self.string(Self::URI)
	}

	pub fn session_id(&self) -> Option<&str> {
		self.string(Self::SESSION_ID)
	}

	pub fn remote_address(&self) -> Option<&str> {
		self.string(Self::REMOTE_ADDRESS)
	}

	pub fn origin_stream_id(&self) -> Option<&str> {
		self.string(Self::ORIGIN_STREAM_ID)
	}

	pub fn required_tag(&self) -> Option<&str> {
		self.string(Self::REQUIRED_TAG)
	}

	pub fn capabilities(&self) -> Vec<&str> {
		self.strings(Self::CAPABILITIES)
	}

	pub fn apply_tags(&self) -> Vec<&str> {
		self.strings(Self::APPLY_TAGS)
	}

	fn string(&self, field: &str) -> Option<&str> {
		self.get(field)?.as_str()
	}

	// Non-string entries are skipped.
	fn strings(&self, field: &str) -> Vec<&str> {
		match self.get(field) {
			Some(Value::Array(list)) => list.iter().filter_map(Value::as_str).collect(),
			_ => Vec::new(),
		}
	}
}

impl From<Map<String, Value>> for Token {
	fn from(map: Map<String, Value>) -> Self {
		Self(map)
	}
}

impl From<Token> for Map<String, Value> {
	fn from(token: Token) -> Self {
		token.0
	}
}
