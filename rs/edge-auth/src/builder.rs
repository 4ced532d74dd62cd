use std::fmt;

use chrono::{DateTime, TimeZone, Utc};

use crate::{DigestTokens, Error, Result, Token, TokenType};

/// Builds digest tokens that can be used with the platform.
///
/// Setters are chained and silently overwrite earlier calls, except for
/// [`with_capability`](Self::with_capability) and [`apply_tag`](Self::apply_tag) which append.
/// Fields appear in the payload in the order they are first set.
///
/// ```
/// use edge_auth::{DigestTokens, TokenBuilder};
///
/// let token = TokenBuilder::new()
/// 	.with_application_id("my-application-id")
/// 	.with_secret("my-secret")
/// 	.expires_in_seconds(3600)
/// 	.for_channel_alias("my-channel")
/// 	.for_streaming_only()
/// 	.build()
/// 	.unwrap();
///
/// let result = DigestTokens::new().verify_and_decode("my-secret", &token);
/// assert!(result.verified);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TokenBuilder {
	application_id: Option<String>,
	secret: Option<String>,
	token: Token,
}

impl TokenBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// The application ID used to sign the token (required).
	pub fn with_application_id(&mut self, application_id: impl Into<String>) -> &mut Self {
		self.application_id = Some(application_id.into());
		self
	}

	/// The shared secret used to sign the token (required).
	pub fn with_secret(&mut self, secret: impl Into<String>) -> &mut Self {
		self.secret = Some(secret.into());
		self
	}

	/// The backend URI.
	pub fn with_uri(&mut self, uri: impl Into<String>) -> &mut Self {
		self.token.insert(Token::URI, uri.into());
		self
	}

	/// Add a capability, e.g. to publish with multiple bitrates.
	pub fn with_capability(&mut self, capability: impl Into<String>) -> &mut Self {
		self.token.append(Token::CAPABILITIES, capability);
		self
	}

	/// Expire the token the given number of seconds from now.
	///
	/// The local clock must be in sync for the expiration to be meaningful.
	pub fn expires_in_seconds(&mut self, seconds: i64) -> &mut Self {
		let expires = Utc::now()
			.timestamp_millis()
			.saturating_add(seconds.saturating_mul(1000));

		self.token.insert(Token::EXPIRES, expires);
		self
	}

	/// Expire the token at the given instant.
	pub fn expires_at<Tz: TimeZone>(&mut self, expires: DateTime<Tz>) -> &mut Self {
		self.token.insert(Token::EXPIRES, expires.timestamp_millis());
		self
	}

	/// Limit the token to authentication only.
	pub fn for_authentication_only(&mut self) -> &mut Self {
		self.with_type(TokenType::Auth)
	}

	/// Limit the token to streaming only.
	pub fn for_streaming_only(&mut self) -> &mut Self {
		self.with_type(TokenType::Stream)
	}

	/// Limit the token to publishing only.
	pub fn for_publishing_only(&mut self) -> &mut Self {
		self.with_type(TokenType::Publish)
	}

	fn with_type(&mut self, kind: TokenType) -> &mut Self {
		self.token.insert(Token::TYPE, kind.as_str());
		self
	}

	/// Limit the token to the given session.
	pub fn for_session(&mut self, session_id: impl Into<String>) -> &mut Self {
		self.token.insert(Token::SESSION_ID, session_id.into());
		self
	}

	/// Limit the token to the given remote address.
	pub fn for_remote_address(&mut self, remote_address: impl Into<String>) -> &mut Self {
		self.token.insert(Token::REMOTE_ADDRESS, remote_address.into());
		self
	}

	/// Limit the token to the given origin stream.
	pub fn for_origin_stream(&mut self, origin_stream_id: impl Into<String>) -> &mut Self {
		self.token.insert(Token::ORIGIN_STREAM_ID, origin_stream_id.into());
		self
	}

	/// Limit the token to the given channel ID.
	pub fn for_channel(&mut self, channel_id: impl fmt::Display) -> &mut Self {
		self.for_tag(format!("channelId:{channel_id}"))
	}

	/// Limit the token to the given channel alias.
	pub fn for_channel_alias(&mut self, channel_alias: impl fmt::Display) -> &mut Self {
		self.for_tag(format!("channelAlias:{channel_alias}"))
	}

	/// Limit the token to the given room ID.
	pub fn for_room(&mut self, room_id: impl fmt::Display) -> &mut Self {
		self.for_tag(format!("roomId:{room_id}"))
	}

	/// Limit the token to the given room alias.
	pub fn for_room_alias(&mut self, room_alias: impl fmt::Display) -> &mut Self {
		self.for_tag(format!("roomAlias:{room_alias}"))
	}

	/// Limit the token to origin streams carrying the given tag.
	///
	/// There is a single required tag: this replaces any channel or room set before.
	pub fn for_tag(&mut self, tag: impl Into<String>) -> &mut Self {
		self.token.insert(Token::REQUIRED_TAG, tag.into());
		self
	}

	/// Apply the tag to the stream when it is set up, e.g. for reporting.
	pub fn apply_tag(&mut self, tag: impl Into<String>) -> &mut Self {
		self.token.append(Token::APPLY_TAGS, tag);
		self
	}

	/// The payload accumulated so far, unsigned.
	pub fn value(&self) -> &Token {
		&self.token
	}

	/// Sign and encode the token.
	pub fn build(&self) -> Result<String> {
		let application_id = self.application_id.as_deref().ok_or(Error::MissingApplicationId)?;
		let secret = self.secret.as_deref().ok_or(Error::MissingSecret)?;

		DigestTokens::new().sign_and_encode(application_id, secret, &self.token)
	}
}
