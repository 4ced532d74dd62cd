use anyhow::Context;
use chrono::DateTime;
use clap::{ArgGroup, Args};
use edge_auth::TokenBuilder;

/// Options for generating a token; each maps onto a [`TokenBuilder`] setter.
#[derive(Args, Clone, Debug)]
#[command(group(ArgGroup::new("scope").args(["authentication_only", "streaming_only", "publishing_only"])))]
#[command(group(ArgGroup::new("required_tag").args(["channel", "channel_alias", "room", "room_alias", "tag"])))]
pub struct SignArgs {
	/// The application ID.
	#[arg(short = 'u', long, env = "EDGE_AUTH_APPLICATION_ID")]
	pub application_id: String,

	/// The application secret.
	#[arg(short = 'w', long, env = "EDGE_AUTH_SECRET", hide_env_values = true)]
	pub secret: String,

	/// The backend URI.
	#[arg(long)]
	pub uri: Option<String>,

	/// Token life time in seconds.
	#[arg(short = 'l', long, default_value_t = 3600)]
	pub expires_in_seconds: i64,

	/// Token expires at timestamp measured in milliseconds since UNIX epoch.
	#[arg(short = 'e', long, conflicts_with = "expires_in_seconds")]
	pub expires_at: Option<i64>,

	/// Comma separated list of capabilities, e.g. for publishing.
	#[arg(short = 'b', long)]
	pub capabilities: Option<String>,

	/// Token is limited to the given session.
	#[arg(short = 'z', long)]
	pub session_id: Option<String>,

	/// Token is limited to the given remote address.
	#[arg(short = 'x', long)]
	pub remote_address: Option<String>,

	/// [STREAMING] Token is limited to the given origin stream.
	#[arg(short = 'o', long)]
	pub origin_stream_id: Option<String>,

	/// [STREAMING] Token is limited to the given channel.
	#[arg(short = 'c', long)]
	pub channel: Option<String>,

	/// [STREAMING] Token is limited to the given channel alias.
	#[arg(short = 'i', long)]
	pub channel_alias: Option<String>,

	/// [STREAMING] Token is limited to the given room.
	#[arg(short = 'm', long)]
	pub room: Option<String>,

	/// [STREAMING] Token is limited to the given room alias.
	#[arg(short = 'n', long)]
	pub room_alias: Option<String>,

	/// [STREAMING] Token is limited to the given origin stream tag.
	#[arg(short = 't', long)]
	pub tag: Option<String>,

	/// [REPORTING] Apply tag to the new stream. May be repeated.
	#[arg(short = 'r', long)]
	pub apply_tag: Vec<String>,

	/// Token can be used for authentication only.
	#[arg(short = 'a', long)]
	pub authentication_only: bool,

	/// Token can be used for streaming only.
	#[arg(short = 's', long)]
	pub streaming_only: bool,

	/// Token can be used for publishing only.
	#[arg(short = 'p', long)]
	pub publishing_only: bool,

	/// Print the unsigned payload on its own line before the token.
	#[arg(long)]
	pub print_payload: bool,
}

impl SignArgs {
	/// Apply every option to a new builder.
	pub fn builder(&self) -> anyhow::Result<TokenBuilder> {
		let mut builder = TokenBuilder::new();
		builder
			.with_application_id(&self.application_id)
			.with_secret(&self.secret);

		if let Some(uri) = &self.uri {
			builder.with_uri(uri);
		}

		match self.expires_at {
			Some(millis) => {
				let at = DateTime::from_timestamp_millis(millis)
					.with_context(|| format!("invalid expiration timestamp: {millis}"))?;
				builder.expires_at(at);
			}
			None => {
				builder.expires_in_seconds(self.expires_in_seconds);
			}
		}

		if self.authentication_only {
			builder.for_authentication_only();
		}
		if self.streaming_only {
			builder.for_streaming_only();
		}
		if self.publishing_only {
			builder.for_publishing_only();
		}

		if let Some(capabilities) = &self.capabilities {
			for capability in capabilities.split(',').map(str::trim).filter(|c| !c.is_empty()) {
				builder.with_capability(capability);
			}
		}

		if let Some(session_id) = &self.session_id {
			builder.for_session(session_id);
		}
		if let Some(remote_address) = &self.remote_address {
			builder.for_remote_address(remote_address);
		}
		if let Some(origin_stream_id) = &self.origin_stream_id {
			builder.for_origin_stream(origin_stream_id);
		}

		if let Some(channel) = &self.channel {
			builder.for_channel(channel);
		}
		if let Some(channel_alias) = &self.channel_alias {
			builder.for_channel_alias(channel_alias);
		}
		if let Some(room) = &self.room {
			builder.for_room(room);
		}
		if let Some(room_alias) = &self.room_alias {
			builder.for_room_alias(room_alias);
		}
		if let Some(tag) = &self.tag {
			builder.for_tag(tag);
		}

		for tag in &self.apply_tag {
			builder.apply_tag(tag);
		}

		Ok(builder)
	}

	pub fn run(&self, out: &mut impl std::io::Write) -> anyhow::Result<()> {
		let builder = self.builder()?;
		let payload = builder.value().to_string()?;

		tracing::info!(application_id = %self.application_id, %payload, "signing token");

		if self.print_payload {
			writeln!(out, "{payload}")?;
		}

		let token = builder.build().context("failed to sign token")?;
		writeln!(out, "{token}")?;

		Ok(())
	}
}
