use std::io::Read;

use anyhow::Context;
use clap::Args;
use edge_auth::DigestTokens;

#[derive(Args, Clone, Debug)]
pub struct VerifyArgs {
	/// The application secret the token was signed with.
	#[arg(short = 'w', long, env = "EDGE_AUTH_SECRET", hide_env_values = true)]
	pub secret: String,

	/// The encoded token; read from stdin when omitted.
	pub token: Option<String>,
}

impl VerifyArgs {
	/// Print the verification result as JSON, failing if the token was not verified.
	pub fn run(&self, input: &mut impl Read, out: &mut impl std::io::Write) -> anyhow::Result<()> {
		let token = match &self.token {
			Some(token) => token.clone(),
			None => {
				let mut token = String::new();
				input.read_to_string(&mut token).context("failed to read token")?;
				token
			}
		};

		let result = DigestTokens::new().verify_and_decode(&self.secret, token.trim());
		writeln!(out, "{}", serde_json::to_string(&result)?)?;

		anyhow::ensure!(result.verified, "token not verified: {}", result.code);

		Ok(())
	}
}
