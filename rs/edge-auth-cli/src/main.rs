//! Command line tool to generate and verify Edge Auth digest tokens.

mod log;
mod sign;
mod verify;

use log::*;
use sign::*;
use verify::*;

use clap::{Parser, Subcommand};

#[derive(Parser, Clone, Debug)]
#[command(name = "edge-auth", version, about = "Edge Auth digest token generator")]
pub struct Cli {
	#[command(flatten)]
	log: Log,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
	/// Generate a signed token and print it to stdout.
	Sign(SignArgs),

	/// Verify a token and print the decoded payload as JSON.
	Verify(VerifyArgs),
}

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	cli.log.init();

	let mut stdout = std::io::stdout().lock();

	match cli.command {
		Command::Sign(args) => args.run(&mut stdout),
		Command::Verify(args) => args.run(&mut std::io::stdin().lock(), &mut stdout),
	}
}
