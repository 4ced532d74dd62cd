use clap::Args;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Logging configuration, written to stderr so stdout only carries the token.
#[derive(Args, Clone, Debug)]
pub struct Log {
	/// The default log level; `RUST_LOG` directives take precedence.
	#[arg(long = "log-level", env = "EDGE_AUTH_LOG_LEVEL", default_value = "warn", global = true)]
	pub level: tracing::Level,
}

impl Log {
	pub fn level(&self) -> LevelFilter {
		LevelFilter::from_level(self.level)
	}

	pub fn init(&self) {
		let filter = EnvFilter::builder()
			.with_default_directive(self.level().into())
			.from_env_lossy();

		tracing_subscriber::fmt()
			.with_writer(std::io::stderr)
			.with_env_filter(filter)
			.init();
	}
}
