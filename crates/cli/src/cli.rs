use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use fu::runtime::{ConnectionConfig, DEFAULT_DEBUG_PORT};

#[derive(Parser, Debug)]
#[command(name = "figma-use")]
#[command(about = "Render element trees into an open design document")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Remote debugging port of the desktop app or browser
	#[arg(long, global = true, env = "FIGMA_USE_CDP_PORT", default_value_t = DEFAULT_DEBUG_PORT)]
	pub port: u16,

	/// Per-request deadline on the debugging channel
	#[arg(long, global = true, env = "FIGMA_USE_TIMEOUT_MS", default_value_t = 30_000, value_name = "MS")]
	pub timeout_ms: u64,

	/// Close the debugging link after this long without pending requests
	#[arg(long, global = true, env = "FIGMA_USE_IDLE_MS", default_value_t = 100, value_name = "MS")]
	pub idle_ms: u64,

	/// Pretty-print the JSON result
	#[arg(long, global = true)]
	pub pretty: bool,

	#[command(subcommand)]
	pub command: Commands,
}

impl Cli {
	pub fn connection_config(&self) -> ConnectionConfig {
		ConnectionConfig::default()
			.with_port(self.port)
			.with_request_timeout(Duration::from_millis(self.timeout_ms))
			.with_idle_timeout(Duration::from_millis(self.idle_ms))
	}
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Render a JSON template into the current page
	Render(RenderArgs),

	/// Evaluate JavaScript in the document page
	Eval {
		/// Expression to evaluate; promises are awaited
		expression: String,
	},

	/// Call a plugin bridge command
	Command {
		/// Command name, e.g. `create-frame`
		name: String,

		/// Arguments as a JSON value
		#[arg(default_value = "{}")]
		args: String,

		/// Script defining `window.__figmaRpc`, injected when missing
		#[arg(long, value_name = "FILE", env = "FIGMA_USE_RPC_BUNDLE")]
		rpc_bundle: Option<PathBuf>,
	},

	/// Check whether a document answers
	Status,

	/// List debuggable pages on the port
	Targets,

	/// List the document's local color variables
	Variables,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
	/// Template file (JSON with `components` and `root`)
	#[arg(value_name = "FILE")]
	pub template: PathBuf,

	/// Props merged over the root element's props, as a JSON object
	#[arg(long, value_name = "JSON")]
	pub props: Option<String>,

	/// Attach the root to this node instead of the current page (`session:local`)
	#[arg(long, value_name = "GUID")]
	pub parent: Option<String>,

	/// Encode without connecting; prints the changes and base64 frames
	#[arg(long)]
	pub dry_run: bool,

	/// Session id used for node ids in a dry run
	#[arg(long, default_value_t = 1, requires = "dry_run")]
	pub session: u32,

	/// First local id; the clock seeds it otherwise
	#[arg(long)]
	pub seed: Option<u32>,

	/// Prefix frames with the `fig-wire` header carrying this version
	#[arg(long, value_name = "VERSION")]
	pub header_version: Option<u32>,

	/// Cookie header for the multiplayer socket
	#[arg(long, env = "FIGMA_USE_COOKIE", hide_env_values = true)]
	pub cookie: Option<String>,
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn verify_cli() {
		Cli::command().debug_assert();
	}

	#[test]
	fn flags_build_connection_config() {
		let cli = Cli::parse_from(["figma-use", "--port", "9333", "--timeout-ms", "50", "--idle-ms", "5", "status"]);
		let config = cli.connection_config();
		assert_eq!(config.port, 9333);
		assert_eq!(config.request_timeout, Duration::from_millis(50));
		assert_eq!(config.idle_timeout, Duration::from_millis(5));
	}

	#[test]
	fn render_flags() {
		let cli = Cli::parse_from([
			"figma-use",
			"render",
			"card.json",
			"--dry-run",
			"--session",
			"7",
			"--parent",
			"0:1",
			"--header-version",
			"151",
		]);
		let Commands::Render(args) = cli.command else {
			panic!("expected render");
		};
		assert!(args.dry_run);
		assert_eq!(args.session, 7);
		assert_eq!(args.parent.as_deref(), Some("0:1"));
		assert_eq!(args.header_version, Some(151));
	}
}
