mod document;
mod render;

use serde_json::Value;

use crate::cli::{Cli, Commands};
use crate::error::Result;

impl Commands {
	/// Name reported in the result envelope.
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Render(_) => "render",
			Commands::Eval { .. } => "eval",
			Commands::Command { .. } => "command",
			Commands::Status => "status",
			Commands::Targets => "targets",
			Commands::Variables => "variables",
		}
	}
}

/// Runs the selected command and returns its result data.
pub async fn dispatch(cli: Cli) -> Result<Value> {
	let config = cli.connection_config();
	tracing::debug!(port = config.port, command = cli.command.name(), "Dispatching");

	match cli.command {
		Commands::Render(args) => render::execute(args, config).await,
		Commands::Eval { expression } => document::eval(&expression, config).await,
		Commands::Command { name, args, rpc_bundle } => {
			document::command(&name, &args, rpc_bundle.as_deref(), config).await
		}
		Commands::Status => Ok(document::status(config).await),
		Commands::Targets => document::targets(config).await,
		Commands::Variables => document::variables(config).await,
	}
}
