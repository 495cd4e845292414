mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;

use crate::cli::Cli;
use crate::output::CommandResult;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let pretty = cli.pretty;
	let name = cli.command.name();

	match commands::dispatch(cli).await {
		Ok(data) => output::print_result(&CommandResult::success(name, data), pretty),
		Err(err) => {
			tracing::error!(command = name, error = %err, "Command failed");
			let error = err.to_command_error();
			output::print_error_stderr(&error);
			output::print_result(&CommandResult::failure(name, error), pretty);
			std::process::exit(1);
		}
	}
}
