//! JSON result envelope printed on stdout by every command.
//!
//! ```json
//! {"ok": true, "command": "render", "data": {...}}
//! {"ok": false, "command": "render", "error": {"code": "INVALID_INPUT", "message": "..."}}
//! ```

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CommandResult<T: Serialize> {
	pub ok: bool,
	pub command: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
}

impl<T: Serialize> CommandResult<T> {
	pub fn success(command: impl Into<String>, data: T) -> Self {
		Self {
			ok: true,
			command: command.into(),
			data: Some(data),
			error: None,
		}
	}
}

impl CommandResult<()> {
	pub fn failure(command: impl Into<String>, error: CommandError) -> Self {
		Self {
			ok: false,
			command: command.into(),
			data: None,
			error: Some(error),
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// Template, props, or flags could not be used
	InvalidInput,
	/// No debuggable document, or the link failed
	ConnectionFailed,
	/// A request outlived its deadline
	Timeout,
	/// The page threw while evaluating
	JsEvalFailed,
	/// The plugin bridge reported a failure
	CommandFailed,
	/// The multiplayer socket failed
	MultiplayerFailed,
	IoError,
	InternalError,
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			ErrorCode::InvalidInput => "INVALID_INPUT",
			ErrorCode::ConnectionFailed => "CONNECTION_FAILED",
			ErrorCode::Timeout => "TIMEOUT",
			ErrorCode::JsEvalFailed => "JS_EVAL_FAILED",
			ErrorCode::CommandFailed => "COMMAND_FAILED",
			ErrorCode::MultiplayerFailed => "MULTIPLAYER_FAILED",
			ErrorCode::IoError => "IO_ERROR",
			ErrorCode::InternalError => "INTERNAL_ERROR",
		};
		f.write_str(s)
	}
}

pub fn print_result<T: Serialize>(result: &CommandResult<T>, pretty: bool) {
	let json = if pretty {
		serde_json::to_string_pretty(result)
	} else {
		serde_json::to_string(result)
	};
	if let Ok(json) = json {
		println!("{json}");
	}
}

pub fn print_error_stderr(error: &CommandError) {
	eprintln!("Error [{}]: {}", error.code, error.message);
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn envelopes_serialize() {
		let ok = serde_json::to_value(CommandResult::success("status", json!({"connected": true}))).unwrap();
		assert_eq!(ok, json!({"ok": true, "command": "status", "data": {"connected": true}}));

		let failed = CommandResult::failure(
			"render",
			CommandError {
				code: ErrorCode::InvalidInput,
				message: "bad".into(),
			},
		);
		assert_eq!(
			serde_json::to_value(failed).unwrap(),
			json!({"ok": false, "command": "render", "error": {"code": "INVALID_INPUT", "message": "bad"}})
		);
	}

	#[test]
	fn codes_display_like_they_serialize() {
		for code in [ErrorCode::JsEvalFailed, ErrorCode::MultiplayerFailed, ErrorCode::IoError] {
			assert_eq!(serde_json::to_value(code).unwrap(), json!(code.to_string()));
		}
	}
}
