use std::path::PathBuf;

use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("cannot read {path}: {source}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error(transparent)]
	Fu(#[from] fu::Error),

	#[error(transparent)]
	Runtime(#[from] fu::runtime::Error),
}

fn classify_runtime(err: &fu::runtime::Error) -> ErrorCode {
	use fu::runtime::Error as R;
	match err {
		R::TransportTimeout { .. } => ErrorCode::Timeout,
		R::Remote { .. } => ErrorCode::JsEvalFailed,
		R::ConnectionFailed(_) | R::TargetNotFound(_) | R::TransportClosed(_) | R::TransportError(_) => {
			ErrorCode::ConnectionFailed
		}
		R::ProtocolError(_) | R::Io(_) | R::Json(_) => ErrorCode::InternalError,
	}
}

impl CliError {
	pub fn code(&self) -> ErrorCode {
		use fu::Error as F;
		match self {
			CliError::Read { .. } => ErrorCode::IoError,
			CliError::InvalidInput(_) => ErrorCode::InvalidInput,
			CliError::Runtime(err) => classify_runtime(err),
			CliError::Fu(err) => match err {
				F::ResolutionDepthExceeded { .. }
				| F::NestingTooDeep { .. }
				| F::UnknownElement(_)
				| F::UnknownProperty { .. }
				| F::InvalidValue { .. }
				| F::UnknownVariable(_)
				| F::InvalidGuid(_)
				| F::Template(_) => ErrorCode::InvalidInput,
				F::Runtime(inner) => classify_runtime(inner),
				F::Command { .. } => ErrorCode::CommandFailed,
				F::Multiplayer(_) => ErrorCode::MultiplayerFailed,
				F::IdsExhausted { .. } => ErrorCode::InternalError,
				F::UnexpectedResponse(_) | F::Protocol(_) | F::Json(_) => ErrorCode::InternalError,
			},
		}
	}

	pub fn to_command_error(&self) -> CommandError {
		CommandError {
			code: self.code(),
			message: self.to_string(),
		}
	}
}
