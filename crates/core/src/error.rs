//! Error types for tree resolution, rendering, and document access.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// Composite expansion went deeper than the configured ceiling, usually
	/// because a component renders itself.
	#[error("component resolution depth {depth} exceeded while expanding '{component}'")]
	ResolutionDepthExceeded { depth: usize, component: String },

	#[error("element nesting depth {depth} exceeded at <{element}>")]
	NestingTooDeep { depth: usize, element: String },

	#[error("unknown element type '{0}'")]
	UnknownElement(String),

	#[error("unknown property '{key}' on <{element}>")]
	UnknownProperty { element: String, key: String },

	#[error("invalid value for '{key}' on <{element}>: {reason}")]
	InvalidValue {
		element: String,
		key: String,
		reason: String,
	},

	/// The allocator has handed out every local id of its session.
	#[error("node ids exhausted for session {session}")]
	IdsExhausted { session: u32 },

	#[error("unknown variable '{0}'")]
	UnknownVariable(String),

	#[error(transparent)]
	InvalidGuid(#[from] fu_protocol::GuidParseError),

	/// A template document could not be read.
	#[error("invalid template: {0}")]
	Template(String),

	/// The page answered with something other than the expected shape.
	#[error("unexpected response from document: {0}")]
	UnexpectedResponse(String),

	/// The RPC bridge reported a failure through its `__error` field.
	#[error("command '{command}' failed: {message}")]
	Command { command: String, message: String },

	#[error(transparent)]
	Protocol(#[from] fu_protocol::Error),

	#[error(transparent)]
	Runtime(#[from] fu_runtime::Error),

	#[error("multiplayer channel error: {0}")]
	Multiplayer(String),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl From<fu_protocol::FramingError> for Error {
	fn from(err: fu_protocol::FramingError) -> Self {
		Error::Protocol(err.into())
	}
}

impl From<fu_protocol::CodecError> for Error {
	fn from(err: fu_protocol::CodecError) -> Self {
		Error::Protocol(err.into())
	}
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
	fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
		Error::Multiplayer(err.to_string())
	}
}

impl Error {
	pub(crate) fn invalid(element: &str, key: &str, reason: impl Into<String>) -> Self {
		Error::InvalidValue {
			element: element.to_string(),
			key: key.to_string(),
			reason: reason.into(),
		}
	}

	/// True for per-request timeouts on the control channel.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Runtime(e) if e.is_timeout())
	}
}
