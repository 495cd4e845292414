//! Error types for the debugging-channel runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the control channel.
#[derive(Debug, Error)]
pub enum Error {
	/// Failed to establish the duplex link.
	#[error("Failed to connect to debugging endpoint: {0}")]
	ConnectionFailed(String),

	/// No debuggable page matched the configured URL patterns.
	#[error("No matching document open in the browser ({0})")]
	TargetNotFound(String),

	/// Transport-level failure (WebSocket read/write).
	#[error("Transport error: {0}")]
	TransportError(String),

	/// Envelope did not have the expected shape.
	#[error("Protocol error: {0}")]
	ProtocolError(String),

	/// The remote side answered with an error or threw while evaluating.
	#[error("{name}: {message}")]
	Remote {
		/// Error class or protocol error code
		name: String,
		/// Human-readable error message
		message: String,
		/// JavaScript stack trace (if available)
		stack: Option<String>,
	},

	/// No response arrived before the per-request deadline.
	///
	/// The connection stays open; the caller may dispatch again.
	#[error("Request {id} ({method}) timed out after {timeout_ms}ms")]
	TransportTimeout { id: u32, method: String, timeout_ms: u64 },

	/// The link dropped while the request was pending.
	#[error("Connection closed: {0}")]
	TransportClosed(String),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns true if this is a per-request timeout.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::TransportTimeout { .. })
	}

	/// Returns true if the link went away underneath the request.
	pub fn is_closed(&self) -> bool {
		matches!(self, Error::TransportClosed(_))
	}

	/// Returns the remote error name if this is a Remote error.
	pub fn error_name(&self) -> Option<&str> {
		match self {
			Error::Remote { name, .. } => Some(name),
			_ => None,
		}
	}
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
	fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
		Error::TransportError(err.to_string())
	}
}

impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		Error::ConnectionFailed(err.to_string())
	}
}
