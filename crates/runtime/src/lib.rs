//! Control-channel plumbing for the design application.
//!
//! - [`discovery`] finds the document page on the debugging port
//! - [`transport`] moves frames over a WebSocket
//! - [`connection`] correlates requests and responses with deadlines and an
//!   idle close
//! - [`cdp`] wraps `Runtime.evaluate`

pub mod cdp;
pub mod config;
pub mod connection;
pub mod discovery;
pub mod error;
pub mod transport;

pub use cdp::{EvaluateParams, EvaluateResult, ExceptionDetails, RemoteObject};
pub use config::{
	ConnectionConfig, DEFAULT_DEBUG_PORT, DEFAULT_DISCOVERY_TIMEOUT, DEFAULT_IDLE_TIMEOUT,
	DEFAULT_REQUEST_TIMEOUT,
};
pub use connection::{Connection, ConnectionState, Connector};
pub use discovery::{CdpConnector, CdpTarget, fetch_targets, select_target};
pub use error::{Error, Result};
pub use transport::{Frame, Transport, TransportParts, WebSocketTransport};
