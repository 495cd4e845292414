//! Connection configuration.

use std::time::Duration;

/// Port the desktop app or browser exposes its debugging endpoint on.
pub const DEFAULT_DEBUG_PORT: u16 = 9222;

/// Deadline applied to requests that do not pass their own.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How long an idle link stays open after the last response.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(100);

/// Timeout for the target-list HTTP request.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_millis(400);

/// Settings shared by discovery and the correlation layer.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
	pub port: u16,
	pub request_timeout: Duration,
	pub idle_timeout: Duration,
	pub discovery_timeout: Duration,
	/// A page target matching any of these URL substrings is preferred.
	pub target_patterns: Vec<String>,
	/// Tried only when no preferred target exists.
	pub fallback_patterns: Vec<String>,
}

impl Default for ConnectionConfig {
	fn default() -> Self {
		Self {
			port: DEFAULT_DEBUG_PORT,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			idle_timeout: DEFAULT_IDLE_TIMEOUT,
			discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
			target_patterns: vec!["figma.com/design".to_string(), "figma.com/file".to_string()],
			fallback_patterns: vec!["figma.com/board".to_string()],
		}
	}
}

impl ConnectionConfig {
	pub fn with_port(mut self, port: u16) -> Self {
		self.port = port;
		self
	}

	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
		self.idle_timeout = timeout;
		self
	}

	pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
		self.discovery_timeout = timeout;
		self
	}

	pub fn with_target_patterns<I, S>(mut self, patterns: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.target_patterns = patterns.into_iter().map(Into::into).collect();
		self
	}

	/// URL of the target list endpoint.
	pub fn targets_url(&self) -> String {
		format!("http://localhost:{}/json", self.port)
	}
}
