//! Debugging-endpoint discovery.
//!
//! The browser (or desktop app) started with `--remote-debugging-port`
//! lists its pages at `GET /json`. The first page whose URL matches one of
//! the configured document patterns is the control target.

use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::ConnectionConfig;
use crate::connection::Connector;
use crate::error::{Error, Result};
use crate::transport::{TransportParts, WebSocketTransport};

/// Entry of the `/json` target list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdpTarget {
	#[serde(default)]
	pub id: String,
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub title: String,
	pub url: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub web_socket_debugger_url: Option<String>,
}

impl CdpTarget {
	pub fn is_page(&self) -> bool {
		self.kind == "page"
	}
}

/// Fetches the target list from the debugging port.
///
/// Tries IPv4 loopback, `localhost`, then IPv6 loopback, returning the first
/// successful answer.
pub async fn fetch_targets(port: u16, timeout: Duration) -> Result<Vec<CdpTarget>> {
	let client = reqwest::Client::builder()
		.timeout(timeout)
		.build()
		.map_err(|e| Error::ConnectionFailed(format!("Failed to create HTTP client: {}", e)))?;
	let mut last_error = "no response".to_string();

	for url in [
		format!("http://127.0.0.1:{}/json", port),
		format!("http://localhost:{}/json", port),
		format!("http://[::1]:{}/json", port),
	] {
		let response = match client.get(&url).send().await {
			Ok(r) => r,
			Err(e) => {
				last_error = e.to_string();
				continue;
			}
		};

		if !response.status().is_success() {
			last_error = format!("unexpected status {}", response.status());
			continue;
		}

		let targets: Vec<CdpTarget> = response
			.json()
			.await
			.map_err(|e| Error::ProtocolError(format!("Failed to parse target list: {}", e)))?;
		tracing::debug!(port, count = targets.len(), "Fetched debugging targets");
		return Ok(targets);
	}

	Err(Error::ConnectionFailed(format!(
		"No debugging endpoint on port {}: {}",
		port, last_error
	)))
}

/// Picks the first page target matching `patterns`, falling back to the
/// first matching `fallback`.
pub fn select_target<'a, S: AsRef<str>>(
	targets: &'a [CdpTarget],
	patterns: &[S],
	fallback: &[S],
) -> Option<&'a CdpTarget> {
	let matching = |wanted: &[S]| {
		targets
			.iter()
			.find(|t| t.is_page() && wanted.iter().any(|p| t.url.contains(p.as_ref())))
	};
	matching(patterns).or_else(|| matching(fallback))
}

/// [`Connector`] that discovers the document page over HTTP and connects to
/// its WebSocket debugger URL.
///
/// The selected target is cached until [`CdpConnector::invalidate`] is
/// called, which the connection does whenever a link fails.
pub struct CdpConnector {
	config: ConnectionConfig,
	cached: Mutex<Option<CdpTarget>>,
}

impl CdpConnector {
	pub fn new(config: ConnectionConfig) -> Self {
		Self {
			config,
			cached: Mutex::new(None),
		}
	}

	/// Returns the cached target or discovers a new one.
	pub async fn target(&self) -> Result<CdpTarget> {
		if let Some(target) = self.cached.lock().clone() {
			return Ok(target);
		}

		let targets = fetch_targets(self.config.port, self.config.discovery_timeout).await?;
		let target = select_target(&targets, &self.config.target_patterns[..], &self.config.fallback_patterns[..])
			.cloned()
			.ok_or_else(|| {
				Error::TargetNotFound(format!(
					"{} page target(s) on port {}; start the app with --remote-debugging-port={}",
					targets.iter().filter(|t| t.is_page()).count(),
					self.config.port,
					self.config.port
				))
			})?;

		tracing::debug!(url = %target.url, "Selected debugging target");
		*self.cached.lock() = Some(target.clone());
		Ok(target)
	}

	pub fn cached_target(&self) -> Option<CdpTarget> {
		self.cached.lock().clone()
	}

	pub fn config(&self) -> &ConnectionConfig {
		&self.config
	}
}

impl Connector for CdpConnector {
	fn connect(&self) -> BoxFuture<'_, Result<TransportParts>> {
		async move {
			let target = self.target().await?;
			let url = target.web_socket_debugger_url.ok_or_else(|| {
				Error::ConnectionFailed(format!(
					"target {} has no WebSocket URL (is another debugger attached?)",
					target.url
				))
			})?;
			WebSocketTransport::connect(&url).await
		}
		.boxed()
	}

	fn invalidate(&self) {
		if self.cached.lock().take().is_some() {
			tracing::debug!("Dropped cached debugging target");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn target(kind: &str, url: &str) -> CdpTarget {
		CdpTarget {
			id: url.to_string(),
			kind: kind.to_string(),
			title: String::new(),
			url: url.to_string(),
			web_socket_debugger_url: Some(format!("ws://127.0.0.1:9222/devtools/page/{url}")),
		}
	}

	#[test]
	fn prefers_design_pages_over_boards() {
		let config = ConnectionConfig::default();
		let targets = vec![
			target("page", "https://www.figma.com/board/abc/Jam"),
			target("service_worker", "https://www.figma.com/design/sw"),
			target("page", "https://www.figma.com/design/KEY123/File"),
		];
		let picked = select_target(&targets, &config.target_patterns[..], &config.fallback_patterns[..]).unwrap();
		assert_eq!(picked.url, "https://www.figma.com/design/KEY123/File");
	}

	#[test]
	fn falls_back_to_boards() {
		let config = ConnectionConfig::default();
		let targets = vec![
			target("page", "https://example.com"),
			target("page", "https://www.figma.com/board/abc/Jam"),
		];
		let picked = select_target(&targets, &config.target_patterns[..], &config.fallback_patterns[..]).unwrap();
		assert!(picked.url.contains("/board/"));
	}

	#[test]
	fn no_match_yields_none() {
		let targets = vec![target("page", "https://example.com")];
		let none: &[&str] = &[];
		assert!(select_target(&targets, &["figma.com/design"][..], none).is_none());
	}

	#[test]
	fn parses_target_list_entries() {
		let json = r#"[{
			"description": "",
			"devtoolsFrontendUrl": "/devtools/inspector.html",
			"id": "E1",
			"title": "File – Figma",
			"type": "page",
			"url": "https://www.figma.com/file/KEY/File",
			"webSocketDebuggerUrl": "ws://localhost:9222/devtools/page/E1"
		}]"#;
		let targets: Vec<CdpTarget> = serde_json::from_str(json).unwrap();
		assert_eq!(targets[0].kind, "page");
		assert_eq!(
			targets[0].web_socket_debugger_url.as_deref(),
			Some("ws://localhost:9222/devtools/page/E1")
		);
	}

	#[tokio::test]
	async fn invalidate_clears_cache() {
		let connector = CdpConnector::new(ConnectionConfig::default());
		*connector.cached.lock() = Some(target("page", "https://www.figma.com/design/K/F"));
		assert!(connector.target().await.is_ok());
		connector.invalidate();
		assert!(connector.cached_target().is_none());
	}
}
