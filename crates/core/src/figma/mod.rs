//! Document client over the debugging channel.
//!
//! [`Figma`] owns the correlation [`Connection`] to the document page and
//! the document's [`VariableRegistry`]. Everything it knows about the
//! document comes from `Runtime.evaluate` calls against the page.

mod rpc;

#[cfg(test)]
mod tests;

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use fu_protocol::Guid;
use fu_runtime::{CdpConnector, Connection, ConnectionConfig, Connector};
use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::render::{RenderOptions, Renderer};
use crate::variables::{VariableEntry, VariableMap, VariableRegistry};

static FILE_KEY: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"/(?:file|design|board)/([a-zA-Z0-9]+)").expect("file key pattern is valid"));

const CURRENT_PAGE: &str = "figma.currentPage.id";
const SESSION_ID: &str = "figma.currentUser ? figma.currentUser.sessionId : null";
const ROOT_NAME: &str = "figma.root.name";
const LOCATION: &str = "window.location.href";
const LOCAL_COLOR_VARIABLES: &str = "(async () => (await figma.variables.getLocalVariablesAsync('COLOR')).map(v => ({ name: v.name, id: v.id })))()";

/// Extracts the file key from a document URL.
pub fn file_key_from_url(url: &str) -> Option<String> {
	FILE_KEY
		.captures(url)
		.and_then(|c| c.get(1))
		.map(|m| m.as_str().to_string())
}

/// Result of [`Figma::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
	pub connected: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub file_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

/// Client for one open document.
pub struct Figma {
	connection: Connection,
	connector: Option<Arc<CdpConnector>>,
	variables: Arc<VariableRegistry>,
	rpc_bundle: Option<String>,
	rpc_ready: AtomicBool,
}

impl Figma {
	/// Client that discovers the document page on the configured port.
	///
	/// Nothing is contacted until the first call.
	pub fn connect(config: ConnectionConfig) -> Self {
		let connector = Arc::new(CdpConnector::new(config.clone()));
		let connection = Connection::new(connector.clone(), config);
		Self::from_parts(connection, Some(connector))
	}

	/// Client over a caller-supplied connector.
	pub fn with_connector(connector: Arc<dyn Connector>, config: ConnectionConfig) -> Self {
		Self::from_parts(Connection::new(connector, config), None)
	}

	fn from_parts(connection: Connection, connector: Option<Arc<CdpConnector>>) -> Self {
		Self {
			connection,
			connector,
			variables: Arc::new(VariableRegistry::new()),
			rpc_bundle: None,
			rpc_ready: AtomicBool::new(false),
		}
	}

	/// Script that defines `window.__figmaRpc`, injected on first command.
	pub fn with_rpc_bundle(mut self, bundle: impl Into<String>) -> Self {
		self.rpc_bundle = Some(bundle.into());
		self
	}

	pub fn connection(&self) -> &Connection {
		&self.connection
	}

	pub fn variables(&self) -> &Arc<VariableRegistry> {
		&self.variables
	}

	/// Evaluates JavaScript in the document page.
	pub async fn evaluate(&self, expression: &str) -> Result<Value> {
		Ok(self.connection.evaluate(expression).await?)
	}

	pub async fn evaluate_with_timeout(&self, expression: &str, timeout: Duration) -> Result<Value> {
		Ok(self.connection.evaluate_with_timeout(expression, timeout).await?)
	}

	/// Evaluates JavaScript and deserializes the result to `T`.
	pub async fn evaluate_as<T: DeserializeOwned>(&self, expression: &str) -> Result<T> {
		let value = self.evaluate(expression).await?;
		serde_json::from_value(value.clone())
			.map_err(|e| Error::UnexpectedResponse(format!("{expression} returned {value}: {e}")))
	}

	/// Reports whether the document answers, never failing.
	pub async fn status(&self) -> Status {
		match self.evaluate_as::<String>(ROOT_NAME).await {
			Ok(name) => Status {
				connected: true,
				file_name: Some(name),
				error: None,
			},
			Err(err) => {
				tracing::debug!(error = %err, "Status probe failed");
				Status {
					connected: false,
					file_name: None,
					error: Some(err.to_string()),
				}
			}
		}
	}

	/// Key of the open file, from the page URL.
	pub async fn file_key(&self) -> Result<String> {
		let url = match &self.connector {
			Some(connector) => connector.target().await?.url,
			None => self.evaluate_as::<String>(LOCATION).await?,
		};
		file_key_from_url(&url).ok_or_else(|| Error::UnexpectedResponse(format!("no file key in '{url}'")))
	}

	/// Id of the page currently shown.
	pub async fn current_page(&self) -> Result<Guid> {
		let id: String = self.evaluate_as(CURRENT_PAGE).await?;
		Ok(id.parse()?)
	}

	/// Multiplayer session id of this client.
	pub async fn session_id(&self) -> Result<u32> {
		let id: Option<u32> = self.evaluate_as(SESSION_ID).await?;
		id.ok_or_else(|| Error::UnexpectedResponse("no current user session".into()))
	}

	/// Loads the document's local color variables once and returns them.
	pub async fn load_variables(&self) -> Result<Arc<VariableMap>> {
		self.variables
			.ensure_loaded(move || async move {
				let entries: Vec<VariableEntry> = self.evaluate_as(LOCAL_COLOR_VARIABLES).await?;
				VariableMap::from_entries(entries)
			})
			.await
	}

	/// Renderer for this document: own session id, the current page as the
	/// default parent, and loaded variables.
	pub async fn renderer(&self, mut options: RenderOptions) -> Result<Renderer> {
		options.session_id = self.session_id().await?;
		if options.parent.is_none() {
			options.parent = Some(self.current_page().await?);
		}
		let variables = self.load_variables().await?;
		Ok(Renderer::new(options).with_variables(variables))
	}

	/// Multiplayer endpoint for the open file.
	pub async fn multiplayer_url(&self, tracking_session_id: &str) -> Result<String> {
		Ok(fu_protocol::multiplayer_url(&self.file_key().await?, tracking_session_id))
	}

	/// Forgets cached document state so it is fetched again.
	pub fn invalidate(&self) {
		self.variables.invalidate();
		self.rpc_ready.store(false, std::sync::atomic::Ordering::SeqCst);
		if let Some(connector) = &self.connector {
			connector.invalidate();
		}
	}

	pub async fn close(&self) {
		self.connection.close().await;
	}
}
