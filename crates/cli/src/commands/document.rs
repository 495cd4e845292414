//! Commands that talk to the document page over the debugging channel.

use std::path::Path;

use fu::Figma;
use fu::runtime::{ConnectionConfig, fetch_targets, select_target};
use serde_json::{Value, json};

use crate::error::{CliError, Result};

pub async fn eval(expression: &str, config: ConnectionConfig) -> Result<Value> {
	let figma = Figma::connect(config);
	let result = figma.evaluate(expression).await;
	figma.close().await;
	Ok(json!({ "result": result? }))
}

pub async fn command(name: &str, args: &str, bundle: Option<&Path>, config: ConnectionConfig) -> Result<Value> {
	let args: Value = serde_json::from_str(args)
		.map_err(|e| CliError::InvalidInput(format!("command arguments are not JSON: {e}")))?;

	let mut figma = Figma::connect(config);
	if let Some(path) = bundle {
		let script = tokio::fs::read_to_string(path).await.map_err(|source| CliError::Read {
			path: path.to_path_buf(),
			source,
		})?;
		figma = figma.with_rpc_bundle(script);
	}

	let result = figma.command(name, &args).await;
	figma.close().await;
	Ok(json!({ "result": result? }))
}

pub async fn status(config: ConnectionConfig) -> Value {
	let figma = Figma::connect(config);
	let status = figma.status().await;
	figma.close().await;
	json!(status)
}

/// Lists page targets and marks the one a document command would use.
pub async fn targets(config: ConnectionConfig) -> Result<Value> {
	let targets = fetch_targets(config.port, config.discovery_timeout).await?;
	let selected = select_target(&targets, &config.target_patterns[..], &config.fallback_patterns[..]).map(|t| t.id.clone());
	tracing::info!(count = targets.len(), selected = ?selected, "Fetched targets");

	let pages: Vec<Value> = targets
		.iter()
		.filter(|t| t.is_page())
		.map(|t| {
			json!({
				"id": t.id,
				"title": t.title,
				"url": t.url,
				"selected": selected.as_deref() == Some(t.id.as_str()),
			})
		})
		.collect();
	Ok(json!({ "targets": pages }))
}

pub async fn variables(config: ConnectionConfig) -> Result<Value> {
	let figma = Figma::connect(config);
	let loaded = figma.load_variables().await;
	figma.close().await;

	let variables: Vec<Value> = loaded?
		.iter()
		.map(|(name, id)| json!({ "name": name, "id": id.to_string() }))
		.collect();
	Ok(json!({ "variables": variables }))
}
