use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use fu::runtime::ConnectionConfig;
use fu::{Figma, Guid, MultiplayerChannel, Props, RenderBatch, RenderOptions, Renderer, TemplateDocument, send_batch};
use serde_json::{Value, json};

use crate::cli::RenderArgs;
use crate::error::{CliError, Result};

pub async fn execute(args: RenderArgs, config: ConnectionConfig) -> Result<Value> {
	let source = tokio::fs::read_to_string(&args.template)
		.await
		.map_err(|source| CliError::Read {
			path: args.template.clone(),
			source,
		})?;
	let root = TemplateDocument::from_json(&source)?.into_element(parse_props(args.props.as_deref())?)?;
	let options = render_options(&args)?;

	if args.dry_run {
		let batch = Renderer::new(options).render(&root)?;
		return Ok(dry_run_output(&batch));
	}

	let figma = Figma::connect(config);
	let result = render_live(&figma, &root, options, args.cookie.as_deref()).await;
	figma.close().await;
	result
}

fn parse_props(raw: Option<&str>) -> Result<Props> {
	let Some(raw) = raw else {
		return Ok(Props::new());
	};
	match serde_json::from_str(raw) {
		Ok(Value::Object(props)) => Ok(props),
		Ok(other) => Err(CliError::InvalidInput(format!("--props must be a JSON object, got {other}"))),
		Err(e) => Err(CliError::InvalidInput(format!("--props is not JSON: {e}"))),
	}
}

fn render_options(args: &RenderArgs) -> Result<RenderOptions> {
	let mut options = RenderOptions::new(args.session);
	if let Some(parent) = &args.parent {
		options = options.with_parent(parent.parse::<Guid>().map_err(fu::Error::from)?);
	}
	if let Some(version) = args.header_version {
		options = options.with_header_version(version);
	}
	if let Some(seed) = args.seed {
		options = options.with_seed(seed);
	}
	Ok(options)
}

fn dry_run_output(batch: &RenderBatch) -> Value {
	let frames: Vec<String> = batch.frames.iter().map(|f| STANDARD.encode(f)).collect();
	json!({
		"dryRun": true,
		"nodes": batch.len(),
		"root": batch.root().map(|g| g.to_string()),
		"frameBytes": batch.frame_bytes(),
		"changes": batch.changes,
		"frames": frames,
	})
}

async fn render_live(figma: &Figma, root: &fu::Element, options: RenderOptions, cookie: Option<&str>) -> Result<Value> {
	let renderer = figma.renderer(options).await?;
	let batch = renderer.render(root)?;
	tracing::info!(nodes = batch.len(), bytes = batch.frame_bytes(), "Rendered template");

	let url = figma.multiplayer_url(&tracking_session_id()).await?;
	let mut channel = MultiplayerChannel::connect(&url, cookie).await?;
	send_batch(&mut channel, &batch).await?;
	let sent = channel.frames_sent();
	channel.close().await?;

	Ok(json!({
		"dryRun": false,
		"nodes": batch.len(),
		"root": batch.root().map(|g| g.to_string()),
		"parent": renderer.options().parent.map(|g| g.to_string()),
		"framesSent": sent,
	}))
}

fn tracking_session_id() -> String {
	let millis = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_millis())
		.unwrap_or_default();
	format!("ws-{millis}")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn props_must_be_an_object() {
		assert!(parse_props(None).unwrap().is_empty());
		assert_eq!(parse_props(Some(r#"{"title": "Hi"}"#)).unwrap()["title"], "Hi");
		assert!(matches!(parse_props(Some("[1]")), Err(CliError::InvalidInput(_))));
		assert!(matches!(parse_props(Some("{")), Err(CliError::InvalidInput(_))));
	}
}
