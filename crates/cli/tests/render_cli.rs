//! Runs the built binary against templates in temporary directories.

use std::net::TcpListener;
use std::path::Path;
use std::process::{Command, Output};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use tempfile::TempDir;

fn figma_use() -> Command {
	let mut cmd = Command::new(env!("CARGO_BIN_EXE_figma-use"));
	for var in ["FIGMA_USE_CDP_PORT", "FIGMA_USE_TIMEOUT_MS", "FIGMA_USE_IDLE_MS", "FIGMA_USE_COOKIE", "RUST_LOG"] {
		cmd.env_remove(var);
	}
	cmd
}

fn run(cmd: &mut Command) -> (Value, Output) {
	let output = cmd.output().expect("failed to execute figma-use");
	let stdout = String::from_utf8_lossy(&output.stdout);
	let parsed = serde_json::from_str(stdout.trim()).unwrap_or_else(|_| json!({ "raw": stdout }));
	(parsed, output)
}

fn write_template(dir: &TempDir, name: &str, template: &Value) -> std::path::PathBuf {
	let path = dir.path().join(name);
	std::fs::write(&path, template.to_string()).unwrap();
	path
}

fn render_dry(path: &Path, extra: &[&str]) -> (Value, Output) {
	run(figma_use()
		.arg("render")
		.arg(path)
		.args(["--dry-run", "--session", "9", "--seed", "1", "--parent", "0:1"])
		.args(extra))
}

/// A port nothing listens on.
fn closed_port() -> u16 {
	let listener = TcpListener::bind("127.0.0.1:0").unwrap();
	listener.local_addr().unwrap().port()
}

#[test]
fn dry_run_prints_changes_and_frames() {
	let dir = TempDir::new().unwrap();
	let path = write_template(
		&dir,
		"card.json",
		&json!({
			"components": {
				"Card": {
					"type": "frame",
					"props": {"name": {"$prop": "title"}, "padding": 16},
					"children": [{"type": "text", "children": [{"$prop": "title"}]}, {"type": "slot"}]
				}
			},
			"root": {"type": "Card", "props": {"title": "Hello"}, "children": [{"type": "rect"}]}
		}),
	);

	let (json, output) = render_dry(&path, &["--props", r#"{"title": "Welcome"}"#]);
	assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
	assert_eq!(json["ok"], true);
	assert_eq!(json["command"], "render");

	let data = &json["data"];
	assert_eq!(data["nodes"], 3);
	assert_eq!(data["root"], "9:1");
	assert_eq!(data["changes"][0]["properties"]["name"], "Welcome");
	assert_eq!(data["changes"][1]["properties"]["characters"], "Welcome");
	assert_eq!(data["changes"][0]["parentIndex"]["guid"]["localID"], 1);

	let frames = data["frames"].as_array().unwrap();
	assert_eq!(frames.len(), 3);
	for (frame, change) in frames.iter().zip(data["changes"].as_array().unwrap()) {
		let bytes = STANDARD.decode(frame.as_str().unwrap()).unwrap();
		let message = fu::protocol::decode_frame(&bytes).unwrap();
		assert_eq!(message.session_id, Some(9));
		assert_eq!(json!(message.node_changes[0].guid), change["guid"]);
	}
}

#[test]
fn unknown_element_is_invalid_input() {
	let dir = TempDir::new().unwrap();
	let path = write_template(&dir, "bad.json", &json!({"root": {"type": "marquee"}}));

	let (json, output) = render_dry(&path, &[]);
	assert_eq!(output.status.code(), Some(1));
	assert_eq!(json["ok"], false);
	assert_eq!(json["error"]["code"], "INVALID_INPUT");
	assert!(json["error"]["message"].as_str().unwrap().contains("marquee"));
	assert!(String::from_utf8_lossy(&output.stderr).contains("INVALID_INPUT"));
}

#[test]
fn self_referencing_component_reports_depth() {
	let dir = TempDir::new().unwrap();
	let path = write_template(
		&dir,
		"loop.json",
		&json!({
			"components": {"Loop": {"type": "frame", "children": [{"type": "Loop"}]}},
			"root": {"type": "Loop"}
		}),
	);

	let (json, output) = render_dry(&path, &[]);
	assert_eq!(output.status.code(), Some(1));
	assert_eq!(json["error"]["code"], "INVALID_INPUT");
	assert!(json["error"]["message"].as_str().unwrap().contains("depth"));
}

#[test]
fn missing_template_is_an_io_error() {
	let dir = TempDir::new().unwrap();
	let (json, output) = render_dry(&dir.path().join("nope.json"), &[]);
	assert_eq!(output.status.code(), Some(1));
	assert_eq!(json["error"]["code"], "IO_ERROR");
}

#[test]
fn props_must_be_an_object() {
	let dir = TempDir::new().unwrap();
	let path = write_template(&dir, "frame.json", &json!({"root": {"type": "frame"}}));
	let (json, _) = render_dry(&path, &["--props", "[1, 2]"]);
	assert_eq!(json["error"]["code"], "INVALID_INPUT");
}

#[test]
fn status_without_app_reports_disconnected() {
	let port = closed_port();
	let (json, output) = run(figma_use().args(["--port", &port.to_string(), "status"]));
	assert!(output.status.success());
	assert_eq!(json["data"]["connected"], false);
	assert!(json["data"]["error"].as_str().is_some_and(|e| !e.is_empty()));
}

#[test]
fn targets_without_app_fails_to_connect() {
	let port = closed_port();
	let (json, output) = run(figma_use().env("FIGMA_USE_CDP_PORT", port.to_string()).arg("targets"));
	assert_eq!(output.status.code(), Some(1));
	assert_eq!(json["error"]["code"], "CONNECTION_FAILED");
}
