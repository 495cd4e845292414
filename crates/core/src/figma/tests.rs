use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use fu_runtime::{Frame, Transport, TransportParts};
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::mpsc;

use super::*;
use crate::element::{Element, Intrinsic};

type Handler = Arc<dyn Fn(&str) -> Value + Send + Sync>;

/// Answers `Runtime.evaluate` requests with `handler(expression)`.
struct PageTransport {
	handler: Handler,
	seen: Arc<Mutex<Vec<String>>>,
	replies: mpsc::UnboundedSender<Frame>,
}

impl Transport for PageTransport {
	fn send(&mut self, frame: Frame) -> BoxFuture<'_, fu_runtime::Result<()>> {
		if let Frame::Text(text) = frame {
			let request: Value = serde_json::from_str(&text).unwrap();
			let expression = request["params"]["expression"].as_str().unwrap().to_string();
			let result = (self.handler)(&expression);
			self.seen.lock().push(expression);
			let reply = json!({"id": request["id"], "result": result});
			let _ = self.replies.send(Frame::Text(reply.to_string()));
		}
		async { Ok(()) }.boxed()
	}

	fn close(&mut self) -> BoxFuture<'_, fu_runtime::Result<()>> {
		async { Ok(()) }.boxed()
	}
}

struct PageConnector {
	handler: Handler,
	seen: Arc<Mutex<Vec<String>>>,
}

impl Connector for PageConnector {
	fn connect(&self) -> BoxFuture<'_, fu_runtime::Result<TransportParts>> {
		let (replies, inbound) = mpsc::unbounded_channel();
		let sender = PageTransport {
			handler: self.handler.clone(),
			seen: self.seen.clone(),
			replies,
		};
		async move {
			Ok(TransportParts {
				sender: Box::new(sender),
				inbound,
			})
		}
		.boxed()
	}
}

fn value(v: Value) -> Value {
	json!({"result": {"type": "object", "value": v}})
}

fn thrown(description: &str) -> Value {
	json!({
		"result": {"type": "object", "subtype": "error"},
		"exceptionDetails": {
			"text": "Uncaught",
			"exception": {"type": "object", "className": "Error", "description": description}
		}
	})
}

fn page<F>(handler: F) -> (Figma, Arc<Mutex<Vec<String>>>)
where
	F: Fn(&str) -> Value + Send + Sync + 'static,
{
	let seen = Arc::new(Mutex::new(Vec::new()));
	let connector = Arc::new(PageConnector {
		handler: Arc::new(handler),
		seen: seen.clone(),
	});
	(Figma::with_connector(connector, ConnectionConfig::default()), seen)
}

/// A document with one page, one user session, and one color variable.
fn document(expression: &str) -> Value {
	match expression {
		ROOT_NAME => value(json!("Design System")),
		CURRENT_PAGE => value(json!("0:1")),
		SESSION_ID => value(json!(38448)),
		LOCATION => value(json!("https://www.figma.com/design/AbC123xyz/Design-System?node-id=0-1")),
		LOCAL_COLOR_VARIABLES => value(json!([{"name": "Colors/Gray/50", "id": "VariableID:38448:122296"}])),
		other => thrown(&format!("ReferenceError: {other} is not defined")),
	}
}

#[test]
fn file_keys_from_urls() {
	assert_eq!(
		file_key_from_url("https://www.figma.com/design/AbC123/Title?node-id=1-2").as_deref(),
		Some("AbC123")
	);
	assert_eq!(file_key_from_url("https://www.figma.com/file/K9/x").as_deref(), Some("K9"));
	assert_eq!(file_key_from_url("https://www.figma.com/files/recent"), None);
}

#[test]
fn file_key_pattern_compiles() {
	let pattern = LazyLock::force(&super::FILE_KEY);
	assert_eq!(pattern.captures_len(), 2);
	assert_eq!(file_key_from_url("https://www.figma.com/board/Zz9/Jam").as_deref(), Some("Zz9"));
}

#[tokio::test]
async fn status_reports_file_name() {
	let (figma, _) = page(document);
	assert_eq!(
		figma.status().await,
		Status {
			connected: true,
			file_name: Some("Design System".into()),
			error: None,
		}
	);
}

#[tokio::test]
async fn status_reports_failures_without_erroring() {
	let (figma, _) = page(|_| thrown("Error: figma is not ready"));
	let status = figma.status().await;
	assert!(!status.connected);
	assert_eq!(status.error.as_deref(), Some("Error: figma is not ready"));
}

#[tokio::test]
async fn document_helpers() {
	let (figma, _) = page(document);
	assert_eq!(figma.current_page().await.unwrap(), Guid::new(0, 1));
	assert_eq!(figma.session_id().await.unwrap(), 38448);
	assert_eq!(figma.file_key().await.unwrap(), "AbC123xyz");
	assert_eq!(
		figma.multiplayer_url("ws-1").await.unwrap(),
		"wss://www.figma.com/api/multiplayer/AbC123xyz?role=editor&version=151&recentReload=0&tracking_session_id=ws-1"
	);
}

#[tokio::test]
async fn missing_session_is_an_error() {
	let (figma, _) = page(|_| value(Value::Null));
	assert!(matches!(figma.session_id().await, Err(Error::UnexpectedResponse(_))));
}

#[tokio::test]
async fn variables_load_once() {
	let (figma, seen) = page(document);
	let first = figma.load_variables().await.unwrap();
	let second = figma.load_variables().await.unwrap();
	assert!(Arc::ptr_eq(&first, &second));
	assert_eq!(first.get("Colors/Gray/50"), Some(Guid::new(38448, 122296)));

	let loads = seen.lock().iter().filter(|e| e.as_str() == LOCAL_COLOR_VARIABLES).count();
	assert_eq!(loads, 1);

	figma.invalidate();
	figma.load_variables().await.unwrap();
	let loads = seen.lock().iter().filter(|e| e.as_str() == LOCAL_COLOR_VARIABLES).count();
	assert_eq!(loads, 2);
}

#[tokio::test]
async fn renderer_targets_current_page() {
	let (figma, _) = page(document);
	let renderer = figma.renderer(RenderOptions::default().with_seed(1)).await.unwrap();
	let root = Element::new(Intrinsic::Frame).prop("fill", json!({"$var": "Colors/Gray/50"}));

	let batch = renderer.render(&root).unwrap();
	let change = &batch.changes[0];
	assert_eq!(change.guid, Guid::new(38448, 1));
	assert_eq!(change.parent_guid(), Some(Guid::new(0, 1)));
	assert_eq!(change.properties.fills[0].color_var, Some(Guid::new(38448, 122296)));
}

#[tokio::test]
async fn command_injects_bundle_once() {
	const BUNDLE: &str = "window.__figmaRpc = (cmd, args) => ({ cmd, args })";
	let injected = Arc::new(AtomicBool::new(false));
	let state = injected.clone();
	let (figma, seen) = page(move |expression| {
		if expression == super::rpc::RPC_READY {
			value(json!(state.load(Ordering::SeqCst)))
		} else if expression == BUNDLE {
			state.store(true, Ordering::SeqCst);
			value(Value::Null)
		} else if expression.starts_with("window.__figmaRpc(\"get-node\"") {
			value(json!({"__error": "Node not found"}))
		} else if expression.starts_with("window.__figmaRpc(") {
			value(json!({"id": "1:2", "name": "Frame"}))
		} else {
			thrown("Error: unexpected")
		}
	});
	let figma = figma.with_rpc_bundle(BUNDLE);

	let created = figma.command("create-frame", &json!({"width": 10})).await.unwrap();
	assert_eq!(created["id"], "1:2");
	figma.command("create-frame", &json!({})).await.unwrap();

	assert!(injected.load(Ordering::SeqCst));
	assert_eq!(seen.lock().iter().filter(|e| e.as_str() == BUNDLE).count(), 1);
	assert!(seen.lock().contains(&"window.__figmaRpc(\"create-frame\", {\"width\":10})".to_string()));

	let err = figma.command("get-node", &json!({"id": "9:9"})).await.unwrap_err();
	assert_eq!(err.to_string(), "command 'get-node' failed: Node not found");
}

#[tokio::test]
async fn command_without_bridge_fails() {
	let (figma, _) = page(|_| value(json!(false)));
	let err = figma.command("noop", &json!(null)).await.unwrap_err();
	assert!(matches!(err, Error::Command { .. }), "{err}");
}
