use std::sync::Arc;
use std::time::Duration;

use fu_runtime::{CdpConnector, Connection, ConnectionConfig, Error, fetch_targets};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Serves `body` as the `/json` answer to every request.
async fn spawn_target_list(body: String) -> u16 {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let port = listener.local_addr().unwrap().port();
	tokio::spawn(async move {
		loop {
			let Ok((mut stream, _)) = listener.accept().await else {
				break;
			};
			let body = body.clone();
			tokio::spawn(async move {
				let mut buf = [0u8; 2048];
				let _ = stream.read(&mut buf).await;
				let response = format!(
					"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
					body.len(),
					body
				);
				let _ = stream.write_all(response.as_bytes()).await;
				let _ = stream.shutdown().await;
			});
		}
	});
	port
}

/// Answers every `Runtime.evaluate` with the expression's length.
async fn spawn_page() -> String {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		while let Ok((stream, _)) = listener.accept().await {
			tokio::spawn(async move {
				let mut ws = accept_async(stream).await.unwrap();
				while let Some(Ok(Message::Text(text))) = ws.next().await {
					let request: Value = serde_json::from_str(&text).unwrap();
					let expression = request["params"]["expression"].as_str().unwrap_or_default();
					let reply = json!({
						"id": request["id"],
						"result": {"result": {"type": "number", "value": expression.len()}}
					});
					if ws.send(Message::Text(reply.to_string())).await.is_err() {
						break;
					}
				}
			});
		}
	});
	format!("ws://{addr}/devtools/page/P1")
}

fn page(url: &str, ws: &str) -> Value {
	json!({
		"id": "P1",
		"type": "page",
		"title": "Untitled",
		"url": url,
		"webSocketDebuggerUrl": ws
	})
}

#[tokio::test]
async fn evaluates_against_discovered_page() {
	let ws = spawn_page().await;
	let list = json!([
		{"id": "W", "type": "worker", "url": "https://www.figma.com/design/KEY/worker"},
		page("https://www.figma.com/design/KEY/Untitled", &ws),
	]);
	let port = spawn_target_list(list.to_string()).await;

	let config = ConnectionConfig::default()
		.with_port(port)
		.with_idle_timeout(Duration::from_secs(5));
	let connector = Arc::new(CdpConnector::new(config.clone()));
	let connection = Connection::new(connector.clone(), config);

	assert_eq!(connection.evaluate("1 + 1").await.unwrap(), json!(5));
	assert_eq!(
		connector.cached_target().map(|t| t.url),
		Some("https://www.figma.com/design/KEY/Untitled".to_string())
	);
	connection.close().await;
}

#[tokio::test]
async fn missing_document_page_is_target_not_found() {
	let list = json!([page("https://example.com/", "ws://127.0.0.1:1/x")]);
	let port = spawn_target_list(list.to_string()).await;

	let config = ConnectionConfig::default().with_port(port);
	let connection = Connection::new(Arc::new(CdpConnector::new(config.clone())), config);

	let err = connection.evaluate("1").await.unwrap_err();
	assert!(matches!(err, Error::TargetNotFound(_)), "{err}");
}

#[tokio::test]
async fn closed_port_is_connection_failure() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let port = listener.local_addr().unwrap().port();
	drop(listener);

	let err = fetch_targets(port, Duration::from_millis(200)).await.unwrap_err();
	assert!(matches!(err, Error::ConnectionFailed(_)), "{err}");
}
