//! Duplex frame transport.
//!
//! A transport is split into two halves when connected:
//! - a [`Transport`] sender owned by the connection's writer task
//! - an inbound channel fed by a reader task that ends when the link ends
//!
//! The correlation layer only sees these two halves, so tests can stand in
//! a pair of in-memory channels for a real socket.

use futures_util::future::BoxFuture;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{FutureExt, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::error::{Error, Result};


/// One application-level message on the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
	Text(String),
	Binary(Vec<u8>),
}

impl Frame {
	pub fn len(&self) -> usize {
		match self {
			Frame::Text(text) => text.len(),
			Frame::Binary(bytes) => bytes.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Sending half of a connected link.
pub trait Transport: Send {
	/// Writes one frame.
	fn send(&mut self, frame: Frame) -> BoxFuture<'_, Result<()>>;

	/// Performs an orderly close of the link.
	fn close(&mut self) -> BoxFuture<'_, Result<()>>;
}

/// Both halves of a freshly connected link.
pub struct TransportParts {
	pub sender: Box<dyn Transport>,
	/// Inbound frames. The channel closing means the link is gone.
	pub inbound: mpsc::UnboundedReceiver<Frame>,
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket-backed transport.
pub struct WebSocketTransport {
	sink: SplitSink<WsStream, Message>,
}

impl WebSocketTransport {
	/// Opens a WebSocket to `url` and starts its reader task.
	pub async fn connect(url: &str) -> Result<TransportParts> {
		tracing::debug!(%url, "Connecting websocket");
		let (stream, _response) = connect_async(url)
			.await
			.map_err(|e| Error::ConnectionFailed(format!("{url}: {e}")))?;

		let (sink, read) = stream.split();
		let (tx, inbound) = mpsc::unbounded_channel();
		tokio::spawn(Self::read_loop(read, tx));

		Ok(TransportParts {
			sender: Box::new(Self { sink }),
			inbound,
		})
	}

	async fn read_loop(mut read: SplitStream<WsStream>, tx: mpsc::UnboundedSender<Frame>) {
		while let Some(message) = read.next().await {
			let frame = match message {
				Ok(Message::Text(text)) => Frame::Text(text),
				Ok(Message::Binary(bytes)) => Frame::Binary(bytes),
				Ok(Message::Close(reason)) => {
					tracing::debug!(?reason, "Websocket closed by peer");
					break;
				}
				Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
				Err(e) => {
					tracing::error!("Websocket read error: {}", e);
					break;
				}
			};
			if tx.send(frame).is_err() {
				break;
			}
		}
	}
}

impl Transport for WebSocketTransport {
	fn send(&mut self, frame: Frame) -> BoxFuture<'_, Result<()>> {
		let message = match frame {
			Frame::Text(text) => Message::Text(text),
			Frame::Binary(bytes) => Message::Binary(bytes),
		};
		async move { self.sink.send(message).await.map_err(Error::from) }.boxed()
	}

	fn close(&mut self) -> BoxFuture<'_, Result<()>> {
		async move { self.sink.close().await.map_err(Error::from) }.boxed()
	}
}
