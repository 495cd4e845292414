//! Binary channel to the document's live-collaboration endpoint.

use futures_util::future::BoxFuture;
use futures_util::{FutureExt, SinkExt, StreamExt};
use fu_protocol::Message;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::error::{Error, Result};

/// Destination for framed wire messages.
pub trait FrameSink: Send {
	fn send_frame(&mut self, frame: Vec<u8>) -> BoxFuture<'_, Result<()>>;
}

/// Collects frames in memory.
impl FrameSink for Vec<Vec<u8>> {
	fn send_frame(&mut self, frame: Vec<u8>) -> BoxFuture<'_, Result<()>> {
		self.push(frame);
		async { Ok(()) }.boxed()
	}
}

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket carrying compressed binary frames.
pub struct MultiplayerChannel {
	stream: Stream,
	sent: usize,
}

impl MultiplayerChannel {
	/// Connects to `url`, sending `cookie` as the `Cookie` header when given.
	pub async fn connect(url: &str, cookie: Option<&str>) -> Result<Self> {
		let mut request = url.into_client_request()?;
		if let Some(cookie) = cookie {
			let value = HeaderValue::from_str(cookie)
				.map_err(|e| Error::Multiplayer(format!("invalid cookie header: {e}")))?;
			request.headers_mut().insert("Cookie", value);
		}

		let (stream, response) = connect_async(request).await?;
		tracing::debug!(status = %response.status(), "Multiplayer channel open");
		Ok(Self { stream, sent: 0 })
	}

	pub fn frames_sent(&self) -> usize {
		self.sent
	}

	/// Waits for the next binary frame and decodes it.
	///
	/// Text and control frames are skipped. Returns `Ok(None)` once the peer
	/// closes. A frame that fails to unwrap or decode is returned as an error;
	/// the channel stays usable.
	pub async fn recv(&mut self) -> Result<Option<Message>> {
		while let Some(frame) = self.stream.next().await {
			match frame? {
				WsMessage::Binary(bytes) => return Ok(Some(fu_protocol::decode_frame(&bytes)?)),
				WsMessage::Close(_) => return Ok(None),
				_ => continue,
			}
		}
		Ok(None)
	}

	pub async fn close(mut self) -> Result<()> {
		self.stream.close(None).await?;
		Ok(())
	}
}

impl FrameSink for MultiplayerChannel {
	fn send_frame(&mut self, frame: Vec<u8>) -> BoxFuture<'_, Result<()>> {
		async move {
			let len = frame.len();
			self.stream.send(WsMessage::Binary(frame)).await?;
			self.sent += 1;
			tracing::debug!(len, sent = self.sent, "Sent multiplayer frame");
			Ok(())
		}
		.boxed()
	}
}
