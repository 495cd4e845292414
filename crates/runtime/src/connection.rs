//! JSON-RPC correlation layer over a single duplex link.
//!
//! This module turns one-way, interleaved frames into awaitable calls:
//! - Generating monotonically increasing request ids
//! - Correlating responses with pending requests by id, in any order
//! - Failing a request with [`Error::TransportTimeout`] when its deadline passes
//! - Closing the link after it has been idle for a while
//! - Failing everything with [`Error::TransportClosed`] when the link drops
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected --send--> Connecting --connected--> Open
//!      ^                                            |
//!      |------- link lost -------------------------|
//!      |                                            | idle / close()
//!      '------------- transport closed ---- Closing <'
//! ```
//!
//! The link is (re)established lazily by the next dispatch through a
//! [`Connector`]. Reader, writer, and timer tasks hold only weak references,
//! and each link carries a generation number so a task belonging to a torn
//! down link can never disturb its successor.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex as TokioMutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;

use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::transport::{Frame, Transport, TransportParts};


/// Produces fresh links on demand.
pub trait Connector: Send + Sync {
	/// Opens a new link.
	fn connect(&self) -> BoxFuture<'_, Result<TransportParts>>;

	/// Drops any cached endpoint after a failure so the next connect
	/// rediscovers it.
	fn invalidate(&self) {}
}

/// Observable state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
	Disconnected,
	Connecting,
	Open,
	Closing,
}

impl fmt::Display for ConnectionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			ConnectionState::Disconnected => "disconnected",
			ConnectionState::Connecting => "connecting",
			ConnectionState::Open => "open",
			ConnectionState::Closing => "closing",
		})
	}
}

/// Outbound request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
	/// Correlation id
	pub id: u32,
	pub method: String,
	pub params: Value,
}

/// Inbound response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
	pub id: u32,
	/// Success result (mutually exclusive with error)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	/// Error result (mutually exclusive with result)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorPayload>,
}

/// Protocol error details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code: Option<i64>,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

/// Anything that can arrive on the control channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	/// Has a numeric `id`.
	Response(Response),
	/// Events and anything else; ignored by the correlation layer.
	Unknown(Value),
}

pub(crate) fn parse_protocol_error(payload: ErrorPayload) -> Error {
	Error::Remote {
		name: match payload.code {
			Some(code) => format!("ProtocolError({code})"),
			None => "ProtocolError".to_string(),
		},
		message: payload.message,
		stack: payload.data.map(|d| d.to_string()),
	}
}

struct PendingRequest {
	method: String,
	timeout: Duration,
	tx: oneshot::Sender<Result<Value>>,
	timer: AbortHandle,
}

enum Outbound {
	Frame(Frame),
	/// Close the transport, then acknowledge.
	Close(Option<oneshot::Sender<()>>),
}

struct Link {
	generation: u64,
	outbound: mpsc::UnboundedSender<Outbound>,
	reader: AbortHandle,
}

struct Shared {
	state: ConnectionState,
	link: Option<Link>,
	pending: HashMap<u32, PendingRequest>,
	idle: Option<AbortHandle>,
	/// Bumped every time an idle timer is armed.
	idle_epoch: u64,
	generation: u64,
}

struct Inner {
	connector: Arc<dyn Connector>,
	config: ConnectionConfig,
	last_id: AtomicU32,
	shared: Mutex<Shared>,
	/// Serializes connection attempts.
	connect_gate: TokioMutex<()>,
}

/// Shared handle to the control channel. Cloning is cheap.
#[derive(Clone)]
pub struct Connection {
	inner: Arc<Inner>,
}

impl fmt::Debug for Connection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Connection")
			.field("state", &self.state())
			.field("pending", &self.pending_count())
			.finish()
	}
}

impl Connection {
	pub fn new(connector: Arc<dyn Connector>, config: ConnectionConfig) -> Self {
		Self {
			inner: Arc::new(Inner {
				connector,
				config,
				last_id: AtomicU32::new(1),
				shared: Mutex::new(Shared {
					state: ConnectionState::Disconnected,
					link: None,
					pending: HashMap::new(),
					idle: None,
					idle_epoch: 0,
					generation: 0,
				}),
				connect_gate: TokioMutex::new(()),
			}),
		}
	}

	pub fn config(&self) -> &ConnectionConfig {
		&self.inner.config
	}

	pub fn state(&self) -> ConnectionState {
		self.inner.shared.lock().state
	}

	/// Number of requests awaiting a response.
	pub fn pending_count(&self) -> usize {
		self.inner.shared.lock().pending.len()
	}

	/// Sends a request with the configured default timeout.
	pub async fn send(&self, method: &str, params: Value) -> Result<Value> {
		self.send_with_timeout(method, params, self.inner.config.request_timeout)
			.await
	}

	/// Sends a request and awaits its response or `timeout`.
	///
	/// Connects first if there is no open link. A timeout fails only this
	/// request; the link stays up for other callers.
	pub async fn send_with_timeout(&self, method: &str, params: Value, timeout: Duration) -> Result<Value> {
		let (id, rx, outbound) = loop {
			self.inner.connect_if_needed().await?;
			if let Some(registered) = self.inner.register(method, timeout) {
				break registered;
			}
		};
		let guard = CancelGuard {
			id,
			inner: Arc::downgrade(&self.inner),
			completed: false,
		};

		let request = Request {
			id,
			method: method.to_string(),
			params,
		};
		let text = serde_json::to_string(&request)?;
		tracing::debug!(id, method, "Sending request");

		if outbound.send(Outbound::Frame(Frame::Text(text))).is_err() {
			return Err(Error::TransportClosed("writer stopped before the request was sent".to_string()));
		}

		ResponseFuture { rx, guard }.await
	}

	/// Closes the link, failing anything still pending.
	///
	/// The next dispatch reconnects.
	pub async fn close(&self) {
		let (ack_tx, ack_rx) = oneshot::channel();
		{
			let mut shared = self.inner.shared.lock();
			if let Some(idle) = shared.idle.take() {
				idle.abort();
			}
			if shared.link.is_none() {
				return;
			}
			self.inner
				.shutdown(&mut shared, "connection closed by caller", Some(ack_tx));
		}
		let _ = ack_rx.await;
	}
}

impl Inner {
	async fn connect_if_needed(self: &Arc<Self>) -> Result<()> {
		if self.shared.lock().link.is_some() {
			return Ok(());
		}
		let _gate = self.connect_gate.lock().await;
		{
			let mut shared = self.shared.lock();
			if shared.link.is_some() {
				return Ok(());
			}
			shared.state = ConnectionState::Connecting;
		}

		tracing::debug!("Connecting control channel");
		match self.connector.connect().await {
			Ok(parts) => {
				self.install(parts);
				Ok(())
			}
			Err(e) => {
				{
					let mut shared = self.shared.lock();
					if shared.link.is_none() {
						shared.state = ConnectionState::Disconnected;
					}
				}
				self.connector.invalidate();
				Err(e)
			}
		}
	}

	fn install(self: &Arc<Self>, parts: TransportParts) {
		let TransportParts { sender, inbound } = parts;
		let mut shared = self.shared.lock();
		shared.generation += 1;
		let generation = shared.generation;

		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		let weak = Arc::downgrade(self);
		tokio::spawn(writer_loop(weak.clone(), generation, sender, outbound_rx));
		let reader = tokio::spawn(reader_loop(weak, generation, inbound)).abort_handle();

		shared.link = Some(Link {
			generation,
			outbound: outbound_tx,
			reader,
		});
		shared.state = ConnectionState::Open;
		tracing::debug!(generation, "Control channel open");
	}

	/// Adds a pending entry if a link is up, returning the id, the response
	/// receiver, and the link's outbound queue.
	fn register(
		self: &Arc<Self>,
		method: &str,
		timeout: Duration,
	) -> Option<(u32, oneshot::Receiver<Result<Value>>, mpsc::UnboundedSender<Outbound>)> {
		let mut shared = self.shared.lock();
		let outbound = shared.link.as_ref()?.outbound.clone();
		if let Some(idle) = shared.idle.take() {
			idle.abort();
		}

		let id = self.last_id.fetch_add(1, Ordering::SeqCst);
		let (tx, rx) = oneshot::channel();
		let weak = Arc::downgrade(self);
		let timer = tokio::spawn(async move {
			tokio::time::sleep(timeout).await;
			if let Some(inner) = weak.upgrade() {
				inner.expire(id);
			}
		})
		.abort_handle();

		shared.pending.insert(
			id,
			PendingRequest {
				method: method.to_string(),
				timeout,
				tx,
				timer,
			},
		);
		Some((id, rx, outbound))
	}

	fn handle_frame(self: &Arc<Self>, frame: Frame) {
		let Frame::Text(text) = frame else {
			tracing::debug!("Ignoring binary frame on control channel");
			return;
		};
		let response = match serde_json::from_str::<Message>(&text) {
			Ok(Message::Response(response)) => response,
			Ok(Message::Unknown(_)) => {
				tracing::trace!("Ignoring non-response message");
				return;
			}
			Err(e) => {
				tracing::warn!("Failed to parse inbound message: {}", e);
				return;
			}
		};

		let mut shared = self.shared.lock();
		let Some(pending) = shared.pending.remove(&response.id) else {
			tracing::debug!(id = response.id, "Ignoring response with no pending request");
			return;
		};
		pending.timer.abort();
		tracing::debug!(id = response.id, method = %pending.method, "Response received");

		let result = match response.error {
			Some(error) => Err(parse_protocol_error(error)),
			None => Ok(response.result.unwrap_or(Value::Null)),
		};
		let _ = pending.tx.send(result);
		self.arm_idle(&mut shared);
	}

	fn expire(self: &Arc<Self>, id: u32) {
		let mut shared = self.shared.lock();
		let Some(pending) = shared.pending.remove(&id) else {
			return;
		};
		tracing::warn!(id, method = %pending.method, "Request timed out");
		let _ = pending.tx.send(Err(Error::TransportTimeout {
			id,
			method: pending.method,
			timeout_ms: pending.timeout.as_millis() as u64,
		}));
		self.arm_idle(&mut shared);
	}

	/// Removes an entry whose caller stopped waiting.
	fn cancel(self: &Arc<Self>, id: u32) {
		let mut shared = self.shared.lock();
		if let Some(pending) = shared.pending.remove(&id) {
			pending.timer.abort();
			tracing::debug!(id, "Removed abandoned request");
			self.arm_idle(&mut shared);
		}
	}

	/// Starts (or restarts) the idle timer once nothing is pending.
	fn arm_idle(self: &Arc<Self>, shared: &mut Shared) {
		if !shared.pending.is_empty() {
			return;
		}
		let Some(generation) = shared.link.as_ref().map(|l| l.generation) else {
			return;
		};
		let Ok(handle) = tokio::runtime::Handle::try_current() else {
			return;
		};
		if let Some(idle) = shared.idle.take() {
			idle.abort();
		}

		shared.idle_epoch += 1;
		let epoch = shared.idle_epoch;
		let idle_timeout = self.config.idle_timeout;
		let weak = Arc::downgrade(self);
		let task = handle.spawn(async move {
			tokio::time::sleep(idle_timeout).await;
			if let Some(inner) = weak.upgrade() {
				inner.close_idle(generation, epoch);
			}
		});
		shared.idle = Some(task.abort_handle());
	}

	fn close_idle(&self, generation: u64, epoch: u64) {
		let mut shared = self.shared.lock();
		if shared.idle.is_none() || shared.idle_epoch != epoch || !shared.pending.is_empty() {
			return;
		}
		if shared.link.as_ref().map(|l| l.generation) != Some(generation) {
			return;
		}
		shared.idle = None;
		tracing::debug!(generation, "Closing idle control channel");
		self.shutdown(&mut shared, "connection closed while idle", None);
	}

	/// Deliberate teardown: detach the link and ask the writer to close it.
	fn shutdown(&self, shared: &mut Shared, reason: &str, ack: Option<oneshot::Sender<()>>) {
		let Some(link) = shared.link.take() else {
			return;
		};
		shared.state = ConnectionState::Closing;
		link.reader.abort();
		fail_pending(shared, reason);
		if link.outbound.send(Outbound::Close(ack)).is_err() {
			shared.state = ConnectionState::Disconnected;
		}
	}

	fn finish_close(&self, generation: u64) {
		let mut shared = self.shared.lock();
		if shared.link.is_none() && shared.state == ConnectionState::Closing {
			shared.state = ConnectionState::Disconnected;
			tracing::debug!(generation, "Control channel closed");
		}
	}

	/// Unexpected loss of the link identified by `generation`.
	fn link_lost(&self, generation: u64, reason: &str) {
		{
			let mut shared = self.shared.lock();
			if shared.link.as_ref().map(|l| l.generation) != Some(generation) {
				return;
			}
			let Some(link) = shared.link.take() else {
				return;
			};
			tracing::warn!(generation, reason, pending = shared.pending.len(), "Control channel lost");
			shared.state = ConnectionState::Disconnected;
			if let Some(idle) = shared.idle.take() {
				idle.abort();
			}
			link.reader.abort();
			fail_pending(&mut shared, reason);
		}
		self.connector.invalidate();
	}
}

impl Drop for Inner {
	fn drop(&mut self) {
		let shared = self.shared.get_mut();
		if let Some(link) = shared.link.take() {
			link.reader.abort();
		}
		if let Some(idle) = shared.idle.take() {
			idle.abort();
		}
		for pending in shared.pending.values() {
			pending.timer.abort();
		}
	}
}

fn fail_pending(shared: &mut Shared, reason: &str) {
	for (id, pending) in shared.pending.drain() {
		pending.timer.abort();
		tracing::debug!(id, method = %pending.method, "Failing pending request");
		let _ = pending.tx.send(Err(Error::TransportClosed(reason.to_string())));
	}
}

async fn reader_loop(inner: Weak<Inner>, generation: u64, mut inbound: mpsc::UnboundedReceiver<Frame>) {
	while let Some(frame) = inbound.recv().await {
		let Some(strong) = inner.upgrade() else {
			return;
		};
		strong.handle_frame(frame);
	}
	if let Some(strong) = inner.upgrade() {
		strong.link_lost(generation, "connection closed by remote");
	}
}

async fn writer_loop(
	inner: Weak<Inner>,
	generation: u64,
	mut transport: Box<dyn Transport>,
	mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
	while let Some(next) = outbound.recv().await {
		match next {
			Outbound::Frame(frame) => {
				if let Err(e) = transport.send(frame).await {
					tracing::error!("Transport write error: {}", e);
					if let Some(strong) = inner.upgrade() {
						strong.link_lost(generation, &format!("write failed: {e}"));
					}
					return;
				}
			}
			Outbound::Close(ack) => {
				if let Err(e) = transport.close().await {
					tracing::debug!("Error while closing transport: {}", e);
				}
				if let Some(strong) = inner.upgrade() {
					strong.finish_close(generation);
				}
				if let Some(ack) = ack {
					let _ = ack.send(());
				}
				return;
			}
		}
	}
}

/// RAII guard ensuring the pending entry is removed when a request future
/// is dropped before completing.
struct CancelGuard {
	id: u32,
	inner: Weak<Inner>,
	completed: bool,
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if self.completed {
			return;
		}
		if let Some(inner) = self.inner.upgrade() {
			inner.cancel(self.id);
		}
	}
}

struct ResponseFuture {
	rx: oneshot::Receiver<Result<Value>>,
	guard: CancelGuard,
}

impl Future for ResponseFuture {
	type Output = Result<Value>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(result) => {
				self.guard.completed = true;
				Poll::Ready(
					result
						.map_err(|_| Error::TransportClosed("request dropped by connection".to_string()))
						.and_then(|r| r),
				)
			}
			Poll::Pending => Poll::Pending,
		}
	}
}
