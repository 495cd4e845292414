//! Wire vocabulary for the collaborative document transport.
//!
//! This crate owns everything that is fixed by the remote side's binary
//! contract:
//! - **Identity**: [`Guid`] session-scoped node ids
//! - **Schema**: enum ordinals and numbered field tables ([`schema`])
//! - **Model**: the canonical [`NodeChange`] and [`Message`] shapes
//! - **Codec**: field-numbered binary encode/decode ([`codec`])
//! - **Framing**: the zstd envelope and optional `fig-wire` header ([`framing`])
//!
//! It performs no I/O. Transport and correlation live in `fu-runtime`.

pub mod codec;
pub mod error;
pub mod framing;
pub mod guid;
pub mod node;
pub mod schema;

pub use codec::{decode_message, decode_node_change, encode_message, encode_node_change};
pub use error::{CodecError, Error, FramingError, Result};
pub use guid::{Guid, GuidParseError};
pub use node::*;
pub use schema::{
	BlendMode, EffectType, MessageType, NodePhase, NodeType, PROTOCOL_VERSION, PaintType, StackAlign,
	StackJustify, StackMode, StrokeAlign, TextAlignHorizontal,
};

/// Builds the multiplayer WebSocket URL for a document.
pub fn multiplayer_url(file_key: &str, tracking_session_id: &str) -> String {
	format!(
		"wss://www.figma.com/api/multiplayer/{file_key}?role=editor&version={PROTOCOL_VERSION}&recentReload=0&tracking_session_id={tracking_session_id}"
	)
}

/// Encodes and frames a message in one step.
pub fn encode_frame(message: &Message, header_version: Option<u32>) -> Result<Vec<u8>> {
	let wire = encode_message(message);
	Ok(framing::wrap(&wire.payload, header_version)?)
}

/// Unwraps and decodes an inbound binary frame.
pub fn decode_frame(frame: &[u8]) -> Result<Message> {
	let payload = framing::unwrap(frame)?;
	Ok(decode_message(&payload)?)
}
