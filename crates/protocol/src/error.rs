//! Error types for the wire codec and compression framer.

use std::fmt;

use thiserror::Error;

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Schema mismatch or truncated data while encoding or decoding.
///
/// `offset` is the byte position where the problem was detected, `field` the
/// schema field being processed at the time (if any). Together they are
/// enough to tell a local bug apart from remote schema drift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecError {
	pub reason: String,
	pub offset: usize,
	pub field: Option<&'static str>,
}

impl CodecError {
	pub fn new(reason: impl Into<String>, offset: usize) -> Self {
		Self {
			reason: reason.into(),
			offset,
			field: None,
		}
	}

	pub(crate) fn in_field(mut self, field: &'static str) -> Self {
		self.field.get_or_insert(field);
		self
	}
}

impl fmt::Display for CodecError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.field {
			Some(field) => write!(f, "codec error at offset {} in '{}': {}", self.offset, field, self.reason),
			None => write!(f, "codec error at offset {}: {}", self.offset, self.reason),
		}
	}
}

impl std::error::Error for CodecError {}

/// Compression envelope could not be produced or removed.
#[derive(Debug, Error)]
pub enum FramingError {
	/// The outer `fig-wire` header was announced but the frame is shorter than it.
	#[error("frame has a wire header but only {len} bytes (need at least {needed})")]
	HeaderTruncated { len: usize, needed: usize },

	/// Payload does not start with the compression magic bytes.
	#[error("missing compression magic: found {found:02x?}")]
	MissingMagic { found: Vec<u8> },

	/// Compressed stream is corrupt.
	#[error("decompression failed: {0}")]
	Decompress(#[source] std::io::Error),

	/// Compressor rejected the input or level.
	#[error("compression failed: {0}")]
	Compress(#[source] std::io::Error),
}

/// Umbrella error for the protocol crate.
#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	Codec(#[from] CodecError),

	#[error(transparent)]
	Framing(#[from] FramingError),
}

impl Error {
	/// Returns the byte offset for codec errors.
	pub fn offset(&self) -> Option<usize> {
		match self {
			Error::Codec(e) => Some(e.offset),
			Error::Framing(_) => None,
		}
	}
}
