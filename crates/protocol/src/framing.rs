//! Whole-message compression envelope.
//!
//! Outbound frames are a zstd stream, optionally preceded by a 12-byte
//! header: the ASCII magic `fig-wire` plus a little-endian `u32` protocol
//! version. Inbound frames are classified by prefix only.

use crate::error::FramingError;

/// Leading bytes of every zstd frame.
pub const COMPRESSION_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];

/// Magic string opening the optional outer header.
pub const HEADER_MAGIC: &[u8; 8] = b"fig-wire";

/// Outer header length: magic plus version.
pub const HEADER_LEN: usize = HEADER_MAGIC.len() + 4;

/// Compression level used by [`wrap`].
pub const DEFAULT_LEVEL: i32 = 3;

/// Returns true when `frame` opens with the outer header magic.
pub fn has_header(frame: &[u8]) -> bool {
	frame.starts_with(HEADER_MAGIC)
}

/// Returns true when `bytes` opens with the compression magic.
pub fn is_compressed(bytes: &[u8]) -> bool {
	bytes.starts_with(&COMPRESSION_MAGIC)
}

/// Splits off the outer header if present, returning its version and the rest.
pub fn strip_header(frame: &[u8]) -> Result<(Option<u32>, &[u8]), FramingError> {
	if !has_header(frame) {
		return Ok((None, frame));
	}
	if frame.len() < HEADER_LEN {
		return Err(FramingError::HeaderTruncated {
			len: frame.len(),
			needed: HEADER_LEN,
		});
	}
	let version = u32::from_le_bytes([frame[8], frame[9], frame[10], frame[11]]);
	Ok((Some(version), &frame[HEADER_LEN..]))
}

/// Compresses `payload` at [`DEFAULT_LEVEL`], prefixing the outer header
/// when `header_version` is set.
pub fn wrap(payload: &[u8], header_version: Option<u32>) -> Result<Vec<u8>, FramingError> {
	wrap_with_level(payload, header_version, DEFAULT_LEVEL)
}

pub fn wrap_with_level(payload: &[u8], header_version: Option<u32>, level: i32) -> Result<Vec<u8>, FramingError> {
	let compressed = zstd::encode_all(payload, level).map_err(FramingError::Compress)?;
	let Some(version) = header_version else {
		return Ok(compressed);
	};
	let mut frame = Vec::with_capacity(HEADER_LEN + compressed.len());
	frame.extend_from_slice(HEADER_MAGIC);
	frame.extend_from_slice(&version.to_le_bytes());
	frame.extend_from_slice(&compressed);
	Ok(frame)
}

/// Removes the envelope from an inbound frame.
///
/// Frames without a header and without the compression magic are returned
/// as-is, since some message kinds travel uncompressed. A frame that carries
/// the header must be compressed.
pub fn unwrap(frame: &[u8]) -> Result<Vec<u8>, FramingError> {
	let (version, body) = strip_header(frame)?;
	if !is_compressed(body) {
		if version.is_some() {
			return Err(FramingError::MissingMagic {
				found: body.iter().take(COMPRESSION_MAGIC.len()).copied().collect(),
			});
		}
		tracing::trace!(len = body.len(), "Uncompressed frame passed through");
		return Ok(body.to_vec());
	}
	let payload = zstd::decode_all(body).map_err(FramingError::Decompress)?;
	tracing::trace!(version = ?version, frame = frame.len(), payload = payload.len(), "Unwrapped frame");
	Ok(payload)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::PROTOCOL_VERSION;

	#[test]
	fn round_trips_without_header() {
		let payload = b"\x01\x01\x02\x07\x00 node changes".repeat(8);
		let frame = wrap(&payload, None).unwrap();
		assert!(is_compressed(&frame));
		assert!(!has_header(&frame));
		assert_eq!(unwrap(&frame).unwrap(), payload);
	}

	#[test]
	fn round_trips_with_header() {
		let payload: Vec<u8> = (0..=255u8).collect();
		let frame = wrap(&payload, Some(PROTOCOL_VERSION)).unwrap();
		assert_eq!(&frame[..8], b"fig-wire");
		assert_eq!(&frame[8..12], &151u32.to_le_bytes());
		assert!(is_compressed(&frame[HEADER_LEN..]));

		let (version, body) = strip_header(&frame).unwrap();
		assert_eq!(version, Some(151));
		assert_eq!(body.len(), frame.len() - HEADER_LEN);
		assert_eq!(unwrap(&frame).unwrap(), payload);
	}

	#[test]
	fn empty_payload_round_trips() {
		assert!(unwrap(&wrap(&[], None).unwrap()).unwrap().is_empty());
		assert!(unwrap(&wrap(&[], Some(1)).unwrap()).unwrap().is_empty());
	}

	#[test]
	fn uncompressed_frames_pass_through() {
		assert_eq!(unwrap(b"plain").unwrap(), b"plain");
	}

	#[test]
	fn truncated_header_is_an_error() {
		let err = unwrap(b"fig-wire\x97").unwrap_err();
		assert!(matches!(err, FramingError::HeaderTruncated { len: 9, needed: 12 }));
	}

	#[test]
	fn header_without_compressed_body_is_an_error() {
		let mut frame = b"fig-wire".to_vec();
		frame.extend_from_slice(&151u32.to_le_bytes());
		frame.extend_from_slice(b"oops");
		let err = unwrap(&frame).unwrap_err();
		assert!(matches!(err, FramingError::MissingMagic { ref found } if found == b"oops"));
	}

	#[test]
	fn corrupt_stream_is_an_error() {
		let mut frame = wrap(b"hello hello hello", None).unwrap();
		frame.truncate(COMPRESSION_MAGIC.len() + 2);
		assert!(matches!(unwrap(&frame), Err(FramingError::Decompress(_))));
	}
}
