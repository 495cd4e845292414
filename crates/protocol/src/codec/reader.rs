use crate::error::CodecError;
use crate::schema::{self, Field, FieldKind, FloatLayout};

/// Longest varint that can still fit in 64 bits.
const MAX_VARINT_LEN: usize = 10;

/// Decodes a varint from the front of `data`, returning the value and the
/// number of bytes consumed.
pub fn read_varint(data: &[u8]) -> Result<(u64, usize), CodecError> {
	let mut reader = Reader::new(data);
	let value = reader.varint()?;
	Ok((value, reader.offset()))
}

/// Cursor over an encoded payload that reports the offset of every failure.
pub(crate) struct Reader<'a> {
	data: &'a [u8],
	pos: usize,
}

impl<'a> Reader<'a> {
	pub(crate) fn new(data: &'a [u8]) -> Self {
		Self { data, pos: 0 }
	}

	pub(crate) fn offset(&self) -> usize {
		self.pos
	}

	pub(crate) fn remaining(&self) -> usize {
		self.data.len() - self.pos
	}

	pub(crate) fn error(&self, reason: impl Into<String>) -> CodecError {
		CodecError::new(reason, self.pos)
	}

	/// A field listed in the schema table that the decoder has no arm for.
	pub(crate) fn unhandled(&self, field: &Field) -> CodecError {
		self.error(format!("field tag {} has no decoder", field.number))
	}

	fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
		if self.remaining() < len {
			return Err(self.error(format!(
				"truncated: need {len} bytes, {} left",
				self.remaining()
			)));
		}
		let data = self.data;
		let slice = &data[self.pos..self.pos + len];
		self.pos += len;
		Ok(slice)
	}

	fn byte(&mut self) -> Result<u8, CodecError> {
		Ok(self.take(1)?[0])
	}

	pub(crate) fn varint(&mut self) -> Result<u64, CodecError> {
		let start = self.pos;
		let mut value = 0u64;
		for i in 0..MAX_VARINT_LEN {
			let byte = self.byte()?;
			value |= u64::from(byte & 0x7f) << (7 * i);
			if byte & 0x80 == 0 {
				return Ok(value);
			}
		}
		Err(CodecError::new("varint longer than 10 bytes", start))
	}

	pub(crate) fn uint(&mut self) -> Result<u32, CodecError> {
		let start = self.pos;
		let value = self.varint()?;
		u32::try_from(value)
			.map_err(|_| CodecError::new(format!("value {value} does not fit in 32 bits"), start))
	}

	pub(crate) fn boolean(&mut self) -> Result<bool, CodecError> {
		match self.byte()? {
			0 => Ok(false),
			1 => Ok(true),
			other => Err(CodecError::new(format!("invalid bool byte 0x{other:02x}"), self.pos - 1)),
		}
	}

	/// Reads an enum ordinal and maps it through `from_ordinal`.
	pub(crate) fn enumeration<T>(
		&mut self,
		from_ordinal: fn(u32) -> Option<T>,
		what: &str,
	) -> Result<T, CodecError> {
		let start = self.pos;
		let ordinal = self.uint()?;
		from_ordinal(ordinal).ok_or_else(|| CodecError::new(format!("unknown {what} ordinal {ordinal}"), start))
	}

	pub(crate) fn float(&mut self, field: &Field) -> Result<f32, CodecError> {
		match field.kind {
			FieldKind::Float(FloatLayout::Marked(marker)) => {
				let found = self.byte()?;
				if found != marker {
					return Err(CodecError::new(
						format!("expected float marker 0x{marker:02x}, found 0x{found:02x}"),
						self.pos - 1,
					));
				}
			}
			FieldKind::Float(FloatLayout::Plain) => {}
			other => return Err(self.error(format!("field is {other:?}, not a float"))),
		}
		let bytes = self.take(4)?;
		Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
	}

	pub(crate) fn string(&mut self) -> Result<String, CodecError> {
		let start = self.pos;
		let len = self.varint()?;
		let len = usize::try_from(len)
			.map_err(|_| CodecError::new(format!("string length {len} overflows"), start))?;
		let bytes = self.take(len)?;
		String::from_utf8(bytes.to_vec()).map_err(|e| CodecError::new(format!("invalid utf-8: {e}"), start))
	}

	/// Walks the fields of one message until its zero terminator, handing
	/// each to `on_field`. Unknown tags are rejected, and errors raised while
	/// reading a field are annotated with its name.
	pub(crate) fn fields(
		&mut self,
		table: &'static [Field],
		mut on_field: impl FnMut(&mut Self, &'static Field) -> Result<(), CodecError>,
	) -> Result<(), CodecError> {
		loop {
			let start = self.pos;
			let tag = self.uint()?;
			if tag == 0 {
				return Ok(());
			}
			let field = schema::lookup(table, tag)
				.ok_or_else(|| CodecError::new(format!("unknown field tag {tag}"), start))?;
			on_field(self, field).map_err(|e| e.in_field(field.name))?;
		}
	}

	/// Reads an element count followed by that many sub-messages.
	pub(crate) fn array<T>(
		&mut self,
		mut element: impl FnMut(&mut Self) -> Result<T, CodecError>,
	) -> Result<Vec<T>, CodecError> {
		let count = self.uint()? as usize;
		// Every element takes at least its terminator byte.
		if count > self.remaining() {
			return Err(self.error(format!("array of {count} elements exceeds remaining input")));
		}
		let mut items = Vec::with_capacity(count);
		for _ in 0..count {
			items.push(element(self)?);
		}
		Ok(items)
	}
}
