use crate::schema::{self, Field, FieldKind, FloatLayout};

/// Appends `value` as a little-endian base-128 varint.
pub fn write_varint(out: &mut Vec<u8>, mut value: u64) {
	loop {
		let byte = (value & 0x7f) as u8;
		value >>= 7;
		if value == 0 {
			out.push(byte);
			return;
		}
		out.push(byte | 0x80);
	}
}

/// Field writer bound to one message table.
///
/// Every tag goes through [`Writer::tag`], which in debug builds asserts the
/// field belongs to the table and has the expected value shape. Emitting a
/// field the schema does not know is a local bug, so it fails loudly during
/// development instead of producing bytes the remote decoder would misread.
pub(crate) struct Writer<'a> {
	out: &'a mut Vec<u8>,
	table: &'static [Field],
}

impl<'a> Writer<'a> {
	pub(crate) fn new(out: &'a mut Vec<u8>, table: &'static [Field]) -> Self {
		Self { out, table }
	}

	fn tag(&mut self, field: Field) {
		debug_assert!(
			schema::lookup(self.table, field.number) == Some(&field),
			"field '{}' (#{}) is not part of this message",
			field.name,
			field.number
		);
		write_varint(self.out, u64::from(field.number));
	}

	pub(crate) fn uint(&mut self, field: Field, value: u32) {
		debug_assert_eq!(field.kind, FieldKind::Uint, "'{}'", field.name);
		self.tag(field);
		write_varint(self.out, u64::from(value));
	}

	pub(crate) fn boolean(&mut self, field: Field, value: bool) {
		debug_assert_eq!(field.kind, FieldKind::Bool, "'{}'", field.name);
		self.tag(field);
		self.out.push(u8::from(value));
	}

	pub(crate) fn enumeration(&mut self, field: Field, ordinal: u32) {
		debug_assert_eq!(field.kind, FieldKind::Enum, "'{}'", field.name);
		self.tag(field);
		write_varint(self.out, u64::from(ordinal));
	}

	pub(crate) fn float(&mut self, field: Field, value: f32) {
		self.tag(field);
		match field.kind {
			FieldKind::Float(FloatLayout::Marked(marker)) => self.out.push(marker),
			FieldKind::Float(FloatLayout::Plain) => {}
			other => debug_assert!(false, "'{}' is {other:?}, not a float", field.name),
		}
		self.out.extend_from_slice(&value.to_le_bytes());
	}

	pub(crate) fn string(&mut self, field: Field, value: &str) {
		debug_assert_eq!(field.kind, FieldKind::String, "'{}'", field.name);
		self.tag(field);
		write_varint(self.out, value.len() as u64);
		self.out.extend_from_slice(value.as_bytes());
	}

	/// Writes a nested sub-message closed by a zero byte.
	pub(crate) fn message(
		&mut self,
		field: Field,
		table: &'static [Field],
		body: impl FnOnce(&mut Writer<'_>),
	) {
		debug_assert_eq!(field.kind, FieldKind::Message, "'{}'", field.name);
		self.tag(field);
		body(&mut Writer::new(&mut *self.out, table));
		self.out.push(0);
	}

	/// Writes a counted array of sub-messages. Empty arrays are omitted.
	pub(crate) fn array<T>(
		&mut self,
		field: Field,
		table: &'static [Field],
		items: &[T],
		mut body: impl FnMut(&mut Writer<'_>, &T),
	) {
		debug_assert_eq!(field.kind, FieldKind::Array, "'{}'", field.name);
		if items.is_empty() {
			return;
		}
		self.tag(field);
		write_varint(self.out, items.len() as u64);
		for item in items {
			body(&mut Writer::new(&mut *self.out, table), item);
			self.out.push(0);
		}
	}
}
