//! Field-numbered binary codec for node changes and multiplayer messages.
//!
//! Layout rules:
//! - every value is preceded by its varint field tag;
//! - unsigned integers and enum ordinals are varints;
//! - floats are four little-endian bytes, optionally preceded by the
//!   per-field marker byte from the schema table;
//! - strings are a varint byte length followed by UTF-8;
//! - sub-messages are their fields followed by a zero byte;
//! - arrays are a varint element count followed by that many sub-messages.
//!
//! Top-level node changes and messages are terminated like sub-messages.

mod reader;
mod writer;


pub use reader::read_varint;
pub use writer::write_varint;

use reader::Reader;
use writer::Writer;

use crate::error::CodecError;
use crate::guid::Guid;
use crate::node::{
	Color, CornerRadii, Effect, FontName, Message, NodeChange, NodeProperties, Padding, Paint,
	ParentIndex, Vector, WireMessage,
};
use crate::schema::{
	self, BlendMode, EffectType, MessageType, NodePhase, NodeType, PaintType, StackAlign,
	StackJustify, StackMode, StrokeAlign, TextAlignHorizontal,
};

/// Encodes one node change as a standalone, terminated field sequence.
pub fn encode_node_change(change: &NodeChange) -> Vec<u8> {
	let mut out = Vec::with_capacity(64);
	write_node_change(&mut Writer::new(&mut out, schema::node_change::FIELDS), change);
	out.push(0);
	out
}

/// Decodes a payload produced by [`encode_node_change`].
///
/// The whole input must be consumed; trailing bytes are a schema mismatch.
pub fn decode_node_change(bytes: &[u8]) -> Result<NodeChange, CodecError> {
	let mut reader = Reader::new(bytes);
	let change = read_node_change(&mut reader)?;
	expect_end(&reader)?;
	Ok(change)
}

/// Encodes a multiplayer message.
pub fn encode_message(message: &Message) -> WireMessage {
	use schema::message as f;

	let mut payload = Vec::with_capacity(32 + 64 * message.node_changes.len());
	let mut w = Writer::new(&mut payload, f::FIELDS);
	w.enumeration(f::TYPE, message.kind.ordinal());
	if let Some(session) = message.session_id {
		w.uint(f::SESSION_ID, session);
	}
	if let Some(ack) = message.ack_id {
		w.uint(f::ACK_ID, ack);
	}
	w.array(
		f::NODE_CHANGES,
		schema::node_change::FIELDS,
		&message.node_changes,
		write_node_change,
	);
	payload.push(0);

	WireMessage {
		kind: message.kind,
		payload,
	}
}

/// Decodes a payload produced by [`encode_message`].
pub fn decode_message(bytes: &[u8]) -> Result<Message, CodecError> {
	use schema::message as f;

	let mut reader = Reader::new(bytes);
	let mut kind = None;
	let mut session_id = None;
	let mut ack_id = None;
	let mut node_changes = Vec::new();

	reader.fields(f::FIELDS, |r, field| {
		match *field {
			f::TYPE => kind = Some(r.enumeration(MessageType::from_ordinal, "message type")?),
			f::SESSION_ID => session_id = Some(r.uint()?),
			f::ACK_ID => ack_id = Some(r.uint()?),
			f::NODE_CHANGES => node_changes = r.array(read_node_change)?,
			_ => return Err(r.unhandled(field)),
		}
		Ok(())
	})?;
	expect_end(&reader)?;

	let kind = kind.ok_or_else(|| CodecError::new("message has no type", 0).in_field(f::TYPE.name))?;
	Ok(Message {
		kind,
		session_id,
		ack_id,
		node_changes,
	})
}

fn expect_end(reader: &Reader<'_>) -> Result<(), CodecError> {
	match reader.remaining() {
		0 => Ok(()),
		n => Err(reader.error(format!("{n} trailing bytes after message terminator"))),
	}
}

fn write_guid(w: &mut Writer<'_>, guid: &Guid) {
	w.uint(schema::guid::SESSION_ID, guid.session);
	w.uint(schema::guid::LOCAL_ID, guid.local);
}

fn read_guid(r: &mut Reader<'_>) -> Result<Guid, CodecError> {
	use schema::guid as f;

	let mut session = None;
	let mut local = None;
	r.fields(f::FIELDS, |r, field| {
		match *field {
			f::SESSION_ID => session = Some(r.uint()?),
			f::LOCAL_ID => local = Some(r.uint()?),
			_ => return Err(r.unhandled(field)),
		}
		Ok(())
	})?;
	match (session, local) {
		(Some(session), Some(local)) => Ok(Guid::new(session, local)),
		_ => Err(r.error("guid is missing sessionID or localID")),
	}
}

fn write_color(w: &mut Writer<'_>, color: &Color) {
	use schema::color as f;
	w.float(f::R, color.r);
	w.float(f::G, color.g);
	w.float(f::B, color.b);
	w.float(f::A, color.a);
}

fn read_color(r: &mut Reader<'_>) -> Result<Color, CodecError> {
	use schema::color as f;

	let mut color = Color {
		r: 0.0,
		g: 0.0,
		b: 0.0,
		a: 1.0,
	};
	r.fields(f::FIELDS, |r, field| {
		let value = r.float(field)?;
		match *field {
			f::R => color.r = value,
			f::G => color.g = value,
			f::B => color.b = value,
			f::A => color.a = value,
			_ => return Err(r.unhandled(field)),
		}
		Ok(())
	})?;
	Ok(color)
}

fn write_vector(w: &mut Writer<'_>, v: &Vector) {
	w.float(schema::vector::X, v.x);
	w.float(schema::vector::Y, v.y);
}

fn read_vector(r: &mut Reader<'_>) -> Result<Vector, CodecError> {
	use schema::vector as f;

	let mut v = Vector::default();
	r.fields(f::FIELDS, |r, field| {
		let value = r.float(field)?;
		match *field {
			f::X => v.x = value,
			f::Y => v.y = value,
			_ => return Err(r.unhandled(field)),
		}
		Ok(())
	})?;
	Ok(v)
}

fn write_padding(w: &mut Writer<'_>, p: &Padding) {
	use schema::padding as f;
	w.float(f::TOP, p.top);
	w.float(f::RIGHT, p.right);
	w.float(f::BOTTOM, p.bottom);
	w.float(f::LEFT, p.left);
}

fn read_padding(r: &mut Reader<'_>) -> Result<Padding, CodecError> {
	use schema::padding as f;

	let mut p = Padding::default();
	r.fields(f::FIELDS, |r, field| {
		let value = r.float(field)?;
		match *field {
			f::TOP => p.top = value,
			f::RIGHT => p.right = value,
			f::BOTTOM => p.bottom = value,
			f::LEFT => p.left = value,
			_ => return Err(r.unhandled(field)),
		}
		Ok(())
	})?;
	Ok(p)
}

fn write_corner_radii(w: &mut Writer<'_>, c: &CornerRadii) {
	use schema::corner_radii as f;
	w.float(f::TOP_LEFT, c.top_left);
	w.float(f::TOP_RIGHT, c.top_right);
	w.float(f::BOTTOM_RIGHT, c.bottom_right);
	w.float(f::BOTTOM_LEFT, c.bottom_left);
}

fn read_corner_radii(r: &mut Reader<'_>) -> Result<CornerRadii, CodecError> {
	use schema::corner_radii as f;

	let mut c = CornerRadii::default();
	r.fields(f::FIELDS, |r, field| {
		let value = r.float(field)?;
		match *field {
			f::TOP_LEFT => c.top_left = value,
			f::TOP_RIGHT => c.top_right = value,
			f::BOTTOM_RIGHT => c.bottom_right = value,
			f::BOTTOM_LEFT => c.bottom_left = value,
			_ => return Err(r.unhandled(field)),
		}
		Ok(())
	})?;
	Ok(c)
}

fn write_font_name(w: &mut Writer<'_>, font: &FontName) {
	w.string(schema::font_name::FAMILY, &font.family);
	w.string(schema::font_name::STYLE, &font.style);
}

fn read_font_name(r: &mut Reader<'_>) -> Result<FontName, CodecError> {
	use schema::font_name as f;

	let mut font = FontName {
		family: String::new(),
		style: String::new(),
	};
	r.fields(f::FIELDS, |r, field| {
		match *field {
			f::FAMILY => font.family = r.string()?,
			f::STYLE => font.style = r.string()?,
			_ => return Err(r.unhandled(field)),
		}
		Ok(())
	})?;
	Ok(font)
}

fn write_paint(w: &mut Writer<'_>, paint: &Paint) {
	use schema::paint as f;

	w.enumeration(f::TYPE, paint.paint_type.ordinal());
	if let Some(color) = &paint.color {
		w.message(f::COLOR, schema::color::FIELDS, |w| write_color(w, color));
	}
	if let Some(opacity) = paint.opacity {
		w.float(f::OPACITY, opacity);
	}
	if let Some(visible) = paint.visible {
		w.boolean(f::VISIBLE, visible);
	}
	if let Some(mode) = paint.blend_mode {
		w.enumeration(f::BLEND_MODE, mode.ordinal());
	}
	if let Some(var) = &paint.color_var {
		w.message(f::COLOR_VAR, schema::variable_binding::FIELDS, |w| {
			w.message(schema::variable_binding::VARIABLE_ID, schema::guid::FIELDS, |w| write_guid(w, var));
		});
	}
}

fn read_paint(r: &mut Reader<'_>) -> Result<Paint, CodecError> {
	use schema::paint as f;

	let start = r.offset();
	let mut paint_type = None;
	let mut paint = Paint {
		paint_type: PaintType::Solid,
		color: None,
		opacity: None,
		visible: None,
		blend_mode: None,
		color_var: None,
	};
	r.fields(f::FIELDS, |r, field| {
		match *field {
			f::TYPE => paint_type = Some(r.enumeration(PaintType::from_ordinal, "paint type")?),
			f::COLOR => paint.color = Some(read_color(r)?),
			f::OPACITY => paint.opacity = Some(r.float(field)?),
			f::VISIBLE => paint.visible = Some(r.boolean()?),
			f::BLEND_MODE => paint.blend_mode = Some(r.enumeration(BlendMode::from_ordinal, "blend mode")?),
			f::COLOR_VAR => paint.color_var = Some(read_variable_binding(r)?),
			_ => return Err(r.unhandled(field)),
		}
		Ok(())
	})?;
	paint.paint_type = paint_type.ok_or_else(|| CodecError::new("paint has no type", start).in_field(f::TYPE.name))?;
	Ok(paint)
}

fn read_variable_binding(r: &mut Reader<'_>) -> Result<Guid, CodecError> {
	let start = r.offset();
	let mut guid = None;
	r.fields(schema::variable_binding::FIELDS, |r, field| {
		match *field {
			schema::variable_binding::VARIABLE_ID => guid = Some(read_guid(r)?),
			_ => return Err(r.unhandled(field)),
		}
		Ok(())
	})?;
	guid.ok_or_else(|| CodecError::new("variable binding has no variableID", start))
}

fn write_effect(w: &mut Writer<'_>, effect: &Effect) {
	use schema::effect as f;

	w.enumeration(f::TYPE, effect.effect_type.ordinal());
	if let Some(color) = &effect.color {
		w.message(f::COLOR, schema::color::FIELDS, |w| write_color(w, color));
	}
	if let Some(offset) = &effect.offset {
		w.message(f::OFFSET, schema::vector::FIELDS, |w| write_vector(w, offset));
	}
	if let Some(radius) = effect.radius {
		w.float(f::RADIUS, radius);
	}
	if let Some(spread) = effect.spread {
		w.float(f::SPREAD, spread);
	}
	if let Some(visible) = effect.visible {
		w.boolean(f::VISIBLE, visible);
	}
	if let Some(mode) = effect.blend_mode {
		w.enumeration(f::BLEND_MODE, mode.ordinal());
	}
}

fn read_effect(r: &mut Reader<'_>) -> Result<Effect, CodecError> {
	use schema::effect as f;

	let start = r.offset();
	let mut effect_type = None;
	let mut effect = Effect {
		effect_type: EffectType::DropShadow,
		color: None,
		offset: None,
		radius: None,
		spread: None,
		visible: None,
		blend_mode: None,
	};
	r.fields(f::FIELDS, |r, field| {
		match *field {
			f::TYPE => effect_type = Some(r.enumeration(EffectType::from_ordinal, "effect type")?),
			f::COLOR => effect.color = Some(read_color(r)?),
			f::OFFSET => effect.offset = Some(read_vector(r)?),
			f::RADIUS => effect.radius = Some(r.float(field)?),
			f::SPREAD => effect.spread = Some(r.float(field)?),
			f::VISIBLE => effect.visible = Some(r.boolean()?),
			f::BLEND_MODE => effect.blend_mode = Some(r.enumeration(BlendMode::from_ordinal, "blend mode")?),
			_ => return Err(r.unhandled(field)),
		}
		Ok(())
	})?;
	effect.effect_type =
		effect_type.ok_or_else(|| CodecError::new("effect has no type", start).in_field(f::TYPE.name))?;
	Ok(effect)
}

fn write_parent_index(w: &mut Writer<'_>, parent: &ParentIndex) {
	use schema::parent_index as f;
	w.message(f::GUID, schema::guid::FIELDS, |w| write_guid(w, &parent.guid));
	w.string(f::POSITION, &parent.position);
}

fn read_parent_index(r: &mut Reader<'_>) -> Result<ParentIndex, CodecError> {
	use schema::parent_index as f;

	let start = r.offset();
	let mut guid = None;
	let mut position = String::new();
	r.fields(f::FIELDS, |r, field| {
		match *field {
			f::GUID => guid = Some(read_guid(r)?),
			f::POSITION => position = r.string()?,
			_ => return Err(r.unhandled(field)),
		}
		Ok(())
	})?;
	let guid = guid.ok_or_else(|| CodecError::new("parent index has no guid", start))?;
	Ok(ParentIndex { guid, position })
}

fn write_node_change(w: &mut Writer<'_>, change: &NodeChange) {
	use schema::node_change as f;

	w.message(f::GUID, schema::guid::FIELDS, |w| write_guid(w, &change.guid));
	w.enumeration(f::PHASE, change.phase.ordinal());
	if let Some(parent) = &change.parent_index {
		w.message(f::PARENT_INDEX, schema::parent_index::FIELDS, |w| {
			write_parent_index(w, parent)
		});
	}
	w.enumeration(f::TYPE, change.node_type.ordinal());
	write_properties(w, &change.properties);
}

fn write_properties(w: &mut Writer<'_>, p: &NodeProperties) {
	use schema::node_change as f;

	if let Some(name) = &p.name {
		w.string(f::NAME, name);
	}
	if let Some(visible) = p.visible {
		w.boolean(f::VISIBLE, visible);
	}
	if let Some(opacity) = p.opacity {
		w.float(f::OPACITY, opacity);
	}
	if let Some(size) = &p.size {
		w.message(f::SIZE, schema::vector::FIELDS, |w| write_vector(w, size));
	}
	if let Some(position) = &p.position {
		w.message(f::POSITION, schema::vector::FIELDS, |w| write_vector(w, position));
	}
	w.array(f::FILL_PAINTS, schema::paint::FIELDS, &p.fills, write_paint);
	w.array(f::STROKE_PAINTS, schema::paint::FIELDS, &p.strokes, write_paint);
	if let Some(weight) = p.stroke_weight {
		w.float(f::STROKE_WEIGHT, weight);
	}
	if let Some(align) = p.stroke_align {
		w.enumeration(f::STROKE_ALIGN, align.ordinal());
	}
	if let Some(radius) = p.corner_radius {
		w.float(f::CORNER_RADIUS, radius);
	}
	if let Some(radii) = &p.corner_radii {
		w.message(f::CORNER_RADII, schema::corner_radii::FIELDS, |w| write_corner_radii(w, radii));
	}
	if let Some(mode) = p.stack_mode {
		w.enumeration(f::STACK_MODE, mode.ordinal());
	}
	if let Some(spacing) = p.item_spacing {
		w.float(f::STACK_SPACING, spacing);
	}
	if let Some(padding) = &p.padding {
		w.message(f::STACK_PADDING, schema::padding::FIELDS, |w| write_padding(w, padding));
	}
	if let Some(align) = p.primary_align {
		w.enumeration(f::STACK_PRIMARY_ALIGN, align.ordinal());
	}
	if let Some(align) = p.counter_align {
		w.enumeration(f::STACK_COUNTER_ALIGN, align.ordinal());
	}
	w.array(f::EFFECTS, schema::effect::FIELDS, &p.effects, write_effect);
	if let Some(characters) = &p.characters {
		w.string(f::CHARACTERS, characters);
	}
	if let Some(size) = p.font_size {
		w.float(f::FONT_SIZE, size);
	}
	if let Some(font) = &p.font_name {
		w.message(f::FONT_NAME, schema::font_name::FIELDS, |w| write_font_name(w, font));
	}
	if let Some(align) = p.text_align {
		w.enumeration(f::TEXT_ALIGN, align.ordinal());
	}
	if let Some(line_height) = p.line_height {
		w.float(f::LINE_HEIGHT, line_height);
	}
	if let Some(spacing) = p.letter_spacing {
		w.float(f::LETTER_SPACING, spacing);
	}
	if let Some(mode) = p.blend_mode {
		w.enumeration(f::BLEND_MODE, mode.ordinal());
	}
	if let Some(clips) = p.clips_content {
		w.boolean(f::CLIPS_CONTENT, clips);
	}
	if let Some(count) = p.point_count {
		w.uint(f::COUNT, count);
	}
	if let Some(symbol) = &p.symbol_id {
		w.message(f::SYMBOL_ID, schema::guid::FIELDS, |w| write_guid(w, symbol));
	}
	if let Some(rotation) = p.rotation {
		w.float(f::ROTATION, rotation);
	}
}

fn read_node_change(r: &mut Reader<'_>) -> Result<NodeChange, CodecError> {
	use schema::node_change as f;

	let start = r.offset();
	let mut guid = None;
	let mut phase = NodePhase::Created;
	let mut parent_index = None;
	let mut node_type = None;
	let mut p = NodeProperties::default();

	r.fields(f::FIELDS, |r, field| {
		match *field {
			f::GUID => guid = Some(read_guid(r)?),
			f::PHASE => phase = r.enumeration(NodePhase::from_ordinal, "node phase")?,
			f::PARENT_INDEX => parent_index = Some(read_parent_index(r)?),
			f::TYPE => node_type = Some(r.enumeration(NodeType::from_ordinal, "node type")?),
			f::NAME => p.name = Some(r.string()?),
			f::VISIBLE => p.visible = Some(r.boolean()?),
			f::OPACITY => p.opacity = Some(r.float(field)?),
			f::SIZE => p.size = Some(read_vector(r)?),
			f::POSITION => p.position = Some(read_vector(r)?),
			f::FILL_PAINTS => p.fills = r.array(read_paint)?,
			f::STROKE_PAINTS => p.strokes = r.array(read_paint)?,
			f::STROKE_WEIGHT => p.stroke_weight = Some(r.float(field)?),
			f::STROKE_ALIGN => p.stroke_align = Some(r.enumeration(StrokeAlign::from_ordinal, "stroke align")?),
			f::CORNER_RADIUS => p.corner_radius = Some(r.float(field)?),
			f::CORNER_RADII => p.corner_radii = Some(read_corner_radii(r)?),
			f::STACK_MODE => p.stack_mode = Some(r.enumeration(StackMode::from_ordinal, "stack mode")?),
			f::STACK_SPACING => p.item_spacing = Some(r.float(field)?),
			f::STACK_PADDING => p.padding = Some(read_padding(r)?),
			f::STACK_PRIMARY_ALIGN => p.primary_align = Some(r.enumeration(StackJustify::from_ordinal, "primary align")?),
			f::STACK_COUNTER_ALIGN => p.counter_align = Some(r.enumeration(StackAlign::from_ordinal, "counter align")?),
			f::EFFECTS => p.effects = r.array(read_effect)?,
			f::CHARACTERS => p.characters = Some(r.string()?),
			f::FONT_SIZE => p.font_size = Some(r.float(field)?),
			f::FONT_NAME => p.font_name = Some(read_font_name(r)?),
			f::TEXT_ALIGN => p.text_align = Some(r.enumeration(TextAlignHorizontal::from_ordinal, "text align")?),
			f::LINE_HEIGHT => p.line_height = Some(r.float(field)?),
			f::LETTER_SPACING => p.letter_spacing = Some(r.float(field)?),
			f::BLEND_MODE => p.blend_mode = Some(r.enumeration(BlendMode::from_ordinal, "blend mode")?),
			f::CLIPS_CONTENT => p.clips_content = Some(r.boolean()?),
			f::COUNT => p.point_count = Some(r.uint()?),
			f::SYMBOL_ID => p.symbol_id = Some(read_guid(r)?),
			f::ROTATION => p.rotation = Some(r.float(field)?),
			_ => return Err(r.unhandled(field)),
		}
		Ok(())
	})?;

	let guid = guid.ok_or_else(|| CodecError::new("node change has no guid", start).in_field(f::GUID.name))?;
	let node_type =
		node_type.ok_or_else(|| CodecError::new("node change has no type", start).in_field(f::TYPE.name))?;
	Ok(NodeChange {
		guid,
		phase,
		parent_index,
		node_type,
		properties: p,
	})
}
