//! Canonical node-change model.
//!
//! These are the typed shapes the codec reads and writes. Every property is
//! optional: an absent value is simply not put on the wire.

use serde::{Deserialize, Serialize};

use crate::guid::Guid;
use crate::schema::{
	BlendMode, EffectType, MessageType, NodePhase, NodeType, PaintType, StackAlign, StackJustify,
	StackMode, StrokeAlign, TextAlignHorizontal,
};

/// RGBA color with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
	pub r: f32,
	pub g: f32,
	pub b: f32,
	pub a: f32,
}

impl Color {
	pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
	pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

	pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Parses `#rgb`, `#rgba`, `#rrggbb`, or `#rrggbbaa`.
	pub fn from_hex(hex: &str) -> Option<Self> {
		let digits = hex.strip_prefix('#')?;
		if !digits.is_ascii() {
			return None;
		}
		let expand = |s: &str| -> Option<f32> {
			let v = u8::from_str_radix(s, 16).ok()?;
			Some(f32::from(v) / 255.0)
		};
		let short = |i: usize| -> Option<f32> {
			let c = &digits[i..i + 1];
			expand(&format!("{c}{c}"))
		};
		match digits.len() {
			3 | 4 => Some(Self {
				r: short(0)?,
				g: short(1)?,
				b: short(2)?,
				a: if digits.len() == 4 { short(3)? } else { 1.0 },
			}),
			6 | 8 => Some(Self {
				r: expand(&digits[0..2])?,
				g: expand(&digits[2..4])?,
				b: expand(&digits[4..6])?,
				a: if digits.len() == 8 { expand(&digits[6..8])? } else { 1.0 },
			}),
			_ => None,
		}
	}

	/// Formats as `#RRGGBB`, appending alpha only when it is not opaque.
	pub fn to_hex(&self) -> String {
		let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
		if c(self.a) == 255 {
			format!("#{:02X}{:02X}{:02X}", c(self.r), c(self.g), c(self.b))
		} else {
			format!("#{:02X}{:02X}{:02X}{:02X}", c(self.r), c(self.g), c(self.b), c(self.a))
		}
	}
}

/// Two-component value used for size, position, and shadow offset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
	pub x: f32,
	pub y: f32,
}

impl Vector {
	pub const fn new(x: f32, y: f32) -> Self {
		Self { x, y }
	}
}

/// Four-sided padding.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Padding {
	pub top: f32,
	pub right: f32,
	pub bottom: f32,
	pub left: f32,
}

impl Padding {
	pub const fn uniform(v: f32) -> Self {
		Self { top: v, right: v, bottom: v, left: v }
	}

	pub const fn symmetric(vertical: f32, horizontal: f32) -> Self {
		Self {
			top: vertical,
			right: horizontal,
			bottom: vertical,
			left: horizontal,
		}
	}
}

/// Per-corner radii, clockwise from top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CornerRadii {
	pub top_left: f32,
	pub top_right: f32,
	pub bottom_right: f32,
	pub bottom_left: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontName {
	pub family: String,
	pub style: String,
}

impl Default for FontName {
	fn default() -> Self {
		Self {
			family: "Inter".to_string(),
			style: "Regular".to_string(),
		}
	}
}

/// One fill or stroke layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paint {
	#[serde(rename = "type")]
	pub paint_type: PaintType,
	pub color: Option<Color>,
	pub opacity: Option<f32>,
	pub visible: Option<bool>,
	pub blend_mode: Option<BlendMode>,
	/// Variable the color is bound to, if any.
	pub color_var: Option<Guid>,
}

impl Paint {
	/// Solid, visible, normally blended paint of `color`.
	pub fn solid(color: Color) -> Self {
		Self {
			paint_type: PaintType::Solid,
			color: Some(color),
			opacity: Some(1.0),
			visible: Some(true),
			blend_mode: Some(BlendMode::Normal),
			color_var: None,
		}
	}

	/// Solid paint bound to a color variable, with `fallback` as the literal color.
	pub fn bound(variable: Guid, fallback: Color) -> Self {
		Self {
			color_var: Some(variable),
			..Self::solid(fallback)
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
	#[serde(rename = "type")]
	pub effect_type: EffectType,
	pub color: Option<Color>,
	pub offset: Option<Vector>,
	pub radius: Option<f32>,
	pub spread: Option<f32>,
	pub visible: Option<bool>,
	pub blend_mode: Option<BlendMode>,
}

/// Link from a node to its parent plus an ordering key among siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentIndex {
	pub guid: Guid,
	pub position: String,
}

impl ParentIndex {
	/// Parent link for the `index`-th authored child of `guid`.
	pub fn at(guid: Guid, index: usize) -> Self {
		Self {
			guid,
			position: position_key(index),
		}
	}
}

const KEY_DIGITS: u8 = b'~' - b'!' + 1;

/// Sibling ordering key whose byte-wise order equals numeric order.
///
/// The index is written in base 94 using the printable range `!..=~`,
/// preceded by a letter giving the digit count (`a` for one digit).
pub fn position_key(index: usize) -> String {
	let mut digits = Vec::new();
	let mut rest = index;
	loop {
		digits.push(b'!' + (rest % usize::from(KEY_DIGITS)) as u8);
		rest /= usize::from(KEY_DIGITS);
		if rest == 0 {
			break;
		}
	}
	let mut key = String::with_capacity(digits.len() + 1);
	key.push(char::from(b'a' + (digits.len() - 1) as u8));
	key.extend(digits.iter().rev().map(|&d| char::from(d)));
	key
}

/// Canonical property set of one node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProperties {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub visible: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub opacity: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub size: Option<Vector>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub position: Option<Vector>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub fills: Vec<Paint>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub strokes: Vec<Paint>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stroke_weight: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stroke_align: Option<StrokeAlign>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub corner_radius: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub corner_radii: Option<CornerRadii>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stack_mode: Option<StackMode>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub item_spacing: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub padding: Option<Padding>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub primary_align: Option<StackJustify>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub counter_align: Option<StackAlign>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub effects: Vec<Effect>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub characters: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub font_size: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub font_name: Option<FontName>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub text_align: Option<TextAlignHorizontal>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub line_height: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub letter_spacing: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub blend_mode: Option<BlendMode>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub clips_content: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub point_count: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub symbol_id: Option<Guid>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rotation: Option<f32>,
}

/// One create/update unit targeted at the remote document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeChange {
	pub guid: Guid,
	pub phase: NodePhase,
	pub parent_index: Option<ParentIndex>,
	#[serde(rename = "type")]
	pub node_type: NodeType,
	pub properties: NodeProperties,
}

impl NodeChange {
	/// A `CREATED` change with no parent and no properties.
	pub fn created(guid: Guid, node_type: NodeType) -> Self {
		Self {
			guid,
			phase: NodePhase::Created,
			parent_index: None,
			node_type,
			properties: NodeProperties::default(),
		}
	}

	pub fn parent_guid(&self) -> Option<Guid> {
		self.parent_index.as_ref().map(|p| p.guid)
	}
}

/// Typed multiplayer message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
	#[serde(rename = "type")]
	pub kind: MessageType,
	pub session_id: Option<u32>,
	pub ack_id: Option<u32>,
	pub node_changes: Vec<NodeChange>,
}

impl Message {
	/// A `NODE_CHANGES` message carrying `changes`.
	pub fn node_changes(session_id: u32, changes: Vec<NodeChange>) -> Self {
		Self {
			kind: MessageType::NodeChanges,
			session_id: Some(session_id),
			ack_id: None,
			node_changes: changes,
		}
	}
}

/// Encoded message ready for framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
	pub kind: MessageType,
	pub payload: Vec<u8>,
}
