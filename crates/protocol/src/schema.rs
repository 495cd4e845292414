//! Constant tables for the multiplayer wire schema.
//!
//! The remote decoder is schema-driven and not self-describing beyond field
//! tags, so field numbers, enum ordinals, and the per-field float layout are
//! all part of the contract. They are written out here as named constants and
//! never derived from payload shape.

use serde::{Deserialize, Serialize};

/// Multiplayer protocol version this table was captured against.
pub const PROTOCOL_VERSION: u32 = 151;

/// Byte observed in front of some float fields in captured traffic.
pub const FLOAT_MARKER: u8 = 0x7f;

macro_rules! wire_enum {
	(
		$(#[$meta:meta])*
		pub enum $name:ident {
			$( $(#[$vmeta:meta])* $variant:ident = $ordinal:literal => $wire:literal, )+
		}
	) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
		pub enum $name {
			$( $(#[$vmeta])* #[serde(rename = $wire)] $variant, )+
		}

		impl $name {
			/// Every variant, in ordinal order.
			pub const ALL: &'static [$name] = &[$($name::$variant),+];

			/// Ordinal written on the wire.
			pub const fn ordinal(self) -> u32 {
				match self {
					$($name::$variant => $ordinal,)+
				}
			}

			/// Looks up a variant by wire ordinal.
			pub const fn from_ordinal(value: u32) -> Option<Self> {
				match value {
					$($ordinal => Some($name::$variant),)+
					_ => None,
				}
			}

			/// Upper-case schema name.
			pub const fn wire_name(self) -> &'static str {
				match self {
					$($name::$variant => $wire,)+
				}
			}
		}
	};
}

wire_enum! {
	/// Top-level message kinds.
	pub enum MessageType {
		JoinStart = 0 => "JOIN_START",
		NodeChanges = 1 => "NODE_CHANGES",
		UserChanges = 2 => "USER_CHANGES",
		JoinEnd = 3 => "JOIN_END",
		Signal = 4 => "SIGNAL",
		Style = 5 => "STYLE",
		StyleSet = 6 => "STYLE_SET",
		JoinStartSkipReload = 7 => "JOIN_START_SKIP_RELOAD",
		NotifyShouldUpgrade = 8 => "NOTIFY_SHOULD_UPGRADE",
		UpgradeDone = 9 => "UPGRADE_DONE",
		UpgradeRefresh = 10 => "UPGRADE_REFRESH",
		SceneGraphQuery = 11 => "SCENE_GRAPH_QUERY",
		SceneGraphReply = 12 => "SCENE_GRAPH_REPLY",
		Diff = 13 => "DIFF",
		ClientBroadcast = 14 => "CLIENT_BROADCAST",
	}
}

wire_enum! {
	/// Scene node kinds.
	pub enum NodeType {
		None = 0 => "NONE",
		Document = 1 => "DOCUMENT",
		Canvas = 2 => "CANVAS",
		Group = 3 => "GROUP",
		Frame = 4 => "FRAME",
		BooleanOperation = 5 => "BOOLEAN_OPERATION",
		Vector = 6 => "VECTOR",
		Star = 7 => "STAR",
		Line = 8 => "LINE",
		Ellipse = 9 => "ELLIPSE",
		Rectangle = 10 => "RECTANGLE",
		RegularPolygon = 11 => "REGULAR_POLYGON",
		RoundedRectangle = 12 => "ROUNDED_RECTANGLE",
		Text = 13 => "TEXT",
		Slice = 14 => "SLICE",
		Symbol = 15 => "SYMBOL",
		Instance = 16 => "INSTANCE",
		Sticky = 17 => "STICKY",
		ShapeWithText = 18 => "SHAPE_WITH_TEXT",
		Connector = 19 => "CONNECTOR",
		CodeBlock = 20 => "CODE_BLOCK",
		Widget = 21 => "WIDGET",
		Stamp = 22 => "STAMP",
		Media = 23 => "MEDIA",
		Highlight = 24 => "HIGHLIGHT",
		Section = 25 => "SECTION",
		SectionOverlay = 26 => "SECTION_OVERLAY",
		WashiTape = 27 => "WASHI_TAPE",
		Variable = 28 => "VARIABLE",
	}
}

wire_enum! {
	/// Whether a change creates or removes its node.
	pub enum NodePhase {
		Created = 0 => "CREATED",
		Removed = 1 => "REMOVED",
	}
}

wire_enum! {
	pub enum BlendMode {
		PassThrough = 0 => "PASS_THROUGH",
		Normal = 1 => "NORMAL",
		Darken = 2 => "DARKEN",
		Multiply = 3 => "MULTIPLY",
		LinearBurn = 4 => "LINEAR_BURN",
		ColorBurn = 5 => "COLOR_BURN",
		Lighten = 6 => "LIGHTEN",
		Screen = 7 => "SCREEN",
		LinearDodge = 8 => "LINEAR_DODGE",
		ColorDodge = 9 => "COLOR_DODGE",
		Overlay = 10 => "OVERLAY",
		SoftLight = 11 => "SOFT_LIGHT",
		HardLight = 12 => "HARD_LIGHT",
		Difference = 13 => "DIFFERENCE",
		Exclusion = 14 => "EXCLUSION",
		Hue = 15 => "HUE",
		Saturation = 16 => "SATURATION",
		Color = 17 => "COLOR",
		Luminosity = 18 => "LUMINOSITY",
	}
}

wire_enum! {
	pub enum PaintType {
		Solid = 0 => "SOLID",
		GradientLinear = 1 => "GRADIENT_LINEAR",
		GradientRadial = 2 => "GRADIENT_RADIAL",
		GradientAngular = 3 => "GRADIENT_ANGULAR",
		GradientDiamond = 4 => "GRADIENT_DIAMOND",
		Image = 5 => "IMAGE",
		Emoji = 6 => "EMOJI",
		Video = 7 => "VIDEO",
	}
}

wire_enum! {
	/// Auto-layout direction.
	pub enum StackMode {
		None = 0 => "NONE",
		Horizontal = 1 => "HORIZONTAL",
		Vertical = 2 => "VERTICAL",
	}
}

wire_enum! {
	/// Primary-axis distribution of auto-layout children.
	pub enum StackJustify {
		Min = 0 => "MIN",
		Center = 1 => "CENTER",
		Max = 2 => "MAX",
		SpaceEvenly = 3 => "SPACE_EVENLY",
		SpaceBetween = 4 => "SPACE_BETWEEN",
	}
}

wire_enum! {
	/// Counter-axis alignment of auto-layout children.
	pub enum StackAlign {
		Min = 0 => "MIN",
		Center = 1 => "CENTER",
		Max = 2 => "MAX",
		Baseline = 3 => "BASELINE",
	}
}

wire_enum! {
	pub enum EffectType {
		InnerShadow = 0 => "INNER_SHADOW",
		DropShadow = 1 => "DROP_SHADOW",
		ForegroundBlur = 2 => "FOREGROUND_BLUR",
		BackgroundBlur = 3 => "BACKGROUND_BLUR",
	}
}

wire_enum! {
	pub enum StrokeAlign {
		Center = 0 => "CENTER",
		Inside = 1 => "INSIDE",
		Outside = 2 => "OUTSIDE",
	}
}

wire_enum! {
	pub enum TextAlignHorizontal {
		Left = 0 => "LEFT",
		Center = 1 => "CENTER",
		Right = 2 => "RIGHT",
		Justified = 3 => "JUSTIFIED",
	}
}

/// How a float field is laid out after its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatLayout {
	/// Four little-endian IEEE-754 bytes.
	Plain,
	/// A fixed marker byte followed by the four float bytes.
	Marked(u8),
}

/// Value shape that follows a field tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
	Uint,
	Bool,
	Enum,
	Float(FloatLayout),
	String,
	/// Nested fields closed by a zero byte.
	Message,
	/// Element count followed by that many sub-messages.
	Array,
}

/// One numbered field of a schema message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
	pub number: u32,
	pub name: &'static str,
	pub kind: FieldKind,
}

impl Field {
	const fn new(number: u32, name: &'static str, kind: FieldKind) -> Self {
		Self { number, name, kind }
	}
}

/// Finds the field with tag `number` in a message table.
pub fn lookup(fields: &'static [Field], number: u32) -> Option<&'static Field> {
	fields.iter().find(|f| f.number == number)
}

const PLAIN: FieldKind = FieldKind::Float(FloatLayout::Plain);
const MARKED: FieldKind = FieldKind::Float(FloatLayout::Marked(FLOAT_MARKER));

/// Envelope carrying a batch of node changes.
pub mod message {
	use super::{Field, FieldKind};

	pub const TYPE: Field = Field::new(1, "type", FieldKind::Enum);
	pub const SESSION_ID: Field = Field::new(2, "sessionID", FieldKind::Uint);
	pub const ACK_ID: Field = Field::new(3, "ackID", FieldKind::Uint);
	pub const NODE_CHANGES: Field = Field::new(4, "nodeChanges", FieldKind::Array);

	pub const FIELDS: &[Field] = &[TYPE, SESSION_ID, ACK_ID, NODE_CHANGES];
}

pub mod guid {
	use super::{Field, FieldKind};

	pub const SESSION_ID: Field = Field::new(1, "sessionID", FieldKind::Uint);
	pub const LOCAL_ID: Field = Field::new(2, "localID", FieldKind::Uint);

	pub const FIELDS: &[Field] = &[SESSION_ID, LOCAL_ID];
}

pub mod parent_index {
	use super::{Field, FieldKind};

	pub const GUID: Field = Field::new(1, "guid", FieldKind::Message);
	pub const POSITION: Field = Field::new(2, "position", FieldKind::String);

	pub const FIELDS: &[Field] = &[GUID, POSITION];
}

pub mod color {
	use super::{Field, PLAIN};

	pub const R: Field = Field::new(1, "r", PLAIN);
	pub const G: Field = Field::new(2, "g", PLAIN);
	pub const B: Field = Field::new(3, "b", PLAIN);
	pub const A: Field = Field::new(4, "a", PLAIN);

	pub const FIELDS: &[Field] = &[R, G, B, A];
}

pub mod vector {
	use super::{Field, PLAIN};

	pub const X: Field = Field::new(1, "x", PLAIN);
	pub const Y: Field = Field::new(2, "y", PLAIN);

	pub const FIELDS: &[Field] = &[X, Y];
}

pub mod padding {
	use super::{Field, PLAIN};

	pub const TOP: Field = Field::new(1, "top", PLAIN);
	pub const RIGHT: Field = Field::new(2, "right", PLAIN);
	pub const BOTTOM: Field = Field::new(3, "bottom", PLAIN);
	pub const LEFT: Field = Field::new(4, "left", PLAIN);

	pub const FIELDS: &[Field] = &[TOP, RIGHT, BOTTOM, LEFT];
}

pub mod corner_radii {
	use super::{Field, PLAIN};

	pub const TOP_LEFT: Field = Field::new(1, "topLeft", PLAIN);
	pub const TOP_RIGHT: Field = Field::new(2, "topRight", PLAIN);
	pub const BOTTOM_RIGHT: Field = Field::new(3, "bottomRight", PLAIN);
	pub const BOTTOM_LEFT: Field = Field::new(4, "bottomLeft", PLAIN);

	pub const FIELDS: &[Field] = &[TOP_LEFT, TOP_RIGHT, BOTTOM_RIGHT, BOTTOM_LEFT];
}

pub mod font_name {
	use super::{Field, FieldKind};

	pub const FAMILY: Field = Field::new(1, "family", FieldKind::String);
	pub const STYLE: Field = Field::new(2, "style", FieldKind::String);

	pub const FIELDS: &[Field] = &[FAMILY, STYLE];
}

/// Binding of a paint color to a document variable.
pub mod variable_binding {
	use super::{Field, FieldKind};

	pub const VARIABLE_ID: Field = Field::new(1, "variableID", FieldKind::Message);

	pub const FIELDS: &[Field] = &[VARIABLE_ID];
}

pub mod paint {
	use super::{Field, FieldKind, MARKED};

	pub const TYPE: Field = Field::new(1, "type", FieldKind::Enum);
	pub const COLOR: Field = Field::new(2, "color", FieldKind::Message);
	pub const OPACITY: Field = Field::new(3, "opacity", MARKED);
	pub const VISIBLE: Field = Field::new(4, "visible", FieldKind::Bool);
	pub const BLEND_MODE: Field = Field::new(5, "blendMode", FieldKind::Enum);
	pub const COLOR_VAR: Field = Field::new(21, "colorVar", FieldKind::Message);

	pub const FIELDS: &[Field] = &[TYPE, COLOR, OPACITY, VISIBLE, BLEND_MODE, COLOR_VAR];
}

pub mod effect {
	use super::{Field, FieldKind, PLAIN};

	pub const TYPE: Field = Field::new(1, "type", FieldKind::Enum);
	pub const COLOR: Field = Field::new(2, "color", FieldKind::Message);
	pub const OFFSET: Field = Field::new(3, "offset", FieldKind::Message);
	pub const RADIUS: Field = Field::new(4, "radius", PLAIN);
	pub const SPREAD: Field = Field::new(5, "spread", PLAIN);
	pub const VISIBLE: Field = Field::new(6, "visible", FieldKind::Bool);
	pub const BLEND_MODE: Field = Field::new(7, "blendMode", FieldKind::Enum);

	pub const FIELDS: &[Field] = &[TYPE, COLOR, OFFSET, RADIUS, SPREAD, VISIBLE, BLEND_MODE];
}

pub mod node_change {
	use super::{Field, FieldKind, MARKED, PLAIN};

	pub const GUID: Field = Field::new(1, "guid", FieldKind::Message);
	pub const PHASE: Field = Field::new(2, "phase", FieldKind::Enum);
	pub const PARENT_INDEX: Field = Field::new(3, "parentIndex", FieldKind::Message);
	pub const TYPE: Field = Field::new(4, "type", FieldKind::Enum);
	pub const NAME: Field = Field::new(5, "name", FieldKind::String);
	pub const VISIBLE: Field = Field::new(6, "visible", FieldKind::Bool);
	pub const OPACITY: Field = Field::new(7, "opacity", MARKED);
	pub const SIZE: Field = Field::new(8, "size", FieldKind::Message);
	pub const POSITION: Field = Field::new(9, "position", FieldKind::Message);
	pub const FILL_PAINTS: Field = Field::new(10, "fillPaints", FieldKind::Array);
	pub const STROKE_PAINTS: Field = Field::new(11, "strokePaints", FieldKind::Array);
	pub const STROKE_WEIGHT: Field = Field::new(12, "strokeWeight", PLAIN);
	pub const STROKE_ALIGN: Field = Field::new(13, "strokeAlign", FieldKind::Enum);
	pub const CORNER_RADIUS: Field = Field::new(14, "cornerRadius", PLAIN);
	pub const CORNER_RADII: Field = Field::new(15, "rectangleCornerRadii", FieldKind::Message);
	pub const STACK_MODE: Field = Field::new(16, "stackMode", FieldKind::Enum);
	pub const STACK_SPACING: Field = Field::new(17, "stackSpacing", PLAIN);
	pub const STACK_PADDING: Field = Field::new(18, "stackPadding", FieldKind::Message);
	pub const STACK_PRIMARY_ALIGN: Field = Field::new(19, "stackPrimaryAlignItems", FieldKind::Enum);
	pub const STACK_COUNTER_ALIGN: Field = Field::new(20, "stackCounterAlignItems", FieldKind::Enum);
	pub const EFFECTS: Field = Field::new(21, "effects", FieldKind::Array);
	pub const CHARACTERS: Field = Field::new(22, "characters", FieldKind::String);
	pub const FONT_SIZE: Field = Field::new(23, "fontSize", PLAIN);
	pub const FONT_NAME: Field = Field::new(24, "fontName", FieldKind::Message);
	pub const TEXT_ALIGN: Field = Field::new(25, "textAlignHorizontal", FieldKind::Enum);
	pub const LINE_HEIGHT: Field = Field::new(26, "lineHeight", PLAIN);
	pub const LETTER_SPACING: Field = Field::new(27, "letterSpacing", PLAIN);
	pub const BLEND_MODE: Field = Field::new(28, "blendMode", FieldKind::Enum);
	pub const CLIPS_CONTENT: Field = Field::new(29, "clipsContent", FieldKind::Bool);
	pub const COUNT: Field = Field::new(30, "count", FieldKind::Uint);
	pub const SYMBOL_ID: Field = Field::new(31, "symbolID", FieldKind::Message);
	pub const ROTATION: Field = Field::new(32, "rotation", PLAIN);

	pub const FIELDS: &[Field] = &[
		GUID,
		PHASE,
		PARENT_INDEX,
		TYPE,
		NAME,
		VISIBLE,
		OPACITY,
		SIZE,
		POSITION,
		FILL_PAINTS,
		STROKE_PAINTS,
		STROKE_WEIGHT,
		STROKE_ALIGN,
		CORNER_RADIUS,
		CORNER_RADII,
		STACK_MODE,
		STACK_SPACING,
		STACK_PADDING,
		STACK_PRIMARY_ALIGN,
		STACK_COUNTER_ALIGN,
		EFFECTS,
		CHARACTERS,
		FONT_SIZE,
		FONT_NAME,
		TEXT_ALIGN,
		LINE_HEIGHT,
		LETTER_SPACING,
		BLEND_MODE,
		CLIPS_CONTENT,
		COUNT,
		SYMBOL_ID,
		ROTATION,
	];
}
