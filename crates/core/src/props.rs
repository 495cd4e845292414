//! Shorthand-to-canonical property translation.
//!
//! Every authored key is looked up in one fixed [`RULES`] table. A rule names
//! the keys it accepts, which element kinds may use them, and how the value
//! lands in [`NodeProperties`]. Keys with no rule are rejected, so a typo
//! fails the render instead of silently producing a different node.
//!
//! Keys inside a `style` object are read first; top-level keys override them.

use fu_protocol::{
	BlendMode, Color, CornerRadii, Effect, EffectType, FontName, Guid, NodeProperties, Padding, Paint,
	StackAlign, StackJustify, StackMode, StrokeAlign, TextAlignHorizontal, Vector,
};
use serde_json::Value;

use crate::element::{Intrinsic, Props};
use crate::error::{Error, Result};
use crate::variables::VariableMap;

/// Key of the object form that references a color variable by name:
/// `{"$var": "Colors/Gray/50"}`.
pub const VARIABLE_KEY: &str = "$var";

/// Shadow color used when only geometry is given.
const DEFAULT_SHADOW: Color = Color {
	r: 0.0,
	g: 0.0,
	b: 0.0,
	a: 0.25,
};

/// Element kinds a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
	Any,
	Text,
	/// Frames, components, and sections.
	Container,
	/// Anything that is not text.
	Shape,
	Polygonal,
	Instance,
}

impl Scope {
	fn allows(self, kind: Intrinsic) -> bool {
		match self {
			Scope::Any => true,
			Scope::Text => kind.is_text(),
			Scope::Container => kind.is_container(),
			Scope::Shape => !kind.is_text(),
			Scope::Polygonal => matches!(kind, Intrinsic::Star | Intrinsic::Polygon),
			Scope::Instance => kind == Intrinsic::Instance,
		}
	}
}

type Apply = fn(&mut Translation<'_>, &str, &Value) -> Result<()>;

struct Rule {
	keys: &'static [&'static str],
	scope: Scope,
	apply: Apply,
}

const fn rule(keys: &'static [&'static str], scope: Scope, apply: Apply) -> Rule {
	Rule { keys, scope, apply }
}

static RULES: &[Rule] = &[
	// Identity and geometry
	rule(&["name"], Scope::Any, |t, k, v| {
		t.out.name = Some(t.string(k, v)?);
		Ok(())
	}),
	rule(&["visible"], Scope::Any, |t, k, v| {
		t.out.visible = Some(t.boolean(k, v)?);
		Ok(())
	}),
	rule(&["opacity"], Scope::Any, |t, k, v| {
		t.out.opacity = Some(t.unit(k, v)?);
		Ok(())
	}),
	rule(&["x"], Scope::Any, |t, k, v| {
		t.x = Some(t.number(k, v)?);
		Ok(())
	}),
	rule(&["y"], Scope::Any, |t, k, v| {
		t.y = Some(t.number(k, v)?);
		Ok(())
	}),
	rule(&["width", "w"], Scope::Any, |t, k, v| {
		t.width = Some(t.number(k, v)?);
		Ok(())
	}),
	rule(&["height", "h"], Scope::Any, |t, k, v| {
		t.height = Some(t.number(k, v)?);
		Ok(())
	}),
	rule(&["rotation"], Scope::Any, |t, k, v| {
		t.out.rotation = Some(t.number(k, v)?);
		Ok(())
	}),
	rule(&["blendMode"], Scope::Any, |t, k, v| {
		t.out.blend_mode = Some(t.wire_enum(k, v, BlendMode::ALL, |m| m.wire_name())?);
		Ok(())
	}),
	// Auto layout
	rule(&["layout", "flexDirection", "direction", "layoutMode"], Scope::Container, |t, k, v| {
		let mode = t.keyword(k, v, &[
			("row", StackMode::Horizontal),
			("horizontal", StackMode::Horizontal),
			("col", StackMode::Vertical),
			("column", StackMode::Vertical),
			("vertical", StackMode::Vertical),
			("none", StackMode::None),
		])?;
		t.out.stack_mode = Some(mode);
		Ok(())
	}),
	rule(&["gap", "itemSpacing"], Scope::Container, |t, k, v| {
		t.out.item_spacing = Some(t.number(k, v)?);
		Ok(())
	}),
	rule(&["padding"], Scope::Container, |t, k, v| {
		t.padding = Some(t.padding(k, v)?);
		Ok(())
	}),
	rule(&["paddingTop", "pt"], Scope::Container, |t, k, v| {
		t.padding_side(k, v, |p, n| p.top = n)
	}),
	rule(&["paddingRight", "pr"], Scope::Container, |t, k, v| {
		t.padding_side(k, v, |p, n| p.right = n)
	}),
	rule(&["paddingBottom", "pb"], Scope::Container, |t, k, v| {
		t.padding_side(k, v, |p, n| p.bottom = n)
	}),
	rule(&["paddingLeft", "pl"], Scope::Container, |t, k, v| {
		t.padding_side(k, v, |p, n| p.left = n)
	}),
	rule(&["paddingHorizontal", "px"], Scope::Container, |t, k, v| {
		t.padding_side(k, v, |p, n| {
			p.left = n;
			p.right = n;
		})
	}),
	rule(&["paddingVertical", "py"], Scope::Container, |t, k, v| {
		t.padding_side(k, v, |p, n| {
			p.top = n;
			p.bottom = n;
		})
	}),
	rule(&["justifyContent", "justify", "primaryAxisAlign"], Scope::Container, |t, k, v| {
		let align = t.keyword(k, v, &[
			("flex-start", StackJustify::Min),
			("start", StackJustify::Min),
			("min", StackJustify::Min),
			("center", StackJustify::Center),
			("flex-end", StackJustify::Max),
			("end", StackJustify::Max),
			("max", StackJustify::Max),
			("space-between", StackJustify::SpaceBetween),
			("space-evenly", StackJustify::SpaceEvenly),
		])?;
		t.out.primary_align = Some(align);
		Ok(())
	}),
	rule(&["alignItems", "items", "counterAxisAlign"], Scope::Container, |t, k, v| {
		let align = t.keyword(k, v, &[
			("flex-start", StackAlign::Min),
			("start", StackAlign::Min),
			("min", StackAlign::Min),
			("stretch", StackAlign::Min),
			("center", StackAlign::Center),
			("flex-end", StackAlign::Max),
			("end", StackAlign::Max),
			("max", StackAlign::Max),
			("baseline", StackAlign::Baseline),
		])?;
		t.out.counter_align = Some(align);
		Ok(())
	}),
	rule(&["clipsContent"], Scope::Container, |t, k, v| {
		t.out.clips_content = Some(t.boolean(k, v)?);
		Ok(())
	}),
	rule(&["overflow"], Scope::Container, |t, k, v| {
		let clip = t.keyword(k, v, &[("hidden", true), ("visible", false)])?;
		t.out.clips_content = Some(clip);
		Ok(())
	}),
	// Fill and stroke
	rule(&["fill", "bg", "backgroundColor", "background"], Scope::Any, |t, k, v| {
		let paint = t.paint(k, v)?;
		t.out.fills = vec![paint];
		Ok(())
	}),
	rule(&["color"], Scope::Text, |t, k, v| {
		let paint = t.paint(k, v)?;
		t.out.fills = vec![paint];
		Ok(())
	}),
	rule(&["stroke", "border", "borderColor"], Scope::Any, |t, k, v| {
		let paint = t.paint(k, v)?;
		t.out.strokes = vec![paint];
		Ok(())
	}),
	rule(&["strokeWeight", "strokeWidth", "borderWidth"], Scope::Any, |t, k, v| {
		t.out.stroke_weight = Some(t.number(k, v)?);
		Ok(())
	}),
	rule(&["strokeAlign"], Scope::Any, |t, k, v| {
		t.out.stroke_align = Some(t.wire_enum(k, v, StrokeAlign::ALL, |a| a.wire_name())?);
		Ok(())
	}),
	// Corners
	rule(&["radius", "r", "borderRadius", "cornerRadius"], Scope::Shape, |t, k, v| {
		t.out.corner_radius = Some(t.number(k, v)?);
		Ok(())
	}),
	rule(&["borderTopLeftRadius", "topLeftRadius"], Scope::Shape, |t, k, v| {
		t.corner(k, v, |c, n| c.top_left = Some(n))
	}),
	rule(&["borderTopRightRadius", "topRightRadius"], Scope::Shape, |t, k, v| {
		t.corner(k, v, |c, n| c.top_right = Some(n))
	}),
	rule(&["borderBottomRightRadius", "bottomRightRadius"], Scope::Shape, |t, k, v| {
		t.corner(k, v, |c, n| c.bottom_right = Some(n))
	}),
	rule(&["borderBottomLeftRadius", "bottomLeftRadius"], Scope::Shape, |t, k, v| {
		t.corner(k, v, |c, n| c.bottom_left = Some(n))
	}),
	// Shadow
	rule(&["shadowColor"], Scope::Any, |t, k, v| {
		t.shadow.color = Some(t.color(k, v)?);
		Ok(())
	}),
	rule(&["shadowOffset"], Scope::Any, |t, k, v| {
		let object = v.as_object().ok_or_else(|| t.invalid(k, "expected {width, height}"))?;
		let axis = |name: &str| -> Result<f32> {
			object.get(name).map_or(Ok(0.0), |n| t.number(k, n))
		};
		t.shadow.offset = Some(Vector::new(axis("width")?, axis("height")?));
		Ok(())
	}),
	rule(&["shadowRadius", "shadowBlur"], Scope::Any, |t, k, v| {
		t.shadow.radius = Some(t.number(k, v)?);
		Ok(())
	}),
	rule(&["shadowSpread"], Scope::Any, |t, k, v| {
		t.shadow.spread = Some(t.number(k, v)?);
		Ok(())
	}),
	rule(&["shadowOpacity"], Scope::Any, |t, k, v| {
		t.shadow.opacity = Some(t.unit(k, v)?);
		Ok(())
	}),
	// Typography
	rule(&["characters", "text"], Scope::Text, |t, k, v| {
		t.out.characters = Some(t.string(k, v)?);
		Ok(())
	}),
	rule(&["fontSize", "size"], Scope::Text, |t, k, v| {
		t.out.font_size = Some(t.number(k, v)?);
		Ok(())
	}),
	rule(&["fontFamily", "font"], Scope::Text, |t, k, v| {
		t.font.family = Some(t.string(k, v)?);
		Ok(())
	}),
	rule(&["fontWeight", "weight"], Scope::Text, |t, k, v| {
		t.font.weight = Some(t.weight(k, v)?);
		Ok(())
	}),
	rule(&["fontStyle"], Scope::Text, |t, k, v| {
		let style = t.string(k, v)?;
		match style.to_ascii_lowercase().as_str() {
			"italic" => t.font.italic = true,
			"normal" => t.font.italic = false,
			_ => t.font.style = Some(style),
		}
		Ok(())
	}),
	rule(&["italic"], Scope::Text, |t, k, v| {
		t.font.italic = t.boolean(k, v)?;
		Ok(())
	}),
	rule(&["bold"], Scope::Text, |t, k, v| {
		if t.boolean(k, v)? {
			t.font.weight = Some(700);
		}
		Ok(())
	}),
	rule(&["textAlign", "textAlignHorizontal"], Scope::Text, |t, k, v| {
		let align = t.keyword(k, v, &[
			("left", TextAlignHorizontal::Left),
			("start", TextAlignHorizontal::Left),
			("center", TextAlignHorizontal::Center),
			("right", TextAlignHorizontal::Right),
			("end", TextAlignHorizontal::Right),
			("justify", TextAlignHorizontal::Justified),
			("justified", TextAlignHorizontal::Justified),
		])?;
		t.out.text_align = Some(align);
		Ok(())
	}),
	rule(&["lineHeight"], Scope::Text, |t, k, v| {
		t.out.line_height = Some(t.number(k, v)?);
		Ok(())
	}),
	rule(&["letterSpacing"], Scope::Text, |t, k, v| {
		t.out.letter_spacing = Some(t.number(k, v)?);
		Ok(())
	}),
	// Kind-specific
	rule(&["pointCount", "points"], Scope::Polygonal, |t, k, v| {
		let n = t.number(k, v)?;
		if n < 3.0 || n.fract() != 0.0 {
			return Err(t.invalid(k, "expected a whole number of at least 3"));
		}
		t.out.point_count = Some(n as u32);
		Ok(())
	}),
	rule(&["componentId"], Scope::Instance, |t, k, v| {
		let id = t.string(k, v)?;
		t.out.symbol_id = Some(id.parse::<Guid>()?);
		Ok(())
	}),
	// Authoring metadata
	rule(&["key"], Scope::Any, |_, _, _| Ok(())),
];

fn find_rule(key: &str) -> Option<&'static Rule> {
	RULES.iter().find(|r| r.keys.contains(&key))
}

/// Pieces of a drop shadow collected from separate keys.
#[derive(Default)]
struct Shadow {
	color: Option<Color>,
	offset: Option<Vector>,
	radius: Option<f32>,
	spread: Option<f32>,
	opacity: Option<f32>,
}

impl Shadow {
	fn into_effect(self) -> Option<Effect> {
		if self.color.is_none() && self.offset.is_none() && self.radius.is_none() && self.spread.is_none() {
			return None;
		}
		let mut color = self.color.unwrap_or(DEFAULT_SHADOW);
		if let Some(opacity) = self.opacity {
			color.a *= opacity;
		}
		Some(Effect {
			effect_type: EffectType::DropShadow,
			color: Some(color),
			offset: Some(self.offset.unwrap_or_default()),
			radius: Some(self.radius.unwrap_or(0.0)),
			spread: self.spread,
			visible: Some(true),
			blend_mode: Some(BlendMode::Normal),
		})
	}
}

/// Per-corner overrides; unset corners take the uniform radius.
#[derive(Default)]
struct Corners {
	top_left: Option<f32>,
	top_right: Option<f32>,
	bottom_right: Option<f32>,
	bottom_left: Option<f32>,
}

impl Corners {
	fn into_radii(self, base: f32) -> Option<CornerRadii> {
		if self.top_left.is_none() && self.top_right.is_none() && self.bottom_right.is_none() && self.bottom_left.is_none() {
			return None;
		}
		Some(CornerRadii {
			top_left: self.top_left.unwrap_or(base),
			top_right: self.top_right.unwrap_or(base),
			bottom_right: self.bottom_right.unwrap_or(base),
			bottom_left: self.bottom_left.unwrap_or(base),
		})
	}
}

#[derive(Default)]
struct Font {
	family: Option<String>,
	weight: Option<u16>,
	italic: bool,
	/// Explicit style name such as `"Semi Bold Italic"`.
	style: Option<String>,
}

impl Font {
	fn is_set(&self) -> bool {
		self.family.is_some() || self.weight.is_some() || self.italic || self.style.is_some()
	}

	fn into_font_name(self) -> FontName {
		let defaults = FontName::default();
		let style = self.style.unwrap_or_else(|| {
			let weight = self.weight.map(weight_name).unwrap_or("Regular");
			match (weight, self.italic) {
				(w, false) => w.to_string(),
				("Regular", true) => "Italic".to_string(),
				(w, true) => format!("{w} Italic"),
			}
		});
		FontName {
			family: self.family.unwrap_or(defaults.family),
			style,
		}
	}
}

/// Style name for a CSS numeric weight.
fn weight_name(weight: u16) -> &'static str {
	match weight {
		0..=149 => "Thin",
		150..=249 => "Extra Light",
		250..=349 => "Light",
		350..=449 => "Regular",
		450..=549 => "Medium",
		550..=649 => "Semi Bold",
		650..=749 => "Bold",
		750..=849 => "Extra Bold",
		_ => "Black",
	}
}

struct Translation<'a> {
	kind: Intrinsic,
	variables: &'a VariableMap,
	out: NodeProperties,
	x: Option<f32>,
	y: Option<f32>,
	width: Option<f32>,
	height: Option<f32>,
	padding: Option<Padding>,
	corners: Corners,
	shadow: Shadow,
	font: Font,
}

impl<'a> Translation<'a> {
	fn new(kind: Intrinsic, variables: &'a VariableMap) -> Self {
		Self {
			kind,
			variables,
			out: NodeProperties::default(),
			x: None,
			y: None,
			width: None,
			height: None,
			padding: None,
			corners: Corners::default(),
			shadow: Shadow::default(),
			font: Font::default(),
		}
	}

	fn apply(&mut self, key: &str, value: &Value) -> Result<()> {
		let rule = find_rule(key)
			.filter(|r| r.scope.allows(self.kind))
			.ok_or_else(|| Error::UnknownProperty {
				element: self.kind.tag().to_string(),
				key: key.to_string(),
			})?;
		(rule.apply)(self, key, value)
	}

	fn finish(mut self) -> NodeProperties {
		if self.width.is_some() || self.height.is_some() {
			self.out.size = Some(Vector::new(self.width.unwrap_or(0.0), self.height.unwrap_or(0.0)));
		}
		if self.x.is_some() || self.y.is_some() {
			self.out.position = Some(Vector::new(self.x.unwrap_or(0.0), self.y.unwrap_or(0.0)));
		}
		self.out.padding = self.padding;
		self.out.corner_radii = self.corners.into_radii(self.out.corner_radius.unwrap_or(0.0));
		if let Some(effect) = self.shadow.into_effect() {
			self.out.effects.push(effect);
		}
		if self.font.is_set() {
			self.out.font_name = Some(self.font.into_font_name());
		}
		self.out
	}

	fn invalid(&self, key: &str, reason: impl Into<String>) -> Error {
		Error::invalid(self.kind.tag(), key, reason)
	}

	fn number(&self, key: &str, value: &Value) -> Result<f32> {
		let parsed = match value {
			Value::Number(n) => n.as_f64(),
			Value::String(s) => s.trim().trim_end_matches("px").trim().parse::<f64>().ok(),
			_ => None,
		};
		parsed
			.filter(|n| n.is_finite())
			.map(|n| n as f32)
			.ok_or_else(|| self.invalid(key, format!("expected a number, got {value}")))
	}

	/// Number in `0.0..=1.0`.
	fn unit(&self, key: &str, value: &Value) -> Result<f32> {
		let n = self.number(key, value)?;
		if !(0.0..=1.0).contains(&n) {
			return Err(self.invalid(key, format!("{n} is outside 0..1")));
		}
		Ok(n)
	}

	fn boolean(&self, key: &str, value: &Value) -> Result<bool> {
		value
			.as_bool()
			.ok_or_else(|| self.invalid(key, format!("expected true or false, got {value}")))
	}

	fn string(&self, key: &str, value: &Value) -> Result<String> {
		match value {
			Value::String(s) => Ok(s.clone()),
			Value::Number(n) => Ok(n.to_string()),
			_ => Err(self.invalid(key, format!("expected a string, got {value}"))),
		}
	}

	fn keyword<T: Copy>(&self, key: &str, value: &Value, table: &[(&str, T)]) -> Result<T> {
		let word = value
			.as_str()
			.ok_or_else(|| self.invalid(key, format!("expected a keyword, got {value}")))?
			.trim()
			.to_ascii_lowercase();
		table
			.iter()
			.find(|(name, _)| *name == word)
			.map(|(_, v)| *v)
			.ok_or_else(|| {
				let names: Vec<&str> = table.iter().map(|(n, _)| *n).collect();
				self.invalid(key, format!("'{word}' is not one of {}", names.join(", ")))
			})
	}

	/// Matches a schema enum by its wire name, accepting `kebab-case`,
	/// `snake_case`, and any letter case.
	fn wire_enum<T: Copy>(&self, key: &str, value: &Value, all: &[T], name: fn(T) -> &'static str) -> Result<T> {
		let word = value
			.as_str()
			.ok_or_else(|| self.invalid(key, format!("expected a keyword, got {value}")))?
			.trim()
			.to_ascii_uppercase()
			.replace(['-', ' '], "_");
		all.iter()
			.copied()
			.find(|v| name(*v) == word)
			.ok_or_else(|| self.invalid(key, format!("unknown value '{word}'")))
	}

	fn weight(&self, key: &str, value: &Value) -> Result<u16> {
		if let Some(word) = value.as_str() {
			match word.trim().to_ascii_lowercase().as_str() {
				"normal" => return Ok(400),
				"bold" => return Ok(700),
				_ => {}
			}
		}
		let n = self.number(key, value)?;
		if !(1.0..=1000.0).contains(&n) {
			return Err(self.invalid(key, format!("weight {n} is outside 1..1000")));
		}
		Ok(n as u16)
	}

	/// Accepts `n`, `[v, h]`, `[t, r, b, l]`, `"t,r,b,l"`, or an object
	/// with `top`/`right`/`bottom`/`left`.
	fn padding(&self, key: &str, value: &Value) -> Result<Padding> {
		let numbers: Vec<f32> = match value {
			Value::Array(items) => items.iter().map(|v| self.number(key, v)).collect::<Result<_>>()?,
			Value::String(s) if s.contains(',') || s.contains(' ') => s
				.split([',', ' '])
				.filter(|p| !p.trim().is_empty())
				.map(|p| self.number(key, &Value::String(p.to_string())))
				.collect::<Result<_>>()?,
			Value::Object(sides) => {
				let side = |name: &str| sides.get(name).map_or(Ok(0.0), |v| self.number(key, v));
				return Ok(Padding {
					top: side("top")?,
					right: side("right")?,
					bottom: side("bottom")?,
					left: side("left")?,
				});
			}
			other => vec![self.number(key, other)?],
		};
		match numbers.as_slice() {
			[all] => Ok(Padding::uniform(*all)),
			[vertical, horizontal] => Ok(Padding::symmetric(*vertical, *horizontal)),
			[top, right, bottom, left] => Ok(Padding {
				top: *top,
				right: *right,
				bottom: *bottom,
				left: *left,
			}),
			_ => Err(self.invalid(key, format!("expected 1, 2, or 4 values, got {}", numbers.len()))),
		}
	}

	fn padding_side(&mut self, key: &str, value: &Value, set: fn(&mut Padding, f32)) -> Result<()> {
		let n = self.number(key, value)?;
		set(self.padding.get_or_insert_with(Padding::default), n);
		Ok(())
	}

	fn corner(&mut self, key: &str, value: &Value, set: fn(&mut Corners, f32)) -> Result<()> {
		let n = self.number(key, value)?;
		set(&mut self.corners, n);
		Ok(())
	}

	fn color(&self, key: &str, value: &Value) -> Result<Color> {
		match value {
			Value::String(hex) => Color::from_hex(hex.trim())
				.ok_or_else(|| self.invalid(key, format!("'{hex}' is not a hex color"))),
			Value::Object(channels) if channels.contains_key("r") => {
				let channel = |name: &str, default: f32| {
					channels.get(name).map_or(Ok(default), |v| self.unit(key, v))
				};
				Ok(Color {
					r: channel("r", 0.0)?,
					g: channel("g", 0.0)?,
					b: channel("b", 0.0)?,
					a: channel("a", 1.0)?,
				})
			}
			_ => Err(self.invalid(key, format!("expected a color, got {value}"))),
		}
	}

	/// Literal color or `{"$var": name, "fallback"?: color}` reference.
	fn paint(&self, key: &str, value: &Value) -> Result<Paint> {
		if let Some(reference) = value.as_object().and_then(|o| o.get(VARIABLE_KEY).map(|n| (o, n))) {
			let (object, name) = reference;
			let name = name
				.as_str()
				.ok_or_else(|| self.invalid(key, "variable name must be a string"))?;
			let id = self
				.variables
				.get(name)
				.ok_or_else(|| Error::UnknownVariable(name.to_string()))?;
			let fallback = match object.get("fallback") {
				Some(color) => self.color(key, color)?,
				None => Color::BLACK,
			};
			return Ok(Paint::bound(id, fallback));
		}
		self.color(key, value).map(Paint::solid)
	}
}

/// Translates an element's authored props into canonical node properties.
pub fn translate(kind: Intrinsic, props: &Props, variables: &VariableMap) -> Result<NodeProperties> {
	let mut translation = Translation::new(kind, variables);

	if let Some(style) = props.get("style") {
		let style = style
			.as_object()
			.ok_or_else(|| translation.invalid("style", "expected an object"))?;
		for (key, value) in style {
			translation.apply(key, value)?;
		}
	}
	for (key, value) in props {
		if key == "style" || key == "children" {
			continue;
		}
		translation.apply(key, value)?;
	}

	Ok(translation.finish())
}

/// Whether a key is understood for `kind`.
pub fn is_known(kind: Intrinsic, key: &str) -> bool {
	key == "style" || find_rule(key).is_some_and(|r| r.scope.allows(kind))
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn props(value: Value) -> Props {
		value.as_object().cloned().unwrap()
	}

	fn frame(value: Value) -> NodeProperties {
		translate(Intrinsic::Frame, &props(value), &VariableMap::new()).unwrap()
	}

	fn text(value: Value) -> NodeProperties {
		translate(Intrinsic::Text, &props(value), &VariableMap::new()).unwrap()
	}

	#[test]
	fn layout_keywords_map_to_axes() {
		assert_eq!(frame(json!({"layout": "row"})).stack_mode, Some(StackMode::Horizontal));
		assert_eq!(frame(json!({"layout": "COL"})).stack_mode, Some(StackMode::Vertical));
		assert_eq!(frame(json!({"flexDirection": "column"})).stack_mode, Some(StackMode::Vertical));

		let out = frame(json!({"justifyContent": "space-between", "alignItems": "center", "gap": 8}));
		assert_eq!(out.primary_align, Some(StackJustify::SpaceBetween));
		assert_eq!(out.counter_align, Some(StackAlign::Center));
		assert_eq!(out.item_spacing, Some(8.0));
	}

	#[test]
	fn padding_shorthands() {
		assert_eq!(frame(json!({"padding": 4})).padding, Some(Padding::uniform(4.0)));
		assert_eq!(frame(json!({"padding": [8, 16]})).padding, Some(Padding::symmetric(8.0, 16.0)));
		assert_eq!(
			frame(json!({"padding": "1,2,3,4"})).padding,
			Some(Padding {
				top: 1.0,
				right: 2.0,
				bottom: 3.0,
				left: 4.0
			})
		);
		assert_eq!(
			frame(json!({"padding": 10, "paddingLeft": 2})).padding,
			Some(Padding {
				top: 10.0,
				right: 10.0,
				bottom: 10.0,
				left: 2.0
			})
		);

		let err = translate(Intrinsic::Frame, &props(json!({"padding": [1, 2, 3]})), &VariableMap::new()).unwrap_err();
		assert!(err.to_string().contains("expected 1, 2, or 4 values"), "{err}");
	}

	#[test]
	fn style_object_is_overridden_by_top_level() {
		let out = frame(json!({"style": {"width": 320, "backgroundColor": "#fff"}, "w": 200, "h": 50}));
		assert_eq!(out.size, Some(Vector::new(200.0, 50.0)));
		assert_eq!(out.fills, vec![Paint::solid(Color::WHITE)]);
	}

	#[test]
	fn colors_and_variables() {
		let mut vars = VariableMap::new();
		vars.insert("Colors/Gray/50", Guid::new(38448, 122296));

		let out = translate(
			Intrinsic::Rectangle,
			&props(json!({"fill": {"$var": "Colors/Gray/50", "fallback": "#fafafa"}, "stroke": "#000"})),
			&vars,
		)
		.unwrap();
		assert_eq!(out.fills[0].color_var, Some(Guid::new(38448, 122296)));
		assert_eq!(out.fills[0].color.map(|c| c.to_hex()), Some("#FAFAFA".to_string()));
		assert_eq!(out.strokes, vec![Paint::solid(Color::BLACK)]);

		let err = translate(
			Intrinsic::Rectangle,
			&props(json!({"fill": {"$var": "Colors/Red/500"}})),
			&vars,
		)
		.unwrap_err();
		assert!(matches!(err, Error::UnknownVariable(ref name) if name == "Colors/Red/500"));
	}

	#[test]
	fn typography() {
		let out = text(json!({"fontSize": 14, "fontWeight": 500, "color": "#FFFFFF", "textAlign": "center"}));
		assert_eq!(out.font_size, Some(14.0));
		assert_eq!(
			out.font_name,
			Some(FontName {
				family: "Inter".into(),
				style: "Medium".into()
			})
		);
		assert_eq!(out.text_align, Some(TextAlignHorizontal::Center));
		assert_eq!(out.fills, vec![Paint::solid(Color::WHITE)]);

		assert_eq!(text(json!({"bold": true, "italic": true})).font_name.unwrap().style, "Bold Italic");
		assert_eq!(text(json!({"fontStyle": "italic"})).font_name.unwrap().style, "Italic");
		assert_eq!(
			text(json!({"fontFamily": "Roboto", "fontWeight": "bold"})).font_name,
			Some(FontName {
				family: "Roboto".into(),
				style: "Bold".into()
			})
		);
		assert!(text(json!({"fontSize": 12})).font_name.is_none());
	}

	#[test]
	fn shadow_keys_build_one_effect() {
		let out = frame(json!({
			"shadowColor": "#000000",
			"shadowOffset": {"width": 0, "height": 4},
			"shadowRadius": 12,
			"shadowOpacity": 0.5
		}));
		assert_eq!(out.effects.len(), 1);
		let effect = &out.effects[0];
		assert_eq!(effect.effect_type, EffectType::DropShadow);
		assert_eq!(effect.offset, Some(Vector::new(0.0, 4.0)));
		assert_eq!(effect.radius, Some(12.0));
		assert_eq!(effect.color.map(|c| c.a), Some(0.5));
	}

	#[test]
	fn corner_keys() {
		let out = frame(json!({"borderRadius": 8, "borderTopLeftRadius": 0}));
		assert_eq!(out.corner_radius, Some(8.0));
		assert_eq!(
			out.corner_radii,
			Some(CornerRadii {
				top_left: 0.0,
				top_right: 8.0,
				bottom_right: 8.0,
				bottom_left: 8.0
			})
		);
	}

	#[test]
	fn corner_keys_ignore_key_order() {
		let out = frame(json!({"borderRadius": 8, "borderBottomLeftRadius": 0}));
		assert_eq!(
			out.corner_radii,
			Some(CornerRadii {
				top_left: 8.0,
				top_right: 8.0,
				bottom_right: 8.0,
				bottom_left: 0.0
			})
		);

		let out = frame(json!({"cornerRadius": 6, "bottomRightRadius": 2, "style": {"topLeftRadius": 1}}));
		assert_eq!(
			out.corner_radii,
			Some(CornerRadii {
				top_left: 1.0,
				top_right: 6.0,
				bottom_right: 2.0,
				bottom_left: 6.0
			})
		);

		assert_eq!(frame(json!({"radius": 4})).corner_radii, None);
	}

	#[test]
	fn scope_is_enforced() {
		let err = translate(Intrinsic::Rectangle, &props(json!({"gap": 4})), &VariableMap::new()).unwrap_err();
		assert!(matches!(err, Error::UnknownProperty { ref key, .. } if key == "gap"));

		let err = translate(Intrinsic::Frame, &props(json!({"fontSize": 4})), &VariableMap::new()).unwrap_err();
		assert!(matches!(err, Error::UnknownProperty { .. }));

		let err = translate(Intrinsic::Frame, &props(json!({"colour": "#fff"})), &VariableMap::new()).unwrap_err();
		assert_eq!(err.to_string(), "unknown property 'colour' on <frame>");

		assert!(is_known(Intrinsic::Star, "pointCount"));
		assert!(!is_known(Intrinsic::Ellipse, "pointCount"));
	}

	#[test]
	fn kind_specific_props() {
		let star = translate(Intrinsic::Star, &props(json!({"pointCount": 5})), &VariableMap::new()).unwrap();
		assert_eq!(star.point_count, Some(5));

		let instance = translate(Intrinsic::Instance, &props(json!({"componentId": "12:34"})), &VariableMap::new()).unwrap();
		assert_eq!(instance.symbol_id, Some(Guid::new(12, 34)));

		let err = translate(Intrinsic::Instance, &props(json!({"componentId": "nope"})), &VariableMap::new()).unwrap_err();
		assert!(matches!(err, Error::InvalidGuid(_)));
	}

	#[test]
	fn invalid_values_name_the_key() {
		let err = translate(Intrinsic::Frame, &props(json!({"opacity": 2})), &VariableMap::new()).unwrap_err();
		assert_eq!(err.to_string(), "invalid value for 'opacity' on <frame>: 2 is outside 0..1");

		let err = translate(Intrinsic::Frame, &props(json!({"layout": "grid"})), &VariableMap::new()).unwrap_err();
		assert!(err.to_string().contains("'grid' is not one of"), "{err}");

		let err = translate(Intrinsic::Frame, &props(json!({"fill": "red"})), &VariableMap::new()).unwrap_err();
		assert!(err.to_string().contains("not a hex color"), "{err}");
	}

	#[test]
	fn numeric_strings_are_accepted() {
		assert_eq!(frame(json!({"width": "120px", "height": "40"})).size, Some(Vector::new(120.0, 40.0)));
		assert_eq!(frame(json!({"blendMode": "color-dodge"})).blend_mode, Some(BlendMode::ColorDodge));
	}
}
