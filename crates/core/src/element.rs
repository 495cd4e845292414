//! Declarative element trees.
//!
//! An [`Element`] is either intrinsic (maps to exactly one node change), a
//! composite [`Component`] that expands to other nodes when resolved, or a
//! fragment that splices its children into the parent.

use std::fmt;
use std::sync::Arc;

use fu_protocol::NodeType;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Property bag as authored. Translated into canonical node properties by
/// [`crate::props`].
pub type Props = Map<String, Value>;

/// Element kinds that map one-to-one onto a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intrinsic {
	Frame,
	Rectangle,
	Ellipse,
	Text,
	Line,
	Star,
	Polygon,
	Vector,
	Component,
	Instance,
	Group,
	Section,
}

impl Intrinsic {
	pub const ALL: &'static [Intrinsic] = &[
		Intrinsic::Frame,
		Intrinsic::Rectangle,
		Intrinsic::Ellipse,
		Intrinsic::Text,
		Intrinsic::Line,
		Intrinsic::Star,
		Intrinsic::Polygon,
		Intrinsic::Vector,
		Intrinsic::Component,
		Intrinsic::Instance,
		Intrinsic::Group,
		Intrinsic::Section,
	];

	/// Looks up an element tag, accepting the usual aliases
	/// (`view`, `rect`, ...). Case-insensitive.
	pub fn from_tag(tag: &str) -> Option<Self> {
		let kind = match tag.to_ascii_lowercase().as_str() {
			"frame" | "view" => Intrinsic::Frame,
			"rect" | "rectangle" => Intrinsic::Rectangle,
			"ellipse" => Intrinsic::Ellipse,
			"text" => Intrinsic::Text,
			"line" => Intrinsic::Line,
			"star" => Intrinsic::Star,
			"polygon" => Intrinsic::Polygon,
			"vector" => Intrinsic::Vector,
			"component" => Intrinsic::Component,
			"instance" => Intrinsic::Instance,
			"group" => Intrinsic::Group,
			"section" => Intrinsic::Section,
			_ => return None,
		};
		Some(kind)
	}

	pub fn tag(self) -> &'static str {
		match self {
			Intrinsic::Frame => "frame",
			Intrinsic::Rectangle => "rectangle",
			Intrinsic::Ellipse => "ellipse",
			Intrinsic::Text => "text",
			Intrinsic::Line => "line",
			Intrinsic::Star => "star",
			Intrinsic::Polygon => "polygon",
			Intrinsic::Vector => "vector",
			Intrinsic::Component => "component",
			Intrinsic::Instance => "instance",
			Intrinsic::Group => "group",
			Intrinsic::Section => "section",
		}
	}

	pub fn node_type(self) -> NodeType {
		match self {
			Intrinsic::Frame => NodeType::Frame,
			Intrinsic::Rectangle => NodeType::Rectangle,
			Intrinsic::Ellipse => NodeType::Ellipse,
			Intrinsic::Text => NodeType::Text,
			Intrinsic::Line => NodeType::Line,
			Intrinsic::Star => NodeType::Star,
			Intrinsic::Polygon => NodeType::RegularPolygon,
			Intrinsic::Vector => NodeType::Vector,
			Intrinsic::Component => NodeType::Symbol,
			Intrinsic::Instance => NodeType::Instance,
			Intrinsic::Group => NodeType::Group,
			Intrinsic::Section => NodeType::Section,
		}
	}

	/// Name given to nodes that do not set one.
	pub fn default_name(self) -> &'static str {
		match self {
			Intrinsic::Frame => "Frame",
			Intrinsic::Rectangle => "Rectangle",
			Intrinsic::Ellipse => "Ellipse",
			Intrinsic::Text => "Text",
			Intrinsic::Line => "Line",
			Intrinsic::Star => "Star",
			Intrinsic::Polygon => "Polygon",
			Intrinsic::Vector => "Vector",
			Intrinsic::Component => "Component",
			Intrinsic::Instance => "Instance",
			Intrinsic::Group => "Group",
			Intrinsic::Section => "Section",
		}
	}

	/// Kinds that hold children and get a fallback size when none is given.
	pub fn is_container(self) -> bool {
		matches!(self, Intrinsic::Frame | Intrinsic::Component | Intrinsic::Section)
	}

	pub fn is_text(self) -> bool {
		self == Intrinsic::Text
	}
}

impl fmt::Display for Intrinsic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.tag())
	}
}

/// User-defined composite element.
///
/// `render` receives the element's props and children and returns the nodes
/// it expands to. Returning several nodes acts as a fragment.
pub trait Component: Send + Sync {
	fn name(&self) -> &str;

	fn render(&self, props: &Props, children: &[Node]) -> Result<Vec<Node>>;
}

/// [`Component`] backed by a closure. See [`component`].
pub struct FnComponent<F> {
	name: String,
	render: F,
}

impl<F> Component for FnComponent<F>
where
	F: Fn(&Props, &[Node]) -> Result<Vec<Node>> + Send + Sync,
{
	fn name(&self) -> &str {
		&self.name
	}

	fn render(&self, props: &Props, children: &[Node]) -> Result<Vec<Node>> {
		(self.render)(props, children)
	}
}

/// Wraps a closure as a shareable component.
pub fn component<F>(name: impl Into<String>, render: F) -> Arc<dyn Component>
where
	F: Fn(&Props, &[Node]) -> Result<Vec<Node>> + Send + Sync + 'static,
{
	Arc::new(FnComponent {
		name: name.into(),
		render,
	})
}

#[derive(Clone)]
pub enum ElementKind {
	Intrinsic(Intrinsic),
	Composite(Arc<dyn Component>),
	Fragment,
}

impl fmt::Debug for ElementKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ElementKind::Intrinsic(kind) => write!(f, "Intrinsic({kind})"),
			ElementKind::Composite(c) => write!(f, "Composite({})", c.name()),
			ElementKind::Fragment => f.write_str("Fragment"),
		}
	}
}

#[derive(Debug, Clone)]
pub struct Element {
	pub kind: ElementKind,
	pub props: Props,
	pub children: Vec<Node>,
}

/// Child of an element: another element or a literal text run.
#[derive(Debug, Clone)]
pub enum Node {
	Element(Element),
	Text(String),
}

impl Element {
	pub fn new(kind: Intrinsic) -> Self {
		Self::with_kind(ElementKind::Intrinsic(kind))
	}

	/// Builds an intrinsic element from its tag.
	pub fn tag(tag: &str) -> Result<Self> {
		Intrinsic::from_tag(tag)
			.map(Self::new)
			.ok_or_else(|| Error::UnknownElement(tag.to_string()))
	}

	pub fn composite(component: Arc<dyn Component>) -> Self {
		Self::with_kind(ElementKind::Composite(component))
	}

	pub fn fragment(children: impl IntoIterator<Item = Node>) -> Self {
		Self::with_kind(ElementKind::Fragment).children(children)
	}

	fn with_kind(kind: ElementKind) -> Self {
		Self {
			kind,
			props: Props::new(),
			children: Vec::new(),
		}
	}

	pub fn prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.props.insert(key.into(), value.into());
		self
	}

	pub fn props(mut self, props: Props) -> Self {
		self.props.extend(props);
		self
	}

	pub fn child(mut self, child: impl Into<Node>) -> Self {
		self.children.push(child.into());
		self
	}

	pub fn children<I, N>(mut self, children: I) -> Self
	where
		I: IntoIterator<Item = N>,
		N: Into<Node>,
	{
		self.children.extend(children.into_iter().map(Into::into));
		self
	}

	pub fn text(self, text: impl Into<String>) -> Self {
		self.child(Node::Text(text.into()))
	}

	/// Display name used in errors and logs.
	pub fn label(&self) -> String {
		match &self.kind {
			ElementKind::Intrinsic(kind) => kind.tag().to_string(),
			ElementKind::Composite(c) => c.name().to_string(),
			ElementKind::Fragment => "fragment".to_string(),
		}
	}
}

impl From<Element> for Node {
	fn from(element: Element) -> Self {
		Node::Element(element)
	}
}

impl From<&str> for Node {
	fn from(text: &str) -> Self {
		Node::Text(text.to_string())
	}
}

impl From<String> for Node {
	fn from(text: String) -> Self {
		Node::Text(text)
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn tags_and_aliases() {
		assert_eq!(Intrinsic::from_tag("view"), Some(Intrinsic::Frame));
		assert_eq!(Intrinsic::from_tag("Rect"), Some(Intrinsic::Rectangle));
		assert_eq!(Intrinsic::from_tag("polygon").map(Intrinsic::node_type), Some(NodeType::RegularPolygon));
		assert_eq!(Intrinsic::Component.node_type(), NodeType::Symbol);
		assert!(Intrinsic::from_tag("div").is_none());
		for kind in Intrinsic::ALL {
			assert_eq!(Intrinsic::from_tag(kind.tag()), Some(*kind));
		}
	}

	#[test]
	fn unknown_tag_is_an_error() {
		let err = Element::tag("marquee").unwrap_err();
		assert_eq!(err.to_string(), "unknown element type 'marquee'");
	}

	#[test]
	fn builder_collects_props_and_children() {
		let card = Element::new(Intrinsic::Frame)
			.prop("name", "Card")
			.prop("padding", json!([8, 16]))
			.child(Element::new(Intrinsic::Text).text("Title"))
			.text("stray");

		assert_eq!(card.props["name"], json!("Card"));
		assert_eq!(card.children.len(), 2);
		assert!(matches!(card.children[1], Node::Text(ref t) if t == "stray"));
	}

	#[test]
	fn closure_components_render() {
		let badge = component("Badge", |props, _| {
			let label = props.get("label").and_then(Value::as_str).unwrap_or("?");
			Ok(vec![Element::new(Intrinsic::Text).text(label).into()])
		});
		let mut props = Props::new();
		props.insert("label".into(), json!("new"));

		let nodes = badge.render(&props, &[]).unwrap();
		assert_eq!(nodes.len(), 1);
		assert_eq!(Element::composite(badge).label(), "Badge");
	}
}
