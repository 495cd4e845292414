//! Element trees and components declared as JSON.
//!
//! ```json
//! {
//!   "components": {
//!     "Card": {
//!       "type": "frame",
//!       "props": {"name": {"$prop": "title"}, "padding": 16},
//!       "children": [{"type": "text", "children": [{"$prop": "title"}]}, {"type": "slot"}]
//!     }
//!   },
//!   "root": {"type": "Card", "props": {"title": "Hello"}, "children": ["Body"]}
//! }
//! ```
//!
//! `{"$prop": name}` is replaced by the caller's prop wherever it appears in
//! props or children; a `slot` element is replaced by the caller's children.
//! Components are expanded lazily during resolution, so a template may refer
//! to itself and is then stopped by the resolver's depth ceiling.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Number, Value};

use crate::element::{Component, Element, Intrinsic, Node, Props};
use crate::error::{Error, Result};

/// Placeholder key substituted with a prop value.
pub const PROP_KEY: &str = "$prop";

/// Element type replaced by the caller's children.
pub const SLOT: &str = "slot";

/// Element type that splices its children into the parent.
pub const FRAGMENT: &str = "fragment";

/// One node of a template as written in JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TemplateNode {
	Text(String),
	Number(Number),
	Prop {
		#[serde(rename = "$prop")]
		prop: String,
	},
	Element {
		#[serde(rename = "type")]
		kind: String,
		#[serde(default)]
		props: Map<String, Value>,
		#[serde(default)]
		children: Vec<TemplateNode>,
	},
}

/// Parsed template file: named components plus the tree to render.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateDocument {
	#[serde(default)]
	pub components: HashMap<String, TemplateNode>,
	pub root: TemplateNode,
}

impl TemplateDocument {
	pub fn from_json(source: &str) -> Result<Self> {
		serde_json::from_str(source).map_err(|e| Error::Template(e.to_string()))
	}

	pub fn from_value(value: Value) -> Result<Self> {
		serde_json::from_value(value).map_err(|e| Error::Template(e.to_string()))
	}

	/// Builds the root element, with `props` merged over the root's own props.
	pub fn into_element(self, props: Props) -> Result<Element> {
		let library = Arc::new(Library {
			components: self.components,
		});
		let mut nodes = library.instantiate(&self.root, &Props::new(), &[])?;
		let mut root = match (nodes.len(), nodes.pop()) {
			(1, Some(Node::Element(element))) => element,
			_ => return Err(Error::Template("root must be a single element".into())),
		};
		root.props.extend(props);
		Ok(root)
	}
}

/// Component bodies shared by every [`TemplateComponent`] of a document.
#[derive(Debug)]
struct Library {
	components: HashMap<String, TemplateNode>,
}

impl Library {
	/// Turns a template node into element nodes, substituting `props` and
	/// the `slot` children.
	fn instantiate(self: &Arc<Self>, node: &TemplateNode, props: &Props, slot: &[Node]) -> Result<Vec<Node>> {
		match node {
			TemplateNode::Text(text) => Ok(vec![Node::Text(text.clone())]),
			TemplateNode::Number(n) => Ok(vec![Node::Text(n.to_string())]),
			TemplateNode::Prop { prop } => Ok(match props.get(prop) {
				None | Some(Value::Null) => Vec::new(),
				Some(Value::String(s)) => vec![Node::Text(s.clone())],
				Some(Value::Number(n)) => vec![Node::Text(n.to_string())],
				Some(Value::Bool(b)) => vec![Node::Text(b.to_string())],
				Some(other) => {
					return Err(Error::Template(format!(
						"prop '{prop}' used as a child must be text, got {other}"
					)));
				}
			}),
			TemplateNode::Element { kind, .. } if kind == SLOT => Ok(slot.to_vec()),
			TemplateNode::Element {
				kind,
				props: own,
				children,
			} => {
				let mut element = self.element_for(kind)?;
				element.props = substitute_props(own, props);
				for child in children {
					element.children.extend(self.instantiate(child, props, slot)?);
				}
				Ok(vec![Node::Element(element)])
			}
		}
	}

	fn element_for(self: &Arc<Self>, kind: &str) -> Result<Element> {
		if kind.eq_ignore_ascii_case(FRAGMENT) {
			return Ok(Element::fragment([]));
		}
		if self.components.contains_key(kind) {
			return Ok(Element::composite(Arc::new(TemplateComponent {
				name: kind.to_string(),
				library: self.clone(),
			})));
		}
		Intrinsic::from_tag(kind)
			.map(Element::new)
			.ok_or_else(|| Error::UnknownElement(kind.to_string()))
	}
}

/// Replaces `{"$prop": name}` values at any depth. Keys whose placeholder
/// has no matching prop are dropped.
fn substitute_props(own: &Map<String, Value>, props: &Props) -> Props {
	own.iter()
		.filter_map(|(key, value)| substitute(value, props).map(|v| (key.clone(), v)))
		.collect()
}

fn substitute(value: &Value, props: &Props) -> Option<Value> {
	match value {
		Value::Object(object) => {
			if object.len() == 1 {
				if let Some(Value::String(name)) = object.get(PROP_KEY) {
					return props.get(name).filter(|v| !v.is_null()).cloned();
				}
			}
			Some(Value::Object(substitute_props(object, props)))
		}
		Value::Array(items) => Some(Value::Array(
			items.iter().map(|v| substitute(v, props).unwrap_or(Value::Null)).collect(),
		)),
		other => Some(other.clone()),
	}
}

/// Composite whose body is a template node.
pub struct TemplateComponent {
	name: String,
	library: Arc<Library>,
}

impl Component for TemplateComponent {
	fn name(&self) -> &str {
		&self.name
	}

	fn render(&self, props: &Props, children: &[Node]) -> Result<Vec<Node>> {
		let body = self
			.library
			.components
			.get(&self.name)
			.ok_or_else(|| Error::UnknownElement(self.name.clone()))?;
		self.library.instantiate(body, props, children)
	}
}
