//! Element tree resolution.
//!
//! Expands composites and fragments, folds literal text runs into their
//! parent, and translates props, producing a flat pre-order list of
//! [`ResolvedNode`]s. Nothing here touches the network.

use std::sync::Arc;

use fu_protocol::{Color, FontName, NodeProperties, NodeType, Paint, Vector};

use crate::element::{Element, ElementKind, Intrinsic, Node, Props};
use crate::error::{Error, Result};
use crate::props;
use crate::variables::VariableMap;

/// Ceiling on nested composite expansions along one path.
pub const MAX_DEPTH: usize = 100;

/// Ceiling on element nesting along one path, counting intrinsic elements
/// and fragments.
pub const MAX_NESTING: usize = 256;

/// Width and height given to containers that set neither.
pub const DEFAULT_SIZE: f32 = 100.0;

/// Inputs shared by one resolution pass.
#[derive(Debug, Clone)]
pub struct ResolveContext {
	pub variables: Arc<VariableMap>,
	pub max_depth: usize,
}

impl Default for ResolveContext {
	fn default() -> Self {
		Self {
			variables: Arc::default(),
			max_depth: MAX_DEPTH,
		}
	}
}

impl ResolveContext {
	pub fn with_variables(variables: Arc<VariableMap>) -> Self {
		Self {
			variables,
			..Self::default()
		}
	}

	pub fn with_max_depth(mut self, max_depth: usize) -> Self {
		self.max_depth = max_depth;
		self
	}
}

/// One intrinsic element after resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNode {
	pub kind: Intrinsic,
	pub properties: NodeProperties,
	/// Position of the parent in [`ResolvedTree::nodes`]; `None` for roots.
	pub parent: Option<usize>,
	/// Index among the parent's resolved children (or among the roots).
	pub index: usize,
}

impl ResolvedNode {
	pub fn node_type(&self) -> NodeType {
		self.kind.node_type()
	}
}

/// Resolver output in tree pre-order: every parent precedes its children and
/// siblings keep their authored order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedTree {
	nodes: Vec<ResolvedNode>,
}

impl ResolvedTree {
	pub fn nodes(&self) -> &[ResolvedNode] {
		&self.nodes
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn get(&self, index: usize) -> Option<&ResolvedNode> {
		self.nodes.get(index)
	}

	/// Positions of nodes without a parent, in order.
	pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
		self.positions_where(|n| n.parent.is_none())
	}

	/// Positions of the direct children of `parent`, in order.
	pub fn children(&self, parent: usize) -> impl Iterator<Item = usize> + '_ {
		self.positions_where(move |n| n.parent == Some(parent))
	}

	pub fn child_count(&self, parent: usize) -> usize {
		self.children(parent).count()
	}

	fn positions_where<'a>(&'a self, pred: impl Fn(&ResolvedNode) -> bool + 'a) -> impl Iterator<Item = usize> + 'a {
		self.nodes
			.iter()
			.enumerate()
			.filter(move |(_, n)| pred(n))
			.map(|(i, _)| i)
	}
}

impl IntoIterator for ResolvedTree {
	type Item = ResolvedNode;
	type IntoIter = std::vec::IntoIter<ResolvedNode>;

	fn into_iter(self) -> Self::IntoIter {
		self.nodes.into_iter()
	}
}

/// Item of a child list after composites and fragments are expanded.
enum Flat<'a> {
	Element {
		kind: Intrinsic,
		element: ElementRef<'a>,
		depth: usize,
		nesting: usize,
	},
	Text(String),
}

/// Expanded elements are owned; authored ones are borrowed.
enum ElementRef<'a> {
	Borrowed(&'a Element),
	Owned(Element),
}

impl ElementRef<'_> {
	fn get(&self) -> &Element {
		match self {
			ElementRef::Borrowed(e) => e,
			ElementRef::Owned(e) => e,
		}
	}
}

struct Resolver<'c> {
	ctx: &'c ResolveContext,
	nodes: Vec<ResolvedNode>,
}

impl Resolver<'_> {
	/// Expands `nodes` into intrinsic elements and text runs, in order.
	fn flatten<'a>(&self, nodes: &'a [Node], depth: usize, nesting: usize, out: &mut Vec<Flat<'a>>) -> Result<()> {
		for node in nodes {
			match node {
				Node::Text(text) => out.push(Flat::Text(text.clone())),
				Node::Element(element) => self.flatten_element(ElementRef::Borrowed(element), depth, nesting, out)?,
			}
		}
		Ok(())
	}

	fn flatten_element<'a>(
		&self,
		element: ElementRef<'a>,
		depth: usize,
		nesting: usize,
		out: &mut Vec<Flat<'a>>,
	) -> Result<()> {
		match &element.get().kind {
			ElementKind::Intrinsic(kind) => {
				let kind = *kind;
				let nesting = nested(nesting, kind.tag())?;
				out.push(Flat::Element {
					kind,
					element,
					depth,
					nesting,
				});
			}
			ElementKind::Fragment => {
				let nesting = nested(nesting, "fragment")?;
				match element {
					ElementRef::Borrowed(e) => self.flatten(&e.children, depth, nesting, out)?,
					ElementRef::Owned(e) => self.flatten_owned(e.children, depth, nesting, out)?,
				}
			}
			ElementKind::Composite(component) => {
				let depth = depth + 1;
				if depth > self.ctx.max_depth {
					return Err(Error::ResolutionDepthExceeded {
						depth,
						component: component.name().to_string(),
					});
				}
				let e = element.get();
				let expanded = component.render(&e.props, &e.children)?;
				self.flatten_owned(expanded, depth, nesting, out)?;
			}
		}
		Ok(())
	}

	fn flatten_owned<'a>(&self, nodes: Vec<Node>, depth: usize, nesting: usize, out: &mut Vec<Flat<'a>>) -> Result<()> {
		for node in nodes {
			match node {
				Node::Text(text) => out.push(Flat::Text(text)),
				Node::Element(element) => self.flatten_element(ElementRef::Owned(element), depth, nesting, out)?,
			}
		}
		Ok(())
	}

	/// Emits `items` as children of `parent`, recursing into each element.
	fn emit(&mut self, items: Vec<Flat<'_>>, parent: Option<usize>) -> Result<()> {
		let mut index = 0;
		for item in items {
			match item {
				Flat::Text(text) if text.trim().is_empty() => {}
				Flat::Text(text) => {
					return Err(Error::invalid(
						"root",
						"children",
						format!("text '{text}' must be inside a <text> element"),
					));
				}
				Flat::Element {
					kind,
					element,
					depth,
					nesting,
				} => {
					self.emit_element(kind, element.get(), depth, nesting, parent, index)?;
					index += 1;
				}
			}
		}
		Ok(())
	}

	fn emit_element(
		&mut self,
		kind: Intrinsic,
		element: &Element,
		depth: usize,
		nesting: usize,
		parent: Option<usize>,
		index: usize,
	) -> Result<()> {
		let mut children = Vec::new();
		self.flatten(&element.children, depth, nesting, &mut children)?;

		let mut text = String::new();
		let mut elements = Vec::new();
		for child in children {
			match child {
				Flat::Text(run) => text.push_str(&run),
				other => elements.push(other),
			}
		}

		let mut properties = props::translate(kind, &element.props, &self.ctx.variables)?;
		apply_text(kind, &mut properties, text)?;
		apply_defaults(kind, &mut properties);

		let position = self.nodes.len();
		tracing::trace!(kind = %kind, position, depth, "Resolved element");
		self.nodes.push(ResolvedNode {
			kind,
			properties,
			parent,
			index,
		});

		self.emit(elements, Some(position))
	}
}

fn nested(nesting: usize, element: &str) -> Result<usize> {
	let nesting = nesting + 1;
	if nesting > MAX_NESTING {
		return Err(Error::NestingTooDeep {
			depth: nesting,
			element: element.to_string(),
		});
	}
	Ok(nesting)
}

/// Literal text children become the node's characters. Only text nodes may
/// carry them; whitespace between elements is dropped.
fn apply_text(kind: Intrinsic, properties: &mut NodeProperties, text: String) -> Result<()> {
	if text.is_empty() {
		return Ok(());
	}
	if kind.is_text() {
		properties.characters = Some(text);
		return Ok(());
	}
	if text.trim().is_empty() {
		return Ok(());
	}
	Err(Error::invalid(
		kind.tag(),
		"children",
		format!("text '{}' must be inside a <text> element", text.trim()),
	))
}

fn apply_defaults(kind: Intrinsic, properties: &mut NodeProperties) {
	if properties.name.is_none() {
		properties.name = Some(match (&properties.characters, kind) {
			(Some(characters), Intrinsic::Text) if !characters.is_empty() => characters.clone(),
			_ => kind.default_name().to_string(),
		});
	}

	if kind.is_container() {
		let size = properties.size.get_or_insert(Vector::new(0.0, 0.0));
		if size.x == 0.0 {
			size.x = DEFAULT_SIZE;
		}
		if size.y == 0.0 {
			size.y = DEFAULT_SIZE;
		}
	}

	if kind.is_text() {
		if properties.fills.is_empty() {
			properties.fills.push(Paint::solid(Color::BLACK));
		}
		if properties.font_name.is_none() {
			properties.font_name = Some(FontName::default());
		}
		properties.characters.get_or_insert_with(String::new);
	}
}

/// Resolves `root` into a pre-order list of intrinsic nodes.
pub fn resolve(root: &Element, ctx: &ResolveContext) -> Result<ResolvedTree> {
	let mut resolver = Resolver {
		ctx,
		nodes: Vec::new(),
	};
	let mut items = Vec::new();
	resolver.flatten_element(ElementRef::Borrowed(root), 0, 0, &mut items)?;
	resolver.emit(items, None)?;
	Ok(ResolvedTree { nodes: resolver.nodes })
}

/// Invokes `factory` with `props` and resolves what it returns.
///
/// The call counts as one composite expansion toward the depth ceiling.
pub fn resolve_with<F, N>(factory: F, props: Props, ctx: &ResolveContext) -> Result<ResolvedTree>
where
	F: FnOnce(&Props) -> Result<N>,
	N: Into<Node>,
{
	let root = factory(&props)?;
	let root = match root.into() {
		Node::Element(element) => element,
		Node::Text(text) => return Err(Error::invalid("root", "children", format!("text '{text}' cannot be a root"))),
	};
	let wrapped = Element::fragment([Node::Element(root)]);
	let resolved = resolve(&wrapped, &ctx.clone().with_max_depth(ctx.max_depth.saturating_sub(1)))?;
	Ok(resolved)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::element::component;

	fn text(s: &str) -> Element {
		Element::new(Intrinsic::Text).text(s)
	}

	#[test]
	fn container_with_two_texts() {
		let root = Element::new(Intrinsic::Frame)
			.prop("name", "Card")
			.child(text("Title"))
			.child(text("Body"));

		let tree = resolve(&root, &ResolveContext::default()).unwrap();
		assert_eq!(tree.len(), 3);
		assert_eq!(tree.child_count(0), 2);
		assert_eq!(tree.roots().collect::<Vec<_>>(), vec![0]);

		let nodes = tree.nodes();
		assert_eq!(nodes[0].properties.size, Some(Vector::new(DEFAULT_SIZE, DEFAULT_SIZE)));
		assert_eq!(nodes[1].properties.characters.as_deref(), Some("Title"));
		assert_eq!(nodes[1].properties.name.as_deref(), Some("Title"));
		assert_eq!((nodes[2].parent, nodes[2].index), (Some(0), 1));
		assert_eq!(nodes[2].properties.fills, vec![Paint::solid(Color::BLACK)]);
	}

	#[test]
	fn text_runs_concatenate() {
		let root = Element::new(Intrinsic::Text).text("Hello, ").text("world");
		let tree = resolve(&root, &ResolveContext::default()).unwrap();
		assert_eq!(tree.nodes()[0].properties.characters.as_deref(), Some("Hello, world"));
	}

	#[test]
	fn explicit_size_is_kept_per_axis() {
		let root = Element::new(Intrinsic::Frame).prop("width", 320);
		let tree = resolve(&root, &ResolveContext::default()).unwrap();
		assert_eq!(tree.nodes()[0].properties.size, Some(Vector::new(320.0, DEFAULT_SIZE)));

		let rect = resolve(&Element::new(Intrinsic::Rectangle), &ResolveContext::default()).unwrap();
		assert_eq!(rect.nodes()[0].properties.size, None);
	}

	#[test]
	fn composites_expand_in_place() {
		let row = component("Row", |props, children| {
			Ok(vec![
				Element::new(Intrinsic::Frame)
					.prop("layout", "row")
					.prop("gap", props.get("gap").cloned().unwrap_or(json!(0)))
					.children(children.iter().cloned())
					.into(),
			])
		});
		let pair = component("Pair", |_, _| Ok(vec![text("a").into(), text("b").into()]));

		let root = Element::new(Intrinsic::Frame)
			.child(Element::composite(row).prop("gap", 4).child(Element::composite(pair)))
			.child(text("after"));

		let tree = resolve(&root, &ResolveContext::default()).unwrap();
		let kinds: Vec<_> = tree.nodes().iter().map(|n| n.kind).collect();
		assert_eq!(
			kinds,
			vec![Intrinsic::Frame, Intrinsic::Frame, Intrinsic::Text, Intrinsic::Text, Intrinsic::Text]
		);
		assert_eq!(tree.nodes()[1].properties.item_spacing, Some(4.0));
		assert_eq!(tree.child_count(0), 2);
		assert_eq!(tree.child_count(1), 2);
		assert_eq!(tree.nodes()[4].parent, Some(0));
		assert_eq!(tree.nodes()[4].index, 1);
	}

	#[test]
	fn fragments_at_the_root_give_several_roots() {
		let root = Element::fragment([text("a").into(), text("b").into()]);
		let tree = resolve(&root, &ResolveContext::default()).unwrap();
		assert_eq!(tree.roots().count(), 2);
		assert_eq!(tree.nodes()[1].index, 1);
	}

	#[test]
	fn self_referencing_component_hits_the_ceiling() {
		fn forever(_: &Props, _: &[Node]) -> Result<Vec<Node>> {
			Ok(vec![Element::composite(component("Forever", forever)).into()])
		}
		let root = Element::composite(component("Forever", forever));

		let err = resolve(&root, &ResolveContext::default()).unwrap_err();
		match err {
			Error::ResolutionDepthExceeded { depth, component } => {
				assert_eq!(depth, MAX_DEPTH + 1);
				assert_eq!(component, "Forever");
			}
			other => panic!("expected depth error, got {other}"),
		}
	}

	#[test]
	fn nested_recursion_through_intrinsics_is_caught() {
		fn nest(_: &Props, _: &[Node]) -> Result<Vec<Node>> {
			Ok(vec![Element::new(Intrinsic::Frame).child(Element::composite(component("Nest", nest))).into()])
		}
		let err = resolve(&Element::composite(component("Nest", nest)), &ResolveContext::default().with_max_depth(10))
			.unwrap_err();
		assert!(matches!(err, Error::ResolutionDepthExceeded { depth: 11, .. }));
	}

	fn nested_frames(levels: usize) -> Element {
		let mut element = Element::new(Intrinsic::Frame);
		for _ in 1..levels {
			element = Element::new(Intrinsic::Frame).child(element);
		}
		element
	}

	#[test]
	fn deep_intrinsic_nesting_is_an_error() {
		let tree = resolve(&nested_frames(MAX_NESTING), &ResolveContext::default()).unwrap();
		assert_eq!(tree.len(), MAX_NESTING);
		assert_eq!(tree.nodes()[MAX_NESTING - 1].parent, Some(MAX_NESTING - 2));

		let err = resolve(&nested_frames(MAX_NESTING + 1), &ResolveContext::default()).unwrap_err();
		match err {
			Error::NestingTooDeep { depth, element } => {
				assert_eq!(depth, MAX_NESTING + 1);
				assert_eq!(element, "frame");
			}
			other => panic!("expected nesting error, got {other}"),
		}
	}

	#[test]
	fn deep_fragment_nesting_is_an_error() {
		let mut root = Element::fragment([Node::Element(text("leaf"))]);
		for _ in 0..MAX_NESTING {
			root = Element::fragment([Node::Element(root)]);
		}
		let err = resolve(&root, &ResolveContext::default()).unwrap_err();
		assert!(matches!(err, Error::NestingTooDeep { ref element, .. } if element == "fragment"), "{err}");
	}

	#[test]
	fn text_outside_text_elements_is_rejected() {
		let root = Element::new(Intrinsic::Frame).text("loose");
		let err = resolve(&root, &ResolveContext::default()).unwrap_err();
		assert!(err.to_string().contains("must be inside a <text> element"), "{err}");

		let spaced = Element::new(Intrinsic::Frame).text("  \n").child(text("ok"));
		assert_eq!(resolve(&spaced, &ResolveContext::default()).unwrap().len(), 2);
	}

	#[test]
	fn resolve_with_passes_props() {
		let mut props = Props::new();
		props.insert("title".into(), json!("Hello"));

		let tree = resolve_with(
			|p: &Props| Ok(text(p["title"].as_str().unwrap_or_default())),
			props,
			&ResolveContext::default(),
		)
		.unwrap();
		assert_eq!(tree.nodes()[0].properties.characters.as_deref(), Some("Hello"));
	}
}
