//! Tree-to-wire pipeline: resolve, allocate, encode, frame.

use std::sync::Arc;

use fu_protocol::{Guid, Message, NodeChange, framing};
use serde::Serialize;

use crate::allocator::IdAllocator;
use crate::element::{Element, Node, Props};
use crate::error::Result;
use crate::multiplayer::FrameSink;
use crate::resolver::{self, ResolveContext, ResolvedTree};
use crate::variables::VariableMap;

/// Settings for one render batch.
#[derive(Debug, Clone)]
pub struct RenderOptions {
	/// Session the new node ids belong to.
	pub session_id: u32,
	/// Existing node the batch's roots are attached to.
	pub parent: Option<Guid>,
	/// When set, frames carry the `fig-wire` header with this version.
	pub header_version: Option<u32>,
	pub compression_level: i32,
	/// Fixed first local id; the wall clock seeds it otherwise.
	pub seed: Option<u32>,
}

impl Default for RenderOptions {
	fn default() -> Self {
		Self {
			session_id: 0,
			parent: None,
			header_version: None,
			compression_level: framing::DEFAULT_LEVEL,
			seed: None,
		}
	}
}

impl RenderOptions {
	pub fn new(session_id: u32) -> Self {
		Self {
			session_id,
			..Self::default()
		}
	}

	pub fn with_parent(mut self, parent: Guid) -> Self {
		self.parent = Some(parent);
		self
	}

	pub fn with_header_version(mut self, version: u32) -> Self {
		self.header_version = Some(version);
		self
	}

	pub fn with_compression_level(mut self, level: i32) -> Self {
		self.compression_level = level;
		self
	}

	pub fn with_seed(mut self, seed: u32) -> Self {
		self.seed = Some(seed);
		self
	}
}

/// Output of one render: one message and one frame per node, in send order.
#[derive(Debug, Clone, Serialize)]
pub struct RenderBatch {
	pub changes: Vec<NodeChange>,
	#[serde(skip)]
	pub messages: Vec<Message>,
	#[serde(skip)]
	pub frames: Vec<Vec<u8>>,
}

impl RenderBatch {
	pub fn len(&self) -> usize {
		self.changes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.changes.is_empty()
	}

	/// Id of the first root node.
	pub fn root(&self) -> Option<Guid> {
		self.changes.first().map(|c| c.guid)
	}

	pub fn frame_bytes(&self) -> usize {
		self.frames.iter().map(Vec::len).sum()
	}
}

/// Turns element trees into framed node-change messages.
pub struct Renderer {
	options: RenderOptions,
	allocator: IdAllocator,
	context: ResolveContext,
}

impl Renderer {
	pub fn new(options: RenderOptions) -> Self {
		let allocator = match options.seed {
			Some(seed) => IdAllocator::with_seed(options.session_id, seed),
			None => IdAllocator::new(options.session_id),
		};
		Self {
			options,
			allocator,
			context: ResolveContext::default(),
		}
	}

	/// Uses `variables` to resolve `{"$var": ...}` colors.
	pub fn with_variables(mut self, variables: Arc<VariableMap>) -> Self {
		self.context.variables = variables;
		self
	}

	pub fn with_context(mut self, context: ResolveContext) -> Self {
		self.context = context;
		self
	}

	pub fn options(&self) -> &RenderOptions {
		&self.options
	}

	pub fn render(&self, root: &Element) -> Result<RenderBatch> {
		let tree = resolver::resolve(root, &self.context)?;
		self.encode(&tree)
	}

	/// Renders what `factory` returns for `props`.
	pub fn render_with<F, N>(&self, factory: F, props: Props) -> Result<RenderBatch>
	where
		F: FnOnce(&Props) -> Result<N>,
		N: Into<Node>,
	{
		let tree = resolver::resolve_with(factory, props, &self.context)?;
		self.encode(&tree)
	}

	/// Allocates ids for an already resolved tree and frames every change.
	pub fn encode(&self, tree: &ResolvedTree) -> Result<RenderBatch> {
		let changes = self.allocator.allocate(tree, self.options.parent)?;

		let mut messages = Vec::with_capacity(changes.len());
		let mut frames = Vec::with_capacity(changes.len());
		for change in &changes {
			let message = Message::node_changes(self.options.session_id, vec![change.clone()]);
			let wire = fu_protocol::encode_message(&message);
			let frame = framing::wrap_with_level(&wire.payload, self.options.header_version, self.options.compression_level)?;
			tracing::trace!(guid = %change.guid, payload = wire.payload.len(), frame = frame.len(), "Encoded node change");
			messages.push(message);
			frames.push(frame);
		}

		tracing::debug!(nodes = changes.len(), session = self.options.session_id, "Rendered batch");
		Ok(RenderBatch {
			changes,
			messages,
			frames,
		})
	}
}

/// Sends every frame of `batch` to `sink`, in order.
pub async fn send_batch(sink: &mut dyn FrameSink, batch: &RenderBatch) -> Result<()> {
	for frame in &batch.frames {
		sink.send_frame(frame.clone()).await?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use fu_protocol::{MessageType, NodeType, decode_frame};

	use super::*;
	use crate::element::Intrinsic;

	#[test]
	fn one_frame_per_node() {
		let root = Element::new(Intrinsic::Frame)
			.child(Element::new(Intrinsic::Text).text("a"))
			.child(Element::new(Intrinsic::Text).text("b"));
		let renderer = Renderer::new(RenderOptions::new(42).with_parent(Guid::new(0, 1)).with_seed(10));

		let batch = renderer.render(&root).unwrap();
		assert_eq!(batch.len(), 3);
		assert_eq!(batch.frames.len(), 3);
		assert_eq!(batch.root(), Some(Guid::new(42, 10)));

		for (frame, change) in batch.frames.iter().zip(&batch.changes) {
			assert!(framing::is_compressed(frame));
			let message = decode_frame(frame).unwrap();
			assert_eq!(message.kind, MessageType::NodeChanges);
			assert_eq!(message.session_id, Some(42));
			assert_eq!(message.node_changes, vec![change.clone()]);
		}
		assert_eq!(batch.changes[2].node_type, NodeType::Text);
	}

	#[test]
	fn header_version_is_applied() {
		let renderer = Renderer::new(RenderOptions::new(1).with_seed(1).with_header_version(151));
		let batch = renderer.render(&Element::new(Intrinsic::Rectangle)).unwrap();
		assert!(framing::has_header(&batch.frames[0]));
		assert_eq!(framing::strip_header(&batch.frames[0]).unwrap().0, Some(151));
	}

	#[tokio::test]
	async fn send_batch_preserves_order() {
		let renderer = Renderer::new(RenderOptions::new(1).with_seed(1));
		let batch = renderer
			.render(&Element::new(Intrinsic::Frame).child(Element::new(Intrinsic::Ellipse)))
			.unwrap();

		let mut sink: Vec<Vec<u8>> = Vec::new();
		send_batch(&mut sink, &batch).await.unwrap();
		assert_eq!(sink, batch.frames);
	}

	#[test]
	fn batch_serializes_changes_only() {
		let renderer = Renderer::new(RenderOptions::new(1).with_seed(5));
		let batch = renderer.render(&Element::new(Intrinsic::Frame).prop("name", "Root")).unwrap();
		let json = serde_json::to_value(&batch).unwrap();
		assert_eq!(json["changes"][0]["guid"]["localID"], 5);
		assert_eq!(json["changes"][0]["properties"]["name"], "Root");
		assert!(json.get("frames").is_none());
	}
}
