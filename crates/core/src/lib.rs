//! fu: render declarative element trees into a live design document.
//!
//! A tree of [`Element`]s goes through four stages:
//!
//! 1. [`resolver`] expands composites and fragments and translates props
//!    into canonical node properties, producing a flat pre-order
//!    [`ResolvedTree`]
//! 2. [`allocator`] assigns session-scoped ids and parent links
//! 3. [`render`] encodes one NODE_CHANGES message per node and frames it
//! 4. [`multiplayer`] ships the frames over the collaboration socket
//!
//! [`Figma`] drives the document page over the debugging channel: it finds
//! the session id, the current page and the local color variables a render
//! needs.
//!
//! # Example
//!
//! ```ignore
//! use fu::{Element, Figma, Intrinsic, MultiplayerChannel, RenderOptions, send_batch};
//!
//! #[tokio::main]
//! async fn main() -> fu::Result<()> {
//!     let figma = Figma::connect(Default::default());
//!     let renderer = figma.renderer(RenderOptions::default()).await?;
//!
//!     let card = Element::new(Intrinsic::Frame)
//!         .prop("name", "Card")
//!         .prop("padding", 16)
//!         .child(Element::new(Intrinsic::Text).text("Hello"));
//!     let batch = renderer.render(&card)?;
//!
//!     let url = figma.multiplayer_url("ws-1").await?;
//!     let mut channel = MultiplayerChannel::connect(&url, None).await?;
//!     send_batch(&mut channel, &batch).await?;
//!     channel.close().await
//! }
//! ```

pub mod allocator;
pub mod element;
pub mod error;
pub mod figma;
pub mod multiplayer;
pub mod props;
pub mod render;
pub mod resolver;
pub mod templates;
pub mod variables;

pub use allocator::IdAllocator;
pub use element::{Component, Element, ElementKind, FnComponent, Intrinsic, Node, Props, component};
pub use error::{Error, Result};
pub use figma::{Figma, Status, file_key_from_url};
pub use fu_protocol as protocol;
pub use fu_protocol::{Guid, Message, NodeChange, NodeType};
pub use fu_runtime as runtime;
pub use fu_runtime::ConnectionConfig;
pub use multiplayer::{FrameSink, MultiplayerChannel};
pub use render::{RenderBatch, RenderOptions, Renderer, send_batch};
pub use resolver::{MAX_DEPTH, MAX_NESTING, ResolveContext, ResolvedNode, ResolvedTree, resolve, resolve_with};
pub use templates::{TemplateComponent, TemplateDocument, TemplateNode};
pub use variables::{VariableEntry, VariableMap, VariableRegistry};
