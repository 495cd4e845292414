//! Session-scoped GUID allocation for resolved trees.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use fu_protocol::{Guid, NodeChange, ParentIndex};

use crate::error::{Error, Result};
use crate::resolver::ResolvedTree;

/// Highest local id handed out by any allocator in this process. New
/// allocators start above it so consecutive batches never overlap.
static HIGH_WATER: AtomicU32 = AtomicU32::new(0);

/// Local ids are seeded below this bound to leave room for the counter.
const SEED_SPAN: u64 = 1 << 30;

/// Hands out `(session, local)` ids from a monotonically increasing counter.
///
/// The counter is atomic, so one allocator can be shared between tasks
/// building batches concurrently.
#[derive(Debug)]
pub struct IdAllocator {
	session: u32,
	next: AtomicU32,
}

impl IdAllocator {
	/// Allocator seeded from the wall clock.
	pub fn new(session: u32) -> Self {
		let millis = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|d| d.as_millis())
			.unwrap_or_default();
		let clock = (millis % u128::from(SEED_SPAN)) as u32;
		let seed = clock.max(HIGH_WATER.load(Ordering::Relaxed)).saturating_add(1);
		Self::with_seed(session, seed)
	}

	/// Allocator whose first id has local part `seed`.
	pub fn with_seed(session: u32, seed: u32) -> Self {
		Self {
			session,
			next: AtomicU32::new(seed),
		}
	}

	pub fn session(&self) -> u32 {
		self.session
	}

	/// Returns a fresh id, or [`Error::IdsExhausted`] once the local counter
	/// would wrap.
	pub fn next_guid(&self) -> Result<Guid> {
		let local = self
			.next
			.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1))
			.map_err(|_| Error::IdsExhausted { session: self.session })?;
		HIGH_WATER.fetch_max(local, Ordering::Relaxed);
		Ok(Guid::new(self.session, local))
	}

	/// Assigns ids to every node of `tree` in pre-order and turns parent
	/// positions into parent links.
	///
	/// Root nodes are attached to `parent` when given.
	pub fn allocate(&self, tree: &ResolvedTree, parent: Option<Guid>) -> Result<Vec<NodeChange>> {
		let mut guids: Vec<Guid> = Vec::with_capacity(tree.len());
		let mut changes = Vec::with_capacity(tree.len());

		for node in tree.nodes() {
			let guid = self.next_guid()?;
			let parent_guid = match node.parent {
				Some(position) => guids.get(position).copied(),
				None => parent,
			};

			let mut change = NodeChange::created(guid, node.node_type());
			change.parent_index = parent_guid.map(|p| ParentIndex::at(p, node.index));
			change.properties = node.properties.clone();

			tracing::trace!(%guid, parent = ?parent_guid, "Allocated node id");
			guids.push(guid);
			changes.push(change);
		}

		Ok(changes)
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use fu_protocol::NodeType;

	use super::*;
	use crate::element::{Element, Intrinsic};
	use crate::resolver::{ResolveContext, resolve};

	fn card() -> ResolvedTree {
		let root = Element::new(Intrinsic::Frame)
			.child(Element::new(Intrinsic::Text).text("a"))
			.child(
				Element::new(Intrinsic::Frame)
					.child(Element::new(Intrinsic::Rectangle))
					.child(Element::new(Intrinsic::Ellipse)),
			)
			.child(Element::new(Intrinsic::Text).text("b"));
		resolve(&root, &ResolveContext::default()).unwrap()
	}

	#[test]
	fn parents_are_allocated_before_children() {
		let changes = IdAllocator::with_seed(7, 100).allocate(&card(), None).unwrap();
		assert_eq!(changes.len(), 6);

		let mut seen = HashSet::new();
		for change in &changes {
			if let Some(parent) = change.parent_guid() {
				assert!(seen.contains(&parent), "{} refers to later parent {}", change.guid, parent);
			}
			assert!(seen.insert(change.guid), "duplicate {}", change.guid);
		}
		assert!(changes[0].parent_index.is_none());
	}

	#[test]
	fn ids_follow_pre_order() {
		let changes = IdAllocator::with_seed(7, 100).allocate(&card(), Some(Guid::new(0, 1))).unwrap();
		let locals: Vec<u32> = changes.iter().map(|c| c.guid.local).collect();
		assert_eq!(locals, vec![100, 101, 102, 103, 104, 105]);
		assert!(changes.iter().all(|c| c.guid.session == 7));

		assert_eq!(changes[0].parent_guid(), Some(Guid::new(0, 1)));
		assert_eq!(changes[1].parent_guid(), Some(Guid::new(7, 100)));
		assert_eq!(changes[3].parent_guid(), Some(Guid::new(7, 102)));
		assert_eq!(changes[5].parent_guid(), Some(Guid::new(7, 100)));
		assert_eq!(changes[3].node_type, NodeType::Rectangle);
	}

	#[test]
	fn sibling_positions_sort_in_authored_order() {
		let changes = IdAllocator::with_seed(1, 1).allocate(&card(), None).unwrap();
		let under_root: Vec<&str> = changes
			.iter()
			.filter(|c| c.parent_guid() == Some(changes[0].guid))
			.map(|c| c.parent_index.as_ref().map(|p| p.position.as_str()).unwrap_or_default())
			.collect();
		let mut sorted = under_root.clone();
		sorted.sort();
		assert_eq!(under_root, sorted);
		assert_eq!(under_root.len(), 3);
	}

	#[test]
	fn batches_never_reuse_ids() {
		let tree = card();
		let first = IdAllocator::new(3).allocate(&tree, None).unwrap();
		let second = IdAllocator::new(3).allocate(&tree, None).unwrap();

		let first_max = first.iter().map(|c| c.guid.local).max().unwrap();
		let second_min = second.iter().map(|c| c.guid.local).min().unwrap();
		assert!(second_min > first_max, "{second_min} <= {first_max}");
	}

	#[test]
	fn shared_allocator_is_collision_free() {
		let allocator = std::sync::Arc::new(IdAllocator::with_seed(9, 1));
		let handles: Vec<_> = (0..4)
			.map(|_| {
				let allocator = allocator.clone();
				std::thread::spawn(move || (0..250).map(|_| allocator.next_guid().unwrap()).collect::<Vec<_>>())
			})
			.collect();

		let mut all = HashSet::new();
		for handle in handles {
			for guid in handle.join().unwrap() {
				assert!(all.insert(guid));
			}
		}
		assert_eq!(all.len(), 1000);
	}

	#[test]
	fn exhausted_counter_errors_instead_of_wrapping() {
		// Handing out ids near the top would raise the process-wide high water
		// mark for other tests, so start at the last value.
		let allocator = IdAllocator::with_seed(4, u32::MAX);
		assert!(matches!(allocator.next_guid(), Err(Error::IdsExhausted { session: 4 })));
		assert!(allocator.next_guid().is_err());

		let err = IdAllocator::with_seed(4, u32::MAX).allocate(&card(), None).unwrap_err();
		assert!(matches!(err, Error::IdsExhausted { .. }), "{err}");
	}
}
