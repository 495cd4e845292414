//! Name-to-id registry for document color variables.
//!
//! The registry is loaded lazily from the document, at most once, and then
//! handed to the resolver as an immutable snapshot. [`VariableRegistry::invalidate`]
//! forces the next [`VariableRegistry::ensure_loaded`] to fetch again.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use fu_protocol::Guid;
use parking_lot::RwLock;
use serde::Deserialize;
use tokio::sync::Mutex as TokioMutex;

use crate::error::Result;

/// Immutable variable table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableMap {
	by_name: HashMap<String, Guid>,
}

/// One `{ name, id }` entry as returned by the document.
#[derive(Debug, Clone, Deserialize)]
pub struct VariableEntry {
	pub name: String,
	pub id: String,
}

impl VariableMap {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a map from document entries, parsing `VariableID:<s>:<l>` ids.
	pub fn from_entries(entries: impl IntoIterator<Item = VariableEntry>) -> Result<Self> {
		let mut map = Self::new();
		for entry in entries {
			let guid = Guid::from_variable_id(&entry.id)?;
			map.insert(entry.name, guid);
		}
		Ok(map)
	}

	pub fn insert(&mut self, name: impl Into<String>, id: Guid) {
		self.by_name.insert(name.into(), id);
	}

	pub fn get(&self, name: &str) -> Option<Guid> {
		self.by_name.get(name).copied()
	}

	pub fn len(&self) -> usize {
		self.by_name.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_name.is_empty()
	}

	/// Entries sorted by name.
	pub fn iter(&self) -> impl Iterator<Item = (&str, Guid)> {
		let mut entries: Vec<_> = self.by_name.iter().map(|(name, id)| (name.as_str(), *id)).collect();
		entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
		entries.into_iter()
	}
}

impl FromIterator<(String, Guid)> for VariableMap {
	fn from_iter<I: IntoIterator<Item = (String, Guid)>>(iter: I) -> Self {
		Self {
			by_name: iter.into_iter().collect(),
		}
	}
}

/// Write-once cache of the document's variables.
#[derive(Default)]
pub struct VariableRegistry {
	loaded: RwLock<Option<Arc<VariableMap>>>,
	load_gate: TokioMutex<()>,
}

impl VariableRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_loaded(&self) -> bool {
		self.loaded.read().is_some()
	}

	/// Current table, empty when nothing has been loaded.
	pub fn snapshot(&self) -> Arc<VariableMap> {
		self.loaded.read().clone().unwrap_or_default()
	}

	/// Returns the loaded table, running `load` first if needed.
	///
	/// Concurrent callers share one load. A failed load leaves the registry
	/// unloaded so a later call can try again.
	pub async fn ensure_loaded<F, Fut>(&self, load: F) -> Result<Arc<VariableMap>>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<VariableMap>>,
	{
		let cached = self.loaded.read().clone();
		if let Some(map) = cached {
			return Ok(map);
		}

		let _gate = self.load_gate.lock().await;
		let cached = self.loaded.read().clone();
		if let Some(map) = cached {
			return Ok(map);
		}

		let map = Arc::new(load().await?);
		tracing::debug!(count = map.len(), "Loaded document variables");
		*self.loaded.write() = Some(map.clone());
		Ok(map)
	}

	/// Replaces the table without going to the document.
	pub fn preload(&self, map: VariableMap) {
		*self.loaded.write() = Some(Arc::new(map));
	}

	pub fn invalidate(&self) {
		self.loaded.write().take();
	}
}
