//! Plugin-API command bridge for [`Figma`].
//!
//! Commands run through `window.__figmaRpc(name, args)`, a function defined
//! by an injected script bundle. Failures come back as `{"__error": message}`.

use std::sync::atomic::Ordering;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::Figma;
use crate::error::{Error, Result};

pub(super) const RPC_READY: &str = "typeof window.__figmaRpc === \"function\"";

impl Figma {
	/// Whether the page already has the bridge.
	pub async fn rpc_available(&self) -> Result<bool> {
		self.evaluate_as(RPC_READY).await
	}

	/// Makes sure `window.__figmaRpc` exists, evaluating `bundle` if needed.
	pub async fn inject_rpc(&self, bundle: &str) -> Result<()> {
		if self.rpc_available().await? {
			self.rpc_ready.store(true, Ordering::SeqCst);
			return Ok(());
		}

		tracing::debug!(len = bundle.len(), "Injecting RPC bundle");
		self.evaluate(bundle).await?;

		if !self.rpc_available().await? {
			return Err(Error::Command {
				command: "inject".into(),
				message: "bundle did not define window.__figmaRpc".into(),
			});
		}
		self.rpc_ready.store(true, Ordering::SeqCst);
		Ok(())
	}

	async fn ensure_rpc(&self) -> Result<()> {
		if self.rpc_ready.load(Ordering::SeqCst) {
			return Ok(());
		}
		match &self.rpc_bundle {
			Some(bundle) => self.inject_rpc(bundle).await,
			None if self.rpc_available().await? => {
				self.rpc_ready.store(true, Ordering::SeqCst);
				Ok(())
			}
			None => Err(Error::Command {
				command: "inject".into(),
				message: "window.__figmaRpc is not defined and no bundle was configured".into(),
			}),
		}
	}

	/// Runs a bridge command and returns its raw result.
	pub async fn command(&self, name: &str, args: &impl Serialize) -> Result<Value> {
		self.ensure_rpc().await?;

		let expression = format!(
			"window.__figmaRpc({}, {})",
			serde_json::to_string(name)?,
			serde_json::to_string(args)?
		);
		let result = self.evaluate(&expression).await?;

		if let Some(message) = result.as_object().and_then(|o| o.get("__error")) {
			return Err(Error::Command {
				command: name.to_string(),
				message: message.as_str().map_or_else(|| message.to_string(), str::to_string),
			});
		}
		Ok(result)
	}

	/// Runs a bridge command and deserializes its result.
	pub async fn command_as<T: DeserializeOwned>(&self, name: &str, args: &impl Serialize) -> Result<T> {
		let value = self.command(name, args).await?;
		serde_json::from_value(value).map_err(|e| Error::UnexpectedResponse(format!("{name}: {e}")))
	}
}
