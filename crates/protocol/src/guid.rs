//! Session-scoped node identifiers.
//!
//! Every node in a collaborative document is named by a `(session, local)`
//! pair. The textual form used by the plugin API and the CLI is
//! `"<session>:<local>"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Two-part node identifier, unique within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Guid {
	/// Editing session that allocated the node.
	#[serde(rename = "sessionID")]
	pub session: u32,
	/// Session-local counter value.
	#[serde(rename = "localID")]
	pub local: u32,
}

impl Guid {
	pub const fn new(session: u32, local: u32) -> Self {
		Self { session, local }
	}

	/// Parses a variable id of the form `VariableID:<session>:<local>`.
	///
	/// Plain `"<session>:<local>"` strings are accepted too.
	pub fn from_variable_id(id: &str) -> Result<Self, GuidParseError> {
		id.strip_prefix("VariableID:").unwrap_or(id).parse()
	}
}

impl fmt::Display for Guid {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.session, self.local)
	}
}

/// Returned when a string is not a `"<session>:<local>"` pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid node id '{input}': expected '<session>:<local>'")]
pub struct GuidParseError {
	pub input: String,
}

impl FromStr for Guid {
	type Err = GuidParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let err = || GuidParseError { input: s.to_string() };
		let (session, local) = s.trim().split_once(':').ok_or_else(err)?;
		Ok(Self {
			session: session.parse().map_err(|_| err())?,
			local: local.parse().map_err(|_| err())?,
		})
	}
}
