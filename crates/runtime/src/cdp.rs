//! `Runtime.evaluate` request and result shapes.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::connection::Connection;
use crate::error::{Error, Result};

pub const EVALUATE_METHOD: &str = "Runtime.evaluate";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
	pub expression: String,
	pub await_promise: bool,
	pub return_by_value: bool,
}

impl EvaluateParams {
	/// Evaluates `expression`, awaiting promises and returning JSON values.
	pub fn new(expression: impl Into<String>) -> Self {
		Self {
			expression: expression.into(),
			await_promise: true,
			return_by_value: true,
		}
	}
}

/// Mirror of a JavaScript value handed back by the page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
	#[serde(rename = "type", default)]
	pub kind: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subtype: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub class_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
	#[serde(default)]
	pub text: String,
	#[serde(default)]
	pub line_number: i64,
	#[serde(default)]
	pub column_number: i64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
	/// Converts a thrown exception into a [`Error::Remote`].
	///
	/// The exception's description usually carries both the message and the
	/// stack; the first line becomes the message and the whole text the stack.
	pub fn into_error(self) -> Error {
		let exception = self.exception.unwrap_or_default();
		let name = exception.class_name.unwrap_or_else(|| "Error".to_string());
		match exception.description {
			Some(description) => {
				let message = description
					.lines()
					.next()
					.unwrap_or_default()
					.trim_start_matches(&format!("{name}: "))
					.to_string();
				Error::Remote {
					name,
					message,
					stack: Some(description),
				}
			}
			None => Error::Remote {
				name,
				message: if self.text.is_empty() {
					"evaluation failed".to_string()
				} else {
					self.text
				},
				stack: None,
			},
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
	#[serde(default)]
	pub result: RemoteObject,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exception_details: Option<ExceptionDetails>,
}

impl EvaluateResult {
	/// The returned value, or the thrown exception as an error.
	///
	/// `undefined` comes back as `null`.
	pub fn into_value(self) -> Result<Value> {
		if let Some(details) = self.exception_details {
			return Err(details.into_error());
		}
		Ok(self.result.value.unwrap_or(Value::Null))
	}
}

impl Connection {
	/// Evaluates a JavaScript expression in the page and returns its value.
	pub async fn evaluate(&self, expression: &str) -> Result<Value> {
		self.evaluate_with_timeout(expression, self.config().request_timeout)
			.await
	}

	pub async fn evaluate_with_timeout(&self, expression: &str, timeout: Duration) -> Result<Value> {
		let params = serde_json::to_value(EvaluateParams::new(expression))?;
		let raw = self.send_with_timeout(EVALUATE_METHOD, params, timeout).await?;
		let result: EvaluateResult = serde_json::from_value(raw)
			.map_err(|e| Error::ProtocolError(format!("malformed evaluate result: {e}")))?;
		result.into_value()
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn params_use_wire_names() {
		let params = serde_json::to_value(EvaluateParams::new("1 + 1")).unwrap();
		assert_eq!(
			params,
			json!({"expression": "1 + 1", "awaitPromise": true, "returnByValue": true})
		);
	}

	#[test]
	fn returns_value_by_value() {
		let result: EvaluateResult =
			serde_json::from_value(json!({"result": {"type": "object", "value": {"a": 1}}})).unwrap();
		assert_eq!(result.into_value().unwrap(), json!({"a": 1}));

		let result: EvaluateResult = serde_json::from_value(json!({"result": {"type": "undefined"}})).unwrap();
		assert_eq!(result.into_value().unwrap(), Value::Null);
	}

	#[test]
	fn exceptions_become_remote_errors() {
		let result: EvaluateResult = serde_json::from_value(json!({
			"result": {"type": "object", "subtype": "error"},
			"exceptionDetails": {
				"text": "Uncaught",
				"lineNumber": 0,
				"columnNumber": 6,
				"exception": {
					"type": "object",
					"className": "TypeError",
					"description": "TypeError: figma.foo is not a function\n    at <anonymous>:1:7"
				}
			}
		}))
		.unwrap();

		match result.into_value().unwrap_err() {
			Error::Remote { name, message, stack } => {
				assert_eq!(name, "TypeError");
				assert_eq!(message, "figma.foo is not a function");
				assert!(stack.unwrap().contains("<anonymous>:1:7"));
			}
			other => panic!("expected remote error, got {other:?}"),
		}
	}

	#[test]
	fn exception_without_description_uses_text() {
		let details = ExceptionDetails {
			text: "Uncaught (in promise)".to_string(),
			line_number: 0,
			column_number: 0,
			exception: None,
		};
		assert_eq!(details.into_error().to_string(), "Error: Uncaught (in promise)");
	}
}
