//! Line-oriented JSON wire protocol
//!
//! One JSON object per line in both directions. Requests carry an action
//! name plus action-specific params; responses are a tagged union of
//! progress, result and error messages. Ordering is emission order on
//! the stream, nothing else.

pub mod dispatch;

pub use dispatch::Dispatcher;

use std::io::Write;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::PhotoRecord;

/// A single request line from the parent process
#[derive(Debug, Deserialize)]
pub struct Request {
	pub action: String,
	#[serde(default = "empty_params")]
	pub params: Value,
}

fn empty_params() -> Value {
	Value::Object(serde_json::Map::new())
}

/// Messages emitted on the output stream
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Response {
	Progress { current: usize, total: usize },
	Result { data: Value },
	Error { code: ErrorCode, message: String },
}

/// Error taxonomy of the wire protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// Embedder or engine construction failed; the process exits non-zero
	InitError,
	/// Input line was not valid JSON; the line is skipped
	ParseError,
	/// Request named an action outside the known set
	UnknownAction,
	/// An action handler failed; reported, loop continues
	ProcessingError,
}

/// Parameters for `embed_photos`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmbedPhotosParams {
	#[serde(default)]
	pub paths: Vec<String>,
}

/// Parameters for `find_similar`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FindSimilarParams {
	#[serde(default)]
	pub embeddings: Vec<PhotoRecord>,
	pub threshold: Option<f32>,
}

/// Parameters for `calculate_similarity`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimilarityParams {
	pub embedding1: Vec<f32>,
	pub embedding2: Vec<f32>,
}

/// Serializes protocol messages, one flushed line each
///
/// The parent interleaves progress and result interpretation by line
/// order, so every message is flushed before the next is produced.
pub struct MessageWriter<W: Write> {
	out: W,
}

impl<W: Write> MessageWriter<W> {
	pub fn new(out: W) -> Self {
		Self { out }
	}

	pub fn send(&mut self, message: &Response) -> Result<()> {
		serde_json::to_writer(&mut self.out, message).context("Failed to serialize message")?;
		self.out.write_all(b"\n")?;
		self.out.flush()?;
		Ok(())
	}

	pub fn progress(&mut self, current: usize, total: usize) -> Result<()> {
		self.send(&Response::Progress { current, total })
	}

	pub fn result(&mut self, data: Value) -> Result<()> {
		self.send(&Response::Result { data })
	}

	pub fn error(&mut self, code: ErrorCode, message: &str) -> Result<()> {
		self.send(&Response::Error {
			code,
			message: message.to_string(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn responses_serialize_with_type_tags() {
		let progress = serde_json::to_string(&Response::Progress { current: 2, total: 5 }).unwrap();
		assert_eq!(progress, r#"{"type":"progress","current":2,"total":5}"#);

		let error = serde_json::to_string(&Response::Error {
			code: ErrorCode::UnknownAction,
			message: "nope".to_string(),
		})
		.unwrap();
		assert_eq!(
			error,
			r#"{"type":"error","code":"UNKNOWN_ACTION","message":"nope"}"#
		);
	}

	#[test]
	fn request_params_default_to_empty_mapping() {
		let request: Request = serde_json::from_str(r#"{"action":"ping"}"#).unwrap();
		assert_eq!(request.action, "ping");
		assert_eq!(request.params, serde_json::json!({}));
	}
}
