//! Request dispatch state machine
//!
//! One request is processed start-to-finish before the next line is
//! read; the caller serializes requests and correlates responses by
//! line order alone.

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::config::DEFAULT_THRESHOLD;
use crate::core::PhotoRecord;
use crate::models::Embedder;
use crate::processing::SimilarityEngine;
use crate::protocol::{
	EmbedPhotosParams, ErrorCode, FindSimilarParams, MessageWriter, Request, SimilarityParams,
};
use crate::ui;

/// Routes requests to the embedder and similarity engine
///
/// Both collaborators are explicit constructor dependencies, so tests
/// drive the loop with in-memory streams and a stub embedder.
pub struct Dispatcher<E: Embedder> {
	embedder: E,
	engine: SimilarityEngine,
}

impl<E: Embedder> Dispatcher<E> {
	pub fn new(embedder: E, engine: SimilarityEngine) -> Self {
		Self { embedder, engine }
	}

	/// Run the request loop until the input stream is exhausted
	///
	/// Emits the ready signal first. Per-request failures are reported
	/// on the wire and never end the loop; only stream failures
	/// propagate.
	pub fn run<R: BufRead, W: Write>(&mut self, input: R, output: W) -> Result<()> {
		let mut out = MessageWriter::new(output);
		out.result(json!({"status": "ready"}))?;

		for line in input.lines() {
			let line = line?;
			let line = line.trim();
			if line.is_empty() {
				continue;
			}

			match serde_json::from_str::<Request>(line) {
				Ok(request) => self.handle(request, &mut out)?,
				Err(e) => out.error(
					ErrorCode::ParseError,
					&format!("Failed to parse request: {}", e),
				)?,
			}
		}

		ui::debug("Input stream closed, shutting down");
		Ok(())
	}

	fn handle<W: Write>(&mut self, request: Request, out: &mut MessageWriter<W>) -> Result<()> {
		ui::debug(&format!("Handling action: {}", request.action));

		let outcome = match request.action.as_str() {
			"embed_photos" => self.embed_photos(request.params, out),
			"find_similar" => self.find_similar(request.params, out),
			"calculate_similarity" => self.calculate_similarity(request.params, out),
			"ping" => out.result(json!({"status": "ok"})),
			other => out.error(
				ErrorCode::UnknownAction,
				&format!("Unknown action: {}", other),
			),
		};

		if let Err(e) = outcome {
			out.error(ErrorCode::ProcessingError, &format!("{:#}", e))?;
		}

		Ok(())
	}

	/// Embed each path in turn, reporting progress after every item
	fn embed_photos<W: Write>(&mut self, params: Value, out: &mut MessageWriter<W>) -> Result<()> {
		let params: EmbedPhotosParams = parse_params(params)?;
		let total = params.paths.len();
		let mut records = Vec::with_capacity(total);

		for (index, path) in params.paths.iter().enumerate() {
			let embedding = self.embedder.embed_image(Path::new(path))?;
			records.push(PhotoRecord {
				path: path.clone(),
				embedding: embedding.into_vec(),
			});
			out.progress(index + 1, total)?;
		}

		out.result(serde_json::to_value(records)?)
	}

	fn find_similar<W: Write>(&mut self, params: Value, out: &mut MessageWriter<W>) -> Result<()> {
		let params: FindSimilarParams = parse_params(params)?;
		let threshold = params.threshold.unwrap_or(DEFAULT_THRESHOLD);

		let groups = self.engine.find_groups(&params.embeddings, threshold)?;
		out.result(serde_json::to_value(groups)?)
	}

	fn calculate_similarity<W: Write>(
		&mut self,
		params: Value,
		out: &mut MessageWriter<W>,
	) -> Result<()> {
		let params: SimilarityParams = parse_params(params)?;
		let similarity = self
			.engine
			.cosine_similarity(&params.embedding1, &params.embedding2)?;

		out.result(json!({"similarity": similarity}))
	}
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T> {
	serde_json::from_value(params).context("Invalid request parameters")
}
