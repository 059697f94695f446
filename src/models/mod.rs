//! # Embedding Models
//!
//! The `Embedder` seam consumed by the dispatcher, plus the ONNX vision
//! encoder behind it.

pub mod vision;

pub use vision::VisionEmbedder;

use std::path::Path;

use anyhow::Result;

use crate::core::Embedding;

/// Produces unit-norm embedding vectors for images
///
/// The dispatcher only depends on this trait, so tests can drive the
/// protocol with a stub instead of a loaded model.
pub trait Embedder {
	/// Embed a single image file
	fn embed_image(&mut self, path: &Path) -> Result<Embedding>;

	/// Embed a batch of image files, order-preserving
	fn embed_batch(&mut self, paths: &[String]) -> Result<Vec<Embedding>> {
		paths
			.iter()
			.map(|p| self.embed_image(Path::new(p)))
			.collect()
	}
}
