//! Wire-facing photo and group records

use serde::{Deserialize, Serialize};

/// A photo path paired with its embedding vector
///
/// The path is an opaque identifier; the engine never touches the
/// filesystem through it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoRecord {
	pub path: String,
	pub embedding: Vec<f32>,
}

/// A cluster of visually similar photos
///
/// Always holds at least two members, and member sets are disjoint
/// across the groups produced by one `find_groups` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
	/// Identifier assigned in clustering-discovery order
	pub id: String,
	/// Member photo paths
	pub photo_paths: Vec<String>,
	/// Mean pairwise similarity between members (diagonal excluded)
	pub similarity: f32,
}

impl Group {
	pub fn len(&self) -> usize {
		self.photo_paths.len()
	}

	pub fn is_empty(&self) -> bool {
		self.photo_paths.is_empty()
	}
}
