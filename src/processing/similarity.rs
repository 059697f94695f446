//! Cosine similarity and grouping of photo embeddings

use anyhow::{bail, Result};
use rayon::prelude::*;

use crate::config::MIN_GROUP_SIZE;
use crate::core::{Group, PhotoRecord};
use crate::processing::cluster::agglomerate;
use crate::ui;

/// Computes pairwise similarity and partitions photos into
/// near-duplicate groups
#[derive(Debug, Default)]
pub struct SimilarityEngine;

impl SimilarityEngine {
	pub fn new() -> Self {
		Self
	}

	/// Cosine of the angle between two vectors
	///
	/// Inputs need not be pre-normalized. A zero-magnitude vector on
	/// either side yields `0.0`; mismatched lengths are a computation
	/// error surfaced to the caller.
	pub fn cosine_similarity(&self, a: &[f32], b: &[f32]) -> Result<f32> {
		if a.len() != b.len() {
			bail!("Embedding length mismatch: {} vs {}", a.len(), b.len());
		}

		let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
		let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
		let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

		if norm_a == 0.0 || norm_b == 0.0 {
			return Ok(0.0);
		}

		Ok(dot / (norm_a * norm_b))
	}

	/// Partition photos into groups of mutual similarity above `threshold`
	///
	/// Groups carry ids in clustering-discovery order; the returned list
	/// is then sorted by similarity descending, so ids and positions are
	/// intentionally not aligned (existing callers rely on this shape).
	pub fn find_groups(&self, records: &[PhotoRecord], threshold: f32) -> Result<Vec<Group>> {
		if records.len() < MIN_GROUP_SIZE {
			return Ok(Vec::new());
		}

		let similarity = self.similarity_matrix(records)?;

		let distance: Vec<Vec<f32>> = similarity
			.iter()
			.map(|row| row.iter().map(|s| 1.0 - s).collect())
			.collect();

		let clusters = agglomerate(&distance, 1.0 - threshold);
		ui::debug(&format!(
			"{} photos partitioned into {} clusters at threshold {:.2}",
			records.len(),
			clusters.len(),
			threshold
		));

		let mut groups: Vec<Group> = Vec::new();

		for members in &clusters {
			if members.len() < MIN_GROUP_SIZE {
				continue;
			}

			groups.push(Group {
				id: format!("group_{}", groups.len()),
				photo_paths: members.iter().map(|&i| records[i].path.clone()).collect(),
				similarity: mean_similarity(members, &similarity),
			});
		}

		groups.sort_by(|a, b| {
			b.similarity
				.partial_cmp(&a.similarity)
				.unwrap_or(std::cmp::Ordering::Equal)
		});

		Ok(groups)
	}

	/// Full pairwise similarity matrix, O(n²) comparisons
	fn similarity_matrix(&self, records: &[PhotoRecord]) -> Result<Vec<Vec<f32>>> {
		let dim = records[0].embedding.len();
		if let Some(bad) = records.iter().find(|r| r.embedding.len() != dim) {
			bail!(
				"Inconsistent embedding length for {}: {} vs {}",
				bad.path,
				bad.embedding.len(),
				dim
			);
		}

		records
			.par_iter()
			.map(|a| {
				records
					.iter()
					.map(|b| self.cosine_similarity(&a.embedding, &b.embedding))
					.collect()
			})
			.collect()
	}
}

/// Mean of off-diagonal pairwise similarities within a cluster
///
/// Sums the full submatrix and subtracts the n diagonal self-similarities.
fn mean_similarity(members: &[usize], similarity: &[Vec<f32>]) -> f32 {
	let n = members.len();
	let mut total = 0.0f32;

	for &i in members {
		for &j in members {
			total += similarity[i][j];
		}
	}

	(total - n as f32) / (n * (n - 1)) as f32
}

#[cfg(test)]
mod tests {
	use super::*;

	fn record(path: &str, embedding: Vec<f32>) -> PhotoRecord {
		PhotoRecord {
			path: path.to_string(),
			embedding,
		}
	}

	#[test]
	fn cosine_is_symmetric() {
		let engine = SimilarityEngine::new();
		let a = vec![0.3, -1.2, 0.7];
		let b = vec![2.0, 0.1, -0.5];

		let ab = engine.cosine_similarity(&a, &b).unwrap();
		let ba = engine.cosine_similarity(&b, &a).unwrap();
		assert_eq!(ab, ba);
	}

	#[test]
	fn cosine_of_zero_vector_is_zero() {
		let engine = SimilarityEngine::new();
		let sim = engine.cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).unwrap();
		assert_eq!(sim, 0.0);
	}

	#[test]
	fn cosine_with_self_is_one() {
		let engine = SimilarityEngine::new();
		let sim = engine.cosine_similarity(&[3.0, 4.0], &[3.0, 4.0]).unwrap();
		assert_eq!(sim, 1.0);
	}

	#[test]
	fn cosine_handles_unnormalized_input() {
		let engine = SimilarityEngine::new();
		// Same direction, different magnitudes
		let sim = engine.cosine_similarity(&[1.0, 0.0], &[7.0, 0.0]).unwrap();
		assert_eq!(sim, 1.0);
	}

	#[test]
	fn cosine_rejects_length_mismatch() {
		let engine = SimilarityEngine::new();
		assert!(engine.cosine_similarity(&[1.0, 0.0], &[1.0]).is_err());
	}

	#[test]
	fn fewer_than_two_records_yield_no_groups() {
		let engine = SimilarityEngine::new();
		assert!(engine.find_groups(&[], 0.85).unwrap().is_empty());

		let single = [record("a.jpg", vec![1.0, 0.0])];
		assert!(engine.find_groups(&single, 0.85).unwrap().is_empty());
	}

	#[test]
	fn duplicate_pair_groups_and_singleton_is_excluded() {
		let engine = SimilarityEngine::new();
		let records = [
			record("a.jpg", vec![1.0, 0.0]),
			record("b.jpg", vec![1.0, 0.0]),
			record("c.jpg", vec![0.0, 1.0]),
		];

		let groups = engine.find_groups(&records, 0.85).unwrap();
		assert_eq!(groups.len(), 1);
		assert_eq!(groups[0].photo_paths, vec!["a.jpg", "b.jpg"]);
		assert_eq!(groups[0].similarity, 1.0);
	}

	#[test]
	fn identical_embeddings_form_one_full_group() {
		let engine = SimilarityEngine::new();
		let records = [
			record("a.jpg", vec![1.0, 0.0, 0.0]),
			record("b.jpg", vec![1.0, 0.0, 0.0]),
			record("c.jpg", vec![1.0, 0.0, 0.0]),
		];

		let groups = engine.find_groups(&records, 0.85).unwrap();
		assert_eq!(groups.len(), 1);
		assert_eq!(groups[0].photo_paths.len(), 3);
		assert_eq!(groups[0].similarity, 1.0);
	}

	#[test]
	fn groups_are_disjoint_and_sorted_by_similarity() {
		let engine = SimilarityEngine::new();
		// Looser pair first so discovery-order ids and sort order diverge
		let records = [
			record("a.jpg", vec![1.0, 0.0]),
			record("b.jpg", vec![0.95, 0.3122499]),
			record("c.jpg", vec![0.0, 1.0]),
			record("d.jpg", vec![0.0, 1.0]),
		];

		let groups = engine.find_groups(&records, 0.85).unwrap();
		assert_eq!(groups.len(), 2);

		// Sorted descending, ids keep discovery order
		assert_eq!(groups[0].id, "group_1");
		assert_eq!(groups[0].photo_paths, vec!["c.jpg", "d.jpg"]);
		assert_eq!(groups[0].similarity, 1.0);
		assert_eq!(groups[1].id, "group_0");
		assert_eq!(groups[1].photo_paths, vec!["a.jpg", "b.jpg"]);
		assert!(groups[1].similarity < groups[0].similarity);
		assert!(groups[1].similarity > 0.94);

		// Hard partition
		let mut all_paths: Vec<&String> = groups.iter().flat_map(|g| &g.photo_paths).collect();
		let before = all_paths.len();
		all_paths.sort();
		all_paths.dedup();
		assert_eq!(all_paths.len(), before);

		for group in &groups {
			assert!(group.len() >= 2);
		}
	}

	#[test]
	fn threshold_one_only_groups_exact_duplicates() {
		let engine = SimilarityEngine::new();
		let records = [
			record("a.jpg", vec![1.0, 0.0]),
			record("b.jpg", vec![1.0, 0.0]),
			record("c.jpg", vec![0.95, 0.3122499]),
		];

		let groups = engine.find_groups(&records, 1.0).unwrap();
		assert_eq!(groups.len(), 1);
		assert_eq!(groups[0].photo_paths, vec!["a.jpg", "b.jpg"]);
	}

	#[test]
	fn raising_threshold_never_groups_more_photos() {
		let engine = SimilarityEngine::new();
		let records = [
			record("a.jpg", vec![1.0, 0.0]),
			record("b.jpg", vec![0.98, 0.19899748]),
			record("c.jpg", vec![0.9, 0.43588989]),
			record("d.jpg", vec![0.0, 1.0]),
			record("e.jpg", vec![0.1, 0.99498744]),
		];

		let mut previous = usize::MAX;
		for threshold in [0.5, 0.7, 0.85, 0.95, 1.0] {
			let grouped: usize = engine
				.find_groups(&records, threshold)
				.unwrap()
				.iter()
				.map(Group::len)
				.sum();
			assert!(
				grouped <= previous,
				"threshold {} grouped {} photos, more than {}",
				threshold,
				grouped,
				previous
			);
			previous = grouped;
		}
	}

	#[test]
	fn inconsistent_dimensions_are_an_error() {
		let engine = SimilarityEngine::new();
		let records = [
			record("a.jpg", vec![1.0, 0.0]),
			record("b.jpg", vec![1.0, 0.0, 0.0]),
		];

		assert!(engine.find_groups(&records, 0.85).is_err());
	}
}
