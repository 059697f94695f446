//! Core domain types

pub mod embedding;
pub mod group;

pub use embedding::Embedding;
pub use group::{Group, PhotoRecord};
