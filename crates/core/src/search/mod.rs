//! Ranked retrieval over in-memory record collections.
//!
//! Every collection is searched through [`SearchBackend`], so the lexical
//! [`fuzzy::FuzzyIndex`] and the embedding-backed [`vector::VectorIndex`]
//! can be swapped without touching the tools that call them.

pub mod fuzzy;
pub mod vector;
pub mod weights;

use serde::Serialize;

use crate::errors::SearchError;

pub use fuzzy::{EditDistanceScorer, FieldScorer, FuzzyIndex, WeightedField};
pub use vector::{Embedder, SynthesizedText, VectorIndex};

pub const MIN_K: usize = 1;
pub const MAX_K: usize = 20;
pub const DEFAULT_K: usize = 5;

/// A record paired with its relevance score. Serialises as the record's own
/// fields plus `_score`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scored<R> {
    #[serde(flatten)]
    pub item: R,
    #[serde(rename = "_score")]
    pub score: f64,
}

pub trait SearchBackend<R>: Send + Sync {
    /// Returns at most `k` records ordered by descending score. Equal scores
    /// keep collection order.
    fn search(&self, query: &str, k: usize) -> Result<Vec<Scored<R>>, SearchError>;

    /// The full collection, in stored order.
    fn records(&self) -> &[R];
}

/// Normalises a requested result count: numeric values are clamped into
/// `[MIN_K, MAX_K]`, absent or unparseable values fall back to `DEFAULT_K`.
pub fn clamp_k(requested: Option<i64>) -> usize {
    match requested {
        Some(value) => value.clamp(MIN_K as i64, MAX_K as i64) as usize,
        None => DEFAULT_K,
    }
}

pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{clamp_k, normalize_query, Scored, DEFAULT_K, MAX_K, MIN_K};

    #[test]
    fn clamps_out_of_range_counts_to_the_nearest_bound() {
        for requested in [-50_i64, -1, 0] {
            assert_eq!(clamp_k(Some(requested)), MIN_K, "requested {requested}");
        }
        for requested in [21_i64, 100, i64::MAX] {
            assert_eq!(clamp_k(Some(requested)), MAX_K, "requested {requested}");
        }
        assert_eq!(clamp_k(Some(7)), 7);
        assert_eq!(clamp_k(None), DEFAULT_K);
    }

    #[test]
    fn scored_items_serialise_flat_with_score_field() {
        let scored = Scored { item: serde_json::json!({"product_id": "P1001"}), score: 0.5 };
        let value = serde_json::to_value(&scored).expect("scored item should serialise");
        assert_eq!(value["product_id"], "P1001");
        assert_eq!(value["_score"], 0.5);
    }

    #[test]
    fn query_normalisation_trims_and_lowercases() {
        assert_eq!(normalize_query("  Luma MONITOR "), "luma monitor");
    }
}
