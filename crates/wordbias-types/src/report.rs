// ─────────────────────────────────────────────────────────────────────
// Word-Bias Kernel — Report Records
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

/// Projection of one word on the bias direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionScore {
    pub word: String,
    /// Cosine similarity between the word vector and the direction.
    pub projection: f64,
}

/// One row of the closest-words indirect bias table.
///
/// Keyed by `(end, word)`; `end` is the pole of the local word-pair
/// direction the word leans toward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndirectBiasEntry {
    pub end: String,
    pub word: String,
    /// Projection on the local word-pair direction.
    pub projection: f64,
    /// Indirect bias between `word` and `end`.
    pub indirect_bias: f64,
}

/// Diagnostics for one word touched by equalize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqualizeRecord {
    pub equality_set_index: usize,
    pub word: String,
    pub scaling: f64,
    /// Projection scalar of the normalized vector before equalizing.
    pub projected_scalar: f64,
    /// Projection scalar of the equalized vector.
    pub equalized_projected_scalar: f64,
}

/// A generated `x - y ~ direction` analogy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analogy {
    pub x: String,
    pub y: String,
    /// Euclidean distance between the normalized vectors.
    pub distance: f64,
    /// Projection of `normalize(x - y)` on the direction.
    pub score: f64,
}

/// Projections of one word in two embeddings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossProjection {
    pub word: String,
    pub first: f64,
    pub second: f64,
}

/// Comparison of the same words' bias across two embeddings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossEmbeddingBias {
    pub projections: Vec<CrossProjection>,
    /// Spearman rank correlation between the two projection columns.
    pub rho: f64,
}

impl CrossEmbeddingBias {
    pub fn len(&self) -> usize {
        self.projections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projections.is_empty()
    }
}
