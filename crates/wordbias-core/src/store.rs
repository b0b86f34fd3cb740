// ─────────────────────────────────────────────────────────────────────
// Word-Bias Kernel — Embedding Store Interface
// ─────────────────────────────────────────────────────────────────────
//! Token → vector storage consumed by the auditing core.
//!
//! File loaders live outside this crate: they only need to produce an
//! `EmbeddingStore`. The in-memory backend keeps one contiguous row-major
//! buffer, so cloning it yields a fully independent copy.

use std::collections::HashMap;

use wordbias_types::{BiasError, BiasResult};

use crate::vector_ops::l2_norm;

/// Trait for embedding backends.
pub trait EmbeddingStore {
    /// Dimensionality shared by every vector.
    fn dim(&self) -> usize;

    /// Vocabulary size.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector for `token`, `UnknownToken` if absent.
    fn get(&self, token: &str) -> BiasResult<&[f64]>;

    fn contains(&self, token: &str) -> bool;

    /// Replace the vector of an existing token.
    fn set(&mut self, token: &str, vector: Vec<f64>) -> BiasResult<()>;

    /// Rescale every vector to unit length.
    fn renormalize_all(&mut self) -> BiasResult<()>;

    /// Vocabulary in a stable order.
    fn tokens(&self) -> Box<dyn Iterator<Item = &str> + '_>;
}

impl<T: EmbeddingStore + ?Sized> EmbeddingStore for &mut T {
    fn dim(&self) -> usize {
        (**self).dim()
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, token: &str) -> BiasResult<&[f64]> {
        (**self).get(token)
    }

    fn contains(&self, token: &str) -> bool {
        (**self).contains(token)
    }

    fn set(&mut self, token: &str, vector: Vec<f64>) -> BiasResult<()> {
        (**self).set(token, vector)
    }

    fn renormalize_all(&mut self) -> BiasResult<()> {
        (**self).renormalize_all()
    }

    fn tokens(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        (**self).tokens()
    }
}

/// In-memory embedding keyed by token, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryEmbedding {
    dim: usize,
    tokens: Vec<String>,
    index: HashMap<String, usize>,
    data: Vec<f64>,
}

impl InMemoryEmbedding {
    pub fn new(dim: usize) -> BiasResult<Self> {
        if dim == 0 {
            return Err(BiasError::InvalidConfiguration(
                "embedding dimension must be >= 1".to_string(),
            ));
        }
        Ok(Self {
            dim,
            tokens: Vec::new(),
            index: HashMap::new(),
            data: Vec::new(),
        })
    }

    /// Build from parallel token and row lists. The dimension is taken
    /// from the first row.
    pub fn from_rows<S: Into<String>>(
        tokens: impl IntoIterator<Item = S>,
        rows: impl IntoIterator<Item = Vec<f64>>,
    ) -> BiasResult<Self> {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let rows: Vec<Vec<f64>> = rows.into_iter().collect();
        if tokens.len() != rows.len() {
            return Err(BiasError::InvalidConfiguration(format!(
                "{} tokens but {} vectors",
                tokens.len(),
                rows.len()
            )));
        }
        let dim = rows.first().map(Vec::len).unwrap_or(1);
        let mut store = Self::new(dim)?;
        for (token, row) in tokens.into_iter().zip(rows) {
            store.insert(token, row)?;
        }
        Ok(store)
    }

    /// Add a token, or overwrite its vector if already present.
    pub fn insert(&mut self, token: impl Into<String>, vector: Vec<f64>) -> BiasResult<()> {
        self.check_vector(&vector)?;
        let token = token.into();
        match self.index.get(&token) {
            Some(&row) => self.row_mut(row).copy_from_slice(&vector),
            None => {
                self.index.insert(token.clone(), self.tokens.len());
                self.tokens.push(token);
                self.data.extend_from_slice(&vector);
            }
        }
        Ok(())
    }

    /// Token at vocabulary position `row`.
    pub fn token_at(&self, row: usize) -> Option<&str> {
        self.tokens.get(row).map(String::as_str)
    }

    /// Vector at vocabulary position `row`.
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.dim..(row + 1) * self.dim]
    }

    fn row_mut(&mut self, row: usize) -> &mut [f64] {
        &mut self.data[row * self.dim..(row + 1) * self.dim]
    }

    fn check_vector(&self, vector: &[f64]) -> BiasResult<()> {
        if vector.len() != self.dim {
            return Err(BiasError::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        if let Some(i) = vector.iter().position(|x| !x.is_finite()) {
            return Err(BiasError::NumericalInstability(format!(
                "non-finite value {} at index {i}",
                vector[i]
            )));
        }
        Ok(())
    }
}

impl EmbeddingStore for InMemoryEmbedding {
    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        self.tokens.len()
    }

    fn get(&self, token: &str) -> BiasResult<&[f64]> {
        self.index
            .get(token)
            .map(|&row| self.row(row))
            .ok_or_else(|| BiasError::UnknownToken(token.to_string()))
    }

    fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    fn set(&mut self, token: &str, vector: Vec<f64>) -> BiasResult<()> {
        self.check_vector(&vector)?;
        let row = *self
            .index
            .get(token)
            .ok_or_else(|| BiasError::UnknownToken(token.to_string()))?;
        self.row_mut(row).copy_from_slice(&vector);
        Ok(())
    }

    /// Fails without touching any row if some vector has zero length.
    fn renormalize_all(&mut self) -> BiasResult<()> {
        let norms: Vec<f64> = (0..self.tokens.len())
            .map(|row| l2_norm(self.row(row)))
            .collect();
        if let Some(row) = norms.iter().position(|&n| n == 0.0 || !n.is_finite()) {
            return Err(BiasError::NumericalInstability(format!(
                "cannot renormalize {:?}: vector norm is {}",
                self.tokens[row], norms[row]
            )));
        }
        for (row, norm) in norms.into_iter().enumerate() {
            for x in self.row_mut(row) {
                *x /= norm;
            }
        }
        Ok(())
    }

    fn tokens(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.tokens.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> InMemoryEmbedding {
        InMemoryEmbedding::from_rows(
            ["he", "she", "nurse"],
            [vec![1.0, 0.0], vec![-1.0, 0.0], vec![0.5, 0.5]],
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_and_membership() {
        let store = toy();
        assert_eq!(store.len(), 3);
        assert_eq!(store.dim(), 2);
        assert!(store.contains("nurse"));
        assert!(!store.contains("NURSE"));
        assert_eq!(store.get("she").unwrap(), &[-1.0, 0.0]);
        assert!(matches!(
            store.get("doctor"),
            Err(BiasError::UnknownToken(t)) if t == "doctor"
        ));
    }

    #[test]
    fn test_tokens_in_insertion_order() {
        let store = toy();
        let tokens: Vec<&str> = store.tokens().collect();
        assert_eq!(tokens, vec!["he", "she", "nurse"]);
        assert_eq!(store.token_at(2), Some("nurse"));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut store = toy();
        store.set("nurse", vec![0.0, 1.0]).unwrap();
        assert_eq!(store.get("nurse").unwrap(), &[0.0, 1.0]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_set_unknown_and_wrong_dim() {
        let mut store = toy();
        assert!(matches!(
            store.set("doctor", vec![0.0, 1.0]),
            Err(BiasError::UnknownToken(_))
        ));
        assert_eq!(
            store.set("nurse", vec![1.0]),
            Err(BiasError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_insert_rejects_nan() {
        let mut store = InMemoryEmbedding::new(2).unwrap();
        assert!(store.insert("x", vec![f64::NAN, 0.0]).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_renormalize_all() {
        let mut store = toy();
        store.renormalize_all().unwrap();
        for token in ["he", "she", "nurse"] {
            assert!((l2_norm(store.get(token).unwrap()) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_renormalize_zero_vector_leaves_store_untouched() {
        let mut store = toy();
        store.insert("void", vec![0.0, 0.0]).unwrap();
        let before = store.clone();
        assert!(store.renormalize_all().is_err());
        assert_eq!(store, before);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = toy();
        let mut copy = original.clone();
        copy.set("he", vec![0.0, 1.0]).unwrap();
        assert_eq!(original.get("he").unwrap(), &[1.0, 0.0]);
    }

    #[test]
    fn test_mut_ref_delegates() {
        let mut store = toy();
        {
            let mut borrowed: &mut InMemoryEmbedding = &mut store;
            EmbeddingStore::set(&mut borrowed, "he", vec![2.0, 0.0]).unwrap();
            assert_eq!(EmbeddingStore::len(&borrowed), 3);
        }
        assert_eq!(store.get("he").unwrap(), &[2.0, 0.0]);
    }

    #[test]
    fn test_from_rows_length_mismatch() {
        let result = InMemoryEmbedding::from_rows(["a", "b"], [vec![1.0]]);
        assert!(matches!(result, Err(BiasError::InvalidConfiguration(_))));
    }
}
