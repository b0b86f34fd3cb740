// ─────────────────────────────────────────────────────────────────────
// Word-Bias Kernel — Bias Direction Identification
// ─────────────────────────────────────────────────────────────────────
//! Derives the unit bias direction from definitional words.
//!
//! - `single`: normalized difference of one normalized word pair.
//! - `sum`: normalized difference of two normalized group sums.
//! - `pca`: first principal component of every definitional pair
//!   centered on its own midpoint. The first component must explain at
//!   least `first_pc_threshold` of the variance, otherwise the pairs do
//!   not share a dominant axis and identification fails.
//!
//! PCA axes have arbitrary sign; the result is oriented so that
//! `positive_end - negative_end` projects positively.

use serde::{Deserialize, Serialize};

use wordbias_types::{AuditConfig, BiasError, BiasResult, DirectionMethod};

use crate::pca::Pca;
use crate::store::EmbeddingStore;
use crate::vector_ops::{cosine_similarity, normalize, sub, sum};

/// Words the direction is derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Definitional {
    /// One word pair (`single`).
    Pair(String, String),
    /// Two word groups (`sum`).
    Groups(Vec<String>, Vec<String>),
    /// Word pairs (`pca`; `single` uses the first).
    Pairs(Vec<(String, String)>),
}

impl Definitional {
    pub fn pair(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::Pair(a.into(), b.into())
    }

    pub fn pairs<A: Into<String>, B: Into<String>>(pairs: impl IntoIterator<Item = (A, B)>) -> Self {
        Self::Pairs(pairs.into_iter().map(|(a, b)| (a.into(), b.into())).collect())
    }

    pub fn groups<S: Into<String>>(
        first: impl IntoIterator<Item = S>,
        second: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::Groups(
            first.into_iter().map(Into::into).collect(),
            second.into_iter().map(Into::into).collect(),
        )
    }
}

/// An identified bias direction and its poles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasDirection {
    /// Unit vector.
    pub vector: Vec<f64>,
    pub positive_end: String,
    pub negative_end: String,
    pub method: DirectionMethod,
    /// Explained-variance ratios (PCA only).
    pub explained_variance_ratio: Option<Vec<f64>>,
}

impl BiasDirection {
    pub fn as_slice(&self) -> &[f64] {
        &self.vector
    }

    pub fn dim(&self) -> usize {
        self.vector.len()
    }

    /// Axis caption in `← negative … positive →` form.
    pub fn label(&self) -> String {
        format!("← {}  …  {} →", self.negative_end, self.positive_end)
    }
}

/// Direction identification settings.
#[derive(Debug, Clone)]
pub struct DirectionIdentifier {
    first_pc_threshold: f64,
    n_components: usize,
    verbose: bool,
}

impl Default for DirectionIdentifier {
    fn default() -> Self {
        Self::from_config(&AuditConfig::default())
    }
}

impl DirectionIdentifier {
    pub fn from_config(config: &AuditConfig) -> Self {
        Self {
            first_pc_threshold: config.first_pc_threshold,
            n_components: config.n_components,
            verbose: config.verbose,
        }
    }

    /// Identify the direction from `definitional` using `method`.
    pub fn identify<S: EmbeddingStore + ?Sized>(
        &self,
        store: &S,
        positive_end: &str,
        negative_end: &str,
        definitional: &Definitional,
        method: DirectionMethod,
    ) -> BiasResult<BiasDirection> {
        if positive_end == negative_end {
            return Err(BiasError::InvalidConfiguration(format!(
                "positive_end and negative_end should be different, and not the same {positive_end:?}"
            )));
        }
        log::debug!("Identify direction using {method} method...");

        let (vector, explained_variance_ratio) = match (method, definitional) {
            (DirectionMethod::Single, Definitional::Pair(a, b)) => (single(store, a, b)?, None),
            (DirectionMethod::Single, Definitional::Pairs(pairs)) => {
                let (a, b) = pairs.first().ok_or_else(|| {
                    BiasError::InvalidConfiguration("no definitional pair given".to_string())
                })?;
                (single(store, a, b)?, None)
            }
            (DirectionMethod::Sum, Definitional::Groups(first, second)) => {
                (group_sum(store, first, second)?, None)
            }
            (DirectionMethod::Pca, Definitional::Pairs(pairs)) => {
                let pca = self.principal_axis(store, pairs)?;
                let ratios = pca.explained_variance_ratio.clone();
                let mut direction = pca.components.into_iter().next().unwrap_or_default();

                let ends_diff = sub(store.get(positive_end)?, store.get(negative_end)?);
                if cosine_similarity(&ends_diff, &direction) < 0.0 {
                    direction.iter_mut().for_each(|x| *x = -*x);
                }
                (direction, Some(ratios))
            }
            (method, definitional) => {
                return Err(BiasError::InvalidConfiguration(format!(
                    "method {method} cannot use definitional words of shape {}",
                    shape_name(definitional)
                )))
            }
        };

        Ok(BiasDirection {
            vector,
            positive_end: positive_end.to_string(),
            negative_end: negative_end.to_string(),
            method,
            explained_variance_ratio,
        })
    }

    fn principal_axis<S: EmbeddingStore + ?Sized>(
        &self,
        store: &S,
        pairs: &[(String, String)],
    ) -> BiasResult<Pca> {
        if pairs.is_empty() {
            return Err(BiasError::InvalidConfiguration(
                "no definitional pairs given".to_string(),
            ));
        }

        let mut matrix = Vec::with_capacity(2 * pairs.len());
        for (word1, word2) in pairs {
            let v1 = normalize(store.get(word1)?)?;
            let v2 = normalize(store.get(word2)?)?;
            let center: Vec<f64> = v1.iter().zip(&v2).map(|(a, b)| (a + b) / 2.0).collect();
            matrix.push(sub(&v1, &center));
            matrix.push(sub(&v2, &center));
        }

        let pca = Pca::fit(&matrix, self.n_components)?;

        if self.verbose {
            log::info!("Principal Component    Explained Variance Ratio");
            for (i, ratio) in pca.explained_variance_ratio.iter().enumerate() {
                log::info!("{:>19}    {ratio:.6}", i + 1);
            }
        }

        let first = pca.first_ratio();
        if first < self.first_pc_threshold {
            return Err(BiasError::NumericalInstability(format!(
                "the explained variance of the first principal component should be at least {}, but it is {first:.4}",
                self.first_pc_threshold
            )));
        }
        Ok(pca)
    }
}

fn single<S: EmbeddingStore + ?Sized>(store: &S, a: &str, b: &str) -> BiasResult<Vec<f64>> {
    let diff = sub(&normalize(store.get(a)?)?, &normalize(store.get(b)?)?);
    normalize(&diff)
}

fn group_sum<S: EmbeddingStore + ?Sized>(
    store: &S,
    first: &[String],
    second: &[String],
) -> BiasResult<Vec<f64>> {
    let total = |words: &[String]| -> BiasResult<Vec<f64>> {
        let rows = words
            .iter()
            .map(|w| store.get(w).map(<[f64]>::to_vec))
            .collect::<BiasResult<Vec<_>>>()?;
        let summed = sum(&rows).ok_or_else(|| {
            BiasError::InvalidConfiguration("definitional word group is empty".to_string())
        })?;
        normalize(&summed)
    };
    normalize(&sub(&total(first)?, &total(second)?))
}

fn shape_name(definitional: &Definitional) -> &'static str {
    match definitional {
        Definitional::Pair(..) => "pair",
        Definitional::Groups(..) => "groups",
        Definitional::Pairs(..) => "pairs",
    }
}
