// ─────────────────────────────────────────────────────────────────────
// Word-Bias Kernel — Bias Metrics
// ─────────────────────────────────────────────────────────────────────
//! Measurements against an identified bias direction.
//!
//! - **Direct bias**: `Σ |cos(w, d)|^c / |N|` over neutral words `N`.
//!   `c` sets strictness: `c → 0` approaches a 0/1 indicator of any
//!   bias, large `c` emphasizes only strongly biased words.
//! - **Indirect bias**: `(v1·v2 - cos(v1⊥, v2⊥)) / v1·v2`, the share of
//!   two words' similarity carried by the direction. The denominator is
//!   not guarded: nearly orthogonal words yield huge or non-finite values.

use std::cmp::Ordering;
use std::collections::HashSet;

use wordbias_types::{
    Analogy, BiasError, BiasResult, CrossEmbeddingBias, CrossProjection, IndirectBiasEntry,
    ProjectionScore,
};

use crate::direction::BiasDirection;
use crate::store::EmbeddingStore;
use crate::vector_ops::{cosine_similarity, dot, l2_norm, normalize, reject, sub};

/// Analogy generation settings.
#[derive(Debug, Clone)]
pub struct AnalogyParams {
    /// Number of analogies to generate.
    pub n_analogies: usize,
    /// Allow a word to appear in more than one analogy.
    pub multiple: bool,
    /// Maximal distance between the normalized `x` and `y`. The default
    /// of 1 corresponds to an angle of at most π/3.
    pub delta: f64,
    /// Vocabulary prefix to search.
    pub restrict_vocab: usize,
}

impl Default for AnalogyParams {
    fn default() -> Self {
        Self {
            n_analogies: 100,
            multiple: false,
            delta: 1.0,
            restrict_vocab: 30_000,
        }
    }
}

impl AnalogyParams {
    pub fn with_n_analogies(mut self, n: usize) -> Self {
        self.n_analogies = n;
        self
    }

    pub fn with_multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    pub fn with_restrict_vocab(mut self, restrict_vocab: usize) -> Self {
        self.restrict_vocab = restrict_vocab;
        self
    }
}

/// Read-only bias measurements over one store and one direction.
pub struct BiasMetrics<'a, S: EmbeddingStore + ?Sized> {
    store: &'a S,
    direction: &'a BiasDirection,
}

impl<'a, S: EmbeddingStore + ?Sized> BiasMetrics<'a, S> {
    pub fn new(store: &'a S, direction: &'a BiasDirection) -> Self {
        Self { store, direction }
    }

    pub fn direction(&self) -> &BiasDirection {
        self.direction
    }

    /// Cosine similarity between `word` and the direction.
    pub fn project_on_direction(&self, word: &str) -> BiasResult<f64> {
        Ok(cosine_similarity(
            self.direction.as_slice(),
            self.store.get(word)?,
        ))
    }

    /// Projections of `words`, sorted by projection descending.
    pub fn projection_scores<W: AsRef<str>>(&self, words: &[W]) -> BiasResult<Vec<ProjectionScore>> {
        let mut scores = words
            .iter()
            .map(|w| {
                let word = w.as_ref();
                Ok(ProjectionScore {
                    word: word.to_string(),
                    projection: self.project_on_direction(word)?,
                })
            })
            .collect::<BiasResult<Vec<_>>>()?;
        scores.sort_by(|a, b| descending(a.projection, b.projection));
        Ok(scores)
    }

    /// Direct bias of `neutral_words` with strictness `c`.
    pub fn direct_bias<W: AsRef<str>>(&self, neutral_words: &[W], c: f64) -> BiasResult<f64> {
        if neutral_words.is_empty() {
            return Err(BiasError::InvalidConfiguration(
                "direct bias needs at least one neutral word".to_string(),
            ));
        }
        if !(c >= 0.0 && c.is_finite()) {
            return Err(BiasError::InvalidConfiguration(format!(
                "strictness c must be a finite non-negative number, got {c}"
            )));
        }
        let mut total = 0.0;
        for word in neutral_words {
            total += self.project_on_direction(word.as_ref())?.abs().powf(c);
        }
        Ok(total / neutral_words.len() as f64)
    }

    /// Indirect bias between `word1` and `word2`.
    pub fn indirect_bias(&self, word1: &str, word2: &str) -> BiasResult<f64> {
        let v1 = normalize(self.store.get(word1)?)?;
        let v2 = normalize(self.store.get(word2)?)?;

        let p1 = reject(&v1, self.direction.as_slice());
        let p2 = reject(&v2, self.direction.as_slice());

        let inner = dot(&v1, &v2);
        let perpendicular = cosine_similarity(&p1, &p2);

        Ok((inner - perpendicular) / inner)
    }

    /// Words closest to each end of the local word-pair direction
    /// `normalize(positive_end - negative_end)`, with their indirect bias
    /// toward that end.
    ///
    /// Rows are in descending projection order: up to `n_extreme` rows
    /// for `positive_end`, then up to `n_extreme` for `negative_end`.
    /// A word never appears twice.
    pub fn closest_words_indirect_bias<W: AsRef<str>>(
        &self,
        positive_end: &str,
        negative_end: &str,
        words: &[W],
        n_extreme: usize,
    ) -> BiasResult<Vec<IndirectBiasEntry>> {
        let local_axis = normalize(&sub(
            self.store.get(positive_end)?,
            self.store.get(negative_end)?,
        ))?;

        let mut scored = words
            .iter()
            .map(|w| {
                let word = w.as_ref();
                let vector = normalize(self.store.get(word)?)?;
                Ok((word, dot(&vector, &local_axis)))
            })
            .collect::<BiasResult<Vec<_>>>()?;
        scored.sort_by(|a, b| descending(a.1, b.1));

        let head = n_extreme.min(scored.len());
        let tail = n_extreme.min(scored.len() - head);

        let positive = scored[..head].iter().map(|&(w, p)| (positive_end, w, p));
        let negative = scored[scored.len() - tail..]
            .iter()
            .map(|&(w, p)| (negative_end, w, p));

        positive
            .chain(negative)
            .map(|(end, word, projection)| {
                Ok(IndirectBiasEntry {
                    end: end.to_string(),
                    word: word.to_string(),
                    projection,
                    indirect_bias: self.indirect_bias(word, end)?,
                })
            })
            .collect()
    }

    /// Generate `x - y ~ direction` analogies (`a:x :: b:y` when
    /// `a - b ~ direction`) among semantically close word pairs.
    ///
    /// Both orderings of a close pair are candidates, `(y, x)` scoring the
    /// negation of `(x, y)`. Without `multiple` a word is used at most once,
    /// so only the better-scoring ordering can appear. Returns fewer than
    /// `n_analogies` if candidates run out.
    pub fn generate_analogies(&self, params: &AnalogyParams) -> BiasResult<Vec<Analogy>> {
        let tokens: Vec<&str> = self.store.tokens().take(params.restrict_vocab).collect();
        let vectors = tokens
            .iter()
            .map(|t| normalize(self.store.get(t)?))
            .collect::<BiasResult<Vec<_>>>()?;
        let direction = self.direction.as_slice();

        // (x, y, distance, score)
        let mut candidates: Vec<(usize, usize, f64, f64)> = Vec::new();
        for i in 0..vectors.len() {
            for j in (i + 1)..vectors.len() {
                let diff = sub(&vectors[i], &vectors[j]);
                let distance = l2_norm(&diff);
                if distance == 0.0 || distance >= params.delta {
                    continue;
                }
                let score = dot(&diff, direction) / distance;
                candidates.push((i, j, distance, score));
                candidates.push((j, i, distance, -score));
            }
        }
        candidates.sort_by(|a, b| descending(a.3, b.3));
        log::debug!(
            "{} close pairs among {} words",
            candidates.len(),
            tokens.len()
        );

        let mut analogies = Vec::with_capacity(params.n_analogies.min(candidates.len()));
        let mut generated: HashSet<usize> = HashSet::new();
        for (x, y, distance, score) in candidates {
            if analogies.len() >= params.n_analogies {
                break;
            }
            if params.multiple || (!generated.contains(&x) && !generated.contains(&y)) {
                analogies.push(Analogy {
                    x: tokens[x].to_string(),
                    y: tokens[y].to_string(),
                    distance,
                    score,
                });
            }
            generated.insert(x);
            generated.insert(y);
        }
        Ok(analogies)
    }
}

/// Projections of `words` in two embeddings and their Spearman rank
/// correlation. Words missing from either store are skipped.
pub fn bias_across_embeddings<A, B, W>(
    first: &BiasMetrics<'_, A>,
    second: &BiasMetrics<'_, B>,
    words: &[W],
) -> BiasResult<CrossEmbeddingBias>
where
    A: EmbeddingStore + ?Sized,
    B: EmbeddingStore + ?Sized,
    W: AsRef<str>,
{
    let mut projections = Vec::new();
    for word in words.iter().map(AsRef::as_ref) {
        if !(first.store.contains(word) && second.store.contains(word)) {
            continue;
        }
        projections.push(CrossProjection {
            word: word.to_string(),
            first: first.project_on_direction(word)?,
            second: second.project_on_direction(word)?,
        });
    }
    let xs: Vec<f64> = projections.iter().map(|p| p.first).collect();
    let ys: Vec<f64> = projections.iter().map(|p| p.second).collect();
    let rho = spearman_rho(&xs, &ys);
    Ok(CrossEmbeddingBias { projections, rho })
}

/// Spearman rank correlation with average ranks for ties.
///
/// NaN when fewer than two samples or either side is constant.
pub fn spearman_rho(xs: &[f64], ys: &[f64]) -> f64 {
    debug_assert_eq!(xs.len(), ys.len());
    if xs.len() < 2 {
        return f64::NAN;
    }
    pearson(&ranks(xs), &ranks(ys))
}

fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));
    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // Ranks are 1-based; ties share the mean rank
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &k in &order[i..=j] {
            ranks[k] = rank;
        }
        i = j + 1;
    }
    ranks
}

fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mx = xs.iter().sum::<f64>() / n;
    let my = ys.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        vx += (x - mx) * (x - mx);
        vy += (y - my) * (y - my);
    }
    cov / (vx * vy).sqrt()
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
