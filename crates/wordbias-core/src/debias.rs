// ─────────────────────────────────────────────────────────────────────
// Word-Bias Kernel — Neutralize & Equalize
// ─────────────────────────────────────────────────────────────────────
//! Hard-debias mutations (Bolukbasi et al. 2016).
//!
//! - **Neutralize**: remove the direction component from neutral words.
//! - **Equalize**: make each equality set symmetric about the direction,
//!   so every neutral word is equidistant from its members.
//!
//! Both validate their input before touching the store and finish with a
//! global re-normalization.

use std::collections::HashSet;

use wordbias_types::{AuditConfig, BiasError, BiasResult, EqualizeRecord};

use crate::direction::BiasDirection;
use crate::store::EmbeddingStore;
use crate::vector_ops::{dot, l2_norm, mean, normalize, project, project_reject, reject};

/// Progress hook invoked with `(done, total)` while mutating.
pub type ProgressCallback<'a> = &'a dyn Fn(usize, usize);

/// Relative norm below which a rejection counts as zero.
const REJECTION_EPS: f64 = 1e-10;

/// Applies neutralize/equalize for one direction.
pub struct Debiaser<'a> {
    direction: &'a BiasDirection,
    radicand_tolerance: f64,
    verbose: bool,
}

impl<'a> Debiaser<'a> {
    pub fn new(direction: &'a BiasDirection, config: &AuditConfig) -> Self {
        Self {
            direction,
            radicand_tolerance: config.radicand_tolerance,
            verbose: config.verbose,
        }
    }

    /// Replace each word's vector by its rejection from the direction,
    /// then re-normalize the whole store.
    ///
    /// Returns the number of neutralized words. Repeated words are
    /// processed once.
    pub fn neutralize<S, W>(
        &self,
        store: &mut S,
        words: &[W],
        progress: Option<ProgressCallback<'_>>,
    ) -> BiasResult<usize>
    where
        S: EmbeddingStore + ?Sized,
        W: AsRef<str>,
    {
        let d = self.direction.as_slice();
        let mut seen = HashSet::new();
        let mut updates = Vec::with_capacity(words.len());
        for word in words.iter().map(AsRef::as_ref) {
            if !seen.insert(word) {
                continue;
            }
            let vector = store.get(word)?;
            let rejected = reject(vector, d);
            if l2_norm(&rejected) <= REJECTION_EPS * l2_norm(vector) {
                return Err(BiasError::NumericalInstability(format!(
                    "{word:?} lies on the bias direction; its rejection has zero length"
                )));
            }
            updates.push((word, rejected));
        }
        check_renormalizable(&*store)?;

        let total = updates.len();
        log::debug!("Neutralize {total} words...");
        for (done, (word, rejected)) in updates.into_iter().enumerate() {
            store.set(word, rejected)?;
            if let Some(report) = progress {
                report(done + 1, total);
            }
        }
        store.renormalize_all()?;
        Ok(total)
    }

    /// Equalize every set about the direction, then re-normalize the
    /// whole store.
    ///
    /// Sets are processed in order, each computed in full before being
    /// written back. Every set needs at least two tokens.
    pub fn equalize<S, W>(
        &self,
        store: &mut S,
        equality_sets: &[Vec<W>],
        progress: Option<ProgressCallback<'_>>,
    ) -> BiasResult<Vec<EqualizeRecord>>
    where
        S: EmbeddingStore + ?Sized,
        W: AsRef<str>,
    {
        validate_sets(&*store, equality_sets)?;
        check_renormalizable(&*store)?;

        let d = self.direction.as_slice();
        let total = equality_sets.len();
        log::debug!("Equalize {total} sets...");

        let mut records = Vec::new();
        for (index, set) in equality_sets.iter().enumerate() {
            let vectors = set
                .iter()
                .map(|w| normalize(store.get(w.as_ref())?))
                .collect::<BiasResult<Vec<_>>>()?;
            let center = mean(&vectors).ok_or_else(|| {
                BiasError::InvalidConfiguration("empty equality set".to_string())
            })?;
            let (projected_center, rejected_center) = project_reject(&center, d);
            let scaling = self.scaling(&rejected_center)?;

            let mut equalized = Vec::with_capacity(vectors.len());
            for (word, vector) in set.iter().zip(&vectors) {
                let offset: Vec<f64> = project(vector, d)
                    .iter()
                    .zip(&projected_center)
                    .map(|(p, c)| p - c)
                    .collect();
                let projected_part = normalize(&offset).map_err(|_| {
                    BiasError::NumericalInstability(format!(
                        "{:?} has the same bias projection as its equality set center",
                        word.as_ref()
                    ))
                })?;
                let new_vector: Vec<f64> = rejected_center
                    .iter()
                    .zip(&projected_part)
                    .map(|(r, p)| r + scaling * p)
                    .collect();

                records.push(EqualizeRecord {
                    equality_set_index: index,
                    word: word.as_ref().to_string(),
                    scaling,
                    projected_scalar: dot(vector, d),
                    equalized_projected_scalar: dot(&new_vector, d),
                });
                equalized.push((word.as_ref(), new_vector));
            }

            for (word, new_vector) in equalized {
                store.set(word, new_vector)?;
            }
            if let Some(report) = progress {
                report(index + 1, total);
            }
        }

        if self.verbose {
            log::info!("Equalize Words Data (all equal for 1-dim bias space (direction)):");
            log::info!(
                "{:>5}  {:<20} {:>10} {:>18} {:>28}",
                "set",
                "word",
                "scaling",
                "projected_scalar",
                "equalized_projected_scalar"
            );
            for r in &records {
                log::info!(
                    "{:>5}  {:<20} {:>10.6} {:>18.6} {:>28.6}",
                    r.equality_set_index,
                    r.word,
                    r.scaling,
                    r.projected_scalar,
                    r.equalized_projected_scalar
                );
            }
        }

        store.renormalize_all()?;
        Ok(records)
    }

    /// `sqrt(1 - ‖rejected_center‖²)`, clamping round-off overshoot.
    fn scaling(&self, rejected_center: &[f64]) -> BiasResult<f64> {
        let radicand = 1.0 - dot(rejected_center, rejected_center);
        if radicand >= 0.0 {
            return Ok(radicand.sqrt());
        }
        if radicand >= -self.radicand_tolerance {
            log::warn!("equalize radicand {radicand:e} clamped to zero");
            return Ok(0.0);
        }
        Err(BiasError::NumericalInstability(format!(
            "equalize radicand is negative: {radicand:e}"
        )))
    }
}

/// Every set has at least two tokens, all present in the store.
pub(crate) fn validate_sets<S, W>(store: &S, equality_sets: &[Vec<W>]) -> BiasResult<()>
where
    S: EmbeddingStore + ?Sized,
    W: AsRef<str>,
{
    for set in equality_sets {
        if set.len() < 2 {
            return Err(BiasError::InvalidConfiguration(format!(
                "equality set needs at least two words, got {}",
                set.len()
            )));
        }
        for word in set {
            store.get(word.as_ref())?;
        }
    }
    Ok(())
}

/// The closing re-normalization must not fail half way, so every vector
/// in the store needs a finite, non-zero norm before the first write.
pub(crate) fn check_renormalizable<S>(store: &S) -> BiasResult<()>
where
    S: EmbeddingStore + ?Sized,
{
    for token in store.tokens() {
        let norm = l2_norm(store.get(token)?);
        if norm == 0.0 || !norm.is_finite() {
            return Err(BiasError::NumericalInstability(format!(
                "{token:?} has norm {norm}; the store cannot be re-normalized"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::direction::{Definitional, DirectionIdentifier};
    use crate::fixtures::{axis_store, gendered_store};
    use crate::store::InMemoryEmbedding;
    use wordbias_types::DirectionMethod;

    fn e0_direction(store: &InMemoryEmbedding) -> BiasDirection {
        DirectionIdentifier::default()
            .identify(
                store,
                "p",
                "n",
                &Definitional::pair("p", "n"),
                DirectionMethod::Single,
            )
            .unwrap()
    }

    fn asymmetric_store() -> InMemoryEmbedding {
        InMemoryEmbedding::from_rows(
            ["p", "n", "a", "b", "w"],
            [
                vec![1.0, 0.0, 0.0],
                vec![-1.0, 0.0, 0.0],
                vec![1.0, 0.2, 0.0],
                vec![-0.5, 0.6, 0.3],
                vec![0.3, 0.4, 0.8],
            ],
        )
        .unwrap()
    }

    fn assert_unit_norms(store: &InMemoryEmbedding) {
        for token in store.tokens() {
            let norm = l2_norm(store.get(token).unwrap());
            assert!((norm - 1.0).abs() < 1e-6, "{token} has norm {norm}");
        }
    }

    #[test]
    fn test_neutralize_zeroes_projection() {
        let mut store = axis_store();
        let direction = DirectionIdentifier::default()
            .identify(
                &store,
                "she",
                "he",
                &Definitional::pairs([("she", "he"), ("her", "his"), ("woman", "man")]),
                DirectionMethod::Pca,
            )
            .unwrap();
        let debiaser = Debiaser::new(&direction, &AuditConfig::default());
        let words = ["nurse", "engineer", "doctor"];
        assert_eq!(debiaser.neutralize(&mut store, &words, None).unwrap(), 3);

        for word in words {
            let v = store.get(word).unwrap();
            assert!(dot(v, &direction.vector).abs() < 1e-9);
        }
        assert_unit_norms(&store);
    }

    #[test]
    fn test_neutralize_idempotent() {
        let mut store = asymmetric_store();
        let direction = e0_direction(&store);
        let debiaser = Debiaser::new(&direction, &AuditConfig::default());
        debiaser.neutralize(&mut store, &["w"], None).unwrap();
        let once = store.clone();
        debiaser.neutralize(&mut store, &["w"], None).unwrap();
        for token in once.tokens() {
            let (a, b) = (once.get(token).unwrap(), store.get(token).unwrap());
            assert!(a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-12));
        }
    }

    #[test]
    fn test_neutralize_word_on_direction_fails_untouched() {
        let mut store = asymmetric_store();
        let direction = e0_direction(&store);
        let before = store.clone();
        let err = Debiaser::new(&direction, &AuditConfig::default())
            .neutralize(&mut store, &["w", "p"], None)
            .unwrap_err();
        assert!(matches!(err, BiasError::NumericalInstability(_)));
        assert_eq!(store, before);
    }

    #[test]
    fn test_neutralize_unknown_word_untouched() {
        let mut store = asymmetric_store();
        let direction = e0_direction(&store);
        let before = store.clone();
        let err = Debiaser::new(&direction, &AuditConfig::default())
            .neutralize(&mut store, &["w", "ghost"], None)
            .unwrap_err();
        assert_eq!(err, BiasError::UnknownToken("ghost".into()));
        assert_eq!(store, before);
    }

    #[test]
    fn test_equalize_pair_symmetric() {
        let mut store = asymmetric_store();
        let direction = e0_direction(&store);
        let debiaser = Debiaser::new(&direction, &AuditConfig::default());
        debiaser.neutralize(&mut store, &["w"], None).unwrap();
        let records = debiaser
            .equalize(&mut store, &[vec!["a", "b"]], None)
            .unwrap();

        let a = store.get("a").unwrap().to_vec();
        let b = store.get("b").unwrap().to_vec();
        let d = &direction.vector;
        assert!((dot(&a, d) + dot(&b, d)).abs() < 1e-9);
        let (ra, rb) = (reject(&a, d), reject(&b, d));
        assert!(ra.iter().zip(&rb).all(|(x, y)| (x - y).abs() < 1e-9));

        // A neutral word is equidistant from both members
        let w = store.get("w").unwrap();
        assert!((dot(w, &a) - dot(w, &b)).abs() < 1e-9);
        assert_unit_norms(&store);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].word, "a");
        assert!((records[0].scaling - records[1].scaling).abs() < 1e-12);
        assert!(
            (records[0].equalized_projected_scalar + records[1].equalized_projected_scalar).abs()
                < 1e-9
        );
        assert!((records[0].equalized_projected_scalar - records[0].scaling).abs() < 1e-9);
    }

    #[test]
    fn test_equalize_reports_progress() {
        let mut store = asymmetric_store();
        let direction = e0_direction(&store);
        let calls = RefCell::new(Vec::new());
        let hook = |done: usize, total: usize| calls.borrow_mut().push((done, total));
        Debiaser::new(&direction, &AuditConfig::default())
            .equalize(&mut store, &[vec!["a", "b"], vec!["p", "w"]], Some(&hook))
            .unwrap();
        assert_eq!(calls.into_inner(), vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn test_equalize_rejects_bad_sets() {
        let mut store = asymmetric_store();
        let direction = e0_direction(&store);
        let debiaser = Debiaser::new(&direction, &AuditConfig::default());
        let before = store.clone();
        assert!(matches!(
            debiaser.equalize(&mut store, &[vec!["a"]], None),
            Err(BiasError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            debiaser.equalize(&mut store, &[vec!["a", "b"], vec!["a", "ghost"]], None),
            Err(BiasError::UnknownToken(_))
        ));
        assert_eq!(store, before);
    }

    #[test]
    fn test_zero_vector_in_store_blocks_mutation() {
        let mut store = asymmetric_store();
        store.insert("pad", vec![0.0, 0.0, 0.0]).unwrap();
        let direction = e0_direction(&store);
        let debiaser = Debiaser::new(&direction, &AuditConfig::default());
        let before = store.clone();
        assert!(matches!(
            debiaser.neutralize(&mut store, &["w"], None),
            Err(BiasError::NumericalInstability(_))
        ));
        assert_eq!(store, before);
        assert!(matches!(
            debiaser.equalize(&mut store, &[vec!["a", "b"]], None),
            Err(BiasError::NumericalInstability(_))
        ));
        assert_eq!(store, before);
    }

    #[test]
    fn test_scaling_clamps_round_off() {
        let store = asymmetric_store();
        let direction = e0_direction(&store);
        let debiaser = Debiaser::new(&direction, &AuditConfig::default());
        assert!((debiaser.scaling(&[0.0, 0.6, 0.0]).unwrap() - 0.8).abs() < 1e-12);
        let overshoot = (1.0f64 + 1e-12).sqrt();
        assert_eq!(debiaser.scaling(&[0.0, overshoot, 0.0]).unwrap(), 0.0);
        assert!(matches!(
            debiaser.scaling(&[0.0, 1.1, 0.0]),
            Err(BiasError::NumericalInstability(_))
        ));
    }

    #[test]
    fn test_hard_debias_random_embedding() {
        let fixture = gendered_store(7, 6, 20, 8);
        let mut store = fixture.store;
        let pairs = Definitional::Pairs(fixture.pairs.clone());
        let direction = DirectionIdentifier::default()
            .identify(&store, "f0", "m0", &pairs, DirectionMethod::Pca)
            .unwrap();
        let debiaser = Debiaser::new(&direction, &AuditConfig::default());
        debiaser
            .neutralize(&mut store, &fixture.neutral, None)
            .unwrap();
        let sets: Vec<Vec<String>> = fixture
            .pairs
            .iter()
            .map(|(f, m)| vec![f.clone(), m.clone()])
            .collect();
        debiaser.equalize(&mut store, &sets, None).unwrap();

        assert_unit_norms(&store);
        for word in &fixture.neutral {
            let w = store.get(word).unwrap();
            assert!(dot(w, &direction.vector).abs() < 1e-9);
            for (f, m) in &fixture.pairs {
                let df = dot(w, store.get(f).unwrap());
                let dm = dot(w, store.get(m).unwrap());
                assert!((df - dm).abs() < 1e-9);
            }
        }
    }
}
