// ─────────────────────────────────────────────────────────────────────
// Word-Bias Kernel — Audit Session
// ─────────────────────────────────────────────────────────────────────
//! One auditing session over one embedding store.
//!
//! The session owns its configuration, optional domain tables, the
//! identified direction and the store. Metrics borrow the store;
//! debiasing mutates it, or a deep copy of the whole session when
//! `inplace` is false.
//!
//! # Lifecycle
//!
//! `Uninitialized → DirectionIdentified → {Neutralized, Equalized,
//! HardDebiased}`. Neutralize plus equalize, in either order or at once
//! via `hard`, reach `HardDebiased`. Re-identifying a direction resets
//! to `DirectionIdentified`.

use std::collections::HashSet;

use wordbias_types::{
    Analogy, AuditConfig, BiasError, BiasResult, CrossEmbeddingBias, DebiasMethod,
    DirectionMethod, EqualizeRecord, IndirectBiasEntry, ProjectionScore, SessionState,
};

use crate::debias::{check_renormalizable, validate_sets, Debiaser, ProgressCallback};
use crate::direction::{BiasDirection, Definitional, DirectionIdentifier};
use crate::domain::{BiasDomain, PreparedDomain};
use crate::metrics::{bias_across_embeddings, AnalogyParams, BiasMetrics};
use crate::store::EmbeddingStore;
use crate::vector_ops::l2_norm;
use crate::words::sample_words;

#[derive(Debug, Clone)]
pub struct BiasSession<S: EmbeddingStore> {
    store: S,
    config: AuditConfig,
    domain: Option<PreparedDomain>,
    direction: Option<BiasDirection>,
    state: SessionState,
}

impl<S: EmbeddingStore> BiasSession<S> {
    /// Session without a domain or direction.
    pub fn new(store: S, config: AuditConfig) -> BiasResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            domain: None,
            direction: None,
            state: SessionState::Uninitialized,
        })
    }

    /// Session over `domain`, with the direction identified from the
    /// domain's poles and definitional pairs.
    pub fn with_domain(store: S, domain: &BiasDomain, config: AuditConfig) -> BiasResult<Self> {
        domain.validate()?;
        let mut session = Self::new(store, config)?;
        session.domain = Some(domain.prepare(&session.store, session.config.only_lower));
        session.identify_direction(
            &domain.positive_end,
            &domain.negative_end,
            &domain.definitional(),
            domain.direction_method,
        )?;
        Ok(session)
    }

    /// Identify (or re-identify) the bias direction.
    pub fn identify_direction(
        &mut self,
        positive_end: &str,
        negative_end: &str,
        definitional: &Definitional,
        method: DirectionMethod,
    ) -> BiasResult<&BiasDirection> {
        let direction = DirectionIdentifier::from_config(&self.config).identify(
            &self.store,
            positive_end,
            negative_end,
            definitional,
            method,
        )?;
        log::debug!("direction identified: {}", direction.label());
        self.state = SessionState::DirectionIdentified;
        Ok(self.direction.insert(direction))
    }

    pub fn require_direction(&self) -> BiasResult<&BiasDirection> {
        self.direction.as_ref().ok_or(BiasError::DirectionNotIdentified)
    }

    fn metrics(&self) -> BiasResult<BiasMetrics<'_, S>> {
        Ok(BiasMetrics::new(&self.store, self.require_direction()?))
    }

    // ── Metrics ─────────────────────────────────────────────────────

    pub fn project_on_direction(&self, word: &str) -> BiasResult<f64> {
        self.metrics()?.project_on_direction(word)
    }

    pub fn projection_scores<W: AsRef<str>>(&self, words: &[W]) -> BiasResult<Vec<ProjectionScore>> {
        self.metrics()?.projection_scores(words)
    }

    pub fn direct_bias<W: AsRef<str>>(&self, neutral_words: &[W], c: f64) -> BiasResult<f64> {
        self.metrics()?.direct_bias(neutral_words, c)
    }

    /// Direct bias of a named domain word group, e.g.
    /// [`NEUTRAL_PROFESSIONS`](crate::domain::NEUTRAL_PROFESSIONS).
    pub fn direct_bias_on_group(&self, group: &str, c: f64) -> BiasResult<f64> {
        let words = self.word_group(group)?;
        self.metrics()?.direct_bias(words, c)
    }

    pub fn indirect_bias(&self, word1: &str, word2: &str) -> BiasResult<f64> {
        self.metrics()?.indirect_bias(word1, word2)
    }

    pub fn closest_words_indirect_bias<W: AsRef<str>>(
        &self,
        positive_end: &str,
        negative_end: &str,
        words: &[W],
        n_extreme: usize,
    ) -> BiasResult<Vec<IndirectBiasEntry>> {
        self.metrics()?
            .closest_words_indirect_bias(positive_end, negative_end, words, n_extreme)
    }

    /// Analogy settings with the configured vocabulary limit.
    pub fn analogy_params(&self) -> AnalogyParams {
        AnalogyParams::default().with_restrict_vocab(self.config.max_analogy_vocab)
    }

    pub fn generate_analogies(&self, params: &AnalogyParams) -> BiasResult<Vec<Analogy>> {
        self.metrics()?.generate_analogies(params)
    }

    /// Compare projections of `words` with another session's embedding.
    pub fn bias_across_embeddings<T: EmbeddingStore, W: AsRef<str>>(
        &self,
        other: &BiasSession<T>,
        words: &[W],
    ) -> BiasResult<CrossEmbeddingBias> {
        bias_across_embeddings(&self.metrics()?, &other.metrics()?, words)
    }

    /// Seeded sample of `n` words using the configured seed.
    pub fn sample_words<W: AsRef<str>>(&self, words: &[W], n: usize) -> BiasResult<Vec<String>> {
        sample_words(words, n, self.config.seed)
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Neutralize `words` in place.
    pub fn neutralize<W: AsRef<str>>(
        &mut self,
        words: &[W],
        progress: Option<ProgressCallback<'_>>,
    ) -> BiasResult<usize> {
        let direction = self.direction.as_ref().ok_or(BiasError::DirectionNotIdentified)?;
        let count = Debiaser::new(direction, &self.config).neutralize(&mut self.store, words, progress)?;
        self.state = match self.state {
            SessionState::Equalized | SessionState::HardDebiased => SessionState::HardDebiased,
            _ => SessionState::Neutralized,
        };
        Ok(count)
    }

    /// Equalize `equality_sets` in place.
    pub fn equalize<W: AsRef<str>>(
        &mut self,
        equality_sets: &[Vec<W>],
        progress: Option<ProgressCallback<'_>>,
    ) -> BiasResult<Vec<EqualizeRecord>> {
        let direction = self.direction.as_ref().ok_or(BiasError::DirectionNotIdentified)?;
        let records =
            Debiaser::new(direction, &self.config).equalize(&mut self.store, equality_sets, progress)?;
        self.state = match self.state {
            SessionState::Neutralized | SessionState::HardDebiased => SessionState::HardDebiased,
            _ => SessionState::Equalized,
        };
        Ok(records)
    }

    /// Debias this session's store in place.
    ///
    /// Missing `neutral_words` and `equality_sets` default to the domain
    /// tables. `soft` is rejected before anything is touched.
    pub fn debias_in_place(
        &mut self,
        method: DebiasMethod,
        neutral_words: Option<&[String]>,
        equality_sets: Option<&[Vec<String>]>,
    ) -> BiasResult<()> {
        if method == DebiasMethod::Soft {
            return Err(unsupported_soft());
        }
        self.require_direction()?;

        let neutral_words = self.resolve_neutral_words(neutral_words)?;
        let equality_sets = match method {
            DebiasMethod::Hard => {
                let sets = self.resolve_equality_sets(equality_sets)?;
                check_disjoint(&neutral_words, &sets)?;
                validate_sets(&self.store, &sets)?;
                sets
            }
            _ => Vec::new(),
        };
        check_renormalizable(&self.store)?;

        log::debug!("Neutralize...");
        self.neutralize(&neutral_words, None)?;
        if method == DebiasMethod::Hard {
            log::debug!("Equalize...");
            self.equalize(&equality_sets, None)?;
        }
        Ok(())
    }

    fn resolve_neutral_words(&self, explicit: Option<&[String]>) -> BiasResult<Vec<String>> {
        match (explicit, &self.domain) {
            (Some(words), _) => Ok(words.to_vec()),
            (None, Some(domain)) => Ok(domain.neutral_words.clone()),
            (None, None) => Err(BiasError::InvalidConfiguration(
                "no neutral words given and the session has no bias domain".to_string(),
            )),
        }
    }

    fn resolve_equality_sets(&self, explicit: Option<&[Vec<String>]>) -> BiasResult<Vec<Vec<String>>> {
        match (explicit, &self.domain) {
            (Some(sets), _) => Ok(sets.to_vec()),
            (None, Some(domain)) => Ok(domain.equality_sets.clone()),
            (None, None) => Err(BiasError::InvalidConfiguration(
                "no equality sets given and the session has no bias domain".to_string(),
            )),
        }
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn direction(&self) -> Option<&BiasDirection> {
        self.direction.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn domain(&self) -> Option<&PreparedDomain> {
        self.domain.as_ref()
    }

    /// A named word group of the session's domain.
    pub fn word_group(&self, name: &str) -> BiasResult<&[String]> {
        self.domain
            .as_ref()
            .ok_or_else(|| {
                BiasError::InvalidConfiguration(format!(
                    "word group {name:?} requested but the session has no bias domain"
                ))
            })?
            .group(name)
    }

    /// Every vector has unit norm within `unit_tolerance`.
    pub fn is_unit_normalized(&self) -> bool {
        let tolerance = self.config.unit_tolerance;
        self.store
            .tokens()
            .filter_map(|t| self.store.get(t).ok())
            .all(|v| (l2_norm(v) - 1.0).abs() <= tolerance)
    }
}

impl<S: EmbeddingStore + Clone> BiasSession<S> {
    /// Debias in place (`inplace = true`, returns `None`) or on a deep
    /// copy of the session (returns `Some(copy)`, `self` untouched).
    pub fn debias(
        &mut self,
        method: DebiasMethod,
        neutral_words: Option<&[String]>,
        equality_sets: Option<&[Vec<String>]>,
        inplace: bool,
    ) -> BiasResult<Option<Self>> {
        if method == DebiasMethod::Soft {
            return Err(unsupported_soft());
        }
        if inplace {
            self.debias_in_place(method, neutral_words, equality_sets)?;
            return Ok(None);
        }
        let mut copy = self.clone();
        copy.debias_in_place(method, neutral_words, equality_sets)?;
        Ok(Some(copy))
    }
}

fn unsupported_soft() -> BiasError {
    BiasError::UnsupportedOperation("soft debiasing is not implemented".to_string())
}

fn check_disjoint(neutral_words: &[String], equality_sets: &[Vec<String>]) -> BiasResult<()> {
    let neutral: HashSet<&str> = neutral_words.iter().map(String::as_str).collect();
    let overlap = equality_sets
        .iter()
        .flatten()
        .find(|w| neutral.contains(w.as_str()));
    match overlap {
        Some(word) => Err(BiasError::InvalidConfiguration(format!(
            "{word:?} is both a neutral word and in an equality set"
        ))),
        None => Ok(()),
    }
}
