// ─────────────────────────────────────────────────────────────────────
// Word-Bias Kernel — PyO3 FFI Bindings
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
// Note: #[deny(unsafe_code)] not applied: PyO3 proc macros generate
// unsafe blocks internally. All hand-written code in this crate is safe.
//! Python-callable wrappers around the word-bias kernel.
//!
//! Exposes `WordsEmbedding`, `BiasWordsEmbedding`, `AuditConfig` and
//! `BiasDomain` to Python via PyO3. Embedding loading stays on the Python
//! side: pass tokens and vectors in, get reports back as dicts.
//!
//! # Error mapping
//!
//! - unknown token → `KeyError`
//! - unsupported method (`soft`) → `NotImplementedError`
//! - missing direction, numerical instability → `RuntimeError`
//! - everything else → `ValueError`
//!
//! Install: `pip install -e crates/wordbias-ffi` (requires maturin).
//!
//! Usage from Python:
//! ```python
//! from wordbias_kernel import WordsEmbedding, BiasWordsEmbedding, BiasDomain
//!
//! emb = WordsEmbedding(tokens, vectors)
//! wb = BiasWordsEmbedding(emb, domain=BiasDomain.gender())
//! wb.calc_direct_bias()
//! debiased = wb.debias("hard", inplace=False)
//! ```

use pyo3::exceptions::{PyKeyError, PyNotImplementedError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use wordbias_core::{
    BiasDomain, BiasSession, Definitional, EmbeddingStore, InMemoryEmbedding, NEUTRAL_PROFESSIONS,
    PROFESSIONS,
};
use wordbias_types::{AuditConfig, BiasError, DebiasMethod, DirectionMethod, EqualizeRecord};

fn to_py_err(err: BiasError) -> PyErr {
    match err {
        BiasError::UnknownToken(_) => PyKeyError::new_err(err.to_string()),
        BiasError::UnsupportedOperation(_) => PyNotImplementedError::new_err(err.to_string()),
        BiasError::DirectionNotIdentified | BiasError::NumericalInstability(_) => {
            PyRuntimeError::new_err(err.to_string())
        }
        _ => PyValueError::new_err(err.to_string()),
    }
}

fn records_to_list<'py>(py: Python<'py>, records: &[EqualizeRecord]) -> PyResult<Bound<'py, PyList>> {
    let list = PyList::empty(py);
    for r in records {
        let dict = PyDict::new(py);
        dict.set_item("equality_set_index", r.equality_set_index)?;
        dict.set_item("word", &r.word)?;
        dict.set_item("scaling", r.scaling)?;
        dict.set_item("projected_scalar", r.projected_scalar)?;
        dict.set_item("equalized_projected_scalar", r.equalized_projected_scalar)?;
        list.append(dict)?;
    }
    Ok(list)
}

// ─── PyAuditConfig ──────────────────────────────────────────────────

/// Python-visible audit session configuration.
#[pyclass(name = "AuditConfig")]
#[derive(Clone)]
struct PyAuditConfig {
    inner: AuditConfig,
}

#[pymethods]
impl PyAuditConfig {
    #[new]
    #[pyo3(signature = (
        only_lower = false,
        verbose = false,
        first_pc_threshold = 0.5,
        n_components = 10,
        unit_tolerance = 1e-6,
        radicand_tolerance = 1e-9,
        seed = 42,
        max_analogy_vocab = 30000,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        only_lower: bool,
        verbose: bool,
        first_pc_threshold: f64,
        n_components: usize,
        unit_tolerance: f64,
        radicand_tolerance: f64,
        seed: u64,
        max_analogy_vocab: usize,
    ) -> PyResult<Self> {
        let config = AuditConfig {
            only_lower,
            verbose,
            first_pc_threshold,
            n_components,
            unit_tolerance,
            radicand_tolerance,
            seed,
            max_analogy_vocab,
        };
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    /// Construct from JSON string.
    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        let config = AuditConfig::from_json(json).map_err(to_py_err)?;
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    #[getter]
    fn only_lower(&self) -> bool {
        self.inner.only_lower
    }

    #[getter]
    fn verbose(&self) -> bool {
        self.inner.verbose
    }

    fn __repr__(&self) -> String {
        format!(
            "AuditConfig(only_lower={}, first_pc_threshold={}, seed={})",
            self.inner.only_lower, self.inner.first_pc_threshold, self.inner.seed
        )
    }
}

// ─── PyBiasDomain ───────────────────────────────────────────────────

/// Word tables of one bias domain.
#[pyclass(name = "BiasDomain")]
#[derive(Clone)]
struct PyBiasDomain {
    inner: BiasDomain,
}

#[pymethods]
impl PyBiasDomain {
    /// Gender domain (Bolukbasi et al. definitional pairs).
    #[staticmethod]
    fn gender() -> Self {
        Self {
            inner: BiasDomain::gender(),
        }
    }

    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        Ok(Self {
            inner: BiasDomain::from_json(json).map_err(to_py_err)?,
        })
    }

    #[getter]
    fn name(&self) -> &str {
        &self.inner.name
    }

    #[getter]
    fn positive_end(&self) -> &str {
        &self.inner.positive_end
    }

    #[getter]
    fn negative_end(&self) -> &str {
        &self.inner.negative_end
    }

    #[getter]
    fn definitional_pairs(&self) -> Vec<(String, String)> {
        self.inner.definitional_pairs.clone()
    }

    fn __repr__(&self) -> String {
        format!(
            "BiasDomain(name={:?}, {} pairs, method={})",
            self.inner.name,
            self.inner.definitional_pairs.len(),
            self.inner.direction_method
        )
    }
}

// ─── PyEmbedding ────────────────────────────────────────────────────

/// In-memory words embedding built from parallel token/vector lists.
#[pyclass(name = "WordsEmbedding")]
#[derive(Clone)]
struct PyEmbedding {
    inner: InMemoryEmbedding,
}

#[pymethods]
impl PyEmbedding {
    #[new]
    fn new(tokens: Vec<String>, vectors: Vec<Vec<f64>>) -> PyResult<Self> {
        Ok(Self {
            inner: InMemoryEmbedding::from_rows(tokens, vectors).map_err(to_py_err)?,
        })
    }

    #[getter]
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __contains__(&self, token: &str) -> bool {
        self.inner.contains(token)
    }

    fn __getitem__(&self, token: &str) -> PyResult<Vec<f64>> {
        self.inner
            .get(token)
            .map(<[f64]>::to_vec)
            .map_err(to_py_err)
    }

    fn tokens(&self) -> Vec<String> {
        self.inner.tokens().map(str::to_string).collect()
    }

    fn __repr__(&self) -> String {
        format!(
            "WordsEmbedding(len={}, dim={})",
            self.inner.len(),
            self.inner.dim()
        )
    }
}

// ─── PyBiasSession ──────────────────────────────────────────────────

/// Audit and adjust the bias of a words embedding.
///
/// Owns a copy of the embedding it was built from.
#[pyclass(name = "BiasWordsEmbedding")]
#[derive(Clone)]
struct PyBiasSession {
    inner: BiasSession<InMemoryEmbedding>,
}

impl PyBiasSession {
    /// Explicit words, or the named domain group when absent.
    fn words_or_group(&self, words: Option<Vec<String>>, group: &str) -> PyResult<Vec<String>> {
        match words {
            Some(words) => Ok(words),
            None => Ok(self.inner.word_group(group).map_err(to_py_err)?.to_vec()),
        }
    }
}

#[pymethods]
impl PyBiasSession {
    /// Without a domain, call `identify_direction` before any metric.
    #[new]
    #[pyo3(signature = (embedding, config = None, domain = None))]
    fn new(
        embedding: PyEmbedding,
        config: Option<PyAuditConfig>,
        domain: Option<PyBiasDomain>,
    ) -> PyResult<Self> {
        let cfg = config.map(|c| c.inner).unwrap_or_default();
        let inner = match domain {
            Some(d) => BiasSession::with_domain(embedding.inner, &d.inner, cfg),
            None => BiasSession::new(embedding.inner, cfg),
        }
        .map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Identify the bias direction.
    ///
    /// Args:
    ///     positive_end, negative_end: pole words.
    ///     definitional_pairs: word pairs; `single` uses the first,
    ///         `sum` sums the first and second elements as two groups.
    ///     method: "single", "sum" or "pca".
    #[pyo3(signature = (positive_end, negative_end, definitional_pairs, method = "pca"))]
    fn identify_direction(
        &mut self,
        positive_end: &str,
        negative_end: &str,
        definitional_pairs: Vec<(String, String)>,
        method: &str,
    ) -> PyResult<()> {
        let method: DirectionMethod = method.parse().map_err(to_py_err)?;
        let definitional = match method {
            DirectionMethod::Sum => Definitional::groups(
                definitional_pairs.iter().map(|(a, _)| a.clone()),
                definitional_pairs.iter().map(|(_, b)| b.clone()),
            ),
            _ => Definitional::Pairs(definitional_pairs),
        };
        self.inner
            .identify_direction(positive_end, negative_end, &definitional, method)
            .map_err(to_py_err)?;
        Ok(())
    }

    #[getter]
    fn direction(&self) -> Option<Vec<f64>> {
        self.inner.direction().map(|d| d.vector.clone())
    }

    #[getter]
    fn positive_end(&self) -> Option<String> {
        self.inner.direction().map(|d| d.positive_end.clone())
    }

    #[getter]
    fn negative_end(&self) -> Option<String> {
        self.inner.direction().map(|d| d.negative_end.clone())
    }

    /// Lifecycle state name, e.g. "HardDebiased".
    #[getter]
    fn state(&self) -> String {
        format!("{:?}", self.inner.state())
    }

    fn project_on_direction(&self, word: &str) -> PyResult<f64> {
        self.inner.project_on_direction(word).map_err(to_py_err)
    }

    /// List of (word, projection) sorted by projection descending.
    #[pyo3(signature = (words = None))]
    fn calc_projection_scores(&self, words: Option<Vec<String>>) -> PyResult<Vec<(String, f64)>> {
        let words = self.words_or_group(words, PROFESSIONS)?;
        let scores = self.inner.projection_scores(&words).map_err(to_py_err)?;
        Ok(scores.into_iter().map(|s| (s.word, s.projection)).collect())
    }

    /// Direct bias; defaults to the domain's neutral professions.
    #[pyo3(signature = (neutral_words = None, c = 1.0))]
    fn calc_direct_bias(&self, neutral_words: Option<Vec<String>>, c: f64) -> PyResult<f64> {
        let words = self.words_or_group(neutral_words, NEUTRAL_PROFESSIONS)?;
        self.inner.direct_bias(&words, c).map_err(to_py_err)
    }

    fn calc_indirect_bias(&self, word1: &str, word2: &str) -> PyResult<f64> {
        self.inner.indirect_bias(word1, word2).map_err(to_py_err)
    }

    /// Rows of `{end, word, projection, indirect_bias}`.
    #[pyo3(signature = (neutral_positive_end, neutral_negative_end, words = None, n_extreme = 5))]
    fn generate_closest_words_indirect_bias<'py>(
        &self,
        py: Python<'py>,
        neutral_positive_end: &str,
        neutral_negative_end: &str,
        words: Option<Vec<String>>,
        n_extreme: usize,
    ) -> PyResult<Bound<'py, PyList>> {
        let words = self.words_or_group(words, PROFESSIONS)?;
        let rows = self
            .inner
            .closest_words_indirect_bias(neutral_positive_end, neutral_negative_end, &words, n_extreme)
            .map_err(to_py_err)?;
        let list = PyList::empty(py);
        for row in rows {
            let dict = PyDict::new(py);
            dict.set_item("end", row.end)?;
            dict.set_item("word", row.word)?;
            dict.set_item("projection", row.projection)?;
            dict.set_item("indirect_bias", row.indirect_bias)?;
            list.append(dict)?;
        }
        Ok(list)
    }

    /// Rows of `{x, y, distance, score}`.
    #[pyo3(signature = (n_analogies = 100, multiple = false, delta = 1.0, restrict_vocab = None))]
    fn generate_analogies<'py>(
        &self,
        py: Python<'py>,
        n_analogies: usize,
        multiple: bool,
        delta: f64,
        restrict_vocab: Option<usize>,
    ) -> PyResult<Bound<'py, PyList>> {
        let mut params = self
            .inner
            .analogy_params()
            .with_n_analogies(n_analogies)
            .with_multiple(multiple)
            .with_delta(delta);
        if let Some(limit) = restrict_vocab {
            params = params.with_restrict_vocab(limit);
        }
        let analogies = self.inner.generate_analogies(&params).map_err(to_py_err)?;
        let list = PyList::empty(py);
        for a in analogies {
            let dict = PyDict::new(py);
            dict.set_item("x", a.x)?;
            dict.set_item("y", a.y)?;
            dict.set_item("distance", a.distance)?;
            dict.set_item("score", a.score)?;
            list.append(dict)?;
        }
        Ok(list)
    }

    /// Debias with "neutralize", "hard" or "soft" (unsupported).
    ///
    /// Returns None when `inplace`, otherwise a new debiased object.
    #[pyo3(signature = (method = "hard", neutral_words = None, equality_sets = None, inplace = true))]
    fn debias(
        &mut self,
        method: &str,
        neutral_words: Option<Vec<String>>,
        equality_sets: Option<Vec<Vec<String>>>,
        inplace: bool,
    ) -> PyResult<Option<PyBiasSession>> {
        let method: DebiasMethod = method.parse().map_err(to_py_err)?;
        let copy = self
            .inner
            .debias(
                method,
                neutral_words.as_deref(),
                equality_sets.as_deref(),
                inplace,
            )
            .map_err(to_py_err)?;
        Ok(copy.map(|inner| PyBiasSession { inner }))
    }

    /// Neutralize `words` in place. Returns the number of words.
    fn neutralize(&mut self, words: Vec<String>) -> PyResult<usize> {
        self.inner.neutralize(&words, None).map_err(to_py_err)
    }

    /// Equalize `equality_sets` in place. Returns per-word diagnostics.
    fn equalize<'py>(
        &mut self,
        py: Python<'py>,
        equality_sets: Vec<Vec<String>>,
    ) -> PyResult<Bound<'py, PyList>> {
        let records = self
            .inner
            .equalize(&equality_sets, None)
            .map_err(to_py_err)?;
        records_to_list(py, &records)
    }

    /// Seeded sample of `n` words (configured seed).
    fn sample_words(&self, words: Vec<String>, n: usize) -> PyResult<Vec<String>> {
        self.inner.sample_words(&words, n).map_err(to_py_err)
    }

    /// Copy of the current embedding.
    fn embedding(&self) -> PyEmbedding {
        PyEmbedding {
            inner: self.inner.store().clone(),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "BiasWordsEmbedding(len={}, state={:?})",
            self.inner.store().len(),
            self.inner.state()
        )
    }
}

/// Projections of `words` in two sessions and their Spearman rho.
///
/// Returns `{"projections": [(word, first, second), ...], "rho": float}`.
#[pyfunction]
#[pyo3(signature = (first, second, words = None))]
fn bias_across_embeddings<'py>(
    py: Python<'py>,
    first: PyRef<'py, PyBiasSession>,
    second: PyRef<'py, PyBiasSession>,
    words: Option<Vec<String>>,
) -> PyResult<Bound<'py, PyDict>> {
    let words = first.words_or_group(words, NEUTRAL_PROFESSIONS)?;
    let report = first
        .inner
        .bias_across_embeddings(&second.inner, &words)
        .map_err(to_py_err)?;
    let projections: Vec<(String, f64, f64)> = report
        .projections
        .into_iter()
        .map(|p| (p.word, p.first, p.second))
        .collect();
    let dict = PyDict::new(py);
    dict.set_item("projections", projections)?;
    dict.set_item("rho", report.rho)?;
    Ok(dict)
}

// ─── Module Registration ────────────────────────────────────────────

/// Word-Bias Kernel — audit and hard-debias word embeddings.
///
/// - `AuditConfig`: session configuration
/// - `BiasDomain`: domain word tables
/// - `WordsEmbedding`: in-memory token → vector store
/// - `BiasWordsEmbedding`: direction, metrics and debiasing
/// - `bias_across_embeddings`: compare two sessions
#[pymodule]
fn wordbias_kernel(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyAuditConfig>()?;
    m.add_class::<PyBiasDomain>()?;
    m.add_class::<PyEmbedding>()?;
    m.add_class::<PyBiasSession>()?;
    m.add_function(wrap_pyfunction!(bias_across_embeddings, m)?)?;
    Ok(())
}

