// ─────────────────────────────────────────────────────────────────────
// Word-Bias Kernel — Audit Session Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{BiasError, BiasResult};

/// Construction-time configuration for a bias auditing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// The embedding vocabulary contains only lower-case tokens, so
    /// seed words are not expanded to UPPER/Title case variants.
    /// Default: false.
    pub only_lower: bool,

    /// Log explained-variance tables and equalize diagnostics at `info`.
    /// Default: false.
    pub verbose: bool,

    /// Minimum explained-variance ratio of the first principal component
    /// for PCA direction identification to succeed.
    /// Default: 0.5.
    pub first_pc_threshold: f64,

    /// Number of principal components requested from PCA (capped by the
    /// rank of the definitional matrix).
    /// Default: 10.
    pub n_components: usize,

    /// Tolerance used when checking unit norms and zero projections.
    /// Default: 1e-6.
    pub unit_tolerance: f64,

    /// Negative radicand overshoot in equalize that is still clamped to 0.
    /// Anything more negative is reported as numerical instability.
    /// Default: 1e-9.
    pub radicand_tolerance: f64,

    /// Seed for every randomized step (word sampling).
    /// Default: 42.
    pub seed: u64,

    /// Vocabulary prefix considered by analogy generation.
    /// Default: 30000.
    pub max_analogy_vocab: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            only_lower: false,
            verbose: false,
            first_pc_threshold: 0.5,
            n_components: 10,
            unit_tolerance: 1e-6,
            radicand_tolerance: 1e-9,
            seed: 42,
            max_analogy_vocab: 30_000,
        }
    }
}

impl AuditConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> BiasResult<()> {
        if !(0.0..=1.0).contains(&self.first_pc_threshold) {
            return Err(BiasError::InvalidConfiguration(format!(
                "first_pc_threshold must be in [0, 1], got {}",
                self.first_pc_threshold
            )));
        }
        if self.n_components == 0 {
            return Err(BiasError::InvalidConfiguration(
                "n_components must be >= 1".to_string(),
            ));
        }
        if !(self.unit_tolerance > 0.0 && self.unit_tolerance < 1.0) {
            return Err(BiasError::InvalidConfiguration(format!(
                "unit_tolerance must be in (0, 1), got {}",
                self.unit_tolerance
            )));
        }
        if !(self.radicand_tolerance >= 0.0 && self.radicand_tolerance < 1.0) {
            return Err(BiasError::InvalidConfiguration(format!(
                "radicand_tolerance must be in [0, 1), got {}",
                self.radicand_tolerance
            )));
        }
        if self.max_analogy_vocab < 2 {
            return Err(BiasError::InvalidConfiguration(format!(
                "max_analogy_vocab must be >= 2, got {}",
                self.max_analogy_vocab
            )));
        }
        Ok(())
    }

    /// Load from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> BiasResult<Self> {
        serde_json::from_str(json).map_err(|e| BiasError::Config(format!("JSON parse error: {e}")))
    }

    pub fn with_only_lower(mut self, only_lower: bool) -> Self {
        self.only_lower = only_lower;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
