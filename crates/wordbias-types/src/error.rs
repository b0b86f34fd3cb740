// ─────────────────────────────────────────────────────────────────────
// Word-Bias Kernel — Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all word-bias kernel failures.
///
/// Every variant is a programming or data error raised at the point of
/// violation. None of them is transient, so callers never retry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BiasError {
    /// Equal poles, unknown method names, malformed word sets, bad parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A metric or mutation was requested before a bias direction exists.
    #[error("the bias direction was not identified for this session")]
    DirectionNotIdentified,

    /// Degenerate geometry (weak first principal component, zero-length
    /// vectors, equalize radicand overshoot).
    #[error("numerical instability: {0}")]
    NumericalInstability(String),

    /// Token missing from the embedding vocabulary.
    #[error("unknown token: {0:?}")]
    UnknownToken(String),

    /// A declared but unimplemented operation (soft debiasing).
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Vector written to a store has the wrong dimensionality.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(String),
}

pub type BiasResult<T> = Result<T, BiasError>;
