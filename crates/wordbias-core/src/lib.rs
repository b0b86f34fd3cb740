// ─────────────────────────────────────────────────────────────────────
// Word-Bias Kernel — Core Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Auditing and hard debiasing of word embeddings.
//!
//! Identifies a bias direction (e.g. she − he) from definitional words,
//! measures direct and indirect bias against it, and removes it with
//! neutralize + equalize (Bolukbasi et al. 2016).
//!
//! # Invariants
//!
//! 1. **Unit vectors after mutation**: every debiasing step ends with a
//!    global re-normalization; all vectors have unit norm afterwards.
//!
//! 2. **Validate, then write**: neutralize checks every word (presence and
//!    a non-zero rejection) before the first write; equalize checks every
//!    token before the first set is written. Both refuse a store holding a
//!    zero or non-finite vector, which the closing re-normalization could
//!    not fix. Hard debias validates the equality sets before neutralizing.
//!
//! 3. **No silent NaNs**: zero-norm vectors, degenerate PCA input and
//!    negative equalize radicands surface as `NumericalInstability`.
//!
//! 4. **Direction first**: every metric and mutation fails with
//!    `DirectionNotIdentified` until a direction exists.

pub mod debias;
pub mod direction;
pub mod domain;
pub mod metrics;
pub mod pca;
pub mod session;
pub mod store;
pub mod vector_ops;
pub mod words;

#[cfg(test)]
mod fixtures;

pub use debias::{Debiaser, ProgressCallback};
pub use direction::{BiasDirection, Definitional, DirectionIdentifier};
pub use domain::{BiasDomain, PreparedDomain, NEUTRAL_PROFESSIONS, PROFESSIONS};
pub use metrics::{bias_across_embeddings, spearman_rho, AnalogyParams, BiasMetrics};
pub use pca::Pca;
pub use session::BiasSession;
pub use store::{EmbeddingStore, InMemoryEmbedding};
