// ─────────────────────────────────────────────────────────────────────
// Word-Bias Kernel — Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! word-bias kernel: auditing and hard debiasing of word embeddings.

pub mod config;
pub mod error;
pub mod method;
pub mod report;

pub use config::AuditConfig;
pub use error::{BiasError, BiasResult};
pub use method::{DebiasMethod, DirectionMethod, SessionState};
pub use report::{
    Analogy, CrossEmbeddingBias, CrossProjection, EqualizeRecord, IndirectBiasEntry,
    ProjectionScore,
};
