// ─────────────────────────────────────────────────────────────────────
// Word-Bias Kernel — Method Selection and Session Lifecycle
// ─────────────────────────────────────────────────────────────────────

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BiasError;

/// How the bias direction is derived from definitional words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionMethod {
    /// Difference of one normalized word pair.
    Single,
    /// Difference of two normalized group sums.
    Sum,
    /// First principal component of centered definitional pairs.
    #[default]
    Pca,
}

impl DirectionMethod {
    pub const ALL: [DirectionMethod; 3] = [Self::Single, Self::Sum, Self::Pca];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Sum => "sum",
            Self::Pca => "pca",
        }
    }
}

impl fmt::Display for DirectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DirectionMethod {
    type Err = BiasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                BiasError::InvalidConfiguration(format!(
                    "direction method should be one of [single, sum, pca], {s:?} was given"
                ))
            })
    }
}

/// Debiasing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebiasMethod {
    /// Strip the direction component from neutral words.
    Neutralize,
    /// Neutralize, then equalize the equality sets.
    #[default]
    Hard,
    /// Declared for API completeness; always rejected as unsupported.
    Soft,
}

impl DebiasMethod {
    pub const ALL: [DebiasMethod; 3] = [Self::Neutralize, Self::Hard, Self::Soft];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutralize => "neutralize",
            Self::Hard => "hard",
            Self::Soft => "soft",
        }
    }
}

impl fmt::Display for DebiasMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DebiasMethod {
    type Err = BiasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                BiasError::InvalidConfiguration(format!(
                    "debias method should be one of [neutralize, hard, soft], {s:?} was given"
                ))
            })
    }
}

/// Lifecycle of one auditing session over one embedding store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Uninitialized,
    DirectionIdentified,
    Neutralized,
    Equalized,
    HardDebiased,
}

impl SessionState {
    pub fn has_direction(&self) -> bool {
        !matches!(self, Self::Uninitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_direction_methods() {
        assert_eq!("pca".parse::<DirectionMethod>().unwrap(), DirectionMethod::Pca);
        assert_eq!(
            "single".parse::<DirectionMethod>().unwrap(),
            DirectionMethod::Single
        );
        assert!(matches!(
            "svd".parse::<DirectionMethod>(),
            Err(BiasError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_parse_debias_methods() {
        for m in DebiasMethod::ALL {
            assert_eq!(m.as_str().parse::<DebiasMethod>().unwrap(), m);
        }
        assert!("HARD".parse::<DebiasMethod>().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(DirectionMethod::default(), DirectionMethod::Pca);
        assert_eq!(DebiasMethod::default(), DebiasMethod::Hard);
        assert!(!SessionState::default().has_direction());
        assert!(SessionState::Neutralized.has_direction());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&DebiasMethod::Neutralize).unwrap();
        assert_eq!(json, "\"neutralize\"");
        let m: DirectionMethod = serde_json::from_str("\"sum\"").unwrap();
        assert_eq!(m, DirectionMethod::Sum);
    }
}
