//! Scoring configuration.
//!
//! Every constant of the engine lives here with its default, so a TOML
//! file only needs to list what it overrides.

use serde::{Deserialize, Serialize};
use sitescore_model::MAX_FINAL_SCORE;
use std::path::Path;
use thiserror::Error;

use crate::curves::{PiecewiseCurve, ReviewCurve, ServiceCurve};
use crate::gap::DismissalPolicy;
use crate::rates::RateBands;
use crate::reputation::ReputationPolicy;
use crate::weights::WeightPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub rating: PiecewiseCurve,
    pub reviews: ReviewCurve,
    pub services: ServiceCurve,
    pub weights: WeightPolicy,
    pub dismissal: DismissalPolicy,
    pub reputation: ReputationPolicy,
    pub rates: RateBands,
    /// Upper bound of every final score
    pub max_final_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            rating: PiecewiseCurve::default_rating(),
            reviews: ReviewCurve::default(),
            services: ServiceCurve::default(),
            weights: WeightPolicy::default(),
            dismissal: DismissalPolicy::default(),
            reputation: ReputationPolicy::default(),
            rates: RateBands::default(),
            max_final_score: MAX_FINAL_SCORE,
        }
    }
}

impl ScoringConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rating.validate("rating")?;
        self.services.tiers.validate("services.tiers")?;
        self.weights.validate()?;
        self.rates.validate()?;
        self.dismissal.validate()?;
        self.reputation.validate()?;

        if !(0.0..=MAX_FINAL_SCORE).contains(&self.max_final_score) {
            return Err(ConfigError::Invalid(format!(
                "max_final_score must be within 0..={MAX_FINAL_SCORE}"
            )));
        }
        if !(0.0..=MAX_FINAL_SCORE).contains(&self.services.max_score) {
            return Err(ConfigError::Invalid(format!(
                "services.max_score must be within 0..={MAX_FINAL_SCORE}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_is_valid() {
        assert!(ScoringConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = ScoringConfig::from_toml_str("").unwrap();
        assert_eq!(config, ScoringConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let toml = r#"
            max_final_score = 90.0

            [weights]
            rating_max = 0.5

            [dismissal]
            per_item = 0.5
        "#;
        let config = ScoringConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.max_final_score, 90.0);
        assert_eq!(config.weights.rating_max, 0.5);
        assert_eq!(config.weights.rating_base, 0.30);
        assert_eq!(config.dismissal.per_item, 0.5);
        assert_eq!(config.dismissal.max_share, 0.10);
    }

    #[test]
    fn test_rating_segments_override() {
        let toml = r#"
            [[rating.segments]]
            lower = 0.0
            pivot = 0.0
            base = 0.0
            slope = 20.0
        "#;
        let config = ScoringConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.rating.segments.len(), 1);
        assert_eq!(config.rating.eval(4.0), 80.0);
    }

    #[test]
    fn test_cap_above_limit_rejected() {
        let err = ScoringConfig::from_toml_str("max_final_score = 120.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = ScoringConfig::from_toml_str("max_final_score = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_reputation_cap_above_hundred_rejected() {
        let toml = "[reputation]\nmax_score = 150.0\nper_sample = 20.0\nbase_cap = 140.0";
        let err = ScoringConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_negative_reputation_cap_rejected() {
        let err = ScoringConfig::from_toml_str("[reputation]\nmax_score = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_dismissal_share_above_limit_rejected() {
        let err = ScoringConfig::from_toml_str("[dismissal]\nmax_share = 0.5").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = ScoringConfig::from_toml_str("[dismissal]\nper_item = -0.3").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
