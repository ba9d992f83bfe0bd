use serde::{Deserialize, Serialize};
use sitescore_features::{count_keyword_hits, NEGATIVE_KEYWORDS, POSITIVE_KEYWORDS};
use sitescore_model::{ReputationSample, ReputationScore, Sentiment};

use crate::ConfigError;

/// Upper bound of any reputation score.
pub const MAX_REPUTATION_SCORE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReputationPolicy {
    pub per_sample: f64,
    pub base_cap: f64,
    pub sentiment_scale: f64,
    pub sentiment_cap: f64,
    pub max_score: f64,
    /// Score when no sample is enabled. Missing data is not negative evidence.
    pub no_data_score: u32,
}

impl Default for ReputationPolicy {
    fn default() -> Self {
        Self {
            per_sample: 8.0,
            base_cap: 70.0,
            sentiment_scale: 15.0,
            sentiment_cap: 30.0,
            max_score: 100.0,
            no_data_score: 30,
        }
    }
}

impl ReputationPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("per_sample", self.per_sample),
            ("base_cap", self.base_cap),
            ("sentiment_scale", self.sentiment_scale),
            ("sentiment_cap", self.sentiment_cap),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "reputation.{name} must be finite and non-negative"
                )));
            }
        }
        if !(0.0..=MAX_REPUTATION_SCORE).contains(&self.max_score) {
            return Err(ConfigError::Invalid(format!(
                "reputation.max_score must be within 0..={MAX_REPUTATION_SCORE}"
            )));
        }
        if f64::from(self.no_data_score) > self.max_score {
            return Err(ConfigError::Invalid(
                "reputation.no_data_score must not exceed reputation.max_score".to_string(),
            ));
        }
        Ok(())
    }
}

/// Score the enabled samples with the default policy.
pub fn score_reputation(samples: &[ReputationSample]) -> ReputationScore {
    score_reputation_with(samples, &ReputationPolicy::default())
}

pub fn score_reputation_with(samples: &[ReputationSample], policy: &ReputationPolicy) -> ReputationScore {
    let enabled: Vec<&ReputationSample> = samples.iter().filter(|s| s.enabled).collect();

    let (positive_hits, negative_hits) = enabled.iter().fold((0, 0), |(pos, neg), sample| {
        let text = format!("{} {}", sample.title, sample.snippet);
        (
            pos + count_keyword_hits(&text, &POSITIVE_KEYWORDS),
            neg + count_keyword_hits(&text, &NEGATIVE_KEYWORDS),
        )
    });

    let sentiment = match positive_hits.cmp(&negative_hits) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    };

    if enabled.is_empty() {
        return ReputationScore {
            score: policy.no_data_score,
            sentiment: Sentiment::Neutral,
            positive_hits: 0,
            negative_hits: 0,
            enabled_samples: 0,
        };
    }

    let base = (enabled.len() as f64 * policy.per_sample).min(policy.base_cap);
    let ratio = positive_hits as f64 / negative_hits.max(1) as f64;
    let bonus = (ratio * policy.sentiment_scale).min(policy.sentiment_cap);
    let cap = policy.max_score.min(MAX_REPUTATION_SCORE);
    let score = (base + bonus).round().min(cap).max(0.0) as u32;

    ReputationScore {
        score,
        sentiment,
        positive_hits,
        negative_hits,
        enabled_samples: enabled.len(),
    }
}
