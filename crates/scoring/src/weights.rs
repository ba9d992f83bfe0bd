//! Blending weights as a function of service count.
//!
//! Entities listing many services are judged more on rating and reviews,
//! since service breadth saturates.

use serde::{Deserialize, Serialize};
use sitescore_model::Weights;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightPolicy {
    pub rating_base: f64,
    pub rating_step: f64,
    pub rating_max: f64,
    pub service_base: f64,
    pub service_step: f64,
    pub service_min: f64,
}

impl Default for WeightPolicy {
    fn default() -> Self {
        Self {
            rating_base: 0.30,
            rating_step: 0.015,
            rating_max: 0.55,
            service_base: 0.40,
            service_step: 0.01,
            service_min: 0.25,
        }
    }
}

impl WeightPolicy {
    /// Weights for an entity listing `service_count` services. The review
    /// weight takes the remainder so the three always sum to 1.
    pub fn allocate(&self, service_count: usize) -> Weights {
        let n = service_count as f64;
        let rating = (self.rating_base + self.rating_step * n).min(self.rating_max);
        let service = (self.service_base - self.service_step * n).max(self.service_min);
        let review = 1.0 - rating - service;

        Weights {
            rating,
            review,
            service,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rating_peak = self.rating_max.max(self.rating_base);
        let service_peak = self.service_base.max(self.service_min);
        if self.rating_base < 0.0 || self.service_min < 0.0 || rating_peak + service_peak > 1.0 {
            return Err(ConfigError::Invalid(
                "weights: rating and service weights must stay within 0..=1 combined".to_string(),
            ));
        }
        Ok(())
    }
}
