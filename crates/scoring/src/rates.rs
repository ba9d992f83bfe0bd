use serde::{Deserialize, Serialize};
use sitescore_model::{RateComparison, RateTier};

use crate::curves::Segment;
use crate::ConfigError;

/// One price positioning bracket: applies when `ratio >= segment.lower`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateBand {
    pub tier: RateTier,
    pub segment: Segment,
}

/// Bands sorted ascending by lower ratio bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateBands {
    pub bands: Vec<RateBand>,
}

impl Default for RateBands {
    fn default() -> Self {
        Self {
            bands: vec![
                RateBand {
                    tier: RateTier::TooLow,
                    segment: Segment::anchored(0.0, 60.0, 100.0)
                        .with_pivot(0.90)
                        .with_floor(40.0),
                },
                RateBand {
                    tier: RateTier::Acceptable,
                    segment: Segment::anchored(0.90, 60.0, 120.0),
                },
                RateBand {
                    tier: RateTier::Optimal,
                    segment: Segment::anchored(1.10, 85.0, 50.0).with_ceil(100.0),
                },
            ],
        }
    }
}

impl RateBands {
    fn band_for(&self, ratio: f64) -> Option<&RateBand> {
        self.bands
            .iter()
            .rev()
            .find(|b| ratio >= b.segment.lower)
            .or_else(|| self.bands.first())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bands.is_empty() {
            return Err(ConfigError::Invalid("rates: no bands".to_string()));
        }
        if !self.bands.windows(2).all(|w| w[0].segment.lower < w[1].segment.lower) {
            return Err(ConfigError::Invalid(
                "rates: band bounds must be strictly ascending".to_string(),
            ));
        }
        Ok(())
    }
}

/// Compare own hourly rates with regional rates using the default bands.
///
/// Returns `None` when either side has no usable rate (finite and > 0):
/// "not computed" is not the same as a bad score.
pub fn compare_rates(own_rates: &[f64], regional_rates: &[f64]) -> Option<RateComparison> {
    compare_rates_with(own_rates, regional_rates, &RateBands::default())
}

pub fn compare_rates_with(
    own_rates: &[f64],
    regional_rates: &[f64],
    bands: &RateBands,
) -> Option<RateComparison> {
    let own_mean = usable_mean(own_rates)?;
    let regional_mean = usable_mean(regional_rates)?;
    let ratio = own_mean / regional_mean;
    let band = bands.band_for(ratio)?;

    Some(RateComparison {
        score: band.segment.eval(ratio).clamp(0.0, 100.0),
        tier: band.tier,
        ratio,
        own_mean,
        regional_mean,
    })
}

fn usable_mean(rates: &[f64]) -> Option<f64> {
    let usable: Vec<f64> = rates
        .iter()
        .copied()
        .filter(|r| r.is_finite() && *r > 0.0)
        .collect();
    if usable.is_empty() {
        None
    } else {
        Some(usable.iter().sum::<f64>() / usable.len() as f64)
    }
}
