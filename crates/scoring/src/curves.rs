//! Table-driven score curves.
//!
//! Every curve is data: a list of segments with breakpoints and slopes,
//! so tiers can be tuned from configuration and tested one by one.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One linear piece of a curve: `base + (x - pivot) * slope`, optionally
/// bounded. Applies to inputs `x >= lower`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub lower: f64,
    pub pivot: f64,
    pub base: f64,
    pub slope: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ceil: Option<f64>,
}

impl Segment {
    /// Segment anchored at its own breakpoint.
    pub const fn anchored(lower: f64, base: f64, slope: f64) -> Self {
        Self {
            lower,
            pivot: lower,
            base,
            slope,
            floor: None,
            ceil: None,
        }
    }

    pub const fn with_pivot(mut self, pivot: f64) -> Self {
        self.pivot = pivot;
        self
    }

    pub const fn with_floor(mut self, floor: f64) -> Self {
        self.floor = Some(floor);
        self
    }

    pub const fn with_ceil(mut self, ceil: f64) -> Self {
        self.ceil = Some(ceil);
        self
    }

    pub fn eval(&self, x: f64) -> f64 {
        let mut value = self.base + (x - self.pivot) * self.slope;
        if let Some(floor) = self.floor {
            value = value.max(floor);
        }
        if let Some(ceil) = self.ceil {
            value = value.min(ceil);
        }
        value
    }
}

/// Segments sorted ascending by `lower`; the last segment whose `lower`
/// is reached wins. Inputs below the first breakpoint use the first segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiecewiseCurve {
    pub segments: Vec<Segment>,
}

impl PiecewiseCurve {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Star rating (0 to 5) to rating score. Below 4.5 stars the top tier
    /// is out of reach.
    pub fn default_rating() -> Self {
        Self::new(vec![
            Segment::anchored(0.0, 0.0, 16.0),
            Segment::anchored(2.5, 40.0, 20.0),
            Segment::anchored(3.5, 60.0, 20.0),
            Segment::anchored(4.5, 80.0, 30.0),
        ])
    }

    /// Service count to base service score.
    pub fn default_service_tiers() -> Self {
        Self::new(vec![
            Segment::anchored(0.0, 15.0, 0.0),
            Segment::anchored(1.0, 30.0, 15.0).with_pivot(0.0),
            Segment::anchored(4.0, 75.0, 2.0).with_pivot(3.0),
            Segment::anchored(9.0, 85.0, 0.7).with_pivot(8.0),
            Segment::anchored(16.0, 90.0, 0.3).with_pivot(15.0).with_ceil(93.0),
        ])
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.segments
            .iter()
            .rev()
            .find(|s| x >= s.lower)
            .or_else(|| self.segments.first())
            .map_or(0.0, |s| s.eval(x))
    }

    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.segments.is_empty() {
            return Err(ConfigError::Invalid(format!("{name}: no segments")));
        }
        let sorted = self
            .segments
            .windows(2)
            .all(|w| w[0].lower < w[1].lower);
        if !sorted {
            return Err(ConfigError::Invalid(format!(
                "{name}: segment breakpoints must be strictly ascending"
            )));
        }
        Ok(())
    }
}

/// Review count to review score.
///
/// Up to `threshold` reviews the score grows linearly with the estimated
/// number of positive reviews; above it the growth is logarithmic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewCurve {
    pub threshold: f64,
    pub linear_base: f64,
    pub linear_slope: f64,
    pub linear_cap: f64,
    pub log_base: f64,
    pub log_scale: f64,
    pub log_cap: f64,
}

impl Default for ReviewCurve {
    fn default() -> Self {
        Self {
            threshold: 25.0,
            linear_base: 50.0,
            linear_slope: 1.6,
            linear_cap: 90.0,
            log_base: 90.0,
            log_scale: 5.0,
            log_cap: 95.0,
        }
    }
}

impl ReviewCurve {
    /// Share of reviews assumed positive for a given star rating.
    pub fn positive_fraction(rating: f64) -> f64 {
        ((rating - 1.0) / 4.0).clamp(0.0, 1.0)
    }

    pub fn eval(&self, rating: f64, review_count: u64) -> f64 {
        let fraction = Self::positive_fraction(rating);
        let count = review_count as f64;
        let estimated_positive = count * fraction;

        if count <= self.threshold {
            return self.linear(estimated_positive);
        }

        // The log branch never falls below where the linear branch ends.
        let boundary = self.linear(self.threshold * fraction);
        let log = self.log_base + (estimated_positive / self.threshold).log10() * self.log_scale;
        log.max(boundary).min(self.log_cap)
    }

    fn linear(&self, estimated_positive: f64) -> f64 {
        (self.linear_base + estimated_positive * self.linear_slope).min(self.linear_cap)
    }
}

/// Service count and industry fit to service score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceCurve {
    pub tiers: PiecewiseCurve,
    /// Multiplied by the share of industry-specific services
    pub specialization_weight: f64,
    pub relevance_per_service: f64,
    pub relevance_cap: f64,
    /// Non-industry services tolerated before the dilution penalty
    pub dilution_allowance: f64,
    pub dilution_per_service: f64,
    pub max_score: f64,
}

impl Default for ServiceCurve {
    fn default() -> Self {
        Self {
            tiers: PiecewiseCurve::default_service_tiers(),
            specialization_weight: 8.0,
            relevance_per_service: 3.5,
            relevance_cap: 25.0,
            dilution_allowance: 5.0,
            dilution_per_service: 0.8,
            max_score: 96.0,
        }
    }
}

impl ServiceCurve {
    pub fn eval(&self, service_count: usize, industry_count: usize) -> f64 {
        let base = self.tiers.eval(service_count as f64);
        if service_count == 0 {
            return base.clamp(0.0, self.max_score);
        }

        let n = service_count as f64;
        let industry = industry_count.min(service_count) as f64;
        let non_industry = n - industry;

        let specialization = industry / n * self.specialization_weight;
        let relevance = (industry * self.relevance_per_service).min(self.relevance_cap);
        let dilution = ((non_industry - self.dilution_allowance) * self.dilution_per_service).max(0.0);

        (base + specialization + relevance - dilution).clamp(0.0, self.max_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_rating_tiers() {
        let curve = PiecewiseCurve::default_rating();
        assert!(approx(curve.eval(5.0), 95.0));
        assert!(approx(curve.eval(4.8), 89.0));
        assert!(approx(curve.eval(4.5), 80.0));
        assert!(approx(curve.eval(4.0), 70.0));
        assert!(approx(curve.eval(3.0), 50.0));
        assert!(approx(curve.eval(2.0), 32.0));
        assert!(approx(curve.eval(0.0), 0.0));
    }

    #[test]
    fn test_rating_tiers_continuous_at_breakpoints() {
        let curve = PiecewiseCurve::default_rating();
        for breakpoint in [2.5, 3.5, 4.5] {
            let below = curve.eval(breakpoint - 1e-9);
            let at = curve.eval(breakpoint);
            assert!((at - below).abs() < 1e-6, "jump at {breakpoint}");
        }
    }

    #[test]
    fn test_service_tiers() {
        let curve = PiecewiseCurve::default_service_tiers();
        assert!(approx(curve.eval(0.0), 15.0));
        assert!(approx(curve.eval(1.0), 45.0));
        assert!(approx(curve.eval(3.0), 75.0));
        assert!(approx(curve.eval(4.0), 77.0));
        assert!(approx(curve.eval(8.0), 85.0));
        assert!(approx(curve.eval(10.0), 86.4));
        assert!(approx(curve.eval(20.0), 91.5));
        assert!(approx(curve.eval(100.0), 93.0));
    }

    #[test]
    fn test_review_linear_branch() {
        let curve = ReviewCurve::default();
        // rating 5 -> every review counts as positive
        assert!(approx(curve.eval(5.0, 10), 66.0));
        assert!(approx(curve.eval(5.0, 25), 90.0));
        assert!(approx(curve.eval(5.0, 0), 50.0));
    }

    #[test]
    fn test_review_log_branch() {
        let curve = ReviewCurve::default();
        assert!(approx(curve.eval(5.0, 250), 95.0));
        let expected = 90.0 + (114.0_f64 / 25.0).log10() * 5.0;
        assert!(approx(curve.eval(4.8, 120), expected));
    }

    #[test]
    fn test_review_zero_rating_stays_finite() {
        let curve = ReviewCurve::default();
        let score = curve.eval(0.0, 500);
        assert!(score.is_finite());
        assert!(approx(score, 50.0));
    }

    #[test]
    fn test_service_curve_modifiers() {
        let curve = ServiceCurve::default();
        // 3 services, 2 industry-specific
        let expected = 75.0 + 2.0 / 3.0 * 8.0 + 7.0;
        assert!(approx(curve.eval(3, 2), expected));
        assert!(approx(curve.eval(0, 0), 15.0));
    }

    #[test]
    fn test_service_curve_dilution_and_cap() {
        let curve = ServiceCurve::default();
        // 12 services, none industry-specific: 85 + 2.8 - (12 - 5) * 0.8
        assert!(approx(curve.eval(12, 0), 85.0 + 4.0 * 0.7 - 5.6));
        // 20 industry-specific services hit the cap
        assert!(approx(curve.eval(20, 20), 96.0));
    }

    #[test]
    fn test_validate_rejects_unsorted() {
        let curve = PiecewiseCurve::new(vec![
            Segment::anchored(2.0, 0.0, 1.0),
            Segment::anchored(1.0, 0.0, 1.0),
        ]);
        assert!(curve.validate("rating").is_err());
        assert!(PiecewiseCurve::new(vec![]).validate("rating").is_err());
        assert!(PiecewiseCurve::default_rating().validate("rating").is_ok());
    }
}
