//! Explanation generation for market scores.
//!
//! Converts score breakdowns, market snapshots, gap reports, rate
//! comparisons and reputation scores into human-readable text suitable for
//! the dashboard and the CLI.

use serde::{Deserialize, Serialize};
use sitescore_model::{
    GapReport, MarketPosition, MarketSnapshot, RateComparison, RateTier, ReputationScore,
    ScoreBreakdown, Sentiment,
};

/// A structured explanation of one score component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    /// Short summary (1 line)
    pub summary: String,

    /// Detailed explanation (1-2 sentences)
    pub detail: String,

    /// Points this component adds to the final score
    pub contribution: f64,

    /// Evidence items supporting this explanation
    pub evidence: Vec<EvidenceItem>,
}

/// A piece of evidence supporting an explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Type of evidence
    pub kind: String,

    /// The specific value
    pub value: String,

    /// Optional context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl EvidenceItem {
    fn new(kind: &str, value: impl ToString) -> Self {
        Self {
            kind: kind.to_string(),
            value: value.to_string(),
            context: None,
        }
    }
}

/// The three blended parts of a final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreComponent {
    Rating,
    Reviews,
    Services,
}

/// Explain every component of a breakdown, largest contribution first.
pub fn explain_breakdown(breakdown: &ScoreBreakdown) -> Vec<Explanation> {
    let mut explanations: Vec<Explanation> = [
        ScoreComponent::Rating,
        ScoreComponent::Reviews,
        ScoreComponent::Services,
    ]
    .into_iter()
    .map(|c| explain_component(c, breakdown))
    .collect();

    explanations.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));
    explanations
}

/// Explain a single component of a breakdown.
pub fn explain_component(component: ScoreComponent, breakdown: &ScoreBreakdown) -> Explanation {
    let weights = &breakdown.weights;
    match component {
        ScoreComponent::Rating => Explanation {
            summary: format!("Rating score {:.0}", breakdown.rating_score),
            detail: format!(
                "The star rating contributes {:.0}% of the final score. \
                 Ratings below 4.5 stars cannot reach the top tier.",
                weights.rating * 100.0
            ),
            contribution: breakdown.rating_score * weights.rating,
            evidence: vec![
                EvidenceItem::new("rating_score", format!("{:.1}", breakdown.rating_score)),
                EvidenceItem::new("weight", format!("{:.3}", weights.rating)),
            ],
        },

        ScoreComponent::Reviews => Explanation {
            summary: format!("Review score {:.0}", breakdown.review_score),
            detail: format!(
                "Review volume contributes {:.0}% of the final score. \
                 Beyond 25 reviews each further review adds less.",
                weights.review * 100.0
            ),
            contribution: breakdown.review_score * weights.review,
            evidence: vec![
                EvidenceItem::new("review_score", format!("{:.1}", breakdown.review_score)),
                EvidenceItem::new("weight", format!("{:.3}", weights.review)),
            ],
        },

        ScoreComponent::Services => Explanation {
            summary: format!(
                "Service score {:.0} ({} services, {} industry-specific)",
                breakdown.service_score, breakdown.service_count, breakdown.industry_service_count
            ),
            detail: format!(
                "The service offering contributes {:.0}% of the final score. \
                 {} of {} services are not offered by the comparison group.",
                weights.service * 100.0,
                breakdown.unique_service_count,
                breakdown.service_count
            ),
            contribution: breakdown.service_score * weights.service,
            evidence: vec![
                EvidenceItem::new("service_score", format!("{:.1}", breakdown.service_score)),
                EvidenceItem::new("weight", format!("{:.3}", weights.service)),
                EvidenceItem {
                    context: Some("services without a similar counterpart".to_string()),
                    ..EvidenceItem::new("unique_services", breakdown.unique_service_count)
                },
            ],
        },
    }
}

/// One-line summary of the own entity's market position.
pub fn summarize_position(snapshot: &MarketSnapshot) -> String {
    let total = snapshot.entries.len();
    let own_score = snapshot.own_score();

    match (snapshot.position, snapshot.averages) {
        (Some(position), Some(averages)) => {
            let level = match position {
                MarketPosition::AboveAverage => "ABOVE AVERAGE",
                MarketPosition::BelowAverage => "BELOW AVERAGE",
            };
            format!(
                "{}: rank {} of {}, score {:.1} vs. market average {:.1} ({} competitors)",
                level, snapshot.own_rank, total, own_score, averages.avg_score, averages.competitor_count
            )
        }
        _ => format!("NO COMPARISON: score {:.1}, no competitors to compare against", own_score),
    }
}

/// Summary of missing services.
pub fn summarize_gap(report: &GapReport) -> String {
    if report.missing_services.is_empty() {
        return "No missing services - the offering covers the market.".to_string();
    }

    let mut summary = format!(
        "{} missing service(s): {}",
        report.missing_services.len(),
        report.missing_services.join(", ")
    );
    if !report.dismissed_missing_services.is_empty() {
        summary.push_str(&format!(
            " ({} dismissed)",
            report.dismissed_missing_services.len()
        ));
    }
    summary
}

/// Summary of price positioning. `None` means there was no usable rate data.
pub fn explain_rates(comparison: Option<&RateComparison>) -> String {
    let Some(comparison) = comparison else {
        return "N/A - not enough rate data to compare".to_string();
    };

    let advice = match comparison.tier {
        RateTier::Optimal => "rates are above the regional market",
        RateTier::Acceptable => "rates are in line with the regional market",
        RateTier::TooLow => "rates are below the regional market, consider raising them",
    };
    format!(
        "{} ({:.0}/100): {} ({:.0}% of regional average)",
        comparison.tier.label(),
        comparison.score,
        advice,
        comparison.ratio * 100.0
    )
}

/// Summary of a reputation score.
pub fn explain_reputation(reputation: &ReputationScore) -> String {
    if reputation.enabled_samples == 0 {
        return format!("{}/100: no mentions found", reputation.score);
    }

    let tone = match reputation.sentiment {
        Sentiment::Positive => "mostly positive",
        Sentiment::Neutral => "mixed or neutral",
        Sentiment::Negative => "mostly negative",
    };
    format!(
        "{}/100: {} mentions, {} ({} positive / {} negative signals)",
        reputation.score,
        reputation.enabled_samples,
        tone,
        reputation.positive_hits,
        reputation.negative_hits
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitescore_model::{MarketAverages, Weights};

    fn breakdown() -> ScoreBreakdown {
        ScoreBreakdown {
            rating_score: 89.0,
            review_score: 60.0,
            service_score: 87.0,
            weights: Weights {
                rating: 0.345,
                review: 0.285,
                service: 0.37,
            },
            final_score: 80.0,
            service_count: 3,
            industry_service_count: 2,
            unique_service_count: 1,
        }
    }

    #[test]
    fn test_breakdown_sorted_by_contribution() {
        let explanations = explain_breakdown(&breakdown());
        assert_eq!(explanations.len(), 3);
        assert!(explanations[0].summary.starts_with("Service"));
        assert!(explanations[2].summary.starts_with("Review"));
    }

    #[test]
    fn test_service_explanation_mentions_uniqueness() {
        let explanation = explain_component(ScoreComponent::Services, &breakdown());
        assert!(explanation.detail.contains("1 of 3"));
        assert_eq!(explanation.evidence.len(), 3);
    }

    #[test]
    fn test_position_without_competitors() {
        let snapshot = MarketSnapshot {
            entries: vec![],
            averages: None,
            own_rank: 1,
            position: None,
            base_own_score: 0.0,
            dismissal_bonus: 0.0,
        };
        assert!(summarize_position(&snapshot).starts_with("NO COMPARISON"));
    }

    #[test]
    fn test_position_above_average() {
        let snapshot = MarketSnapshot {
            entries: vec![],
            averages: Some(MarketAverages {
                avg_rating: 4.1,
                avg_reviews: 30.0,
                avg_score: 70.0,
                competitor_count: 4,
            }),
            own_rank: 2,
            position: Some(MarketPosition::AboveAverage),
            base_own_score: 75.0,
            dismissal_bonus: 0.0,
        };
        let summary = summarize_position(&snapshot);
        assert!(summary.starts_with("ABOVE AVERAGE: rank 2"));
        assert!(summary.contains("4 competitors"));
    }

    #[test]
    fn test_rates_not_computed() {
        assert!(explain_rates(None).starts_with("N/A"));
    }

    #[test]
    fn test_rates_too_low() {
        let comparison = RateComparison {
            score: 55.0,
            tier: RateTier::TooLow,
            ratio: 0.85,
            own_mean: 68.0,
            regional_mean: 80.0,
        };
        let text = explain_rates(Some(&comparison));
        assert!(text.starts_with("too-low (55/100)"));
        assert!(text.contains("85%"));
    }

    #[test]
    fn test_gap_summary() {
        let report = GapReport {
            missing_services: vec!["Solar".to_string(), "Notdienst".to_string()],
            dismissed_missing_services: vec!["Klima".to_string()],
            ..Default::default()
        };
        assert_eq!(
            summarize_gap(&report),
            "2 missing service(s): Solar, Notdienst (1 dismissed)"
        );
        assert!(summarize_gap(&GapReport::default()).starts_with("No missing"));
    }

    #[test]
    fn test_reputation_text() {
        let reputation = ReputationScore {
            score: 46,
            sentiment: Sentiment::Positive,
            positive_hits: 4,
            negative_hits: 0,
            enabled_samples: 2,
        };
        assert_eq!(
            explain_reputation(&reputation),
            "46/100: 2 mentions, mostly positive (4 positive / 0 negative signals)"
        );
    }
}
