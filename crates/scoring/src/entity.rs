use sitescore_features::{has_similar, industry_keywords, is_industry_service};
use sitescore_model::{BusinessEntity, Industry, ScoreBreakdown, Weights};

use crate::ScoringConfig;

/// Score a single entity.
///
/// `reference_services` is the list the entity's uniqueness is measured
/// against: the own services when scoring a competitor, the competitor
/// union when scoring the own entity. Invalid ratings and review counts are
/// coerced to 0; this never fails.
pub fn score_entity<S: AsRef<str>>(
    entity: &BusinessEntity,
    reference_services: &[S],
    industry: Industry,
    config: &ScoringConfig,
) -> ScoreBreakdown {
    let rating = entity.sanitized_rating();
    let review_count = entity.sanitized_review_count();
    let services: Vec<&str> = entity.usable_services().collect();

    let keywords = industry_keywords(industry);
    let industry_service_count = services
        .iter()
        .filter(|s| is_industry_service(s, keywords))
        .count();
    let unique_service_count = services
        .iter()
        .filter(|s| !has_similar(s, reference_services))
        .count();

    let rating_score = config.rating.eval(rating);
    let review_score = config.reviews.eval(rating, review_count);
    let service_score = config.services.eval(services.len(), industry_service_count);
    let weights = config.weights.allocate(services.len());

    let final_score = blend(rating_score, review_score, service_score, &weights)
        .clamp(0.0, config.max_final_score);

    ScoreBreakdown {
        rating_score,
        review_score,
        service_score,
        weights,
        final_score,
        service_count: services.len(),
        industry_service_count,
        unique_service_count,
    }
}

fn blend(rating_score: f64, review_score: f64, service_score: f64, weights: &Weights) -> f64 {
    let value = rating_score * weights.rating
        + review_score * weights.review
        + service_score * weights.service;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
