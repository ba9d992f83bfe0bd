//! Market ranking.

use sitescore_model::{
    BusinessEntity, EntityRole, Industry, MarketAverages, MarketPosition, MarketSnapshot,
    RankedEntity, UserState,
};

use crate::gap::{analyze_gap, competitor_service_union};
use crate::{score_entity, ScoringConfig};

/// Score and rank the own entity against its competitors.
///
/// Competitors are scored against the own services; the own entity is
/// scored against the competitor union and then receives the bonus for
/// dismissed gaps (one pass). Removed competitors are left out entirely.
pub fn rank_market(
    own: &BusinessEntity,
    competitors: &[BusinessEntity],
    state: &UserState,
    industry: Industry,
    config: &ScoringConfig,
) -> MarketSnapshot {
    let active: Vec<&BusinessEntity> = competitors
        .iter()
        .filter(|c| !state.is_removed(&c.id))
        .collect();

    let own_services: Vec<&str> = own.usable_services().collect();
    let union = competitor_service_union(active.iter().copied());

    let mut own_breakdown = score_entity(own, &union, industry, config);
    let gap = analyze_gap(&own_services, competitors, state);
    let base_own_score = own_breakdown.final_score;
    own_breakdown.final_score = config.dismissal.apply(
        base_own_score,
        gap.dismissed_missing_services.len(),
        config.max_final_score,
    );
    let dismissal_bonus = own_breakdown.final_score - base_own_score;

    let mut entries = Vec::with_capacity(active.len() + 1);
    entries.push(RankedEntity {
        entity: BusinessEntity {
            role: EntityRole::Own,
            ..own.clone()
        },
        breakdown: own_breakdown,
    });
    entries.extend(active.iter().map(|c| RankedEntity {
        entity: BusinessEntity {
            role: EntityRole::Competitor,
            ..(*c).clone()
        },
        breakdown: score_entity(c, &own_services, industry, config),
    }));

    let averages = market_averages(&entries);

    // Stable: ties keep input order
    entries.sort_by(|a, b| b.breakdown.final_score.total_cmp(&a.breakdown.final_score));

    let own_rank = entries
        .iter()
        .position(|e| e.entity.is_own())
        .map_or(0, |i| i + 1);
    let own_score = entries
        .get(own_rank.saturating_sub(1))
        .map_or(0.0, |e| e.breakdown.final_score);
    let position = averages.map(|a| classify_position(own_score, &a));

    tracing::debug!(
        own_score,
        own_rank,
        competitors = active.len(),
        dismissal_bonus,
        "Ranked market"
    );

    MarketSnapshot {
        entries,
        averages,
        own_rank,
        position,
        base_own_score,
        dismissal_bonus,
    }
}

/// Means over the competitor rows; `None` when there are none.
pub fn market_averages(entries: &[RankedEntity]) -> Option<MarketAverages> {
    let competitors: Vec<&RankedEntity> = entries.iter().filter(|e| !e.entity.is_own()).collect();
    if competitors.is_empty() {
        return None;
    }

    let count = competitors.len() as f64;
    let mean = |f: fn(&RankedEntity) -> f64| competitors.iter().map(|e| f(e)).sum::<f64>() / count;

    Some(MarketAverages {
        avg_rating: mean(|e| e.entity.sanitized_rating()),
        avg_reviews: mean(|e| e.entity.sanitized_review_count() as f64),
        avg_score: mean(|e| e.breakdown.final_score),
        competitor_count: competitors.len(),
    })
}

/// Above average iff the own score reaches the competitor mean.
pub fn classify_position(own_score: f64, averages: &MarketAverages) -> MarketPosition {
    if own_score >= averages.avg_score {
        MarketPosition::AboveAverage
    } else {
        MarketPosition::BelowAverage
    }
}
