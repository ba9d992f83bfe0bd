//! Service gap analysis against the competitor market.

use serde::{Deserialize, Serialize};
use sitescore_features::{has_similar, normalize_service};
use sitescore_model::{BusinessEntity, GapReport, UserState};
use std::collections::{BTreeMap, HashSet};

use crate::ConfigError;

/// Largest bonus share a policy may grant.
pub const MAX_DISMISSAL_SHARE: f64 = 0.10;

/// Bonus the own entity earns for dismissed gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DismissalPolicy {
    /// Points per dismissed service
    pub per_item: f64,
    /// Bonus cap as a share of the un-bonused score
    pub max_share: f64,
}

impl Default for DismissalPolicy {
    fn default() -> Self {
        Self {
            per_item: 0.3,
            max_share: MAX_DISMISSAL_SHARE,
        }
    }
}

impl DismissalPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.per_item.is_finite() || self.per_item < 0.0 {
            return Err(ConfigError::Invalid(
                "dismissal.per_item must be finite and non-negative".to_string(),
            ));
        }
        if !(0.0..=MAX_DISMISSAL_SHARE).contains(&self.max_share) {
            return Err(ConfigError::Invalid(format!(
                "dismissal.max_share must be within 0..={MAX_DISMISSAL_SHARE}"
            )));
        }
        Ok(())
    }

    pub fn bonus(&self, base_score: f64, dismissed_count: usize) -> f64 {
        let uncapped = dismissed_count as f64 * self.per_item;
        uncapped.min(base_score.max(0.0) * self.max_share).max(0.0)
    }

    /// Base score plus bonus, never above `max_score`.
    pub fn apply(&self, base_score: f64, dismissed_count: usize, max_score: f64) -> f64 {
        (base_score + self.bonus(base_score, dismissed_count)).min(max_score)
    }
}

/// Union of all service labels of the given competitors.
///
/// Labels are deduplicated case-insensitively; the first spelling seen is
/// kept and input order is preserved.
pub fn competitor_service_union<'a>(
    competitors: impl IntoIterator<Item = &'a BusinessEntity>,
) -> Vec<String> {
    let mut seen = HashSet::new();
    competitors
        .into_iter()
        .flat_map(|c| c.usable_services())
        .filter(|s| seen.insert(normalize_service(s)))
        .map(str::to_string)
        .collect()
}

/// Diff the competitor services against the own services.
///
/// Removed competitors are ignored. Exclusive services are always measured
/// against the ordinary own list, so dismissals never change how many
/// exclusive services a competitor has.
pub fn analyze_gap<S: AsRef<str>>(
    own_services: &[S],
    competitors: &[BusinessEntity],
    state: &UserState,
) -> GapReport {
    let active: Vec<&BusinessEntity> = competitors
        .iter()
        .filter(|c| !state.is_removed(&c.id))
        .collect();

    let dismissed: HashSet<String> = state
        .dismissed_missing_services
        .iter()
        .map(|s| normalize_service(s))
        .collect();

    let (dismissed_missing_services, missing_services): (Vec<String>, Vec<String>) =
        competitor_service_union(active.iter().copied())
            .into_iter()
            .filter(|s| !has_similar(s, own_services))
            .partition(|s| dismissed.contains(&normalize_service(s)));

    let per_competitor_exclusive_services: BTreeMap<String, Vec<String>> = active
        .iter()
        .map(|c| {
            let exclusive = competitor_service_union(std::iter::once(*c))
                .into_iter()
                .filter(|s| !has_similar(s, own_services))
                .collect();
            (c.id.clone(), exclusive)
        })
        .collect();

    GapReport {
        missing_services,
        per_competitor_exclusive_services,
        dismissed_missing_services,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn competitors() -> Vec<BusinessEntity> {
        vec![
            BusinessEntity::new("a", "Alpha").with_services(["Heizung", "Solaranlagen", "Badsanierung"]),
            BusinessEntity::new("b", "Beta").with_services(["solaranlagen", "Wärmepumpen", "Notdienst"]),
            BusinessEntity::new("c", "Gamma").with_services(["Dachfenster"]),
        ]
    }

    #[test]
    fn test_union_dedupes_case_insensitively() {
        let comps = competitors();
        let union = competitor_service_union(comps.iter());
        assert_eq!(
            union,
            vec!["Heizung", "Solaranlagen", "Badsanierung", "Wärmepumpen", "Notdienst", "Dachfenster"]
        );
    }

    #[test]
    fn test_missing_and_exclusive() {
        let own = vec!["Heizungsbau", "Bad Sanierung komplett"];
        let report = analyze_gap(&own, &competitors(), &UserState::default());

        assert_eq!(
            report.missing_services,
            vec!["Solaranlagen", "Wärmepumpen", "Notdienst", "Dachfenster"]
        );
        assert_eq!(report.exclusive_count("a"), 1);
        assert_eq!(report.exclusive_count("b"), 3);
        assert_eq!(report.exclusive_count("c"), 1);
        assert!(report.dismissed_missing_services.is_empty());
    }

    #[test]
    fn test_removed_competitor_ignored() {
        let own = vec!["Heizung"];
        let mut state = UserState::default();
        state.remove_competitor("c");
        let report = analyze_gap(&own, &competitors(), &state);

        assert!(!report.missing_services.contains(&"Dachfenster".to_string()));
        assert!(!report.per_competitor_exclusive_services.contains_key("c"));
    }

    #[test]
    fn test_dismissal_moves_item_out_of_missing() {
        let own = vec!["Heizung"];
        let mut state = UserState::default();
        state.dismiss("NOTDIENST");
        state.dismiss("Something nobody offers");
        let report = analyze_gap(&own, &competitors(), &state);

        assert!(!report.missing_services.iter().any(|s| s == "Notdienst"));
        assert_eq!(report.dismissed_missing_services, vec!["Notdienst"]);
    }

    #[test]
    fn test_dismissal_keeps_exclusive_counts() {
        let own = vec!["Heizung"];
        let before = analyze_gap(&own, &competitors(), &UserState::default());

        let mut state = UserState::default();
        state.dismiss("Solaranlagen");
        state.dismiss("Notdienst");
        let after = analyze_gap(&own, &competitors(), &state);

        assert_eq!(
            before.per_competitor_exclusive_services,
            after.per_competitor_exclusive_services
        );
    }

    #[test]
    fn test_dismissal_bonus() {
        let policy = DismissalPolicy::default();
        assert!((policy.bonus(80.0, 3) - 0.9).abs() < 1e-12);
        // capped at 10% of the base score
        assert!((policy.bonus(20.0, 50) - 2.0).abs() < 1e-12);
        assert_eq!(policy.bonus(80.0, 0), 0.0);
        assert_eq!(policy.apply(95.0, 100, 96.0), 96.0);
    }
}
