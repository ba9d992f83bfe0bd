//! Core domain model for sitescore market analysis.
//!
//! This crate defines the fundamental types used throughout the system:
//! - `BusinessEntity`: the analysed company or one of its competitors
//! - `ScoreBreakdown`: sub-scores, weights and final score of one entity
//! - `MarketSnapshot`: all entities ranked, plus competitor averages
//! - `GapReport`: services the market offers that the own company lacks
//! - `ReputationSample`: one web-search hit used for reputation scoring
//! - `UserState`: the removed/dismissed sets that survive recomputation

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Highest final score any entity can reach.
pub const MAX_FINAL_SCORE: f64 = 96.0;

/// Highest star rating accepted from review platforms.
pub const MAX_RATING: f64 = 5.0;

/// Whether an entity is the analysed company or a competitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityRole {
    Own,
    Competitor,
}

impl Default for EntityRole {
    fn default() -> Self {
        Self::Competitor
    }
}

/// Trade the market analysis is run for.
///
/// Selects the keyword list that decides which services count as
/// industry-specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Industry {
    /// Plumbing, heating and air conditioning (Sanitär, Heizung, Klima)
    Shk,
    /// Electrical installation
    Elektro,
    /// Roofing
    Dach,
    /// Painting and decorating
    Maler,
    /// Carpentry and joinery
    Tischler,
    /// Gardening and landscaping
    Garten,
    /// No trade-specific keywords
    General,
}

impl Default for Industry {
    fn default() -> Self {
        Self::General
    }
}

impl From<&str> for Industry {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "shk" | "sanitaer" | "sanitär" | "heizung" => Self::Shk,
            "elektro" | "electrical" => Self::Elektro,
            "dach" | "roofing" => Self::Dach,
            "maler" | "painting" => Self::Maler,
            "tischler" | "schreiner" | "carpentry" => Self::Tischler,
            "garten" | "galabau" | "landscaping" => Self::Garten,
            _ => Self::General,
        }
    }
}

impl Industry {
    /// Short code used in input files and on the command line.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Shk => "shk",
            Self::Elektro => "elektro",
            Self::Dach => "dach",
            Self::Maler => "maler",
            Self::Tischler => "tischler",
            Self::Garten => "garten",
            Self::General => "general",
        }
    }
}

/// A business taking part in the market comparison.
///
/// Rating and review count come from external review platforms or manual
/// input and are not trusted: non-numeric values deserialize leniently and
/// are sanitized before any curve sees them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessEntity {
    /// Stable identifier (place id, domain, or generated)
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Average star rating, 0 to 5
    #[serde(default, deserialize_with = "lenient::rating")]
    pub rating: f64,

    /// Number of reviews
    #[serde(default, deserialize_with = "lenient::count")]
    pub review_count: i64,

    /// Offered services as free text, in input order
    #[serde(default)]
    pub services: Vec<String>,

    #[serde(default)]
    pub role: EntityRole,
}

impl BusinessEntity {
    /// Create a competitor with no rating, reviews or services.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rating: 0.0,
            review_count: 0,
            services: Vec::new(),
            role: EntityRole::Competitor,
        }
    }

    /// Create the analysed company.
    pub fn own(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: EntityRole::Own,
            ..Self::new(id, name)
        }
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_reviews(mut self, review_count: i64) -> Self {
        self.review_count = review_count;
        self
    }

    pub fn with_services<S: Into<String>>(mut self, services: impl IntoIterator<Item = S>) -> Self {
        self.services = services.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_own(&self) -> bool {
        self.role == EntityRole::Own
    }

    /// Rating safe for curve evaluation: NaN, infinite and negative values
    /// become 0, anything above 5 is capped.
    pub fn sanitized_rating(&self) -> f64 {
        if self.rating.is_finite() {
            self.rating.clamp(0.0, MAX_RATING)
        } else {
            0.0
        }
    }

    /// Review count safe for curve evaluation: negative values become 0.
    pub fn sanitized_review_count(&self) -> u64 {
        self.review_count.max(0) as u64
    }

    /// Trimmed, non-blank service labels.
    pub fn usable_services(&self) -> impl Iterator<Item = &str> {
        self.services
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

/// Blending weights for the three sub-scores. Always sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub rating: f64,
    pub review: f64,
    pub service: f64,
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.rating + self.review + self.service
    }
}

/// Per-entity score components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub rating_score: f64,
    pub review_score: f64,
    pub service_score: f64,
    pub weights: Weights,

    /// Weighted blend, within 0..=96
    pub final_score: f64,

    /// Non-blank services used for the service curve
    #[serde(default)]
    pub service_count: usize,

    /// Services matching one of the industry keywords
    #[serde(default)]
    pub industry_service_count: usize,

    /// Services with no similar entry in the reference list
    #[serde(default)]
    pub unique_service_count: usize,
}

/// One row of a market ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedEntity {
    pub entity: BusinessEntity,
    pub breakdown: ScoreBreakdown,
}

/// Arithmetic means over the remaining competitors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketAverages {
    pub avg_rating: f64,
    pub avg_reviews: f64,
    pub avg_score: f64,
    pub competitor_count: usize,
}

/// Own entity compared with the competitor average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketPosition {
    AboveAverage,
    BelowAverage,
}

impl MarketPosition {
    pub fn label(&self) -> &'static str {
        match self {
            Self::AboveAverage => "Above Average",
            Self::BelowAverage => "Below Average",
        }
    }
}

/// All entities of a market, ranked by final score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Sorted descending by final score; ties keep input order
    pub entries: Vec<RankedEntity>,

    /// `None` when no competitor remains after removals
    pub averages: Option<MarketAverages>,

    /// 1-based rank of the own entity
    pub own_rank: usize,

    /// `None` when there is nothing to compare against
    pub position: Option<MarketPosition>,

    /// Own final score before the dismissal bonus
    pub base_own_score: f64,

    /// Bonus added to the own score for dismissed gaps
    pub dismissal_bonus: f64,
}

impl MarketSnapshot {
    /// The own entity's row.
    pub fn own_entry(&self) -> Option<&RankedEntity> {
        self.entries.iter().find(|e| e.entity.is_own())
    }

    /// The own entity's final score (bonus included), 0 if absent.
    pub fn own_score(&self) -> f64 {
        self.own_entry()
            .map(|e| e.breakdown.final_score)
            .unwrap_or(0.0)
    }
}

/// Services the market offers that the own entity does not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapReport {
    /// Competitor services with no similar own service, minus dismissals
    pub missing_services: Vec<String>,

    /// For each competitor id, its services with no similar own service
    pub per_competitor_exclusive_services: BTreeMap<String, Vec<String>>,

    /// Missing services the user dismissed
    pub dismissed_missing_services: Vec<String>,
}

impl GapReport {
    /// Number of exclusive services a competitor has against the own list.
    pub fn exclusive_count(&self, competitor_id: &str) -> usize {
        self.per_competitor_exclusive_services
            .get(competitor_id)
            .map_or(0, Vec::len)
    }
}

/// A web-search hit mentioning the company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationSample {
    pub title: String,

    #[serde(default)]
    pub snippet: String,

    #[serde(default)]
    pub source_domain: String,

    pub link: String,

    /// Disabled samples stay in the list but are not scored
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl ReputationSample {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            snippet: String::new(),
            source_domain: String::new(),
            link: link.into(),
            enabled: true,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn with_source_domain(mut self, domain: impl Into<String>) -> Self {
        self.source_domain = domain.into();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Overall tone of the reputation samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

/// Result of reputation scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReputationScore {
    /// 0..=100
    pub score: u32,
    pub sentiment: Sentiment,
    pub positive_hits: usize,
    pub negative_hits: usize,
    pub enabled_samples: usize,
}

/// Price positioning bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RateTier {
    Optimal,
    Acceptable,
    TooLow,
}

impl RateTier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Optimal => "optimal",
            Self::Acceptable => "acceptable",
            Self::TooLow => "too-low",
        }
    }
}

/// Own hourly rates compared with the regional market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateComparison {
    pub score: f64,
    pub tier: RateTier,
    pub ratio: f64,
    pub own_mean: f64,
    pub regional_mean: f64,
}

/// User decisions that survive recomputation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserState {
    /// Competitor ids excluded from ranking, averages and gap analysis
    #[serde(default)]
    pub removed_competitors: BTreeSet<String>,

    /// Missing services the user does not want reported
    #[serde(default)]
    pub dismissed_missing_services: BTreeSet<String>,
}

impl UserState {
    pub fn is_removed(&self, entity_id: &str) -> bool {
        self.removed_competitors.contains(entity_id)
    }

    pub fn remove_competitor(&mut self, entity_id: impl Into<String>) {
        self.removed_competitors.insert(entity_id.into());
    }

    pub fn dismiss(&mut self, service: impl Into<String>) {
        self.dismissed_missing_services.insert(service.into());
    }

    /// Undo a dismissal. Returns whether it was dismissed.
    pub fn restore(&mut self, service: &str) -> bool {
        self.dismissed_missing_services.remove(service)
    }
}

/// Tolerant numeric deserializers for externally entered data.
///
/// Numbers pass through, numeric strings (including a decimal comma) are
/// parsed, anything else becomes NaN for ratings and 0 for counts.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn to_f64(value: Option<Value>) -> f64 {
        match value {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
            Some(Value::String(s)) => s.trim().replace(',', ".").parse().unwrap_or(f64::NAN),
            _ => f64::NAN,
        }
    }

    pub fn rating<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(to_f64(Option::<Value>::deserialize(deserializer)?))
    }

    pub fn count<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = to_f64(Option::<Value>::deserialize(deserializer)?);
        Ok(if value.is_finite() { value as i64 } else { 0 })
    }
}
