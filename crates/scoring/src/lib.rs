//! Competitive scoring and market-gap engine.
//!
//! Turns raw business facts (rating, review count, offered services) into
//! comparable scores, ranks a market, derives missing services, and scores
//! reputation and price positioning. Every function here is pure: results
//! are returned by value and the only user state (`UserState`) is passed in.

mod config;
pub mod curves;
mod entity;
pub mod gap;
mod market;
mod rates;
mod reputation;
pub mod weights;

pub use config::{ConfigError, ScoringConfig};
pub use entity::score_entity;
pub use gap::{analyze_gap, competitor_service_union, DismissalPolicy};
pub use market::{classify_position, market_averages, rank_market};
pub use rates::{compare_rates, compare_rates_with, RateBand, RateBands};
pub use reputation::{score_reputation, score_reputation_with, ReputationPolicy};
