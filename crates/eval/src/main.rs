//! Command-line driver for the market scoring engine.
//!
//! Usage:
//!     sitescore market --input market.json --config scoring.toml
//!     sitescore rates --own 85,90 --regional 80,82
//!     sitescore reputation --name "Muster GmbH" --city Köln
//!     sitescore health

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use sitescore_backend_websearch::{
    gather_latest, RequestTracker, SearchBackend, WebSearchBackend, WebSearchConfig,
};
use sitescore_explain::{
    explain_breakdown, explain_rates, explain_reputation, summarize_gap, summarize_position,
};
use sitescore_model::{BusinessEntity, Industry, ReputationSample, UserState};
use sitescore_query::{QueryDialect, ReputationQuery, WebSearchDialect};
use sitescore_scoring::{
    analyze_gap, compare_rates_with, rank_market, score_reputation_with, ScoringConfig,
};

#[derive(Parser)]
#[command(name = "sitescore")]
#[command(about = "Score a business against its local market")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Scoring configuration (TOML); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<String>,

    /// Web search endpoint
    #[arg(long, default_value = "https://www.googleapis.com/customsearch/v1")]
    endpoint: String,

    /// Web search API key
    #[arg(long, env = "SITESCORE_SEARCH_KEY", default_value = "")]
    api_key: String,

    /// Web search engine id
    #[arg(long, env = "SITESCORE_SEARCH_ENGINE", default_value = "")]
    engine_id: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank a market file and list missing services
    Market {
        /// Path to market JSON file
        #[arg(short, long)]
        input: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Compare own hourly rates with regional rates
    Rates {
        /// Own rates (comma-separated)
        #[arg(long)]
        own: String,

        /// Regional rates (comma-separated)
        #[arg(long)]
        regional: String,
    },

    /// Score the reputation of a company
    Reputation {
        /// Company name
        #[arg(short, long)]
        name: String,

        /// City to narrow the search
        #[arg(short, long)]
        city: Option<String>,

        /// Score a saved sample file instead of searching
        #[arg(short, long)]
        samples: Option<String>,
    },

    /// Check web search backend health
    Health,
}

/// Input file for the `market` command.
#[derive(Debug, Deserialize)]
struct MarketFile {
    #[serde(default)]
    industry: String,
    own: BusinessEntity,
    #[serde(default)]
    competitors: Vec<BusinessEntity>,
    #[serde(default)]
    state: UserState,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sitescore=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ScoringConfig::from_toml_file(path)
            .with_context(|| format!("loading scoring config from {}", path))?,
        None => ScoringConfig::default(),
    };

    match &cli.command {
        Commands::Market { input, format } => run_market(input, format, &config)?,
        Commands::Rates { own, regional } => run_rates(own, regional, &config)?,
        Commands::Reputation { name, city, samples } => {
            run_reputation(&cli, name, city.as_deref(), samples.as_deref(), &config).await?
        }
        Commands::Health => run_health(&cli).await?,
    }

    Ok(())
}

fn run_market(input: &str, format: &str, config: &ScoringConfig) -> Result<()> {
    let content = std::fs::read_to_string(input).with_context(|| format!("reading {}", input))?;
    let market: MarketFile =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", input))?;
    let industry = Industry::from(market.industry.as_str());
    tracing::info!(
        industry = industry.code(),
        competitors = market.competitors.len(),
        "ranking market"
    );

    let snapshot = rank_market(&market.own, &market.competitors, &market.state, industry, config);
    let gap = analyze_gap(&market.own.services, &market.competitors, &market.state);

    if format == "json" {
        let output = serde_json::json!({ "snapshot": snapshot, "gap": gap });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Market: {} ({} competitors)", industry.code(), market.competitors.len());
    println!("---");

    for (i, entry) in snapshot.entries.iter().enumerate() {
        let marker = if entry.entity.is_own() { "*" } else { " " };
        println!(
            "\n{}{}. {} ({})",
            marker,
            i + 1,
            entry.entity.name,
            entry.entity.id
        );
        println!(
            "   Score: {:.1} | Rating: {:.1} | Reviews: {} | Services: {}",
            entry.breakdown.final_score,
            entry.entity.sanitized_rating(),
            entry.entity.sanitized_review_count(),
            entry.breakdown.service_count
        );
        if let Some(exclusive) = gap.per_competitor_exclusive_services.get(&entry.entity.id) {
            if !exclusive.is_empty() && !entry.entity.is_own() {
                println!("   Exclusive: {}", exclusive.join(", "));
            }
        }
    }

    println!("\n---");
    println!("{}", summarize_position(&snapshot));
    if snapshot.dismissal_bonus > 0.0 {
        println!(
            "Dismissal bonus: +{:.2} (base {:.1})",
            snapshot.dismissal_bonus, snapshot.base_own_score
        );
    }
    if let Some(own) = snapshot.own_entry() {
        for explanation in explain_breakdown(&own.breakdown) {
            println!("   {} - {}", explanation.summary, explanation.detail);
        }
    }
    println!("{}", summarize_gap(&gap));

    Ok(())
}

fn run_rates(own: &str, regional: &str, config: &ScoringConfig) -> Result<()> {
    let own = parse_rates(own)?;
    let regional = parse_rates(regional)?;
    let comparison = compare_rates_with(&own, &regional, &config.rates);
    println!("{}", explain_rates(comparison.as_ref()));
    Ok(())
}

async fn run_reputation(
    cli: &Cli,
    name: &str,
    city: Option<&str>,
    samples_path: Option<&str>,
    config: &ScoringConfig,
) -> Result<()> {
    let samples: Vec<ReputationSample> = match samples_path {
        Some(path) => {
            let content =
                std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
            serde_json::from_str(&content).with_context(|| format!("parsing {}", path))?
        }
        None => {
            let mut query = ReputationQuery::new(name);
            if let Some(city) = city {
                query = query.with_city(city);
            }
            let queries = WebSearchDialect::default().translate(&query)?;
            println!("Searching {} queries for: {}", queries.len(), name);

            let backend = WebSearchBackend::new(search_config(cli))?;
            let tracker = RequestTracker::new();
            match gather_latest(&backend, &queries, &tracker).await {
                Some(samples) => samples,
                None => bail!("reputation search was superseded"),
            }
        }
    };

    let reputation = score_reputation_with(&samples, &config.reputation);
    println!("Samples: {} ({} enabled)", samples.len(), reputation.enabled_samples);
    println!("{}", explain_reputation(&reputation));
    Ok(())
}

async fn run_health(cli: &Cli) -> Result<()> {
    let backend = WebSearchBackend::new(search_config(cli))?;
    print!("Checking {} backend... ", backend.name());

    match backend.health_check().await {
        Ok(()) => {
            println!("OK");
            Ok(())
        }
        Err(e) => {
            println!("FAILED: {}", e);
            std::process::exit(1);
        }
    }
}

fn search_config(cli: &Cli) -> WebSearchConfig {
    WebSearchConfig {
        base_url: cli.endpoint.clone(),
        api_key: cli.api_key.clone(),
        engine_id: cli.engine_id.clone(),
        ..Default::default()
    }
}

/// Parse a comma-separated list of rates; blank entries are skipped.
fn parse_rates(s: &str) -> Result<Vec<f64>> {
    s.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|r| {
            r.parse::<f64>()
                .with_context(|| format!("invalid rate: {}", r))
        })
        .collect()
}
