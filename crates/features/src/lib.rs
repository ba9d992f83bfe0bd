//! Text features for market analysis.
//!
//! Provides pure functions used by scoring and gap analysis:
//! - Service label normalization and tokenization
//! - Service similarity (the single matching rule for every gap computation)
//! - Industry keyword tables and industry-service classification
//! - Sentiment lexicons for reputation samples

use sitescore_model::Industry;

/// Tokens shorter than this are ignored by the overlap rule.
pub const MIN_TOKEN_LEN: usize = 3;

/// Share of the shorter token list that must match for two labels to be
/// considered the same service.
pub const TOKEN_OVERLAP_THRESHOLD: f64 = 0.5;

/// Normalize a service label for comparison.
pub fn normalize_service(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Split a service label into comparison tokens.
///
/// Splits on whitespace, hyphens and underscores and keeps lower-cased
/// tokens of at least `MIN_TOKEN_LEN` characters.
pub fn service_tokens(label: &str) -> Vec<String> {
    label
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}

/// Check if two service labels denote the same offering.
///
/// Rules, first match wins: case-insensitive exact match, containment of
/// one label in the other, then token overlap of at least
/// `TOKEN_OVERLAP_THRESHOLD` measured on the shorter token list.
/// Blank labels never match.
pub fn services_similar(a: &str, b: &str) -> bool {
    let a = normalize_service(a);
    let b = normalize_service(b);

    if a.is_empty() || b.is_empty() {
        return false;
    }

    if a == b {
        return true;
    }

    if a.contains(&b) || b.contains(&a) {
        return true;
    }

    token_overlap_ratio(&service_tokens(&a), &service_tokens(&b)) >= TOKEN_OVERLAP_THRESHOLD
}

/// Check if any label in `candidates` is similar to `label`.
pub fn has_similar<S: AsRef<str>>(label: &str, candidates: &[S]) -> bool {
    candidates.iter().any(|c| services_similar(label, c.as_ref()))
}

/// Fraction of the shorter token list found in the longer one.
///
/// Equal-length lists are counted in both directions and the larger count
/// wins, which keeps the relation symmetric.
fn token_overlap_ratio(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let matched = match a.len().cmp(&b.len()) {
        std::cmp::Ordering::Less => count_matched(a, b),
        std::cmp::Ordering::Greater => count_matched(b, a),
        std::cmp::Ordering::Equal => count_matched(a, b).max(count_matched(b, a)),
    };

    matched as f64 / a.len().min(b.len()) as f64
}

fn count_matched(shorter: &[String], longer: &[String]) -> usize {
    shorter
        .iter()
        .filter(|t| longer.iter().any(|l| l.contains(t.as_str()) || t.contains(l.as_str())))
        .count()
}

/// Keyword stems marking a service as specific to the industry.
pub fn industry_keywords(industry: Industry) -> &'static [&'static str] {
    match industry {
        Industry::Shk => &[
            "heizung",
            "heating",
            "sanitär",
            "sanitaer",
            "plumbing",
            "klima",
            "air condition",
            "lüftung",
            "ventilation",
            "badsanierung",
            "bathroom",
            "wärmepumpe",
            "heat pump",
            "solarthermie",
            "boiler",
            "kessel",
            "rohr",
            "pipe",
            "wasser",
            "water",
        ],
        Industry::Elektro => &[
            "elektro",
            "electric",
            "beleuchtung",
            "lighting",
            "photovoltaik",
            "photovoltaic",
            "solar",
            "smart home",
            "wallbox",
            "ladestation",
            "sicherung",
            "verteiler",
            "kabel",
            "wiring",
            "netzwerk",
            "network",
            "e-check",
        ],
        Industry::Dach => &[
            "dach",
            "roof",
            "dachrinne",
            "gutter",
            "ziegel",
            "tile",
            "abdichtung",
            "sealing",
            "flachdach",
            "schiefer",
            "slate",
            "dachfenster",
            "skylight",
            "spengler",
            "klempner",
        ],
        Industry::Maler => &[
            "maler",
            "paint",
            "anstrich",
            "lackier",
            "tapezier",
            "wallpaper",
            "fassade",
            "facade",
            "putz",
            "plaster",
            "spachtel",
            "bodenbelag",
            "flooring",
            "wärmedämm",
            "insulation",
        ],
        Industry::Tischler => &[
            "tischler",
            "schreiner",
            "carpent",
            "joinery",
            "möbel",
            "furniture",
            "küche",
            "kitchen",
            "treppe",
            "stair",
            "fenster",
            "window",
            "türen",
            "door",
            "parkett",
            "holz",
            "wood",
        ],
        Industry::Garten => &[
            "garten",
            "garden",
            "landschaft",
            "landscap",
            "pflaster",
            "paving",
            "rasen",
            "lawn",
            "baumpflege",
            "tree",
            "hecke",
            "hedge",
            "bewässerung",
            "irrigation",
            "teich",
            "pond",
            "zaun",
            "fence",
        ],
        Industry::General => &[],
    }
}

/// Check if a service is specific to the industry: its text contains, or is
/// contained in, one of the keywords.
pub fn is_industry_service(service: &str, keywords: &[&str]) -> bool {
    let service = normalize_service(service);
    if service.is_empty() {
        return false;
    }

    keywords
        .iter()
        .any(|k| service.contains(k) || k.contains(service.as_str()))
}

/// Sentiment word list.
///
/// `stems` match any word starting with them. `words` only match whole
/// words, for short English entries that open ordinary German words
/// ("Bestellung", "Supermarkt", "Ruder").
#[derive(Debug, Clone, Copy)]
pub struct Lexicon {
    pub stems: &'static [&'static str],
    pub words: &'static [&'static str],
}

impl Lexicon {
    fn matches(&self, word: &str) -> bool {
        self.stems.iter().any(|stem| word.starts_with(stem)) || self.words.contains(&word)
    }
}

/// Favourable mentions.
pub const POSITIVE_KEYWORDS: Lexicon = Lexicon {
    stems: &[
        "zufrieden",
        "empfehl",
        "hervorragend",
        "ausgezeichnet",
        "kompetent",
        "zuverlässig",
        "pünktlich",
        "freundlich",
        "professionell",
        "excellent",
        "recommend",
        "reliable",
        "professional",
        "friendly",
        "satisfied",
    ],
    words: &["super", "great", "best"],
};

/// Unfavourable mentions.
pub const NEGATIVE_KEYWORDS: Lexicon = Lexicon {
    stems: &[
        "unzufrieden",
        "schlecht",
        "mangelhaft",
        "betrug",
        "abzocke",
        "beschwerde",
        "warnung",
        "unzuverlässig",
        "unfreundlich",
        "unprofessionell",
        "pfusch",
        "ärger",
        "fraud",
        "complaint",
        "terrible",
        "awful",
        "worst",
        "unprofessional",
    ],
    words: &["scam", "scams", "poor", "rude"],
};

/// Count words in `text` that match the lexicon.
///
/// Matching on word starts keeps negated forms ("unzufrieden") from
/// counting towards their positive stem ("zufrieden").
pub fn count_keyword_hits(text: &str, lexicon: &Lexicon) -> usize {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .filter(|w| lexicon.matches(w))
        .count()
}
