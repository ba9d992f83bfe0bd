//! Reputation query translation.
//!
//! Converts an abstract `ReputationQuery` (company name, optional city)
//! into the set of web-search strings issued for reputation sampling.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("Empty company name")]
    EmptyName,
}

/// What to look up: a company, optionally narrowed to a city.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReputationQuery {
    pub company_name: String,
    pub city: Option<String>,
}

impl ReputationQuery {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            city: None,
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }
}

/// Trait for translating a reputation lookup into search-engine syntax.
pub trait QueryDialect {
    /// The output type (usually a list of query strings)
    type Output;

    /// Translate a ReputationQuery to this dialect
    fn translate(&self, query: &ReputationQuery) -> Result<Self::Output, QueryError>;
}

/// Plain web-search dialect: one quoted phrase per review-related topic.
#[derive(Debug)]
pub struct WebSearchDialect {
    /// Terms appended to the quoted company name, one query each
    pub topics: Vec<String>,
}

impl Default for WebSearchDialect {
    fn default() -> Self {
        Self {
            topics: ["bewertungen", "erfahrungen", "reviews", "beschwerde"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl QueryDialect for WebSearchDialect {
    type Output = Vec<String>;

    fn translate(&self, query: &ReputationQuery) -> Result<Vec<String>, QueryError> {
        // Quotes inside the name would break the phrase
        let name = collapse_whitespace(&query.company_name.replace('"', " "));
        if name.is_empty() {
            return Err(QueryError::EmptyName);
        }

        let city = query
            .city
            .as_deref()
            .map(collapse_whitespace)
            .filter(|c| !c.is_empty());

        let phrase = format!("\"{}\"", name);
        let mut queries: Vec<String> = self
            .topics
            .iter()
            .map(|topic| match &city {
                Some(city) => format!("{} {} {}", phrase, city, topic),
                None => format!("{} {}", phrase, topic),
            })
            .collect();

        if let Some(city) = &city {
            queries.push(format!("{} {}", phrase, city));
        }

        Ok(queries)
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_basic_queries() {
        let dialect = WebSearchDialect::default();
        let queries = dialect.translate(&ReputationQuery::new("Muster GmbH")).unwrap();
        assert_eq!(queries.len(), 4);
        assert_eq!(queries[0], "\"Muster GmbH\" bewertungen");
    }

    #[test]
    fn test_city_added() {
        let dialect = WebSearchDialect::default();
        let query = ReputationQuery::new("Muster GmbH").with_city(" Köln ");
        let queries = dialect.translate(&query).unwrap();
        assert_eq!(queries.len(), 5);
        assert_eq!(queries[1], "\"Muster GmbH\" Köln erfahrungen");
        assert_eq!(queries[4], "\"Muster GmbH\" Köln");
    }

    #[test]
    fn test_quotes_stripped() {
        let dialect = WebSearchDialect::default();
        let queries = dialect
            .translate(&ReputationQuery::new("Bäder \"Meyer\"  & Sohn"))
            .unwrap();
        assert_eq!(queries[0], "\"Bäder Meyer & Sohn\" bewertungen");
    }

    #[test]
    fn test_empty_name_error() {
        let dialect = WebSearchDialect::default();
        assert_eq!(
            dialect.translate(&ReputationQuery::new("  \"\" ")),
            Err(QueryError::EmptyName)
        );
    }
}
