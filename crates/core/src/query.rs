//! Structured filter extraction for catalog queries.
//!
//! `"best monitors under $1,500"` becomes a residual query (`"monitors"`)
//! plus a price ceiling and a minimum rating. Parsing never fails: any
//! internal problem yields [`ParsedQuery::passthrough`].

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const CATEGORIES: [&str; 7] =
    ["electronics", "clothing", "home", "beauty", "sports", "toys", "kitchen"];

pub const DEFAULT_MIN_RATING: f64 = 4.0;

const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '₹'];
const NUMBER: &str = r"\d{1,3}(?:,\d{3})+|\d+(?:\.\d+)?k?";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortHint {
    PriceAsc,
    DeliveryTimeDaysAsc,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub cleaned_query: String,
    pub max_price: Option<i64>,
    pub min_price: Option<i64>,
    pub min_rating: Option<f64>,
    pub category: Option<String>,
    pub sort: Option<SortHint>,
}

impl ParsedQuery {
    pub fn passthrough(text: &str) -> Self {
        Self {
            cleaned_query: text.to_string(),
            max_price: None,
            min_price: None,
            min_rating: None,
            category: None,
            sort: None,
        }
    }
}

struct Patterns {
    category: Regex,
    max_price: Regex,
    min_price: Regex,
    rating: Regex,
    number: Regex,
    vocabulary: Regex,
    whitespace: Regex,
}

impl Patterns {
    fn compile() -> Option<Self> {
        let categories = CATEGORIES.join("|");
        Some(Self {
            category: Regex::new(&format!(r"\b({categories})\b")).ok()?,
            max_price: Regex::new(&format!(r"(?:under|below|less than)\s+({NUMBER})")).ok()?,
            min_price: Regex::new(&format!(r"(?:above|more than|over)\s+({NUMBER})")).ok()?,
            rating: Regex::new(
                r"\b(top rated|best)\b(?:\s*(?:above|over|>=|at least)\s*(\d+(?:\.\d+)?))?",
            )
            .ok()?,
            number: Regex::new(NUMBER).ok()?,
            vocabulary: Regex::new(&format!(
                r"\b(under|below|less|than|above|more|over|cheapest|fastest|top|rated|best|{categories})\b"
            ))
            .ok()?,
            whitespace: Regex::new(r"\s+").ok()?,
        })
    }
}

fn patterns() -> Option<&'static Patterns> {
    static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
    PATTERNS.get_or_init(Patterns::compile).as_ref()
}

#[derive(Clone, Debug, Default)]
pub struct QueryParser;

impl QueryParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, text: &str) -> ParsedQuery {
        if text.trim().is_empty() {
            return ParsedQuery::passthrough(text);
        }
        let Some(patterns) = patterns() else {
            tracing::warn!(
                event_name = "core.query.patterns_unavailable",
                "query patterns failed to compile; using raw query"
            );
            return ParsedQuery::passthrough(text);
        };

        let raw = text
            .to_lowercase()
            .chars()
            .map(|character| if CURRENCY_SYMBOLS.contains(&character) { ' ' } else { character })
            .collect::<String>();

        let category = patterns
            .category
            .captures(&raw)
            .and_then(|captures| captures.get(1))
            .map(|matched| matched.as_str().to_string());

        let max_price = capture_number(&patterns.max_price, &raw);
        let min_price = capture_number(&patterns.min_price, &raw);

        let min_rating = patterns.rating.captures(&raw).map(|captures| {
            captures
                .get(2)
                .and_then(|explicit| explicit.as_str().parse::<f64>().ok())
                .unwrap_or(DEFAULT_MIN_RATING)
        });

        let sort = if raw.contains("cheapest") {
            Some(SortHint::PriceAsc)
        } else if raw.contains("fastest") {
            Some(SortHint::DeliveryTimeDaysAsc)
        } else {
            None
        };

        let without_numbers = patterns.number.replace_all(&raw, " ");
        let without_vocabulary = patterns.vocabulary.replace_all(&without_numbers, " ");
        let collapsed = patterns.whitespace.replace_all(&without_vocabulary, " ");
        let cleaned = collapsed.trim();

        ParsedQuery {
            cleaned_query: if cleaned.is_empty() { text.to_string() } else { cleaned.to_string() },
            max_price,
            min_price,
            min_rating,
            category,
            sort,
        }
    }
}

fn capture_number(pattern: &Regex, raw: &str) -> Option<i64> {
    pattern
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .and_then(|matched| parse_amount(matched.as_str()))
}

/// Parses `1,500`, `250`, `49.99` and `2.5k` into whole currency units.
pub fn parse_amount(token: &str) -> Option<i64> {
    let normalized = token.trim().to_ascii_lowercase().replace(',', "");
    let (digits, multiplier) = match normalized.strip_suffix('k') {
        Some(prefix) => (prefix, 1_000.0),
        None => (normalized.as_str(), 1.0),
    };
    let numeric = digits.chars().all(|character| character.is_ascii_digit() || character == '.');
    if digits.is_empty() || !numeric {
        return None;
    }
    let value = digits.parse::<f64>().ok()?;
    Some((value * multiplier).trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::{parse_amount, ParsedQuery, QueryParser, SortHint};

    #[test]
    fn extracts_price_ceiling_with_thousands_separator_and_currency() {
        let parsed = QueryParser::new().parse("Laptops under $1,500");
        assert_eq!(parsed.max_price, Some(1_500));
        assert_eq!(parsed.cleaned_query, "laptops");
    }

    #[test]
    fn k_suffix_multiplies_and_truncates() {
        let parsed = QueryParser::new().parse("tv below 2.5k");
        assert_eq!(parsed.max_price, Some(2_500));
        assert_eq!(parse_amount("1.2345k"), Some(1_234));
        assert_eq!(parse_amount("k"), None);
    }

    #[test]
    fn extracts_price_floor_category_rating_and_sort() {
        let parsed = QueryParser::new().parse("cheapest top rated electronics headphones above 100");
        assert_eq!(parsed.min_price, Some(100));
        assert_eq!(parsed.category.as_deref(), Some("electronics"));
        assert_eq!(parsed.min_rating, Some(4.0));
        assert_eq!(parsed.sort, Some(SortHint::PriceAsc));
        assert_eq!(parsed.cleaned_query, "headphones");
    }

    #[test]
    fn explicit_rating_threshold_overrides_default() {
        let parsed = QueryParser::new().parse("top rated at least 4.5 blender");
        assert_eq!(parsed.min_rating, Some(4.5));
    }

    #[test]
    fn cheapest_wins_over_fastest() {
        let parsed = QueryParser::new().parse("fastest or cheapest shipping kettle");
        assert_eq!(parsed.sort, Some(SortHint::PriceAsc));

        let parsed = QueryParser::new().parse("fastest kettle");
        assert_eq!(parsed.sort, Some(SortHint::DeliveryTimeDaysAsc));
    }

    #[test]
    fn falls_back_to_original_text_when_everything_is_stripped() {
        let parsed = QueryParser::new().parse("Under 50");
        assert_eq!(parsed.max_price, Some(50));
        assert_eq!(parsed.cleaned_query, "Under 50");
    }

    #[test]
    fn plain_queries_pass_through_without_filters() {
        let parsed = QueryParser::new().parse("monitor");
        assert_eq!(
            parsed,
            ParsedQuery { cleaned_query: "monitor".to_string(), ..ParsedQuery::passthrough("") }
        );
    }
}
