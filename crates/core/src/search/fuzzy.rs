use crate::errors::SearchError;
use crate::search::{normalize_query, Scored, SearchBackend};

/// A searchable field of `R` and the weight of a hit on it.
///
/// `values` returns every value of the field; multi-valued fields (an order's
/// line items) contribute the sum of their per-value scores.
pub struct WeightedField<R> {
    pub name: &'static str,
    pub weight: u32,
    pub values: fn(&R) -> Vec<&str>,
}

impl<R> Clone for WeightedField<R> {
    fn clone(&self) -> Self {
        Self { name: self.name, weight: self.weight, values: self.values }
    }
}

impl<R> std::fmt::Debug for WeightedField<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightedField")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .finish()
    }
}

/// Scores one already-lowercased query against one field value.
pub trait FieldScorer: Send + Sync {
    fn score(&self, query: &str, value: &str, weight: u32) -> u32;
}

/// Full weight for a case-insensitive substring hit, otherwise
/// `max(weight - distance, 1)` for the closest word window within
/// `max_distance` edits, otherwise zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditDistanceScorer {
    pub max_distance: usize,
}

impl Default for EditDistanceScorer {
    fn default() -> Self {
        Self { max_distance: 2 }
    }
}

impl EditDistanceScorer {
    fn best_window_distance(&self, query: &str, value: &str) -> Option<usize> {
        let window_len = query.split_whitespace().count().max(1);
        let words = value.split_whitespace().collect::<Vec<_>>();
        if words.is_empty() {
            return None;
        }
        if words.len() <= window_len {
            return Some(levenshtein(query, &words.join(" ")));
        }
        words.windows(window_len).map(|window| levenshtein(query, &window.join(" "))).min()
    }
}

impl FieldScorer for EditDistanceScorer {
    fn score(&self, query: &str, value: &str, weight: u32) -> u32 {
        if query.is_empty() || value.is_empty() {
            return 0;
        }
        let value = value.to_lowercase();
        if value.contains(query) {
            return weight;
        }

        match self.best_window_distance(query, &value) {
            Some(distance) if distance <= self.max_distance => {
                let distance = u32::try_from(distance).unwrap_or(u32::MAX);
                weight.saturating_sub(distance).max(1)
            }
            _ => 0,
        }
    }
}

/// Character-level Levenshtein distance.
pub fn levenshtein(left: &str, right: &str) -> usize {
    let right_chars = right.chars().collect::<Vec<_>>();
    let mut previous = (0..=right_chars.len()).collect::<Vec<_>>();
    let mut current = vec![0; right_chars.len() + 1];

    for (row, left_char) in left.chars().enumerate() {
        current[0] = row + 1;
        for (column, right_char) in right_chars.iter().enumerate() {
            let substitution = previous[column] + usize::from(left_char != *right_char);
            let deletion = previous[column + 1] + 1;
            let insertion = current[column] + 1;
            current[column + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[right_chars.len()]
}

/// Lexical ranked search over a fixed collection.
pub struct FuzzyIndex<R, S = EditDistanceScorer> {
    records: Vec<R>,
    fields: Vec<WeightedField<R>>,
    scorer: S,
}

impl<R> FuzzyIndex<R, EditDistanceScorer> {
    pub fn new(records: Vec<R>, fields: Vec<WeightedField<R>>) -> Self {
        Self::with_scorer(records, fields, EditDistanceScorer::default())
    }
}

impl<R, S> FuzzyIndex<R, S>
where
    S: FieldScorer,
{
    pub fn with_scorer(records: Vec<R>, fields: Vec<WeightedField<R>>, scorer: S) -> Self {
        Self { records, fields, scorer }
    }

    pub fn score_record(&self, query: &str, record: &R) -> u32 {
        self.fields
            .iter()
            .map(|field| {
                (field.values)(record)
                    .into_iter()
                    .map(|value| self.scorer.score(query, value, field.weight))
                    .sum::<u32>()
            })
            .sum()
    }
}

impl<R, S> SearchBackend<R> for FuzzyIndex<R, S>
where
    R: Clone + Send + Sync,
    S: FieldScorer,
{
    fn search(&self, query: &str, k: usize) -> Result<Vec<Scored<R>>, SearchError> {
        let query = normalize_query(query);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored = self
            .records
            .iter()
            .filter_map(|record| {
                let score = self.score_record(&query, record);
                (score > 0).then(|| (score, record))
            })
            .collect::<Vec<_>>();

        // `sort_by` is stable: equal scores keep collection order.
        scored.sort_by(|left, right| right.0.cmp(&left.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, record)| Scored { item: record.clone(), score: f64::from(score) })
            .collect())
    }

    fn records(&self) -> &[R] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::{levenshtein, EditDistanceScorer, FieldScorer, FuzzyIndex, WeightedField};
    use crate::search::SearchBackend;

    #[derive(Clone, Debug, PartialEq)]
    struct Doc {
        title: &'static str,
        body: &'static str,
    }

    fn fields() -> Vec<WeightedField<Doc>> {
        vec![
            WeightedField { name: "title", weight: 3, values: |doc: &Doc| vec![doc.title] },
            WeightedField { name: "body", weight: 1, values: |doc: &Doc| vec![doc.body] },
        ]
    }

    fn docs() -> Vec<Doc> {
        vec![
            Doc { title: "Zeta Monitor", body: "A budget display" },
            Doc { title: "Aero Laptop", body: "Pairs well with any monitor" },
            Doc { title: "Luma Monitor Pro", body: "Colour accurate display" },
            Doc { title: "Kettle", body: "Boils water" },
        ]
    }

    #[test]
    fn levenshtein_counts_single_character_edits() {
        assert_eq!(levenshtein("monitor", "monitor"), 0);
        assert_eq!(levenshtein("monitr", "monitor"), 1);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
    }

    #[test]
    fn exact_substring_scores_full_weight_and_near_miss_scores_less() {
        let scorer = EditDistanceScorer::default();
        assert_eq!(scorer.score("monitor", "Luma Monitor Pro", 3), 3);
        assert_eq!(scorer.score("monitr", "Luma Monitor Pro", 3), 2);
        assert_eq!(scorer.score("moniter", "Luma Monitor Pro", 1), 1);
        assert_eq!(scorer.score("toaster", "Luma Monitor Pro", 3), 0);
    }

    #[test]
    fn short_queries_match_within_two_edits() {
        let scorer = EditDistanceScorer::default();
        assert_eq!(scorer.score("mug", "Travel Bag", 3), 1);
        assert_eq!(scorer.score("pc", "Gaming PCs", 3), 3);
        assert_eq!(scorer.score("tv", "Smart TW", 3), 2);
        assert_eq!(scorer.score("tv", "kettle", 3), 0);
    }

    #[test]
    fn zero_tolerance_scores_substrings_only() {
        let scorer = EditDistanceScorer { max_distance: 0 };
        assert_eq!(scorer.score("monitr", "Luma Monitor Pro", 3), 0);
        assert_eq!(scorer.score("monitor", "Luma Monitor Pro", 3), 3);
    }

    #[test]
    fn ranks_by_descending_score_with_stable_ties() {
        let index = FuzzyIndex::new(docs(), fields());
        let results = index.search("Monitor", 5).expect("fuzzy search is infallible");
        let titles = results.iter().map(|scored| scored.item.title).collect::<Vec<_>>();

        assert_eq!(titles, vec!["Zeta Monitor", "Luma Monitor Pro", "Aero Laptop"]);
        assert_eq!(results[0].score, 3.0);
        assert_eq!(results[2].score, 1.0);
    }

    #[test]
    fn caps_results_at_k_and_excludes_zero_scores() {
        let index = FuzzyIndex::new(docs(), fields());
        let results = index.search("monitor", 1).expect("fuzzy search is infallible");
        assert_eq!(results.len(), 1);

        let none = index.search("submarine", 5).expect("fuzzy search is infallible");
        assert!(none.is_empty());
        assert!(index.search("   ", 5).expect("fuzzy search is infallible").is_empty());
    }
}
