use crate::domain::faq::FaqEntry;
use crate::domain::order::Order;
use crate::domain::policy::PolicyEntry;
use crate::domain::product::CatalogItem;
use crate::errors::SearchError;
use crate::search::{Scored, SearchBackend};

/// Dense text embedding. Model loading and inference live outside the crate.
pub trait Embedder: Send + Sync {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SearchError>;
}

/// The text a record is embedded as.
pub trait SynthesizedText {
    fn synthesized_text(&self) -> String;
}

/// Cosine-similarity search over record embeddings computed once at build time.
pub struct VectorIndex<R, E> {
    records: Vec<R>,
    vectors: Vec<Vec<f32>>,
    embedder: E,
}

impl<R, E> VectorIndex<R, E>
where
    R: SynthesizedText,
    E: Embedder,
{
    /// Embeds every record with non-empty synthesized text; records without
    /// any text are left out of the index.
    pub fn build(records: Vec<R>, embedder: E) -> Result<Self, SearchError> {
        let (records, texts): (Vec<R>, Vec<String>) = records
            .into_iter()
            .map(|record| {
                let text = record.synthesized_text();
                (record, text)
            })
            .filter(|(_, text)| !text.trim().is_empty())
            .unzip();

        let vectors = if texts.is_empty() { Vec::new() } else { embedder.embed(&texts)? };
        if vectors.len() != records.len() {
            return Err(SearchError::Embedding(format!(
                "embedder returned {} vectors for {} records",
                vectors.len(),
                records.len()
            )));
        }

        Ok(Self { records, vectors, embedder })
    }
}

impl<R, E> SearchBackend<R> for VectorIndex<R, E>
where
    R: Clone + Send + Sync,
    E: Embedder,
{
    fn search(&self, query: &str, k: usize) -> Result<Vec<Scored<R>>, SearchError> {
        if query.trim().is_empty() || self.records.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed(&[query.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| SearchError::Embedding("embedder returned no query vector".into()))?;

        let mut scored = Vec::with_capacity(self.vectors.len());
        for (record, vector) in self.records.iter().zip(&self.vectors) {
            if vector.len() != query_vector.len() {
                return Err(SearchError::DimensionMismatch {
                    expected: vector.len(),
                    actual: query_vector.len(),
                });
            }
            scored.push((cosine_similarity(&query_vector, vector), record));
        }

        scored.sort_by(|left, right| {
            right.0.partial_cmp(&left.0).unwrap_or(std::cmp::Ordering::Equal)
        });

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

pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    let dot = left.iter().zip(right).map(|(a, b)| a * b).sum::<f32>();
    let left_norm = left.iter().map(|value| value * value).sum::<f32>().sqrt();
    let right_norm = right.iter().map(|value| value * value).sum::<f32>().sqrt();
    if left_norm == 0.0 || right_norm == 0.0 {
        return 0.0;
    }
    dot / (left_norm * right_norm)
}

fn join_parts<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .flatten()
        .map(|part| part.as_ref().trim().to_string())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(value: &str) -> Option<String> {
    (!value.trim().is_empty()).then(|| value.to_string())
}

impl SynthesizedText for CatalogItem {
    fn synthesized_text(&self) -> String {
        join_parts([
            non_empty(&self.product_name),
            non_empty(&self.category),
            non_empty(&self.description),
            non_empty(self.product_id.as_str()).map(|id| format!("Product ID {id}")),
            self.price.map(|price| format!("Price {price}")),
            self.rating.map(|rating| format!("Rating {rating}")),
        ])
    }
}

impl SynthesizedText for FaqEntry {
    fn synthesized_text(&self) -> String {
        join_parts([
            non_empty(&self.product_name),
            non_empty(self.product_id.as_str()),
            non_empty(&self.question),
            non_empty(&self.answer),
        ])
    }
}

impl SynthesizedText for PolicyEntry {
    fn synthesized_text(&self) -> String {
        join_parts([non_empty(&self.section), non_empty(&self.text)])
    }
}

impl SynthesizedText for Order {
    fn synthesized_text(&self) -> String {
        let products = self
            .products
            .iter()
            .map(|line| {
                join_parts([
                    non_empty(&line.product_name),
                    non_empty(line.product_id.as_str()).map(|id| format!("({id})")),
                ])
            })
            .collect::<Vec<_>>()
            .join(", ");

        join_parts([
            non_empty(self.order_id.as_str()).map(|id| format!("Order {id}")),
            non_empty(self.customer_id.as_str()).map(|id| format!("Customer {id}")),
            Some(format!("Status {}", self.order_status)),
            non_empty(&self.order_date).map(|date| format!("Date {date}")),
            non_empty(&products).map(|products| format!("Products {products}")),
        ])
    }
}
