use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;

/// One question/answer pair, denormalised with the product it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub product_id: ProductId,
    pub product_name: String,
    pub question: String,
    pub answer: String,
}

/// Shape of `product_faqs.json`: questions grouped per product.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ProductFaqs {
    pub product_id: ProductId,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub faqs: Vec<FaqQuestion>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FaqQuestion {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

pub fn flatten_faqs(groups: Vec<ProductFaqs>) -> Vec<FaqEntry> {
    groups
        .into_iter()
        .flat_map(|group| {
            let ProductFaqs { product_id, product_name, faqs } = group;
            faqs.into_iter().map(move |faq| FaqEntry {
                product_id: product_id.clone(),
                product_name: product_name.clone(),
                question: faq.question,
                answer: faq.answer,
            })
        })
        .collect()
}
