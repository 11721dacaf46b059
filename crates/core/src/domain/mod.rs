pub mod customer;
pub mod faq;
pub mod order;
pub mod policy;
pub mod product;
