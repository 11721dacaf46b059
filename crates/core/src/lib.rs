pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod identifiers;
pub mod query;
pub mod search;

pub use audit::{ActionKind, ActionLog, ActionLogEntry, ActionResult, InMemoryActionLog};
pub use domain::customer::CustomerId;
pub use domain::faq::FaqEntry;
pub use domain::order::{Order, OrderId, OrderLine, OrderStatus};
pub use domain::policy::PolicyEntry;
pub use domain::product::{CatalogItem, ProductId};
pub use errors::{ActionLogError, SearchError, StoreError, ToolError};
pub use query::{ParsedQuery, QueryParser, SortHint};
pub use search::{Scored, SearchBackend};
