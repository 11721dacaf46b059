//! Append-only record of cancel and return decisions.

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerId;
use crate::domain::order::OrderId;
use crate::domain::product::ProductId;
use crate::errors::ActionLogError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    CancelOrder,
    InitiateReturn,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CancelOrder => "cancel_order",
            Self::InitiateReturn => "initiate_return",
        }
    }

    pub fn ticket_prefix(&self) -> &'static str {
        match self {
            Self::CancelOrder => "CAN",
            Self::InitiateReturn => "RET",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionResult {
    Approved,
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub timestamp: DateTime<Utc>,
    pub action: ActionKind,
    pub customer_id: Option<CustomerId>,
    pub order_id: Option<OrderId>,
    pub product_id: Option<ProductId>,
    pub result: ActionResult,
    pub reason: String,
    pub ticket_id: Option<String>,
}

impl ActionLogEntry {
    pub fn approved(
        action: ActionKind,
        customer_id: Option<CustomerId>,
        order_id: OrderId,
        product_id: Option<ProductId>,
        ticket_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            action,
            customer_id,
            order_id: Some(order_id),
            product_id,
            result: ActionResult::Approved,
            reason: reason.into(),
            ticket_id: Some(ticket_id.into()),
        }
    }

    pub fn rejected(
        action: ActionKind,
        customer_id: Option<CustomerId>,
        order_id: Option<OrderId>,
        product_id: Option<ProductId>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            action,
            customer_id,
            order_id,
            product_id,
            result: ActionResult::Rejected,
            reason: reason.into(),
            ticket_id: None,
        }
    }
}

/// Durable sink for action decisions. Entries are never read back by the
/// agent; each `append` must land as one whole line.
pub trait ActionLog: Send + Sync {
    fn append(&self, entry: &ActionLogEntry) -> Result<(), ActionLogError>;
}

#[derive(Clone, Default)]
pub struct InMemoryActionLog {
    entries: Arc<Mutex<Vec<ActionLogEntry>>>,
}

impl InMemoryActionLog {
    pub fn entries(&self) -> Vec<ActionLogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ActionLog for InMemoryActionLog {
    fn append(&self, entry: &ActionLogEntry) -> Result<(), ActionLogError> {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry.clone()),
            Err(poisoned) => poisoned.into_inner().push(entry.clone()),
        }
        Ok(())
    }
}

/// `CAN-1a2b3c` / `RET-9f00e1`: prefix plus six hex digits from the OS RNG.
pub fn issue_ticket_id(action: ActionKind) -> String {
    let mut bytes = [0_u8; 3];
    OsRng.fill_bytes(&mut bytes);
    let suffix = bytes.iter().map(|byte| format!("{byte:02x}")).collect::<String>();
    format!("{}-{suffix}", action.ticket_prefix())
}
