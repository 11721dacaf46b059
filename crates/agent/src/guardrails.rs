use shopdesk_core::{ActionKind, CustomerId, Order, OrderId, ProductId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailIntent {
    /// Orders lookup that may name a customer explicitly.
    OrderLookup { requested_customer: Option<CustomerId> },
    /// Cancel or return attempted against an order owned by `owner`.
    OrderOwnership { action: ActionKind, order_id: OrderId, owner: CustomerId },
    /// An eligible cancel or return about to be submitted.
    ActionSubmission {
        action: ActionKind,
        order_id: OrderId,
        product_id: Option<ProductId>,
        confirmed: bool,
    },
}

impl GuardrailIntent {
    pub fn action_key(&self) -> &'static str {
        match self {
            Self::OrderLookup { .. } => "orders.lookup",
            Self::OrderOwnership { action, .. } | Self::ActionSubmission { action, .. } => {
                action.as_str()
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow,
    Deny { reason_code: &'static str, user_message: String, fallback_path: &'static str },
    Degrade { reason_code: &'static str, user_message: String, fallback_path: &'static str },
}

/// Session-level limits on what tool calls may see and do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardrailPolicy {
    pub customer_id: Option<CustomerId>,
    pub require_confirmation: bool,
}

impl Default for GuardrailPolicy {
    fn default() -> Self {
        Self { customer_id: None, require_confirmation: true }
    }
}

impl GuardrailPolicy {
    pub fn for_customer(customer_id: Option<CustomerId>, require_confirmation: bool) -> Self {
        Self { customer_id, require_confirmation }
    }

    /// Orders visible to the session: all of them when no customer is bound.
    pub fn can_view(&self, order: &Order) -> bool {
        self.customer_id.as_ref().map_or(true, |customer_id| order.belongs_to(customer_id))
    }

    pub fn evaluate(&self, intent: &GuardrailIntent) -> GuardrailDecision {
        match intent {
            GuardrailIntent::OrderLookup { requested_customer: Some(requested) }
                if self.customer_id.as_ref().is_some_and(|bound| bound != requested) =>
            {
                GuardrailDecision::Deny {
                    reason_code: "cross_customer_lookup",
                    user_message:
                        "Access denied: you can only view orders that belong to your own customer ID."
                            .to_string(),
                    fallback_path: "own_orders_only",
                }
            }
            GuardrailIntent::OrderLookup { .. } => GuardrailDecision::Allow,
            GuardrailIntent::OrderOwnership { owner, .. }
                if self.customer_id.as_ref().is_some_and(|bound| bound != owner) =>
            {
                GuardrailDecision::Deny {
                    reason_code: "order_not_owned",
                    user_message: "Order does not belong to your customer ID.".to_string(),
                    fallback_path: "own_orders_only",
                }
            }
            GuardrailIntent::OrderOwnership { .. } => GuardrailDecision::Allow,
            GuardrailIntent::ActionSubmission { confirmed: true, .. } => GuardrailDecision::Allow,
            GuardrailIntent::ActionSubmission { .. } if !self.require_confirmation => {
                GuardrailDecision::Allow
            }
            GuardrailIntent::ActionSubmission { action, order_id, product_id, .. } => {
                let user_message = match (action, product_id) {
                    (ActionKind::InitiateReturn, Some(product_id)) => format!(
                        "Please confirm that you want to return {product_id} from order {order_id}."
                    ),
                    (ActionKind::InitiateReturn, None) => {
                        format!("Please confirm that you want to return items from order {order_id}.")
                    }
                    (ActionKind::CancelOrder, _) => {
                        format!("Please confirm that you want to cancel order {order_id}.")
                    }
                };
                GuardrailDecision::Degrade {
                    reason_code: "confirmation_required",
                    user_message,
                    fallback_path: "request_explicit_confirmation",
                }
            }
        }
    }
}
