use serde::{Deserialize, Serialize};

use shopdesk_core::domain::product::{CatalogItem, ProductId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }

    /// Coarse `chars / 4` proxy; not a tokenizer.
    pub fn approx_tokens(&self) -> usize {
        self.content.chars().count() / 4
    }
}

/// The product the user is currently talking about.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusEntity {
    pub product_id: ProductId,
    pub product_name: String,
}

impl From<&CatalogItem> for FocusEntity {
    fn from(item: &CatalogItem) -> Self {
        Self { product_id: item.product_id.clone(), product_name: item.product_name.clone() }
    }
}

/// Message history for one session plus the current focus entity.
///
/// Index 0 is always the system message. History only grows; the window sent
/// to the model is computed per turn by [`build_window`].
#[derive(Clone, Debug)]
pub struct ConversationState {
    history: Vec<Message>,
    focus: Option<FocusEntity>,
}

impl ConversationState {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self { history: vec![Message::system(system_prompt)], focus: None }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn push(&mut self, message: Message) {
        self.history.push(message);
    }

    pub fn focus(&self) -> Option<&FocusEntity> {
        self.focus.as_ref()
    }

    /// Binds focus to the single match, or to the first match named in the
    /// utterance. Anything else leaves focus unchanged.
    pub fn update_focus(&mut self, matches: &[CatalogItem], utterance: &str) {
        let chosen = match matches {
            [] => None,
            [only] => Some(only),
            many => {
                let lowered = utterance.to_lowercase();
                many.iter().find(|item| {
                    !item.product_name.is_empty()
                        && lowered.contains(&item.product_name.to_lowercase())
                })
            }
        };

        if let Some(item) = chosen {
            tracing::debug!(
                event_name = "agent.conversation.focus_updated",
                product_id = %item.product_id,
                "focus entity updated"
            );
            self.focus = Some(FocusEntity::from(item));
        }
    }

    pub fn window(&self, use_memory: bool, max_tokens: usize) -> Vec<Message> {
        build_window(&self.history, use_memory, max_tokens)
    }
}

/// Token-bounded view of `history` for the generation call.
///
/// Without memory only the system message and the latest user message are
/// kept. With memory, whole messages are evicted oldest-first from index 1
/// until the estimate fits `max_tokens` or a single message remains after
/// the system message.
pub fn build_window(history: &[Message], use_memory: bool, max_tokens: usize) -> Vec<Message> {
    let Some((system, rest)) = history.split_first() else {
        return Vec::new();
    };

    if !use_memory {
        let mut window = vec![system.clone()];
        if let Some(latest_user) = rest.iter().rev().find(|message| message.role == Role::User) {
            window.push(latest_user.clone());
        }
        return window;
    }

    let mut total = history.iter().map(Message::approx_tokens).sum::<usize>();
    let mut start = 0;
    while total > max_tokens && start + 1 < rest.len() {
        total -= rest[start].approx_tokens();
        start += 1;
    }

    let mut window = Vec::with_capacity(rest.len() - start + 1);
    window.push(system.clone());
    window.extend(rest[start..].iter().cloned());
    window
}
