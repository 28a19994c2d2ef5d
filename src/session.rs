//! Per-user dialog state tracking for multi-step flows.
//!
//! Every multi-step interaction (product wizard, checkout, question
//! submission) is a strictly linear sequence of states; each incoming
//! message either advances to the next field, cancels back to `Idle`, or
//! re-prompts on invalid input without advancing.
//!
//! State is memory-only. After a process restart every user is back at
//! `Idle`; the next message of an orphaned flow gets an explicit
//! "let's start over" reply from the dispatcher rather than a silent
//! misroute.

use std::collections::HashMap;
use std::sync::Arc;
use teloxide::types::ChatId;
use tokio::sync::Mutex;

use crate::storage::catalog::ProductField;

/// The current step of a user's dialog.
///
/// Variants carry the partially-entered data of their flow so nothing
/// needs to be re-fetched when the next message arrives.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogState {
    /// No flow in progress
    Idle,

    // Checkout: address, then phone
    AwaitingShippingAddress,
    AwaitingPhone { address: String },

    // Support
    AwaitingQuestion,
    /// Admin typing the answer to a specific question
    AwaitingAnswer { question_id: i64 },

    // Admin category wizard
    AwaitingCategoryTitle,
    AwaitingCategoryRename { category_id: String },

    // Admin product wizard: title -> description -> image -> price -> category
    AwaitingProductTitle,
    AwaitingProductDescription {
        title: String,
    },
    AwaitingProductImage {
        title: String,
        description: String,
    },
    AwaitingProductPrice {
        title: String,
        description: String,
        image: Option<String>,
    },
    AwaitingProductCategory {
        title: String,
        description: String,
        image: Option<String>,
        price: i64,
    },

    // Admin editing one field of an existing product
    AwaitingProductField {
        product_id: String,
        field: ProductField,
    },
}

impl DialogState {
    pub fn is_idle(&self) -> bool {
        matches!(self, DialogState::Idle)
    }
}

/// In-memory tracker of every user's dialog state.
///
/// Each user's flow is serialized by this map: the dispatcher consults
/// it before command matching, so a user mid-flow is always routed to
/// the flow's input handler.
#[derive(Clone, Default)]
pub struct SessionTracker {
    states: Arc<Mutex<HashMap<ChatId, DialogState>>>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the user's current state; users without an entry are `Idle`.
    pub async fn get_state(&self, chat_id: ChatId) -> DialogState {
        self.states
            .lock()
            .await
            .get(&chat_id)
            .cloned()
            .unwrap_or(DialogState::Idle)
    }

    /// Moves the user to a new state, replacing any previous one.
    pub async fn set_state(&self, chat_id: ChatId, state: DialogState) {
        self.states.lock().await.insert(chat_id, state);
    }

    /// Returns the user to `Idle`, discarding any partial flow context.
    pub async fn clear_state(&self, chat_id: ChatId) {
        self.states.lock().await.remove(&chat_id);
    }

    /// True when the user is mid-flow.
    pub async fn in_flow(&self, chat_id: ChatId) -> bool {
        !self.get_state(chat_id).await.is_idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_users_are_idle() {
        let tracker = SessionTracker::new();
        assert_eq!(tracker.get_state(ChatId(1)).await, DialogState::Idle);
        assert!(!tracker.in_flow(ChatId(1)).await);
    }

    #[tokio::test]
    async fn states_are_per_user() {
        let tracker = SessionTracker::new();
        tracker.set_state(ChatId(1), DialogState::AwaitingShippingAddress).await;

        assert!(tracker.in_flow(ChatId(1)).await);
        assert!(!tracker.in_flow(ChatId(2)).await);
    }

    #[tokio::test]
    async fn clear_discards_partial_context() {
        let tracker = SessionTracker::new();
        tracker
            .set_state(
                ChatId(1),
                DialogState::AwaitingPhone {
                    address: "somewhere".to_string(),
                },
            )
            .await;
        tracker.clear_state(ChatId(1)).await;
        assert_eq!(tracker.get_state(ChatId(1)).await, DialogState::Idle);
    }

    #[tokio::test]
    async fn set_state_replaces_previous_step() {
        let tracker = SessionTracker::new();
        tracker.set_state(ChatId(1), DialogState::AwaitingProductTitle).await;
        tracker
            .set_state(
                ChatId(1),
                DialogState::AwaitingProductDescription {
                    title: "Thai".to_string(),
                },
            )
            .await;

        match tracker.get_state(ChatId(1)).await {
            DialogState::AwaitingProductDescription { title } => assert_eq!(title, "Thai"),
            other => panic!("unexpected state: {:?}", other),
        }
    }
}
