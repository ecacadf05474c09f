use crate::api::ContextMessage;
use crate::models::{ChatTurn, Role};
use std::collections::VecDeque;
use tracing::debug;

pub const DEFAULT_HISTORY_CAPACITY: usize = 20;
pub const DEFAULT_CONTEXT_WINDOW: usize = 10;

/// Bounded log of past turns, oldest first.
///
/// Relevance is purely recency, so eviction is FIFO: once `capacity` turns
/// are stored, each append drops the oldest one.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    turns: VecDeque<ChatTurn>,
    capacity: usize,
}

impl ConversationHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a turn, returning whether it was kept.
    ///
    /// Turns whose content is empty or whitespace-only are dropped.
    pub fn append(&mut self, turn: ChatTurn) -> bool {
        if turn.is_blank() || self.capacity == 0 {
            return false;
        }

        while self.turns.len() >= self.capacity {
            if let Some(evicted) = self.turns.pop_front() {
                debug!(role = %evicted.role, "evicting oldest turn");
            }
        }

        self.turns.push_back(turn);
        true
    }

    /// Project the context window for a request carrying `current`.
    ///
    /// Takes the last `window` non-system turns and appends `current` as the
    /// final `user` message. Never touches the stored turns.
    pub fn build_context(&self, current: &str, window: usize) -> Vec<ContextMessage> {
        let conversation: Vec<&ChatTurn> = self
            .turns
            .iter()
            .filter(|turn| turn.role != Role::System)
            .collect();

        let skip = conversation.len().saturating_sub(window);
        let mut context: Vec<ContextMessage> = conversation[skip..]
            .iter()
            .map(|turn| ContextMessage::from(*turn))
            .collect();

        context.push(ContextMessage::user(current));
        context
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatTurn> {
        self.turns.iter()
    }

    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.back()
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
