//! Ordered message set for the active conversation.
//!
//! Messages are kept sorted by `(created_at, id)` and ids are unique. All
//! mutations are idempotent with respect to ids: appending a known id or
//! removing an unknown one leaves the store untouched.

use std::collections::HashSet;

use parley_types::{Message, MessageId};

/// Outcome of a store mutation, used to decide what the renderer must do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    /// Contents were swapped for a new sequence of `len` messages.
    Replaced { len: usize },
    /// A message was inserted at `position`; `newest` when it became the tail.
    Appended { position: usize, newest: bool },
    /// A message with that id was already present.
    Duplicate,
    /// The message at `position` was deleted.
    Removed { position: usize },
    /// No message with that id was present.
    Absent,
}

impl StoreChange {
    /// True when the store's contents actually changed.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Duplicate | Self::Absent)
    }

    /// True when the visible tail grew and the view should follow it.
    pub fn scroll_to_newest(&self) -> bool {
        match self {
            Self::Replaced { len } => *len > 0,
            Self::Appended { newest, .. } => *newest,
            Self::Duplicate | Self::Removed { .. } | Self::Absent => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard current contents and install `messages` in thread order.
    ///
    /// A repeated id keeps its first occurrence.
    pub fn replace(&mut self, messages: impl IntoIterator<Item = Message>) -> StoreChange {
        let mut seen = HashSet::new();
        let mut messages: Vec<Message> = messages
            .into_iter()
            .filter(|m| seen.insert(m.id.clone()))
            .collect();
        messages.sort_by(|a, b| a.order_key().cmp(&b.order_key()));

        self.messages = messages;
        StoreChange::Replaced {
            len: self.messages.len(),
        }
    }

    /// Insert `message` at its ordered position unless its id is already held.
    pub fn append(&mut self, message: Message) -> StoreChange {
        if self.contains(&message.id) {
            return StoreChange::Duplicate;
        }

        let position = self
            .messages
            .partition_point(|m| m.order_key() <= message.order_key());
        self.messages.insert(position, message);

        StoreChange::Appended {
            position,
            newest: position + 1 == self.messages.len(),
        }
    }

    pub fn remove(&mut self, id: &MessageId) -> StoreChange {
        match self.messages.iter().position(|m| &m.id == id) {
            Some(position) => {
                self.messages.remove(position);
                StoreChange::Removed { position }
            }
            None => StoreChange::Absent,
        }
    }

    pub fn clear(&mut self) -> StoreChange {
        self.replace(Vec::new())
    }

    /// Current ordered contents. Borrowed; do not hold across mutations.
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    /// Owned copy of the current contents for handing to a renderer.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.get(id).is_some()
    }

    pub fn newest(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
