use parley_types::MessageId;

/// Which message, if any, has its action menu open. At most one at a time.
///
/// No ownership check happens here; callers only open menus on the current
/// user's own messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuState {
    target: Option<MessageId>,
}

impl MenuState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the menu for `id`, replacing any open one. Returns the replaced target.
    pub fn open_for(&mut self, id: MessageId) -> Option<MessageId> {
        self.target.replace(id)
    }

    pub fn close(&mut self) -> Option<MessageId> {
        self.target.take()
    }

    pub fn target(&self) -> Option<&MessageId> {
        self.target.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    pub fn is_open_for(&self, id: &MessageId) -> bool {
        self.target.as_ref() == Some(id)
    }
}
