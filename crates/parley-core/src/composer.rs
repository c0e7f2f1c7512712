//! Outgoing draft and emoji picker state.
//!
//! The picker listens for pointer interactions only while it is open: opening
//! subscribes to an [`InteractionSource`], closing drops the subscription.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::trace;

const INTERACTION_CAPACITY: usize = 64;

/// Screen region an interaction landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    EmojiPicker,
    Composer,
    MessageList,
    Elsewhere,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interaction {
    pub region: Region,
}

impl Interaction {
    pub fn at(region: Region) -> Self {
        Self { region }
    }

    pub fn is_outside_picker(&self) -> bool {
        self.region != Region::EmojiPicker
    }
}

/// Fan-out of pointer interactions to whoever is currently watching.
#[derive(Clone)]
pub struct InteractionSource {
    tx: broadcast::Sender<Interaction>,
}

impl Default for InteractionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionSource {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(INTERACTION_CAPACITY);
        Self { tx }
    }

    /// Report an interaction. Returns how many watchers received it.
    pub fn emit(&self, region: Region) -> usize {
        self.tx.send(Interaction::at(region)).unwrap_or(0)
    }

    /// Number of live subscriptions.
    pub fn watchers(&self) -> usize {
        self.tx.receiver_count()
    }

    fn subscribe(&self) -> broadcast::Receiver<Interaction> {
        self.tx.subscribe()
    }
}

#[derive(Debug, Default)]
pub struct ComposerState {
    draft: String,
    /// Present exactly while the picker is visible.
    picker: Option<broadcast::Receiver<Interaction>>,
}

impl ComposerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Replace the draft verbatim.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Append `symbol` to the draft. Picker visibility is left alone.
    pub fn insert_emoji(&mut self, symbol: &str) {
        self.draft.push_str(symbol);
    }

    /// Draft with surrounding whitespace removed; `None` when nothing is left.
    pub fn trimmed(&self) -> Option<&str> {
        let text = self.draft.trim();
        (!text.is_empty()).then_some(text)
    }

    pub fn can_send(&self) -> bool {
        self.trimmed().is_some()
    }

    /// Reset the draft. Only called once a send is confirmed.
    pub fn clear(&mut self) {
        self.draft.clear();
    }

    pub fn picker_open(&self) -> bool {
        self.picker.is_some()
    }

    /// Flip picker visibility. Returns the new visibility.
    pub fn toggle_picker(&mut self, source: &InteractionSource) -> bool {
        if self.picker.is_some() {
            self.close_picker();
            false
        } else {
            self.picker = Some(source.subscribe());
            true
        }
    }

    /// Force the picker closed. Returns true if it was open.
    pub fn close_picker(&mut self) -> bool {
        self.picker.take().is_some()
    }

    /// Apply one interaction. Closes the picker when it landed outside.
    pub fn observe(&mut self, interaction: Interaction) -> bool {
        if self.picker.is_some() && interaction.is_outside_picker() {
            trace!(region = ?interaction.region, "interaction outside picker");
            return self.close_picker();
        }
        false
    }

    /// Drain queued interactions without waiting. Returns true if the picker closed.
    pub fn poll_interactions(&mut self) -> bool {
        loop {
            let next = match self.picker.as_mut() {
                Some(rx) => rx.try_recv(),
                None => return false,
            };
            match next {
                Ok(interaction) => {
                    if self.observe(interaction) {
                        return true;
                    }
                }
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return false,
            }
        }
    }

    /// Resolve once an interaction outside the picker arrives.
    ///
    /// Pends forever while the picker is closed, so it can sit in a `select!`.
    pub async fn outside_interaction(&mut self) -> Interaction {
        let Some(rx) = self.picker.as_mut() else {
            return std::future::pending().await;
        };
        loop {
            match rx.recv().await {
                Ok(interaction) if interaction.is_outside_picker() => return interaction,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return std::future::pending().await,
            }
        }
    }
}
